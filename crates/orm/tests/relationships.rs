use std::sync::Arc;

use molti_orm::{
    Field, Fields, FindOptions, MemoryBackend, Model, ModelDefinition, ModelError, QueryInput, Record, Registry,
    RelationshipLoader, Schema,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn definition(name: &str, fields: Fields) -> ModelDefinition {
    ModelDefinition::new(name, Schema::new(fields).unwrap())
}

fn names(records: &[Record]) -> Vec<String> {
    let mut names: Vec<String> = records
        .iter()
        .filter_map(|record| record.get("name"))
        .filter_map(|name| name.as_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

struct Family {
    backend: Arc<MemoryBackend>,
    parents: Model,
}

fn family() -> Family {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed(
            "Parents",
            vec![json!({ "name": "Ada" }), json!({ "name": "Ben" }), json!({ "name": "Cy" })],
        )
        .unwrap();
    backend
        .seed(
            "Children",
            vec![
                json!({ "name": "Dot", "parentId": 1 }),
                json!({ "name": "Eve", "parentId": 1 }),
                json!({ "name": "Fay", "parentId": 2 }),
                json!({ "name": "Gus", "parentId": null }),
            ],
        )
        .unwrap();

    let registry = Registry::new(backend.clone());
    let parents = registry
        .register(definition(
            "Parent",
            Fields::new().field("name", Field::string()).field("children", Field::models()),
        ))
        .unwrap();
    registry
        .register(definition(
            "Child",
            Fields::new()
                .field("name", Field::string())
                .field("parent", Field::model()),
        ))
        .unwrap();

    Family { backend, parents }
}

#[tokio::test]
async fn test_one_to_many_matches_foreign_column() {
    let Family { backend, parents } = family();
    backend.reset_query_count();

    let found = parents.find(QueryInput::All, FindOptions::with(["children"])).await.unwrap();
    assert_eq!(found.len(), 3);
    assert_eq!(backend.query_count(), 2);

    let by_name = |name: &str| {
        found
            .iter()
            .find(|parent| parent.get("name") == Some(json!(name)))
            .cloned()
            .unwrap()
    };
    assert_eq!(names(&by_name("Ada").related_many("children").unwrap()), vec!["Dot", "Eve"]);
    assert_eq!(names(&by_name("Ben").related_many("children").unwrap()), vec!["Fay"]);
    assert!(by_name("Cy").related_many("children").unwrap().is_empty());
}

#[tokio::test]
async fn test_back_references_point_at_the_owner() {
    let Family { parents, .. } = family();

    let ada = parents
        .find_by_id(1, FindOptions::with(["children"]))
        .await
        .unwrap()
        .unwrap();

    let children = ada.related_many("children").unwrap();
    assert_eq!(children.len(), 2);
    for child in &children {
        assert!(child.related_one("parent").unwrap().same(&ada));
    }

    ada.clear_relationships();
    assert!(ada.related("children").is_none());
}

#[tokio::test]
async fn test_single_back_references_count_as_loaded() {
    let Family { backend, parents } = family();
    backend.reset_query_count();

    let found = parents
        .find(QueryInput::All, FindOptions::with(["children.parent"]))
        .await
        .unwrap();
    assert_eq!(backend.query_count(), 2);

    for parent in &found {
        for child in parent.related_many("children").unwrap() {
            assert!(child.related_one("parent").unwrap().same(parent));
        }
    }
}

#[tokio::test]
async fn test_single_relationship_keeps_last_matching_row() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    backend.seed("Parents", vec![json!({ "name": "Ada" })]).unwrap();
    backend
        .seed(
            "Children",
            vec![
                json!({ "name": "Dot", "parentId": 1 }),
                json!({ "name": "Eve", "parentId": 1 }),
            ],
        )
        .unwrap();

    let registry = Registry::new(backend.clone());
    let parents = registry
        .register(definition(
            "Parent",
            Fields::new().field("name", Field::string()).field(
                "youngest",
                Field::model().related("Child").local_field("id").foreign_field("parentId"),
            ),
        ))
        .unwrap();
    registry
        .register(definition(
            "Child",
            Fields::new().field("name", Field::string()).field("parent", Field::model()),
        ))
        .unwrap();

    let ada = parents
        .find_by_id(1, FindOptions::with(["youngest"]))
        .await
        .unwrap()
        .unwrap();
    let youngest = ada.related_one("youngest").unwrap();
    assert_eq!(youngest.get("name"), Some(json!("Eve")));
    assert!(youngest.related_one("parent").unwrap().same(&ada));
}

#[tokio::test]
async fn test_many_to_one_batches_and_shares_instances() {
    let Family { backend, parents } = family();
    let children = parents.registry().model("Child").unwrap();
    backend.reset_query_count();

    let found = children.find(QueryInput::All, FindOptions::with(["parent"])).await.unwrap();
    assert_eq!(backend.query_count(), 2);

    let dot = found[0].related_one("parent").unwrap();
    let eve = found[1].related_one("parent").unwrap();
    assert!(dot.same(&eve));
    assert_eq!(dot.get("name"), Some(json!("Ada")));
    assert_eq!(names(&dot.related_many("children").unwrap()), vec!["Dot", "Eve"]);

    // null foreign key: no match, relationship stays unset
    assert!(found[3].related("parent").is_none());
}

#[tokio::test]
async fn test_many_to_many_through_default_join_table() {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed("Students", vec![json!({ "name": "Ann" }), json!({ "name": "Bo" })])
        .unwrap();
    backend
        .seed("Courses", vec![json!({ "name": "Art" }), json!({ "name": "Bio" })])
        .unwrap();
    backend
        .seed(
            "courseStudent",
            vec![
                json!({ "studentId": 1, "courseId": 1 }),
                json!({ "studentId": 1, "courseId": 2 }),
                json!({ "studentId": 2, "courseId": 2 }),
                json!({ "studentId": 2, "courseId": 2 }),
            ],
        )
        .unwrap();

    let registry = Registry::new(backend.clone());
    let students = registry
        .register(definition(
            "Student",
            Fields::new()
                .field("name", Field::string())
                .field("courses", Field::models().through_default()),
        ))
        .unwrap();
    registry
        .register(definition(
            "Course",
            Fields::new()
                .field("name", Field::string())
                .field("students", Field::models().through_default()),
        ))
        .unwrap();

    let found = students.find(QueryInput::All, FindOptions::with(["courses"])).await.unwrap();
    let ann = &found[0];
    let bo = &found[1];

    assert_eq!(names(&ann.related_many("courses").unwrap()), vec!["Art", "Bio"]);
    // one attached row per join row
    assert_eq!(names(&bo.related_many("courses").unwrap()), vec!["Bio", "Bio"]);

    let art = &ann.related_many("courses").unwrap()[0];
    assert_eq!(art.get("studentId"), None);
    let back = art.related_many("students").unwrap();
    assert_eq!(back.len(), 1);
    assert!(back[0].same(ann));
}

struct School {
    backend: Arc<MemoryBackend>,
    principals: Model,
}

fn school() -> School {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed("Principals", vec![json!({ "name": "Pat" }), json!({ "name": "Quinn" })])
        .unwrap();
    backend
        .seed(
            "Teachers",
            vec![
                json!({ "name": "Rae", "principalId": 1 }),
                json!({ "name": "Sam", "principalId": 1 }),
                json!({ "name": "Tia", "principalId": 2 }),
            ],
        )
        .unwrap();
    backend
        .seed(
            "Students",
            vec![
                json!({ "name": "Uma", "teacherId": 1 }),
                json!({ "name": "Vic", "teacherId": 2 }),
                json!({ "name": "Wes", "teacherId": 3 }),
                json!({ "name": "Xia", "teacherId": 3 }),
            ],
        )
        .unwrap();

    let registry = Registry::new(backend.clone());
    let principals = registry
        .register(definition(
            "Principal",
            Fields::new().field("name", Field::string()).field("teachers", Field::models()),
        ))
        .unwrap();
    registry
        .register(definition(
            "Teacher",
            Fields::new()
                .field("name", Field::string())
                .field("principal", Field::model())
                .field("students", Field::models()),
        ))
        .unwrap();
    registry
        .register(definition(
            "Student",
            Fields::new().field("name", Field::string()).field("teacher", Field::model()),
        ))
        .unwrap();

    School { backend, principals }
}

#[tokio::test]
async fn test_nested_paths_use_one_query_per_level() {
    let School { backend, principals } = school();
    backend.reset_query_count();

    let found = principals
        .find(QueryInput::All, FindOptions::with(["teachers.students"]))
        .await
        .unwrap();
    assert_eq!(backend.query_count(), 3);

    let teachers: Vec<Record> = found
        .iter()
        .flat_map(|principal| principal.related_many("teachers").unwrap())
        .collect();
    assert_eq!(names(&teachers), vec!["Rae", "Sam", "Tia"]);

    let students: Vec<Record> = teachers
        .iter()
        .flat_map(|teacher| teacher.related_many("students").unwrap())
        .collect();
    assert_eq!(names(&students), vec!["Uma", "Vic", "Wes", "Xia"]);

    let wes = students.iter().find(|s| s.get("name") == Some(json!("Wes"))).unwrap();
    let tia = wes.related_one("teacher").unwrap();
    assert!(tia.related_one("principal").unwrap().same(&found[1]));
}

#[tokio::test]
async fn test_three_segment_path_uses_one_query_per_level() {
    let School { backend, principals } = school();
    let students = principals.registry().model("Student").unwrap();
    let found = students.find(QueryInput::All, FindOptions::new()).await.unwrap();
    backend.reset_query_count();

    let loader = RelationshipLoader::new(principals.registry().clone());
    let stats = loader
        .load(students.definition(), &found, "teacher.principal.teachers")
        .await
        .unwrap();
    assert_eq!(backend.query_count(), 3);
    assert_eq!(stats.queries, 3);
    assert_eq!(stats.depth, 3);

    let uma = &found[0];
    let rae = uma.related_one("teacher").unwrap();
    let pat = rae.related_one("principal").unwrap();
    assert_eq!(pat.get("name"), Some(json!("Pat")));
    assert_eq!(names(&pat.related_many("teachers").unwrap()), vec!["Rae", "Sam"]);

    let wes = &found[2];
    let quinn = wes.related_one("teacher").unwrap().related_one("principal").unwrap();
    assert_eq!(names(&quinn.related_many("teachers").unwrap()), vec!["Tia"]);
}

#[tokio::test]
async fn test_resolved_relationships_are_served_from_cache() {
    let School { backend, principals } = school();
    let found = principals
        .find(QueryInput::All, FindOptions::with(["teachers", "teachers.students"]))
        .await
        .unwrap();
    assert_eq!(backend.query_count(), 3);

    backend.reset_query_count();
    let loader = RelationshipLoader::new(principals.registry().clone());
    let stats = loader
        .load(principals.definition(), &found, "teachers.students")
        .await
        .unwrap();
    assert_eq!(backend.query_count(), 0);
    assert_eq!(stats.queries, 0);
    assert_eq!(stats.depth, 2);
}

#[tokio::test]
async fn test_unknown_relationship_aborts_resolution() {
    let School { principals, .. } = school();

    let err = principals
        .find(QueryInput::All, FindOptions::with(["teachers.pets"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::UnknownRelationship { ref entity, ref relationship } if entity == "Teacher" && relationship == "pets"
    ));
}

#[tokio::test]
async fn test_unregistered_related_entity() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed("Owners", vec![json!({ "name": "Olu" })]).unwrap();
    let owners = Registry::new(backend)
        .register(definition("Owner", Fields::new().field("pets", Field::models())))
        .unwrap();

    let err = owners.find(QueryInput::All, FindOptions::with(["pets"])).await.unwrap_err();
    assert!(matches!(err, ModelError::UnknownEntity(ref name) if name == "Pet"));
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let School { backend, principals } = school();
    backend.reset_query_count();

    let filter = json!({ "name": "Nobody" }).as_object().cloned().unwrap();
    let found = principals
        .find(filter, FindOptions::with(["teachers.students"]))
        .await
        .unwrap();
    assert!(found.is_empty());
    assert_eq!(backend.query_count(), 1);
}

#[tokio::test]
async fn test_identical_finds_are_structurally_equal() {
    let School { principals, .. } = school();

    let first: Vec<Value> = principals
        .find(QueryInput::All, FindOptions::with(["teachers.students"]))
        .await
        .unwrap()
        .iter()
        .map(Record::to_json)
        .collect();
    let second: Vec<Value> = principals
        .find(QueryInput::All, FindOptions::with(["teachers.students"]))
        .await
        .unwrap()
        .iter()
        .map(Record::to_json)
        .collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_pull_related_always_queries() {
    let Family { backend, parents } = family();
    let ada = parents
        .find_by_id(1, FindOptions::with(["children"]))
        .await
        .unwrap()
        .unwrap();

    backend.reset_query_count();
    let children = ada.pull_related("children").await.unwrap().unwrap();
    assert_eq!(backend.query_count(), 1);
    assert_eq!(names(children.as_many().unwrap()), vec!["Dot", "Eve"]);

    let err = ada.pull_related("toys").await.unwrap_err();
    assert!(matches!(err, ModelError::UnknownRelationship { .. }));
}
