//! Records - loaded or constructed instances of a model

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;

use super::crud_operations::Model;
use crate::backends::Row;
use crate::error::{ModelError, ModelResult};
use crate::relationships::RelationshipLoader;

/// Populated value of a relationship field
#[derive(Debug, Clone)]
pub enum Related {
    One(Record),
    Many(Vec<Record>),
}

impl Related {
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Related::One(record) => Some(record),
            Related::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&[Record]> {
        match self {
            Related::One(_) => None,
            Related::Many(records) => Some(records),
        }
    }

    /// Records held, in order
    pub fn records(&self) -> Vec<Record> {
        match self {
            Related::One(record) => vec![record.clone()],
            Related::Many(records) => records.clone(),
        }
    }
}

pub(crate) struct RecordState {
    pub(crate) props: Row,
    pub(crate) original: Row,
    /// Changed field names in first-change order
    pub(crate) changes: Vec<String>,
    pub(crate) persisted: bool,
    pub(crate) relations: HashMap<String, Related>,
    /// Relationships resolved by the loader for this instance
    pub(crate) resolved: HashSet<String>,
}

struct RecordInner {
    model: Model,
    state: RwLock<RecordState>,
}

/// Shared handle to one entity instance.
///
/// Clones refer to the same instance, which is what lets the loader wire
/// back-references (`child.parent` is the very parent it was loaded from).
/// Back-references form reference cycles; call
/// [`clear_relationships`](Record::clear_relationships) on long-lived graphs
/// to release them.
#[derive(Clone)]
pub struct Record {
    inner: Arc<RecordInner>,
}

impl Record {
    pub(crate) fn new(model: Model, props: Row, persisted: bool) -> Self {
        Self {
            inner: Arc::new(RecordInner {
                model,
                state: RwLock::new(RecordState {
                    original: props.clone(),
                    props,
                    changes: Vec::new(),
                    persisted,
                    relations: HashMap::new(),
                    resolved: HashSet::new(),
                }),
            }),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, RecordState> {
        self.inner.state.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RecordState> {
        self.inner.state.write()
    }

    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.read().props.get(field).cloned()
    }

    /// Set a property and record it as changed
    pub fn set(&self, field: &str, value: impl Into<Value>) {
        let mut state = self.write();
        state.props.insert(field.to_string(), value.into());
        if !state.changes.iter().any(|changed| changed == field) {
            state.changes.push(field.to_string());
        }
    }

    pub fn props(&self) -> Row {
        self.read().props.clone()
    }

    /// Primary key value, `None` until persisted or assigned
    pub fn id(&self) -> Option<Value> {
        let id_column = self.model().id_column();
        self.get(&id_column).filter(|id| !id.is_null())
    }

    pub fn is_persisted(&self) -> bool {
        self.read().persisted
    }

    /// Changed field -> current value since the last load, save or reset
    pub fn changes(&self) -> Row {
        let state = self.read();
        state
            .changes
            .iter()
            .map(|field| {
                let value = state.props.get(field).cloned().unwrap_or(Value::Null);
                (field.clone(), value)
            })
            .collect()
    }

    /// Revert to the last loaded or saved snapshot
    pub fn reset(&self) {
        let mut state = self.write();
        state.props = state.original.clone();
        state.changes.clear();
    }

    /// Take the current props as the new snapshot
    pub(crate) fn resync(&self) {
        let mut state = self.write();
        state.original = state.props.clone();
        state.changes.clear();
        state.persisted = true;
    }

    /// Run the registry's validator over the props
    pub fn validate(&self) -> ModelResult<()> {
        let model = self.model();
        let instance = Value::Object(self.props());
        model
            .registry()
            .validator()
            .validate(model.definition().validation_schema(), &instance)
            .map_err(ModelError::Validation)
    }

    pub fn related(&self, name: &str) -> Option<Related> {
        self.read().relations.get(name).cloned()
    }

    pub fn related_one(&self, name: &str) -> Option<Record> {
        self.related(name).and_then(|related| related.as_one().cloned())
    }

    pub fn related_many(&self, name: &str) -> Option<Vec<Record>> {
        match self.related(name)? {
            Related::Many(records) => Some(records),
            Related::One(_) => None,
        }
    }

    pub fn set_related(&self, name: &str, related: Related) {
        self.write().relations.insert(name.to_string(), related);
    }

    /// Append `record` to a many relationship unless already present
    pub(crate) fn push_related(&self, name: &str, record: &Record) {
        let mut state = self.write();
        match state.relations.get_mut(name) {
            Some(Related::Many(records)) => {
                if !records.iter().any(|existing| existing.same(record)) {
                    records.push(record.clone());
                }
            }
            _ => {
                state
                    .relations
                    .insert(name.to_string(), Related::Many(vec![record.clone()]));
            }
        }
    }

    pub(crate) fn is_resolved(&self, name: &str) -> bool {
        self.read().resolved.contains(name)
    }

    pub(crate) fn mark_resolved(&self, name: &str) {
        self.write().resolved.insert(name.to_string());
    }

    /// Drop every populated relationship, releasing back-reference cycles
    pub fn clear_relationships(&self) {
        let mut state = self.write();
        state.relations.clear();
        state.resolved.clear();
    }

    /// Instance identity
    pub fn same(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Fetch one relationship for this instance alone, bypassing the cache
    pub async fn pull_related(&self, name: &str) -> ModelResult<Option<Related>> {
        let model = self.model();
        RelationshipLoader::new(model.registry().clone())
            .pull(model.definition(), self, name)
            .await
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let mut relations: Vec<&String> = state.relations.keys().collect();
        relations.sort();
        f.debug_struct("Record")
            .field("model", &self.model().name())
            .field("props", &state.props)
            .field("persisted", &state.persisted)
            .field("relations", &relations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use crate::model::ModelDefinition;
    use crate::registry::Registry;
    use crate::schema::{Field, Fields, Schema};
    use serde_json::json;

    fn model() -> Model {
        let schema = Schema::new(
            Fields::new()
                .field("name", Field::string().max_length(8))
                .field("age", Field::number()),
        )
        .unwrap();
        Registry::new(Arc::new(MemoryBackend::new()))
            .register(ModelDefinition::new("Person", schema))
            .unwrap()
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_changes_and_reset() {
        let record = Record::new(model(), row(json!({ "id": 1, "name": "Ada", "age": 36 })), true);
        assert!(record.changes().is_empty());

        record.set("name", "Grace");
        record.set("age", 37);
        record.set("name", "Hopper");
        assert_eq!(record.changes(), row(json!({ "name": "Hopper", "age": 37 })));
        assert_eq!(record.changes().keys().collect::<Vec<_>>(), vec!["name", "age"]);

        record.reset();
        assert!(record.changes().is_empty());
        assert_eq!(record.get("name"), Some(json!("Ada")));
    }

    #[test]
    fn test_validate_reports_without_mutating() {
        let record = Record::new(model(), row(json!({ "name": "Bartholomew", "age": "41" })), false);
        let err = record.validate().unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().keyword, "maxLength");
        assert_eq!(record.get("age"), Some(json!("41")));
    }

    #[test]
    fn test_identity_and_relations() {
        let model = model();
        let a = Record::new(model.clone(), Row::new(), false);
        let b = Record::new(model, Row::new(), false);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));

        a.push_related("friends", &b);
        a.push_related("friends", &b);
        assert_eq!(a.related_many("friends").unwrap().len(), 1);

        b.set_related("friend", Related::One(a.clone()));
        assert!(b.related_one("friend").unwrap().same(&a));

        a.clear_relationships();
        assert!(a.related("friends").is_none());
        assert!(a.id().is_none());
    }
}
