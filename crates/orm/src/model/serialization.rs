//! Record serialization
//!
//! Records serialize to their own props plus every populated relationship.
//! A nested record is serialized with its parent as the ignored instance, so
//! back-references do not echo the parent; records already on the current
//! path are skipped as well, which keeps cyclic graphs finite.

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::record::{Record, Related};

impl Record {
    pub fn to_json(&self) -> Value {
        self.serialize_on_path(None, &mut Vec::new())
    }

    /// Serialize, leaving `ignored` out of every relationship output
    pub fn to_json_ignoring(&self, ignored: &Record) -> Value {
        self.serialize_on_path(Some(ignored), &mut Vec::new())
    }

    fn serialize_on_path(&self, ignored: Option<&Record>, path: &mut Vec<Record>) -> Value {
        let (mut output, relations) = {
            let state = self.read();
            (state.props.clone(), state.relations.clone())
        };
        path.push(self.clone());

        let skip = |record: &Record, path: &[Record]| {
            ignored.is_some_and(|ignored| record.same(ignored)) || path.iter().any(|seen| seen.same(record))
        };

        for name in self.model().definition().relationship_names() {
            if output.contains_key(&name) {
                continue;
            }
            match relations.get(&name) {
                Some(Related::One(record)) => {
                    if !skip(record, path.as_slice()) {
                        let nested = record.serialize_on_path(Some(self), path);
                        output.insert(name, nested);
                    }
                }
                Some(Related::Many(records)) => {
                    let mut nested = Vec::with_capacity(records.len());
                    for record in records {
                        if !skip(record, path.as_slice()) {
                            nested.push(record.serialize_on_path(Some(self), path));
                        }
                    }
                    output.insert(name, Value::Array(nested));
                }
                None => {}
            }
        }

        path.pop();
        Value::Object(output)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::backends::{MemoryBackend, Row};
    use crate::model::ModelDefinition;
    use crate::registry::Registry;
    use crate::schema::{Field, Fields, Schema};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_back_references_are_not_echoed() {
        let registry = Registry::new(Arc::new(MemoryBackend::new()));
        let parents = registry
            .register(ModelDefinition::new(
                "Parent",
                Schema::new(Fields::new().field("children", Field::models())).unwrap(),
            ))
            .unwrap();
        let children = registry
            .register(ModelDefinition::new(
                "Child",
                Schema::new(Fields::new().field("parent", Field::model())).unwrap(),
            ))
            .unwrap();

        let parent = parents.new_record(row(json!({ "id": 1 }))).unwrap();
        let child = children.new_record(row(json!({ "id": 2, "parentId": 1 }))).unwrap();
        parent.set_related("children", Related::Many(vec![child.clone()]));
        child.set_related("parent", Related::One(parent.clone()));

        assert_eq!(
            parent.to_json(),
            json!({ "id": 1, "children": [{ "id": 2, "parentId": 1 }] })
        );
        assert_eq!(child.to_json(), json!({ "id": 2, "parentId": 1, "parent": { "id": 1, "children": [] } }));
        assert_eq!(child.to_json_ignoring(&parent), json!({ "id": 2, "parentId": 1 }));
        assert_eq!(serde_json::to_value(&parent).unwrap(), parent.to_json());
    }
}
