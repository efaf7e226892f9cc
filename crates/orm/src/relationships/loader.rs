//! Relationship Loader - batched eager loading along dotted paths
//!
//! Each path segment is resolved for the whole batch of instances with a
//! single query against the related table. Results are partitioned by their
//! matching key, assigned to the owning instances and wired back to them
//! through the mirroring relationship of the related entity, if any. The
//! fetched records then form the batch for the next segment.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use super::metadata::RelationshipDescriptor;
use crate::error::ModelResult;
use crate::model::{Model, ModelDefinition, Record, Related};
use crate::registry::Registry;

/// Statistics about one `load` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Number of batched queries executed
    pub queries: usize,
    /// Total records fetched across all levels
    pub records_loaded: usize,
    /// Number of path segments resolved
    pub depth: usize,
}

/// A fetched related record with the owner key it matched on
struct Fetched {
    key: Option<String>,
    record: Record,
}

#[derive(Debug, Clone)]
pub struct RelationshipLoader {
    registry: Registry,
}

impl RelationshipLoader {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Resolve `path` (e.g. `"doctors.patients"`) over `records`, which are
    /// instances of `definition`.
    pub async fn load(
        &self,
        definition: &Arc<ModelDefinition>,
        records: &[Record],
        path: &str,
    ) -> ModelResult<LoadStats> {
        let mut stats = LoadStats::default();
        let mut owner = definition.clone();
        let mut batch: Vec<Record> = records.to_vec();

        for segment in path.split('.').filter(|segment| !segment.is_empty()) {
            if batch.is_empty() {
                break;
            }
            let descriptor = self.registry.descriptor(&owner, segment)?;
            batch = self.resolve(&descriptor, &batch, &mut stats).await?;
            owner = descriptor.related.clone();
            stats.depth += 1;
        }

        Ok(stats)
    }

    /// Fetch one relationship for a single instance, ignoring its cache
    pub async fn pull(
        &self,
        definition: &ModelDefinition,
        record: &Record,
        name: &str,
    ) -> ModelResult<Option<Related>> {
        let descriptor = self.registry.descriptor(definition, name)?;
        let owners = std::slice::from_ref(record);
        let fetched = self.fetch(&descriptor, owners).await?;
        self.assign(&descriptor, owners, fetched);
        Ok(record.related(name))
    }

    /// Resolve one segment for `batch` and return the next batch
    async fn resolve(
        &self,
        descriptor: &RelationshipDescriptor,
        batch: &[Record],
        stats: &mut LoadStats,
    ) -> ModelResult<Vec<Record>> {
        let name = descriptor.name.as_str();
        let (cached, pending): (Vec<&Record>, Vec<&Record>) =
            batch.iter().partition(|record| record.is_resolved(name));

        let mut next = Vec::new();
        if !pending.is_empty() {
            let owners: Vec<Record> = pending.into_iter().cloned().collect();
            if has_keys(descriptor, &owners) {
                stats.queries += 1;
            }
            let fetched = self.fetch(descriptor, &owners).await?;
            stats.records_loaded += fetched.len();
            next.extend(self.assign(descriptor, &owners, fetched));
        }

        for record in cached {
            if let Some(related) = record.related(name) {
                next.extend(related.records());
            }
        }

        let mut seen = HashSet::new();
        next.retain(|record| seen.insert(record.identity()));
        Ok(next)
    }

    /// Run the batched query for `owners`
    async fn fetch(&self, descriptor: &RelationshipDescriptor, owners: &[Record]) -> ModelResult<Vec<Fetched>> {
        let keys = distinct_keys(owners, &descriptor.local_field);
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let related = Model::new(self.registry.clone(), descriptor.related.clone());
        let related_table = related.table_name();
        let query = match &descriptor.through {
            Some(join) => {
                let match_column = format!("{}.{}", join.table, join.local_field);
                let related_columns = format!("{}.*", related_table);
                related
                    .query()
                    .join(
                        &join.table,
                        &format!("{}.{}", related_table, related.id_column()),
                        &format!("{}.{}", join.table, join.foreign_field),
                    )
                    .select_only(&[related_columns.as_str(), match_column.as_str()])
                    .where_in(&match_column, keys)
            }
            None if keys.len() == 1 => {
                let key = keys.into_iter().next().unwrap_or(Value::Null);
                related.query().where_eq(&descriptor.foreign_field, key)
            }
            None => related.query().where_in(&descriptor.foreign_field, keys),
        };

        let rows = self.registry.backend().select(&query).await?;
        tracing::debug!(
            entity = %descriptor.owner,
            relationship = %descriptor.name,
            related = %descriptor.related_name(),
            owners = owners.len(),
            rows = rows.len(),
            "batched relationship fetch"
        );

        let match_column = descriptor.match_column();
        let strip_match_column = descriptor.through.is_some()
            && descriptor.related.schema().field(match_column).is_none()
            && match_column != related.id_column();

        Ok(rows
            .into_iter()
            .map(|mut row| {
                let key = row.get(match_column).and_then(key_of);
                if strip_match_column {
                    row.remove(match_column);
                }
                Fetched {
                    key,
                    record: Record::new(related.clone(), row, true),
                }
            })
            .collect())
    }

    /// Assign fetched records to their owners and wire back-references.
    /// Returns the fetched records in query order.
    fn assign(&self, descriptor: &RelationshipDescriptor, owners: &[Record], fetched: Vec<Fetched>) -> Vec<Record> {
        let name = descriptor.name.as_str();
        let mut one: HashMap<String, Record> = HashMap::new();
        let mut many: HashMap<String, Vec<Record>> = HashMap::new();
        let mut records = Vec::with_capacity(fetched.len());

        for Fetched { key, record } in fetched {
            if let Some(key) = key {
                if descriptor.is_many() {
                    many.entry(key).or_default().push(record.clone());
                } else if one.insert(key.clone(), record.clone()).is_some() {
                    tracing::warn!(
                        entity = %descriptor.owner,
                        relationship = %name,
                        key = %key,
                        "multiple rows for single relationship, keeping the last"
                    );
                }
            }
            records.push(record);
        }

        let inverse = self.inverse(descriptor);

        for owner in owners {
            let key = owner.get(&descriptor.local_field).as_ref().and_then(key_of);
            let results = if descriptor.is_many() {
                let results = key.and_then(|key| many.get(&key).cloned()).unwrap_or_default();
                owner.set_related(name, Related::Many(results.clone()));
                results
            } else {
                match key.and_then(|key| one.get(&key).cloned()) {
                    Some(result) => {
                        owner.set_related(name, Related::One(result.clone()));
                        vec![result]
                    }
                    None => Vec::new(),
                }
            };
            owner.mark_resolved(name);

            if let Some(inverse) = &inverse {
                for result in results.iter().filter(|result| !result.is_resolved(&inverse.name)) {
                    if inverse.is_many() {
                        result.push_related(&inverse.name, owner);
                    } else {
                        result.set_related(&inverse.name, Related::One(owner.clone()));
                        // a fetched row has exactly one owner unless a join table fans it out
                        if descriptor.through.is_none() {
                            result.mark_resolved(&inverse.name);
                        }
                    }
                }
            }
        }

        records
    }

    /// First relationship of the related entity that mirrors `descriptor`
    fn inverse(&self, descriptor: &RelationshipDescriptor) -> Option<Arc<RelationshipDescriptor>> {
        let related = &descriptor.related;
        related
            .relationship_names()
            .iter()
            .filter_map(|name| self.registry.descriptor(related, name).ok())
            .find(|candidate| descriptor.mirrors(candidate))
    }
}

fn has_keys(descriptor: &RelationshipDescriptor, owners: &[Record]) -> bool {
    owners
        .iter()
        .any(|owner| owner.get(&descriptor.local_field).is_some_and(|value| !value.is_null()))
}

/// Distinct non-null values of `column` across `owners`, in first-seen order
fn distinct_keys(owners: &[Record], column: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    owners
        .iter()
        .filter_map(|owner| owner.get(column))
        .filter(|value| key_of(value).is_some_and(|key| seen.insert(key)))
        .collect()
}

/// Canonical map key for a join value. Integral numbers and their string
/// forms collapse to the same key; NULL has none.
fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => match number.as_f64() {
            Some(float) if float.fract() == 0.0 && float.abs() < 9.0e15 => Some(format!("{}", float as i64)),
            _ => Some(number.to_string()),
        },
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_canonicalization() {
        assert_eq!(key_of(&json!(1)), Some("1".to_string()));
        assert_eq!(key_of(&json!(1.0)), Some("1".to_string()));
        assert_eq!(key_of(&json!("1")), Some("1".to_string()));
        assert_eq!(key_of(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(key_of(&json!(null)), None);
    }
}
