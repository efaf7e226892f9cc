//! Model Lifecycle - persisting and deleting records

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::record::Record;
use crate::backends::Row;
use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;

/// Options for [`Record::save_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    pub validate: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

pub(crate) fn timestamp_now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Record {
    pub async fn save(&self) -> ModelResult<()> {
        self.save_with(SaveOptions::default()).await
    }

    /// Insert or update the record.
    ///
    /// New records are inserted with all props and receive the generated
    /// primary key; persisted records update only their changed fields.
    pub async fn save_with(&self, options: SaveOptions) -> ModelResult<()> {
        if options.validate {
            self.validate()?;
        }

        let model = self.model().clone();
        let definition = model.definition();
        if definition.uses_timestamps() {
            let now = timestamp_now();
            if !self.is_persisted() {
                self.set(&definition.created_at(), now.clone());
            }
            self.set(&definition.updated_at(), now);
        }

        let table = definition.table_name();
        let id_column = definition.id_column();
        let backend = model.registry().backend().clone();

        if self.is_persisted() {
            let changes = self.changes();
            if !changes.is_empty() {
                let id = self.id().ok_or(ModelError::MissingPrimaryKey)?;
                let query = QueryBuilder::table(&table).where_eq(&id_column, id);
                let affected = backend.update(&query, &changes).await?;
                tracing::debug!(model = %model.name(), fields = changes.len(), affected, "record updated");
            }
        } else {
            let mut values = self.props();
            if values.get(&id_column).is_some_and(Value::is_null) {
                values.remove(&id_column);
            }
            let id = backend.insert(&table, &values, &id_column).await?;
            tracing::debug!(model = %model.name(), id = %id, "record inserted");
            self.write().props.insert(id_column, id);
        }

        self.resync();
        Ok(())
    }

    /// Soft delete when the model has a delete-timestamp column, hard
    /// delete otherwise. Returns the affected row count.
    pub async fn destroy(&self) -> ModelResult<u64> {
        let model = self.model().clone();
        let id = self.id().ok_or(ModelError::MissingPrimaryKey)?;
        let query = model.query().where_eq(&model.id_column(), id);
        let backend = model.registry().backend().clone();

        let affected = match model.definition().soft_delete_column() {
            Some(column) => {
                let now = timestamp_now();
                let mut values = Row::new();
                values.insert(column.to_string(), now.clone());
                let affected = backend.update(&query, &values).await?;

                let mut state = self.write();
                state.props.insert(column.to_string(), now.clone());
                state.original.insert(column.to_string(), now);
                affected
            }
            None => backend.delete(&query).await?,
        };

        tracing::debug!(model = %model.name(), affected, "record destroyed");
        Ok(affected)
    }
}
