//! CRUD Operations - registry-bound model handles
//!
//! A [`Model`] pairs a [`ModelDefinition`] with the [`Registry`] it was
//! registered into and exposes the table-level operations: find, create,
//! bulk update, remove and restore. Soft-delete filtering is applied by
//! [`Model::query`] so every read path honours it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::definition::ModelDefinition;
use super::record::Record;
use crate::backends::Row;
use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;
use crate::registry::Registry;
use crate::relationships::RelationshipLoader;

/// Row selection for `find`, `update` and `remove`
pub enum QueryInput {
    /// Every (non soft-deleted) row
    All,
    /// Equality filter on each column of the map
    Filter(Row),
    /// Arbitrary customization of the base query
    Custom(Box<dyn FnOnce(QueryBuilder) -> QueryBuilder + Send>),
}

impl QueryInput {
    pub fn filter(filter: Row) -> Self {
        QueryInput::Filter(filter)
    }

    pub fn custom<F>(customize: F) -> Self
    where
        F: FnOnce(QueryBuilder) -> QueryBuilder + Send + 'static,
    {
        QueryInput::Custom(Box::new(customize))
    }

    pub fn apply(self, query: QueryBuilder) -> QueryBuilder {
        match self {
            QueryInput::All => query,
            QueryInput::Filter(filter) => query.where_map(&filter),
            QueryInput::Custom(customize) => customize(query),
        }
    }
}

impl Default for QueryInput {
    fn default() -> Self {
        QueryInput::All
    }
}

impl From<Row> for QueryInput {
    fn from(filter: Row) -> Self {
        QueryInput::Filter(filter)
    }
}

impl fmt::Debug for QueryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryInput::All => f.write_str("All"),
            QueryInput::Filter(filter) => f.debug_tuple("Filter").field(filter).finish(),
            QueryInput::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Projection and eager-loading options for `find` / `find_by_id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Columns to select; all columns when `None`
    pub fields: Option<Vec<String>>,
    /// Dotted relationship paths resolved after the base fetch, in order
    pub with_related: Vec<String>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that only eager-load `paths`
    pub fn with<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new().with_related(paths)
    }

    pub fn with_related<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_related.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// A model definition bound to a registry
#[derive(Clone)]
pub struct Model {
    registry: Registry,
    definition: Arc<ModelDefinition>,
}

impl Model {
    pub(crate) fn new(registry: Registry, definition: Arc<ModelDefinition>) -> Self {
        Self { registry, definition }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn table_name(&self) -> String {
        self.definition.table_name()
    }

    pub fn id_column(&self) -> String {
        self.definition.id_column()
    }

    pub fn definition(&self) -> &Arc<ModelDefinition> {
        &self.definition
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Documentation form of the JSON schema (relationships as `$ref`s)
    pub fn json_schema(&self) -> &Value {
        self.definition.json_schema()
    }

    /// Base query on the table with the soft-delete filter applied
    pub fn query(&self) -> QueryBuilder {
        let table = self.table_name();
        let query = QueryBuilder::table(&table);
        match self.definition.soft_delete_column() {
            Some(column) => query.where_null(&format!("{}.{}", table, column)),
            None => query,
        }
    }

    /// Construct an unsaved record
    pub fn new_record(&self, props: Row) -> ModelResult<Record> {
        let record = Record::new(self.clone(), props, false);
        if self.definition.validates_on_init() {
            record.validate()?;
        }
        Ok(record)
    }

    /// Construct, validate and persist a record
    pub async fn create(&self, props: Row) -> ModelResult<Record> {
        let record = self.new_record(props)?;
        record.save().await?;
        Ok(record)
    }

    pub async fn find(&self, input: impl Into<QueryInput>, options: FindOptions) -> ModelResult<Vec<Record>> {
        let mut query = input.into().apply(self.query());
        if let Some(fields) = &options.fields {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            query = query.select_only(&fields);
        }

        let rows = self.registry.backend().select(&query).await?;
        let records: Vec<Record> = rows
            .into_iter()
            .map(|row| Record::new(self.clone(), row, true))
            .collect();

        self.load_related(&records, &options.with_related).await?;
        Ok(records)
    }

    /// Single-row fetch by primary key; `None` when no row matches
    pub async fn find_by_id(&self, id: impl Into<Value>, options: FindOptions) -> ModelResult<Option<Record>> {
        let id_column = self.id_column();
        let id = id.into();
        let mut found = self
            .find(
                QueryInput::custom(move |query| query.where_eq(&id_column, id).limit(1)),
                FindOptions {
                    fields: options.fields,
                    with_related: Vec::new(),
                },
            )
            .await?;

        let Some(record) = found.pop() else {
            return Ok(None);
        };
        self.load_related(std::slice::from_ref(&record), &options.with_related)
            .await?;
        Ok(Some(record))
    }

    /// Resolve each path over `records`, in order
    pub async fn load_related(&self, records: &[Record], paths: &[String]) -> ModelResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let loader = RelationshipLoader::new(self.registry.clone());
        for path in paths {
            loader.load(&self.definition, records, path).await?;
        }
        Ok(())
    }

    /// Bulk update without validation; returns the affected row count
    pub async fn update(&self, input: impl Into<QueryInput>, updates: Row) -> ModelResult<u64> {
        let query = input.into().apply(self.query());
        let affected = self.registry.backend().update(&query, &updates).await?;
        tracing::debug!(model = %self.name(), affected, "bulk update");
        Ok(affected)
    }

    /// Destroy every matching record; returns the affected row count
    pub async fn remove(&self, input: impl Into<QueryInput>) -> ModelResult<u64> {
        let records = self.find(input, FindOptions::default()).await?;
        let mut affected = 0;
        for record in &records {
            affected += record.destroy().await?;
        }
        Ok(affected)
    }

    /// Clear the soft-delete marker of the row with `id`
    pub async fn restore(&self, id: impl Into<Value>) -> ModelResult<u64> {
        let column = self.definition.soft_delete_column().ok_or_else(|| {
            ModelError::UnsupportedOperation(format!("{} does not support soft deletes", self.name()))
        })?;

        let query = QueryBuilder::table(&self.table_name()).where_eq(&self.id_column(), id);
        let mut values = Row::new();
        values.insert(column.to_string(), Value::Null);

        let affected = self.registry.backend().update(&query, &values).await?;
        tracing::debug!(model = %self.name(), affected, "restored");
        Ok(affected)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("table", &self.table_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use crate::query::QueryOperator;
    use crate::schema::{Field, Fields, Schema};
    use serde_json::json;

    fn teachers(soft_delete: bool) -> Model {
        let definition = ModelDefinition::new(
            "Teacher",
            Schema::new(Fields::new().field("name", Field::string())).unwrap(),
        );
        let definition = if soft_delete {
            definition.soft_delete("deletedAt")
        } else {
            definition
        };
        Registry::new(Arc::new(MemoryBackend::new())).register(definition).unwrap()
    }

    #[test]
    fn test_query_applies_soft_delete_filter() {
        let query = teachers(true).query();
        assert_eq!(query.table_name(), Some("Teachers"));
        assert_eq!(query.conditions().len(), 1);
        assert_eq!(query.conditions()[0].column, "Teachers.deletedAt");
        assert_eq!(query.conditions()[0].operator, QueryOperator::IsNull);

        assert!(teachers(false).query().conditions().is_empty());
    }

    #[test]
    fn test_query_input_variants() {
        let mut filter = Row::new();
        filter.insert("name".to_string(), json!("Ms. Frizzle"));

        let query = QueryInput::from(filter).apply(QueryBuilder::table("Teachers"));
        assert_eq!(query.conditions()[0].operator, QueryOperator::Equal);

        let query = QueryInput::custom(|q| q.order_by_desc("name").limit(2)).apply(QueryBuilder::table("Teachers"));
        assert_eq!(query.limit_count(), Some(2));
        assert_eq!(query.ordering().len(), 1);

        assert!(QueryInput::All.apply(QueryBuilder::table("Teachers")).conditions().is_empty());
    }

    #[test]
    fn test_find_options_builder() {
        let options = FindOptions::with(["students.courses"]).fields(["id", "name"]);
        assert_eq!(options.with_related, vec!["students.courses"]);
        assert_eq!(options.fields, Some(vec!["id".to_string(), "name".to_string()]));
    }

    #[tokio::test]
    async fn test_restore_requires_soft_delete_column() {
        let err = teachers(false).restore(1).await.unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedOperation(ref message) if message == "Teacher does not support soft deletes"));
    }
}
