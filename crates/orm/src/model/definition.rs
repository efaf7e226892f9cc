//! Model definitions - the static description of an entity

use std::fmt;
use std::sync::OnceLock;

use serde_json::Value;

use crate::error::{ModelError, ModelResult};
use crate::naming::{guess_column_name, guess_id_column, pluralize};
use crate::schema::{FieldDefinition, JsonSchemaDocument, Schema};

/// Table-level options for a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelConfig {
    pub table_name: Option<String>,
    pub id_column: Option<String>,
    /// Soft-delete timestamp column; hard deletes when `None`
    pub deleted_at_column: Option<String>,
    pub timestamps: bool,
    pub created_at_column: Option<String>,
    pub updated_at_column: Option<String>,
    /// Reject construction of records that fail validation
    pub validate_on_init: bool,
}

/// A record type bound to a table: name, schema, table options and the
/// relationships declared by the schema.
///
/// Definitions are registered into exactly one [`Registry`](crate::Registry).
pub struct ModelDefinition {
    name: String,
    schema: Schema,
    config: ModelConfig,
    json_schema: JsonSchemaDocument,
    registry_id: OnceLock<u64>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_config(name, schema, ModelConfig::default())
    }

    pub fn with_config(name: impl Into<String>, schema: Schema, config: ModelConfig) -> Self {
        let json_schema = schema.json_schema();
        Self {
            name: name.into(),
            schema,
            config,
            json_schema,
            registry_id: OnceLock::new(),
        }
    }

    pub fn table_name_override(mut self, table: &str) -> Self {
        self.config.table_name = Some(table.to_string());
        self
    }

    pub fn id_column_override(mut self, column: &str) -> Self {
        self.config.id_column = Some(column.to_string());
        self
    }

    /// Enable soft deletes through `column`
    pub fn soft_delete(mut self, column: &str) -> Self {
        self.config.deleted_at_column = Some(column.to_string());
        self
    }

    pub fn timestamps(mut self) -> Self {
        self.config.timestamps = true;
        self
    }

    pub fn created_at_column(mut self, column: &str) -> Self {
        self.config.timestamps = true;
        self.config.created_at_column = Some(column.to_string());
        self
    }

    pub fn updated_at_column(mut self, column: &str) -> Self {
        self.config.timestamps = true;
        self.config.updated_at_column = Some(column.to_string());
        self
    }

    pub fn validate_on_init(mut self) -> Self {
        self.config.validate_on_init = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Explicit table name, else the pluralized model name
    pub fn table_name(&self) -> String {
        self.config
            .table_name
            .clone()
            .unwrap_or_else(|| pluralize(&self.name))
    }

    pub fn id_column(&self) -> String {
        self.config
            .id_column
            .clone()
            .unwrap_or_else(|| guess_id_column().to_string())
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.config.deleted_at_column.as_deref()
    }

    pub fn uses_timestamps(&self) -> bool {
        self.config.timestamps
    }

    pub fn created_at(&self) -> String {
        self.config
            .created_at_column
            .clone()
            .unwrap_or_else(|| guess_column_name("created", "at"))
    }

    pub fn updated_at(&self) -> String {
        self.config
            .updated_at_column
            .clone()
            .unwrap_or_else(|| guess_column_name("updated", "at"))
    }

    pub fn validates_on_init(&self) -> bool {
        self.config.validate_on_init
    }

    /// Declared relationship by name
    pub fn relationship(&self, name: &str) -> Option<&FieldDefinition> {
        self.schema.field(name).filter(|field| field.is_relationship())
    }

    /// Relationship names in declaration order
    pub fn relationship_names(&self) -> Vec<String> {
        self.schema
            .relationship_fields()
            .map(|field| field.name.clone())
            .collect()
    }

    /// Documentation form of the schema
    pub fn json_schema(&self) -> &Value {
        &self.json_schema.with_refs
    }

    /// Instance validation form of the schema
    pub fn validation_schema(&self) -> &Value {
        &self.json_schema.without_refs
    }

    pub(crate) fn bind_registry(&self, registry_id: u64) -> ModelResult<()> {
        let bound = *self.registry_id.get_or_init(|| registry_id);
        if bound == registry_id {
            Ok(())
        } else {
            Err(ModelError::Configuration(format!(
                "model '{}' is already registered in another registry",
                self.name
            )))
        }
    }
}

impl fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("name", &self.name)
            .field("table", &self.table_name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, Fields};

    fn child_schema() -> Schema {
        Schema::new(
            Fields::new()
                .field("name", Field::string())
                .field("parent", Field::model())
                .field("toys", Field::models()),
        )
        .unwrap()
    }

    #[test]
    fn test_table_and_id_defaults() {
        let definition = ModelDefinition::new("Child", child_schema());
        assert_eq!(definition.table_name(), "Children");
        assert_eq!(definition.id_column(), "id");
        assert_eq!(definition.created_at(), "createdAt");
        assert_eq!(definition.updated_at(), "updatedAt");
        assert!(definition.soft_delete_column().is_none());
    }

    #[test]
    fn test_overrides() {
        let definition = ModelDefinition::new("Child", child_schema())
            .table_name_override("kids")
            .id_column_override("kidId")
            .created_at_column("born")
            .soft_delete("gone");
        assert_eq!(definition.table_name(), "kids");
        assert_eq!(definition.id_column(), "kidId");
        assert_eq!(definition.created_at(), "born");
        assert!(definition.uses_timestamps());
        assert_eq!(definition.soft_delete_column(), Some("gone"));
    }

    #[test]
    fn test_relationships_keep_declaration_order() {
        let definition = ModelDefinition::new("Child", child_schema());
        assert_eq!(definition.relationship_names(), vec!["parent", "toys"]);
        assert!(definition.relationship("name").is_none());
    }

    #[test]
    fn test_binding_to_a_second_registry_fails() {
        let definition = ModelDefinition::new("Child", child_schema());
        assert!(definition.bind_registry(1).is_ok());
        assert!(definition.bind_registry(1).is_ok());
        assert!(matches!(definition.bind_registry(2), Err(ModelError::Configuration(_))));
    }
}
