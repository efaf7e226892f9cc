//! Entity schemas
//!
//! A schema is an ordered set of typed fields. Scalar fields describe the
//! record's columns; `Model` and `Models` fields declare relationships. The
//! schema produces the JSON-Schema documents used for validation and
//! documentation, and can be composed from base definitions.

pub mod cast;
pub mod field;

pub use field::{Field, FieldDefinition, FieldMap, FieldType, Fields, RelationOptions, Through};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult, SchemaError};

/// The two JSON-Schema forms of a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaDocument {
    /// Documentation form, relationships rendered as `$ref`s
    pub with_refs: Value,
    /// Instance validation form, relationships omitted
    pub without_refs: Value,
}

/// A base definition for [`Schema::extending`]
#[derive(Debug, Clone)]
pub enum SchemaBase {
    Fields(FieldMap),
    List(Vec<SchemaBase>),
    Schema(Schema),
}

impl From<FieldMap> for SchemaBase {
    fn from(fields: FieldMap) -> Self {
        SchemaBase::Fields(fields)
    }
}

impl From<Fields> for SchemaBase {
    fn from(fields: Fields) -> Self {
        SchemaBase::Fields(fields.build())
    }
}

impl From<Schema> for SchemaBase {
    fn from(schema: Schema) -> Self {
        SchemaBase::Schema(schema)
    }
}

impl<B: Into<SchemaBase>> From<Vec<B>> for SchemaBase {
    fn from(bases: Vec<B>) -> Self {
        SchemaBase::List(bases.into_iter().map(Into::into).collect())
    }
}

/// Typed field definitions for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    definition: FieldMap,
    fields: Vec<FieldDefinition>,
}

impl Schema {
    /// Build a schema from a field map.
    ///
    /// Fields set to `null` are skipped; any other field must name one of
    /// the supported types.
    pub fn new(definition: impl Into<FieldMap>) -> Result<Self, SchemaError> {
        let mut kept = Map::new();
        let mut fields = Vec::new();

        for (name, spec) in definition.into() {
            if spec.is_null() {
                continue;
            }
            fields.push(FieldDefinition::parse(&name, &spec)?);
            kept.insert(name, spec);
        }

        Ok(Self {
            definition: kept,
            fields,
        })
    }

    /// Build a schema from a JSON object document
    pub fn from_json(document: Value) -> ModelResult<Self> {
        match document {
            Value::Object(definition) => Ok(Self::new(definition)?),
            other => Err(ModelError::Serialization(format!(
                "schema definition must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Compose a schema from base definitions.
    ///
    /// Earlier bases take precedence over later ones and `definition`
    /// overrides every base. Overlapping fields are merged property by
    /// property; a property set to `null` by a higher-precedence definition
    /// is deleted, and a field set to `null` is removed.
    pub fn extending(
        definition: impl Into<FieldMap>,
        bases: impl Into<SchemaBase>,
    ) -> Result<Self, SchemaError> {
        let mut flattened = Vec::new();
        flatten_bases(bases.into(), &mut flattened);

        let mut builder = FieldMap::new();
        for base in flattened.into_iter().rev() {
            merge_fields(&mut builder, base);
        }
        merge_fields(&mut builder, definition.into());

        Self::new(builder)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Relationship-typed fields in declaration order
    pub fn relationship_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|field| field.is_relationship())
    }

    /// The raw field map the schema was built from
    pub fn definition(&self) -> &FieldMap {
        &self.definition
    }

    pub fn json_schema(&self) -> JsonSchemaDocument {
        let mut with_refs = Map::new();
        let mut without_refs = Map::new();
        let mut required_all = Vec::new();
        let mut required_scalar = Vec::new();

        for field in &self.fields {
            let property = field.json_schema_property();
            if field.required {
                required_all.push(Value::String(field.name.clone()));
                if !field.is_relationship() {
                    required_scalar.push(Value::String(field.name.clone()));
                }
            }
            if !field.is_relationship() {
                without_refs.insert(field.name.clone(), property.clone());
            }
            with_refs.insert(field.name.clone(), property);
        }

        JsonSchemaDocument {
            with_refs: object_schema(with_refs, required_all),
            without_refs: object_schema(without_refs, required_scalar),
        }
    }
}

fn object_schema(properties: Map<String, Value>, required: Vec<Value>) -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    schema.insert("required".to_string(), Value::Array(required));
    Value::Object(schema)
}

fn flatten_bases(base: SchemaBase, out: &mut Vec<FieldMap>) {
    match base {
        SchemaBase::Fields(fields) => out.push(fields),
        SchemaBase::Schema(schema) => out.push(schema.definition),
        SchemaBase::List(bases) => {
            for base in bases {
                flatten_bases(base, out);
            }
        }
    }
}

fn merge_fields(builder: &mut FieldMap, overlay: FieldMap) {
    for (name, spec) in overlay {
        match spec {
            Value::Null => {
                builder.remove(&name);
            }
            Value::Object(properties) => match builder.get_mut(&name) {
                Some(Value::Object(existing)) => merge_properties(existing, properties),
                _ => {
                    builder.insert(name, Value::Object(properties));
                }
            },
            other => {
                builder.insert(name, other);
            }
        }
    }
}

fn merge_properties(left: &mut Map<String, Value>, right: Map<String, Value>) {
    for (key, value) in right {
        if value.is_null() {
            left.remove(&key);
        } else {
            left.insert(key, value);
        }
    }
}
