//! Field types, typed field definitions and the `Field` builder

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::naming::{capitalize, singularize};

/// Raw field-spec map: field name -> property map. A JSON `null` in place of
/// a field or a property marks it as explicitly undefined.
pub type FieldMap = Map<String, Value>;

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    #[serde(rename = "JSON")]
    Json,
    /// Single related record
    Model,
    /// List of related records
    Models,
}

impl FieldType {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "String" => Some(FieldType::String),
            "Number" => Some(FieldType::Number),
            "Boolean" => Some(FieldType::Boolean),
            "Date" => Some(FieldType::Date),
            "JSON" => Some(FieldType::Json),
            "Model" => Some(FieldType::Model),
            "Models" => Some(FieldType::Models),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::Json => "JSON",
            FieldType::Model => "Model",
            FieldType::Models => "Models",
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, FieldType::Model | FieldType::Models)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join table declaration on a many-to-many field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Through {
    /// `through: true`, table name derived from both tables
    Guess,
    Table(String),
}

/// Relationship properties as declared (all optional)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationOptions {
    pub related_model: Option<String>,
    pub local_field: Option<String>,
    pub foreign_field: Option<String>,
    pub through: Option<Through>,
    pub through_local_field: Option<String>,
    pub through_foreign_field: Option<String>,
}

const STRING_CONSTRAINTS: &[&str] = &["maxLength", "minLength", "pattern", "format", "enum"];
const NUMBER_CONSTRAINTS: &[&str] = &[
    "multipleOf",
    "minimum",
    "maximum",
    "exclusiveMaximum",
    "exclusiveMinimum",
];

/// A parsed schema field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub relation: RelationOptions,
    raw: Map<String, Value>,
}

impl FieldDefinition {
    pub(crate) fn parse(name: &str, spec: &Value) -> Result<Self, SchemaError> {
        let raw = match spec {
            Value::Object(map) => map.clone(),
            _ => return Err(SchemaError::MissingType(name.to_string())),
        };

        let type_name = match raw.get("type") {
            Some(Value::String(type_name)) => type_name.clone(),
            Some(Value::Null) | None => return Err(SchemaError::MissingType(name.to_string())),
            Some(other) => other.to_string(),
        };
        let field_type = FieldType::parse(&type_name).ok_or_else(|| SchemaError::UnknownType {
            field: name.to_string(),
            type_name: type_name.clone(),
        })?;

        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
        let through = match raw.get("through") {
            Some(Value::String(table)) => Some(Through::Table(table.clone())),
            Some(Value::Bool(true)) => Some(Through::Guess),
            _ => None,
        };

        Ok(Self {
            name: name.to_string(),
            field_type,
            required: raw.get("required").and_then(Value::as_bool).unwrap_or(false),
            default: raw.get("default").filter(|value| !value.is_null()).cloned(),
            description: text("description"),
            relation: RelationOptions {
                related_model: text("relatedModel"),
                local_field: text("localField"),
                foreign_field: text("foreignField"),
                through,
                through_local_field: text("throughLocalField"),
                through_foreign_field: text("throughForeignField"),
            },
            raw,
        })
    }

    pub fn is_relationship(&self) -> bool {
        self.field_type.is_relationship()
    }

    /// Related entity name: declared, or the singular capitalized field name
    pub fn related_model_name(&self) -> String {
        match &self.relation.related_model {
            Some(name) => name.clone(),
            None => singularize(&capitalize(&self.name)),
        }
    }

    /// Raw property map this field was built from
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// JSON-Schema property for this field
    pub(crate) fn json_schema_property(&self) -> Value {
        let mut property = match self.field_type {
            FieldType::String => self.constrained("string", STRING_CONSTRAINTS),
            FieldType::Number => self.constrained("number", NUMBER_CONSTRAINTS),
            FieldType::Boolean => json!({ "type": "boolean" }),
            FieldType::Date => json!({ "type": "string", "format": "date-time" }),
            FieldType::Json => json!({}),
            FieldType::Model => json!({ "$ref": format!("#/definitions/{}", self.related_model_name()) }),
            FieldType::Models => json!({
                "items": { "$ref": format!("#/definitions/{}", self.related_model_name()) },
                "type": "array"
            }),
        };

        if let Value::Object(map) = &mut property {
            if let Some(description) = &self.description {
                map.insert("description".to_string(), Value::String(description.clone()));
            }
            if let Some(default) = &self.default {
                map.insert("default".to_string(), default.clone());
            }
        }
        property
    }

    fn constrained(&self, json_type: &str, keywords: &[&str]) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), Value::String(json_type.to_string()));
        for keyword in keywords {
            if let Some(value) = self.raw.get(*keyword).filter(|value| !value.is_null()) {
                property.insert(keyword.to_string(), value.clone());
            }
        }
        Value::Object(property)
    }
}

/// Typed builder for a single field spec
///
/// ```
/// use molti_orm::schema::Field;
///
/// let name = Field::string().required().max_length(40);
/// let children = Field::models().related("Child").foreign_field("parentId");
/// # let _ = (name, children);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    props: Map<String, Value>,
}

impl Field {
    pub fn new(field_type: FieldType) -> Self {
        let mut props = Map::new();
        props.insert("type".to_string(), Value::String(field_type.as_str().to_string()));
        Self { props }
    }

    pub fn string() -> Self {
        Self::new(FieldType::String)
    }

    pub fn number() -> Self {
        Self::new(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldType::Boolean)
    }

    pub fn date() -> Self {
        Self::new(FieldType::Date)
    }

    pub fn json() -> Self {
        Self::new(FieldType::Json)
    }

    pub fn model() -> Self {
        Self::new(FieldType::Model)
    }

    pub fn models() -> Self {
        Self::new(FieldType::Models)
    }

    /// Set an arbitrary property
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    /// Mark a property as explicitly undefined, removing it when this field
    /// overrides a base definition
    pub fn unset(mut self, key: &str) -> Self {
        self.props.insert(key.to_string(), Value::Null);
        self
    }

    pub fn required(self) -> Self {
        self.with("required", true)
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.with("default", value)
    }

    pub fn description(self, text: &str) -> Self {
        self.with("description", text)
    }

    pub fn max_length(self, max: u64) -> Self {
        self.with("maxLength", max)
    }

    pub fn min_length(self, min: u64) -> Self {
        self.with("minLength", min)
    }

    pub fn pattern(self, pattern: &str) -> Self {
        self.with("pattern", pattern)
    }

    pub fn format(self, format: &str) -> Self {
        self.with("format", format)
    }

    pub fn one_of<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.with("enum", values)
    }

    pub fn minimum(self, minimum: f64) -> Self {
        self.with("minimum", minimum)
    }

    pub fn maximum(self, maximum: f64) -> Self {
        self.with("maximum", maximum)
    }

    pub fn exclusive_minimum(self, minimum: f64) -> Self {
        self.with("exclusiveMinimum", minimum)
    }

    pub fn exclusive_maximum(self, maximum: f64) -> Self {
        self.with("exclusiveMaximum", maximum)
    }

    pub fn multiple_of(self, factor: f64) -> Self {
        self.with("multipleOf", factor)
    }

    pub fn related(self, model: &str) -> Self {
        self.with("relatedModel", model)
    }

    pub fn local_field(self, column: &str) -> Self {
        self.with("localField", column)
    }

    pub fn foreign_field(self, column: &str) -> Self {
        self.with("foreignField", column)
    }

    /// Many-to-many through the named join table
    pub fn through(self, table: &str) -> Self {
        self.with("through", table)
    }

    /// Many-to-many through the conventionally named join table
    pub fn through_default(self) -> Self {
        self.with("through", true)
    }

    pub fn through_local_field(self, column: &str) -> Self {
        self.with("throughLocalField", column)
    }

    pub fn through_foreign_field(self, column: &str) -> Self {
        self.with("throughForeignField", column)
    }

    pub fn into_spec(self) -> Value {
        Value::Object(self.props)
    }
}

impl From<Field> for Value {
    fn from(field: Field) -> Self {
        field.into_spec()
    }
}

/// Ordered builder for a whole field map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    map: FieldMap,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, field: Field) -> Self {
        self.map.insert(name.to_string(), field.into_spec());
        self
    }

    /// Explicitly undefined field; removes it when overriding a base
    pub fn remove(mut self, name: &str) -> Self {
        self.map.insert(name.to_string(), Value::Null);
        self
    }

    pub fn build(self) -> FieldMap {
        self.map
    }
}

impl From<Fields> for FieldMap {
    fn from(fields: Fields) -> Self {
        fields.map
    }
}
