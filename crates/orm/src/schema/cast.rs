//! Coercion of loosely typed input into declared field types

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Number, Value};

use super::{FieldType, Schema};

impl Schema {
    /// Keep only declared scalar fields, coercing each to its declared type.
    ///
    /// Relationship fields and undeclared keys are dropped. Values that
    /// cannot be represented (a non-numeric string cast to Number, an
    /// unparseable date) become `null`.
    pub fn cast_input(&self, props: &Map<String, Value>) -> Map<String, Value> {
        let mut cast = Map::new();
        for field in self.fields() {
            if field.is_relationship() {
                continue;
            }
            if let Some(value) = props.get(&field.name) {
                cast.insert(field.name.clone(), cast_value(field.field_type, value));
            }
        }
        cast
    }
}

pub fn cast_value(field_type: FieldType, value: &Value) -> Value {
    match field_type {
        FieldType::String => Value::String(to_text(value)),
        FieldType::Number => to_number(value).map(number_value).unwrap_or(Value::Null),
        FieldType::Boolean => Value::Bool(truthy(value)),
        FieldType::Date => to_date(value)
            .map(|date| Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .unwrap_or(Value::Null),
        FieldType::Json | FieldType::Model | FieldType::Models => value.clone(),
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
            }
        }
        _ => None,
    }
}

fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::Number(Number::from(number as i64))
    } else {
        Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// JavaScript-style truthiness
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(number) => {
            let millis = number.as_i64().or_else(|| number.as_f64().map(|n| n as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .map(|date| date.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
        _ => None,
    }
}
