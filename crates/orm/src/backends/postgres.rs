//! PostgreSQL Backend Implementation
//!
//! Renders `QueryBuilder` queries to parameterized SQL and executes them on
//! a `sqlx` connection pool.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Postgres, Row as SqlxRow, TypeInfo};

use super::core::{QueryBackend, Row};
use crate::config::DatabaseConfig;
use crate::error::{OrmError, OrmResult};
use crate::query::sql_generation::{insert_sql, SqlStatement};
use crate::query::QueryBuilder;

/// PostgreSQL database backend
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Wrap an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> OrmResult<Self> {
        config.validate()?;
        let pool_config = &config.pool;

        let mut options = PgPoolOptions::new()
            .max_connections(pool_config.max_connections)
            .min_connections(pool_config.min_connections)
            .acquire_timeout(pool_config.acquire_timeout());

        if let Some(idle_timeout) = pool_config.idle_timeout() {
            options = options.idle_timeout(idle_timeout);
        }

        if let Some(max_lifetime) = pool_config.max_lifetime() {
            options = options.max_lifetime(max_lifetime);
        }

        let pool = options
            .connect(&config.url)
            .await
            .map_err(|e| OrmError::Database(format!("Failed to create PostgreSQL pool: {}", e)))?;

        tracing::info!(
            max_connections = pool_config.max_connections,
            min_connections = pool_config.min_connections,
            "postgres pool created"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_all(&self, statement: SqlStatement) -> OrmResult<Vec<PgRow>> {
        tracing::debug!(sql = %statement.sql, params = statement.params.len(), "executing query");
        let mut query = sqlx::query(&statement.sql);
        for param in &statement.params {
            query = bind_json_value(query, param);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn execute(&self, statement: SqlStatement) -> OrmResult<u64> {
        tracing::debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
        let mut query = sqlx::query(&statement.sql);
        for param in &statement.params {
            query = bind_json_value(query, param);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl QueryBackend for PostgresBackend {
    async fn select(&self, query: &QueryBuilder) -> OrmResult<Vec<Row>> {
        let rows = self.fetch_all(query.to_select_sql()).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn insert(&self, table: &str, values: &Row, id_column: &str) -> OrmResult<Value> {
        let rows = self.fetch_all(insert_sql(table, values, id_column)).await?;
        let row = rows
            .first()
            .ok_or_else(|| OrmError::Database(format!("insert into {} returned no row", table)))?;
        row_to_json(row)?
            .remove(id_column)
            .ok_or(OrmError::MissingPrimaryKey)
    }

    async fn update(&self, query: &QueryBuilder, values: &Row) -> OrmResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }
        self.execute(query.to_update_sql(values)).await
    }

    async fn delete(&self, query: &QueryBuilder) -> OrmResult<u64> {
        self.execute(query.to_delete_sql()).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Parameter value with the Postgres type it is sent as.
///
/// Timestamps and UUIDs travel as JSON strings; they are bound with their
/// own types so that `timestamptz` and `uuid` columns accept them.
#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Uuid(uuid::Uuid),
    Text(String),
    Json(Value),
}

impl BindValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BindValue::Int(i),
                None => BindValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => {
                if let Ok(timestamp) = chrono::DateTime::parse_from_rfc3339(s) {
                    BindValue::Timestamp(timestamp.with_timezone(&chrono::Utc))
                } else if let Ok(uuid) = uuid::Uuid::parse_str(s) {
                    BindValue::Uuid(uuid)
                } else {
                    BindValue::Text(s.clone())
                }
            }
            Value::Array(_) | Value::Object(_) => BindValue::Json(value.clone()),
        }
    }
}

/// Bind a JSON value to a sqlx query
fn bind_json_value<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match BindValue::from_json(value) {
        // statements render NULL inline; this only covers IN lists
        BindValue::Null => query.bind(Option::<String>::None),
        BindValue::Bool(b) => query.bind(b),
        BindValue::Int(i) => query.bind(i),
        BindValue::Float(f) => query.bind(f),
        BindValue::Timestamp(dt) => query.bind(dt),
        BindValue::Uuid(u) => query.bind(u),
        BindValue::Text(s) => query.bind(s),
        BindValue::Json(j) => query.bind(j),
    }
}

/// Convert a PostgreSQL row to a JSON object
fn row_to_json(row: &PgRow) -> OrmResult<Row> {
    let mut map = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), column_to_json(row, index)?);
    }
    Ok(map)
}

fn column_to_json(row: &PgRow, index: usize) -> OrmResult<Value> {
    let type_name = row.columns()[index].type_info().name();
    let decode_error = |e: sqlx::Error| OrmError::Query(format!("Failed to decode {} column: {}", type_name, e));

    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index).map_err(decode_error)?.map(Value::from),
        "INT2" => row.try_get::<Option<i16>, _>(index).map_err(decode_error)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index).map_err(decode_error)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index).map_err(decode_error)?.map(Value::from),
        "FLOAT4" => row.try_get::<Option<f32>, _>(index).map_err(decode_error)?.map(Value::from),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index).map_err(decode_error)?.map(Value::from),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)
            .map_err(decode_error)?
            .map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .map_err(decode_error)?
            .map(|dt| Value::String(dt.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .map_err(decode_error)?
            .map(|dt| Value::String(dt.and_utc().to_rfc3339())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .map_err(decode_error)?
            .map(|d| Value::String(d.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index).map_err(decode_error)?,
        _ => row.try_get::<Option<String>, _>(index).map_err(decode_error)?.map(Value::String),
    };

    Ok(value.unwrap_or(Value::Null))
}
