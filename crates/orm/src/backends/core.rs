//! Core Query Backend Trait
//!
//! The ORM talks to storage only through [`QueryBackend`]: table-level
//! select / insert / update / delete driven by a [`QueryBuilder`]. Rows are
//! JSON objects keyed by column name.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::OrmResult;
use crate::query::QueryBuilder;

/// A fetched or to-be-written row: column name -> value
pub type Row = Map<String, Value>;

/// Abstract tabular query interface
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Fetch the rows selected by `query`
    async fn select(&self, query: &QueryBuilder) -> OrmResult<Vec<Row>>;

    /// Insert one row and return the value of its `id_column`
    async fn insert(&self, table: &str, values: &Row, id_column: &str) -> OrmResult<Value>;

    /// Update the rows selected by `query`; returns the affected row count
    async fn update(&self, query: &QueryBuilder, values: &Row) -> OrmResult<u64>;

    /// Delete the rows selected by `query`; returns the affected row count
    async fn delete(&self, query: &QueryBuilder) -> OrmResult<u64>;

    /// Short backend name for diagnostics
    fn backend_name(&self) -> &'static str;
}
