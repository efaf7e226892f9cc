//! Query Builder Module - fluent builder for table queries and its SQL rendering

pub mod builder;
pub mod joins;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use sql_generation::{quote_identifier, SqlStatement};
pub use types::{JoinClause, JoinType, OrderDirection, QueryOperator, WhereCondition};
