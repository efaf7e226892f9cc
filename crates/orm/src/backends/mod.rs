//! Query Backends
//!
//! Storage implementations behind the [`QueryBackend`] trait: an in-process
//! table store and a PostgreSQL backend on a `sqlx` pool.

pub mod core;
pub mod memory;
pub mod postgres;

// Re-export core traits and types
pub use self::core::{QueryBackend, Row};
pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;
