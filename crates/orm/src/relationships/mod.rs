//! Relationships Module - descriptor inference and batched eager loading

pub mod inference;
pub mod loader;
pub mod metadata;

pub use inference::infer_descriptor;
pub use loader::{LoadStats, RelationshipLoader};
pub use metadata::{Cardinality, JoinTable, RelationshipDescriptor};
