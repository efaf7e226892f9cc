//! Relationship Metadata - normalized join plans for declared relationships

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::ModelDefinition;

/// How many related records a relationship yields per instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Single related record (`Model` field)
    One,
    /// List of related records (`Models` field)
    Many,
}

/// Join table for many-to-many relationships
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinTable {
    pub table: String,
    /// Join-table column referencing the owning table
    pub local_field: String,
    /// Join-table column referencing the related table
    pub foreign_field: String,
}

/// Fully specified join plan for one relationship of one entity
#[derive(Debug, Clone)]
pub struct RelationshipDescriptor {
    /// Relationship (field) name
    pub name: String,
    /// Owning entity name
    pub owner: String,
    pub related: Arc<ModelDefinition>,
    /// Column on the owning row carrying the join value
    pub local_field: String,
    /// Column on the related row carrying the matching value
    pub foreign_field: String,
    pub cardinality: Cardinality,
    pub through: Option<JoinTable>,
}

impl RelationshipDescriptor {
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }

    pub fn related_name(&self) -> &str {
        self.related.name()
    }

    /// Column of a fetched row that holds the owner's key
    pub fn match_column(&self) -> &str {
        match &self.through {
            Some(join) => &join.local_field,
            None => &self.foreign_field,
        }
    }

    /// Whether `other`, declared on the related entity, is the inverse of
    /// this relationship: it points back at the owner with the local and
    /// foreign sides swapped, or through the same join table with its two
    /// columns swapped.
    pub fn mirrors(&self, other: &RelationshipDescriptor) -> bool {
        if other.related.name() != self.owner || other.owner != self.related.name() {
            return false;
        }

        match (&self.through, &other.through) {
            (None, None) => {
                other.local_field == self.foreign_field && other.foreign_field == self.local_field
            }
            (Some(mine), Some(theirs)) => {
                mine.table == theirs.table
                    && theirs.local_field == mine.foreign_field
                    && theirs.foreign_field == mine.local_field
            }
            _ => false,
        }
    }
}

impl PartialEq for RelationshipDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.owner == other.owner
            && self.related.name() == other.related.name()
            && self.local_field == other.local_field
            && self.foreign_field == other.foreign_field
            && self.cardinality == other.cardinality
            && self.through == other.through
    }
}
