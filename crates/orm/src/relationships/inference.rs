//! Relationship Inference - fills in join columns from naming conventions

use std::sync::Arc;

use super::metadata::{Cardinality, JoinTable, RelationshipDescriptor};
use crate::error::ModelResult;
use crate::model::ModelDefinition;
use crate::naming::{guess_column_name, guess_table_name};
use crate::schema::{FieldDefinition, FieldType, Through};

/// Normalize a declared relationship against its (registered) target.
///
/// Defaults when no explicit columns are declared:
/// - `Models`: owner id column matched against `<owner>Id` on the related row
/// - `Model`: `<related>Id` on the owner matched against the related id column
/// - join table: `<owner>Id` and `<related>Id` columns on the join table,
///   owner id column on the owner side
pub fn infer_descriptor(
    owner: &ModelDefinition,
    field: &FieldDefinition,
    related: Arc<ModelDefinition>,
) -> ModelResult<RelationshipDescriptor> {
    let relation = &field.relation;
    let many = field.field_type == FieldType::Models;
    let owner_table = owner.table_name();
    let related_table = related.table_name();

    let through = relation.through.as_ref().map(|through| JoinTable {
        table: match through {
            Through::Table(table) => table.clone(),
            Through::Guess => guess_table_name(&owner_table, &related_table),
        },
        local_field: relation
            .through_local_field
            .clone()
            .unwrap_or_else(|| guess_column_name(&owner_table, &owner.id_column())),
        foreign_field: relation
            .through_foreign_field
            .clone()
            .unwrap_or_else(|| guess_column_name(&related_table, &related.id_column())),
    });

    let local_field = relation.local_field.clone().unwrap_or_else(|| {
        if many || through.is_some() {
            owner.id_column()
        } else {
            guess_column_name(&related_table, &related.id_column())
        }
    });

    let foreign_field = relation.foreign_field.clone().unwrap_or_else(|| {
        if many {
            guess_column_name(&owner_table, &owner.id_column())
        } else {
            related.id_column()
        }
    });

    Ok(RelationshipDescriptor {
        name: field.name.clone(),
        owner: owner.name().to_string(),
        related,
        local_field,
        foreign_field,
        cardinality: if many { Cardinality::Many } else { Cardinality::One },
        through,
    })
}
