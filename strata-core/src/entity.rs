//! The reflection seam between providers and the calling CRUD facade.

use crate::types::DbValue;

/// Opaque extraction capability supplied by the calling facade.
///
/// Providers pull column values out of an entity, ask whether the entity
/// declares a key column, and write a generated key back — without knowing
/// anything about the entity's shape.
pub trait EntityAdapter<E>: Send + Sync {
    /// Extract the value of `column` from the entity.
    fn extract(&self, entity: &E, column: &str) -> DbValue;

    /// Whether the entity declares a key column.
    fn has_key_column(&self, entity: &E) -> bool;

    /// Write a generated primary key back onto the entity.
    fn set_primary_key(&self, entity: &mut E, key: i64);
}
