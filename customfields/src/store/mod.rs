//! Persistence seam for field definitions.
//!
//! The registry only talks to a [`DefinitionStore`]. Stores own the
//! `(module, api_name)` uniqueness constraint and the all-or-nothing display
//! order update; everything else is plain row CRUD.

mod memory;
mod yaml;

pub use memory::MemoryStore;
pub use yaml::YamlStore;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::types::FieldDefinition;

#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Every definition of `module`, active or not, in no particular order.
    async fn definitions_for(&self, module: &str) -> Result<Vec<FieldDefinition>>;

    async fn get(&self, id: &Ulid) -> Result<Option<FieldDefinition>>;

    /// Fails with `DuplicateField` if `(module, api_name)` is taken.
    async fn insert(&self, def: FieldDefinition) -> Result<()>;

    /// Overwrite an existing row. Fails with `NotFound` if `def.id` is unknown.
    async fn replace(&self, def: FieldDefinition) -> Result<()>;

    /// Hard-delete. Fails with `NotFound` if `id` is unknown.
    async fn remove(&self, id: &Ulid) -> Result<()>;

    /// Set `display_order = index` for every id in `ordered`, which must name
    /// every definition of `module` exactly once. Either every row changes or
    /// none does.
    async fn set_display_orders(
        &self,
        module: &str,
        ordered: &[Ulid],
        now: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
impl<S: DefinitionStore + ?Sized> DefinitionStore for Arc<S> {
    async fn definitions_for(&self, module: &str) -> Result<Vec<FieldDefinition>> {
        (**self).definitions_for(module).await
    }

    async fn get(&self, id: &Ulid) -> Result<Option<FieldDefinition>> {
        (**self).get(id).await
    }

    async fn insert(&self, def: FieldDefinition) -> Result<()> {
        (**self).insert(def).await
    }

    async fn replace(&self, def: FieldDefinition) -> Result<()> {
        (**self).replace(def).await
    }

    async fn remove(&self, id: &Ulid) -> Result<()> {
        (**self).remove(id).await
    }

    async fn set_display_orders(
        &self,
        module: &str,
        ordered: &[Ulid],
        now: DateTime<Utc>,
    ) -> Result<()> {
        (**self).set_display_orders(module, ordered, now).await
    }
}

/// Resolve a reorder request into the updated rows, without applying it.
///
/// Rejects unknown ids, ids from another module, repeated ids and lists that
/// leave out any of the module's `module_size` definitions, so a store can
/// check the whole batch before touching anything. Accepted plans always
/// number the module `0..module_size`.
pub(crate) fn plan_reorder<'a>(
    module: &str,
    ordered: &[Ulid],
    module_size: usize,
    lookup: impl Fn(&Ulid) -> Option<&'a FieldDefinition>,
    now: DateTime<Utc>,
) -> Result<Vec<FieldDefinition>> {
    let mut seen = HashSet::with_capacity(ordered.len());
    let mut planned = Vec::with_capacity(ordered.len());

    for (index, id) in ordered.iter().enumerate() {
        if !seen.insert(*id) {
            return Err(FieldsError::invalid_reorder(
                module,
                format!("id {id} appears more than once"),
            ));
        }
        let current = lookup(id).ok_or_else(|| FieldsError::not_found(id))?;
        if current.module != module {
            return Err(FieldsError::invalid_reorder(
                module,
                format!("id {id} belongs to module '{}'", current.module),
            ));
        }
        let order = i32::try_from(index)
            .map_err(|_| FieldsError::invalid_reorder(module, "too many ids"))?;

        let mut next = current.clone();
        next.display_order = order;
        next.updated_at = now;
        planned.push(next);
    }

    if planned.len() != module_size {
        return Err(FieldsError::invalid_reorder(
            module,
            format!(
                "expected all {module_size} definitions of the module, got {}",
                planned.len()
            ),
        ));
    }

    Ok(planned)
}
