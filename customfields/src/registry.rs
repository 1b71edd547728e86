//! FieldRegistry: the main API surface for field definitions.
//!
//! Wraps a [`DefinitionStore`] with the registry rules: active-only listing in
//! display order, creation defaults, integrity checks, partial updates, hard
//! delete and atomic reordering.

use chrono::Utc;
use tracing::{debug, info};
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::modules::{available_modules, Module};
use crate::store::DefinitionStore;
use crate::types::{FieldDefinition, FieldDefinitionPatch, NewFieldDefinition};

pub struct FieldRegistry<S> {
    store: S,
}

impl<S: DefinitionStore> FieldRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Modules that may host dynamic fields.
    pub fn available_modules(&self) -> &'static [Module] {
        available_modules()
    }

    /// Active definitions of `module`, ascending by display order.
    pub async fn list_definitions(&self, module: &str) -> Result<Vec<FieldDefinition>> {
        let mut defs = self.list_all_definitions(module).await?;
        defs.retain(|d| d.is_active);
        Ok(defs)
    }

    /// Active and inactive definitions of `module`, ascending by display order.
    ///
    /// Ties are broken by creation time, then id, so the order is total.
    pub async fn list_all_definitions(&self, module: &str) -> Result<Vec<FieldDefinition>> {
        let mut defs = self.store.definitions_for(module).await?;
        defs.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(defs)
    }

    pub async fn get_definition(&self, id: &Ulid) -> Result<FieldDefinition> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| FieldsError::not_found(id))
    }

    /// Create a definition. `(module, api_name)` must be unused, including by
    /// inactive definitions.
    pub async fn create_definition(&self, data: NewFieldDefinition) -> Result<FieldDefinition> {
        let def = data.into_definition(Utc::now());
        def.check()?;
        self.store.insert(def.clone()).await?;
        info!(id = %def.id, module = %def.module, api_name = %def.api_name,
            kind = def.field_type.name(), "field definition created");
        Ok(def)
    }

    /// Apply a partial update. Concurrent updates are last-writer-wins.
    pub async fn update_definition(
        &self,
        id: &Ulid,
        patch: FieldDefinitionPatch,
    ) -> Result<FieldDefinition> {
        let current = self.get_definition(id).await?;
        let next = patch.apply(&current, Utc::now())?;
        self.store.replace(next.clone()).await?;
        debug!(id = %id, api_name = %next.api_name, "field definition updated");
        Ok(next)
    }

    /// Hard-delete a definition. Stored entity metadata under its api name is
    /// left in place.
    pub async fn delete_definition(&self, id: &Ulid) -> Result<()> {
        self.store.remove(id).await?;
        info!(id = %id, "field definition deleted");
        Ok(())
    }

    /// Assign `display_order = index` to each id, all or nothing. The list
    /// must name every definition of `module`, inactive ones included.
    pub async fn reorder_definitions(&self, module: &str, ordered_ids: &[Ulid]) -> Result<()> {
        self.store
            .set_display_orders(module, ordered_ids, Utc::now())
            .await?;
        debug!(module, count = ordered_ids.len(), "field definitions reordered");
        Ok(())
    }
}
