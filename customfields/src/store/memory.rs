//! In-process store, used by tests and by embedders that persist elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use ulid::Ulid;

use super::{plan_reorder, DefinitionStore};
use crate::error::{FieldsError, Result};
use crate::types::FieldDefinition;

#[derive(Debug, Default)]
pub struct MemoryStore {
    defs: RwLock<HashMap<Ulid, FieldDefinition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored definitions across all modules.
    pub async fn len(&self) -> usize {
        self.defs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.defs.read().await.is_empty()
    }
}

#[async_trait]
impl DefinitionStore for MemoryStore {
    async fn definitions_for(&self, module: &str) -> Result<Vec<FieldDefinition>> {
        let defs = self.defs.read().await;
        Ok(defs
            .values()
            .filter(|d| d.module == module)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &Ulid) -> Result<Option<FieldDefinition>> {
        Ok(self.defs.read().await.get(id).cloned())
    }

    async fn insert(&self, def: FieldDefinition) -> Result<()> {
        let mut defs = self.defs.write().await;
        if defs.contains_key(&def.id)
            || defs.values().any(|d| d.same_key(&def.module, &def.api_name))
        {
            return Err(FieldsError::duplicate(&def.module, &def.api_name));
        }
        defs.insert(def.id, def);
        Ok(())
    }

    async fn replace(&self, def: FieldDefinition) -> Result<()> {
        let mut defs = self.defs.write().await;
        match defs.get_mut(&def.id) {
            Some(slot) => {
                *slot = def;
                Ok(())
            }
            None => Err(FieldsError::not_found(def.id)),
        }
    }

    async fn remove(&self, id: &Ulid) -> Result<()> {
        self.defs
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| FieldsError::not_found(id))
    }

    async fn set_display_orders(
        &self,
        module: &str,
        ordered: &[Ulid],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut defs = self.defs.write().await;
        let module_size = defs.values().filter(|d| d.module == module).count();
        let planned = plan_reorder(module, ordered, module_size, |id| defs.get(id), now)?;
        for def in planned {
            defs.insert(def.id, def);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldType, NewFieldDefinition};

    fn def(module: &str, api_name: &str) -> FieldDefinition {
        NewFieldDefinition::new(module, api_name, api_name, FieldType::Text)
            .into_definition(Utc::now())
    }

    #[tokio::test]
    async fn insert_rejects_same_key() {
        let store = MemoryStore::new();
        store.insert(def("Student", "nickname")).await.unwrap();
        let err = store.insert(def("Student", "nickname")).await.unwrap_err();
        assert!(matches!(err, FieldsError::DuplicateField { .. }));
        // same api name in a different module is fine
        store.insert(def("Agent", "nickname")).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[test]
    fn shared_store_sees_inserts() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let d = def("Campus", "building");
        tokio_test::block_on(store.insert(d.clone())).unwrap();
        let found = tokio_test::block_on(store.get(&d.id)).unwrap();
        assert_eq!(found, Some(d));
    }

    #[tokio::test]
    async fn replace_and_remove_unknown_fail() {
        let store = MemoryStore::new();
        let d = def("Student", "nickname");
        assert!(matches!(
            store.replace(d.clone()).await,
            Err(FieldsError::NotFound { .. })
        ));
        assert!(matches!(
            store.remove(&d.id).await,
            Err(FieldsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn reorder_with_foreign_id_changes_nothing() {
        let store = MemoryStore::new();
        let a = def("Student", "a");
        let b = def("Student", "b");
        let other = def("Agent", "c");
        for d in [&a, &b, &other] {
            store.insert(d.clone()).await.unwrap();
        }

        let err = store
            .set_display_orders("Student", &[b.id, other.id, a.id], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, FieldsError::InvalidReorder { .. }));
        assert_eq!(store.get(&b.id).await.unwrap().unwrap().display_order, 0);
        assert_eq!(store.get(&a.id).await.unwrap().unwrap().display_order, 0);
    }

    #[tokio::test]
    async fn reorder_must_name_every_definition_of_the_module() {
        let store = MemoryStore::new();
        let a = def("Student", "a");
        let b = def("Student", "b");
        let mut c = def("Student", "c");
        c.display_order = 2;
        for d in [&a, &b, &c] {
            store.insert(d.clone()).await.unwrap();
        }

        let err = store
            .set_display_orders("Student", &[c.id, b.id], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, FieldsError::InvalidReorder { .. }));
        assert_eq!(store.get(&c.id).await.unwrap().unwrap().display_order, 2);
        assert_eq!(store.get(&a.id).await.unwrap().unwrap().display_order, 0);
    }

    #[tokio::test]
    async fn reorder_rejects_repeated_ids() {
        let store = MemoryStore::new();
        let a = def("Student", "a");
        store.insert(a.clone()).await.unwrap();
        let err = store
            .set_display_orders("Student", &[a.id, a.id], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, FieldsError::InvalidReorder { .. }));
    }
}
