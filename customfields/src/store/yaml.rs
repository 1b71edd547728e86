//! YamlStore: field definitions as one YAML file per definition.
//!
//! ```text
//! <root>/
//!   definitions/    ← {ulid}.yaml per definition
//! ```
//!
//! The directory is read once on open; afterwards the in-memory indexes are
//! authoritative and every mutation writes through to disk before the
//! indexes change. A definition found under another file name (renamed or
//! restored by hand) keeps living in that file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use ulid::Ulid;

use super::{plan_reorder, DefinitionStore};
use crate::error::{FieldsError, Result};
use crate::types::FieldDefinition;

#[derive(Debug, Default)]
struct Indexes {
    defs: HashMap<Ulid, FieldDefinition>,
    /// (module, api_name) → id
    keys: HashMap<(String, String), Ulid>,
    /// Source files that are not `{id}.yaml`
    renamed: HashMap<Ulid, PathBuf>,
}

impl Indexes {
    fn put(&mut self, def: FieldDefinition) {
        self.keys
            .insert((def.module.clone(), def.api_name.clone()), def.id);
        self.defs.insert(def.id, def);
    }

    fn take(&mut self, id: &Ulid) -> Option<FieldDefinition> {
        let def = self.defs.remove(id)?;
        self.keys.remove(&(def.module.clone(), def.api_name.clone()));
        Some(def)
    }
}

pub struct YamlStore {
    root: PathBuf,
    inner: RwLock<Indexes>,
}

impl YamlStore {
    /// Open or create a definitions directory under `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("definitions")).await?;

        let store = Self {
            root,
            inner: RwLock::new(Indexes::default()),
        };
        store.load_definitions().await?;
        Ok(store)
    }

    /// The root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a new definition with `id` is written.
    pub fn definition_path(&self, id: &Ulid) -> PathBuf {
        self.root.join("definitions").join(format!("{id}.yaml"))
    }

    fn file_for(&self, inner: &Indexes, id: &Ulid) -> PathBuf {
        inner
            .renamed
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.definition_path(id))
    }

    async fn load_definitions(&self) -> Result<()> {
        let defs_dir = self.root.join("definitions");
        let mut inner = self.inner.write().await;
        let mut entries = fs::read_dir(&defs_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = match fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(?path, %e, "skipping unreadable field definition");
                    continue;
                }
            };
            match serde_yaml_ng::from_str::<FieldDefinition>(&content) {
                Ok(def) => {
                    if inner.defs.contains_key(&def.id) {
                        warn!(?path, id = %def.id, "skipping definition with duplicate id");
                        continue;
                    }
                    let key = (def.module.clone(), def.api_name.clone());
                    if let Some(existing) = inner.keys.get(&key) {
                        warn!(?path, %existing, module = %def.module, api_name = %def.api_name,
                            "skipping definition with duplicate key");
                        continue;
                    }
                    if path != self.definition_path(&def.id) {
                        debug!(?path, id = %def.id, "definition stored under another file name");
                        inner.renamed.insert(def.id, path);
                    }
                    inner.put(def);
                }
                Err(e) => {
                    warn!(?path, %e, "skipping invalid field definition");
                }
            }
        }
        debug!(
            definitions = inner.defs.len(),
            root = %self.root.display(),
            "yaml store opened"
        );
        Ok(())
    }

    async fn write_definition(&self, path: &Path, def: &FieldDefinition) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(def)?;
        atomic_write(path, yaml.as_bytes()).await
    }
}

#[async_trait]
impl DefinitionStore for YamlStore {
    async fn definitions_for(&self, module: &str) -> Result<Vec<FieldDefinition>> {
        let inner = self.inner.read().await;
        Ok(inner
            .defs
            .values()
            .filter(|d| d.module == module)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &Ulid) -> Result<Option<FieldDefinition>> {
        Ok(self.inner.read().await.defs.get(id).cloned())
    }

    async fn insert(&self, def: FieldDefinition) -> Result<()> {
        let mut inner = self.inner.write().await;
        let key = (def.module.clone(), def.api_name.clone());
        if inner.keys.contains_key(&key) || inner.defs.contains_key(&def.id) {
            return Err(FieldsError::duplicate(&def.module, &def.api_name));
        }
        self.write_definition(&self.definition_path(&def.id), &def).await?;
        inner.put(def);
        Ok(())
    }

    async fn replace(&self, def: FieldDefinition) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.defs.contains_key(&def.id) {
            return Err(FieldsError::not_found(def.id));
        }
        self.write_definition(&self.file_for(&inner, &def.id), &def).await?;
        inner.take(&def.id);
        inner.put(def);
        Ok(())
    }

    async fn remove(&self, id: &Ulid) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.defs.contains_key(id) {
            return Err(FieldsError::not_found(id));
        }
        match fs::remove_file(self.file_for(&inner, id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        inner.take(id);
        inner.renamed.remove(id);
        Ok(())
    }

    async fn set_display_orders(
        &self,
        module: &str,
        ordered: &[Ulid],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let module_size = inner.defs.values().filter(|d| d.module == module).count();
        let planned = plan_reorder(module, ordered, module_size, |id| inner.defs.get(id), now)?;

        // Stage every file first so a serialization or write failure leaves
        // the live files untouched.
        let mut staged = Vec::with_capacity(planned.len());
        for def in &planned {
            let target = self.file_for(&inner, &def.id);
            let result = match serde_yaml_ng::to_string(def) {
                Ok(yaml) => stage(&target, yaml.as_bytes()).await,
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(tmp) => staged.push((tmp, target)),
                Err(e) => {
                    discard(staged.iter().map(|(tmp, _)| tmp)).await;
                    return Err(e);
                }
            }
        }

        for (i, (tmp, target)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(tmp, target).await {
                warn!(path = %target.display(), %e, "reorder commit failed, rolling back");
                discard(staged[i..].iter().map(|(tmp, _)| tmp)).await;
                for (def, (_, committed)) in planned[..i].iter().zip(&staged) {
                    if let Some(previous) = inner.defs.get(&def.id) {
                        if let Err(e) = self.write_definition(committed, previous).await {
                            warn!(id = %def.id, %e, "failed to restore definition during rollback");
                        }
                    }
                }
                return Err(e.into());
            }
        }

        for def in planned {
            inner.put(def);
        }
        debug!(module, count = ordered.len(), "display order updated");
        Ok(())
    }
}

/// Write `data` next to `path` under a temporary name and return that name.
async fn stage(path: &Path, data: &[u8]) -> Result<PathBuf> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    Ok(tmp)
}

async fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for tmp in paths {
        let _ = fs::remove_file(tmp).await;
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = stage(path, data).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
