//! In-memory scene registry.
//!
//! [`InMemorySceneRegistry`] keeps every entry in a `HashMap` behind a
//! `RwLock`. Locks are taken per call and never held across an `.await`;
//! observers run after the lock is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use atlas_loader::{LoadedAsset, MaterialSet, SceneObject};
use atlas_types::{MaterialPatch, ModelId, ModelSummary};

use crate::error::{RegistryError, RegistryResult};
use crate::traits::{NoopObserver, SceneObserver, SceneRegistry};

struct Entry {
    object: SceneObject,
    materials: MaterialSet,
}

impl Entry {
    fn release(&self) -> usize {
        self.materials.values().filter(|m| m.release()).count()
    }
}

pub struct InMemorySceneRegistry {
    entries: RwLock<HashMap<ModelId, Entry>>,
    observer: Arc<dyn SceneObserver>,
}

impl InMemorySceneRegistry {
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    pub fn with_observer(observer: Arc<dyn SceneObserver>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            observer,
        }
    }

    fn read(&self) -> RegistryResult<RwLockReadGuard<'_, HashMap<ModelId, Entry>>> {
        self.entries
            .read()
            .map_err(|e| RegistryError::Poisoned(e.to_string()))
    }

    fn write(&self) -> RegistryResult<RwLockWriteGuard<'_, HashMap<ModelId, Entry>>> {
        self.entries
            .write()
            .map_err(|e| RegistryError::Poisoned(e.to_string()))
    }
}

impl Default for InMemorySceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemorySceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemorySceneRegistry")
            .field("len", &len)
            .finish()
    }
}

impl SceneRegistry for InMemorySceneRegistry {
    fn insert(&self, asset: LoadedAsset) -> RegistryResult<ModelSummary> {
        let id = asset.object.model_id.clone();
        let summary = asset.object.summary();
        let attached = asset.object.clone();
        let previous = {
            let mut entries = self.write()?;
            entries.insert(
                id.clone(),
                Entry {
                    object: asset.object,
                    materials: asset.materials,
                },
            )
        };

        if let Some(old) = previous {
            let released = old.release();
            info!(model = %id, released, "replaced registered model");
            self.observer.detached(&id);
        } else {
            debug!(model = %id, "registered model");
        }
        self.observer.attached(&attached);
        Ok(summary)
    }

    fn set_visible(&self, id: &str, visible: bool) -> RegistryResult<bool> {
        let mut entries = self.write()?;
        match entries.get_mut(id) {
            Some(entry) => {
                entry.object.visible = visible;
                debug!(model = id, visible, "visibility changed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get(&self, id: &str) -> RegistryResult<Option<SceneObject>> {
        Ok(self.read()?.get(id).map(|e| e.object.clone()))
    }

    fn list_all(&self) -> RegistryResult<Vec<ModelSummary>> {
        let entries = self.read()?;
        let mut out: Vec<_> = entries.values().map(|e| e.object.summary()).collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    fn remove(&self, id: &str) -> RegistryResult<bool> {
        let removed = self.write()?.remove(id);
        let Some(entry) = removed else {
            return Ok(false);
        };
        let released = entry.release();
        info!(model = id, released, "removed model");
        self.observer.detached(&entry.object.model_id);
        Ok(true)
    }

    fn update_material_properties(&self, patch: &MaterialPatch) -> RegistryResult<usize> {
        let entries = self.read()?;
        let touched = entries
            .values()
            .flat_map(|e| e.materials.values())
            .filter(|m| m.apply(patch))
            .count();
        debug!(touched, "material patch applied");
        Ok(touched)
    }

    fn len(&self) -> RegistryResult<usize> {
        Ok(self.read()?.len())
    }
}
