//! The registry interface and its render-graph hook.

use atlas_loader::{LoadedAsset, SceneObject};
use atlas_types::{MaterialPatch, ModelId, ModelSummary};

use crate::error::RegistryResult;

/// Id-keyed store of live assets.
///
/// At most one asset is registered per id. Implementations must be safe to
/// share across tasks; no method may block on I/O.
pub trait SceneRegistry: Send + Sync {
    /// Register an asset under its model id.
    ///
    /// If the id is taken, the previous occupant is detached and its
    /// materials released before the new asset takes its place.
    fn insert(&self, asset: LoadedAsset) -> RegistryResult<ModelSummary>;

    /// Toggle visibility. Returns `false` if the id is unknown.
    fn set_visible(&self, id: &str, visible: bool) -> RegistryResult<bool>;

    /// A copy of the registered object. Material handles stay shared.
    fn get(&self, id: &str) -> RegistryResult<Option<SceneObject>>;

    /// Summaries of every registered asset, sorted by id.
    fn list_all(&self) -> RegistryResult<Vec<ModelSummary>>;

    /// Detach an asset and release its materials. Returns `false` if unknown.
    fn remove(&self, id: &str) -> RegistryResult<bool>;

    /// Apply `patch` to every live material. Returns how many were touched.
    fn update_material_properties(&self, patch: &MaterialPatch) -> RegistryResult<usize>;

    fn len(&self) -> RegistryResult<usize>;

    fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether an asset is registered under `id`.
    fn contains(&self, id: &str) -> RegistryResult<bool> {
        Ok(self.get(id)?.is_some())
    }
}

/// Notified when objects enter or leave the scene.
///
/// Called after the registry lock is released, so observers may read the
/// registry back. Pipeline inserts run while the load queue is locked for the
/// matching status change, so observers must not call into the load queue.
pub trait SceneObserver: Send + Sync {
    fn attached(&self, object: &SceneObject);

    fn detached(&self, id: &ModelId);
}

/// Observer that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SceneObserver for NoopObserver {
    fn attached(&self, _object: &SceneObject) {}

    fn detached(&self, _id: &ModelId) {}
}
