//! Scene registry for the atlas viewer.
//!
//! The registry is the single place live assets are kept. Each entry is a
//! [`SceneObject`](atlas_loader::SceneObject) plus the materials created for
//! it, keyed by [`ModelId`](atlas_types::ModelId).
//!
//! # Modules
//!
//! - [`error`]: Error types for registry operations
//! - [`traits`]: The [`SceneRegistry`] trait and the [`SceneObserver`] hook
//! - [`memory`]: [`InMemorySceneRegistry`], a `RwLock`-guarded map

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{RegistryError, RegistryResult};
pub use memory::InMemorySceneRegistry;
pub use traits::{NoopObserver, SceneObserver, SceneRegistry};
