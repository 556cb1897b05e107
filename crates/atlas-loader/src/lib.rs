//! Asset loader adapter for the atlas viewer.
//!
//! Turns a raw byte buffer into a scene-attachable [`SceneObject`]. Decoding
//! is delegated to a [`SceneCodec`] (glTF by default); the adapter then walks
//! the decoded graph, gives every renderable part a fresh material built from
//! a [`MaterialTemplate`], tags the root with the model id, and applies the
//! requested placement.
//!
//! The adapter performs no network or filesystem I/O.

pub mod codec;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod loader;
pub mod material;
pub mod scene;

pub use codec::{DecodedScene, GltfCodec, SceneCodec};
pub use error::{LoaderError, LoaderResult};
pub use loader::{AssetLoader, LoadRequest, LoadedAsset};
pub use material::{Material, MaterialHandle, MaterialId, MaterialSet, MaterialTemplate};
pub use scene::{MeshPart, SceneNode, SceneObject};
