//! Foundation types for the atlas viewer.
//!
//! Every other atlas crate depends on `atlas-types`. The types here are plain
//! values: they carry no scene state and perform no I/O.
//!
//! # Key Types
//!
//! - [`ModelId`]: Stable identifier a loaded asset is registered under
//! - [`PackedColor`]: 24-bit RGB value packed as `0xRRGGBB`
//! - [`Vec3`] / [`Placement`]: Position and scale applied to a loaded asset
//! - [`LoadStatus`] / [`LoadQueueItem`]: Acquisition job history
//! - [`MaterialPatch`]: Partial update broadcast to registered materials
//! - [`ModelSummary`]: Snapshot row describing one registered asset

pub mod color;
pub mod error;
pub mod material;
pub mod model;
pub mod placement;
pub mod status;

pub use color::PackedColor;
pub use error::TypeError;
pub use material::MaterialPatch;
pub use model::{ModelId, ModelSummary};
pub use placement::{Placement, Vec3};
pub use status::{LoadQueueItem, LoadStatus};
