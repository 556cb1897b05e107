//! Model bundle archives for the atlas viewer.
//!
//! A bundle is a zip container holding three kinds of entries:
//!
//! - **Manifest** (`config.json`): `{ "folders": [...] }`, the folder
//!   prefixes whose assets are in scope
//! - **Color table**: one `<name>: <r> <g> <b>` record per line
//! - **Assets**: `.glb` files under the manifest folders
//!
//! This crate only reads and scopes entries. Decoding the assets themselves is
//! the loader's job.
//!
//! # Modules
//!
//! - [`container`]: [`AssetArchive`] random access over a decoded container
//! - [`manifest`]: [`Manifest`] parsing and entry scoping
//! - [`colors`]: [`ColorTable`] parsing
//! - [`naming`]: identifier derivation from asset file names
//! - [`writer`]: [`ArchiveWriter`] for building bundles

pub mod colors;
pub mod container;
pub mod error;
pub mod manifest;
pub mod naming;
pub mod writer;

pub use colors::{parse_color_line, ColorTable};
pub use container::{ArchiveEntry, AssetArchive};
pub use error::{ArchiveError, ArchiveResult, ManifestError, ManifestResult};
pub use manifest::Manifest;
pub use naming::{AssetName, NamingRules, Side};
pub use writer::ArchiveWriter;
