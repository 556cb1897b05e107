//! Command protocol for the atlas viewer.
//!
//! A host posts `{type, id, payload}` envelopes. Types carrying the
//! configured namespace prefix (`threejs_` by default) are decoded into a
//! [`Command`], executed against the viewer's services, and answered with a
//! `<namespace>_response` envelope echoing the request id. Everything else is
//! ignored.
//!
//! # Modules
//!
//! - [`envelope`]: Inbound and outbound envelopes
//! - [`command`]: The operation table and payload decoding
//! - [`camera`] / [`lighting`]: Collaborator seams the commands drive
//! - [`dispatch`]: [`Dispatcher`] tying commands to services
//! - [`error`]: [`ProtocolError`]

pub mod camera;
pub mod command;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod lighting;

pub use camera::{CameraRig, CameraState, PresetCamera, ViewPreset};
pub use command::{Command, ColorValue};
pub use dispatch::{Dispatcher, Services};
pub use envelope::{CommandEnvelope, ResponseEnvelope, DEFAULT_NAMESPACE};
pub use error::{ProtocolError, ProtocolResult};
pub use lighting::{LightLevels, LightingRig, StoredLights};
