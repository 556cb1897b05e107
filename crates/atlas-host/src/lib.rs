//! Hosting for the atlas viewer core.
//!
//! A [`ViewerSession`] wires the registry, load queue, acquisition pipeline,
//! and collaborators together behind one [`Dispatcher`](atlas_protocol::Dispatcher).
//! Two channels feed it: newline-delimited JSON over stdio, and an axum
//! router exposing `/v1/command`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod session;
pub mod stdio;

pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use server::ViewerServer;
pub use session::ViewerSession;
pub use stdio::run_stdio;
