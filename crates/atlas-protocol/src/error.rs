use thiserror::Error;

use atlas_pipeline::{AcquireError, QueueError};
use atlas_registry::RegistryError;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown command type: {0}")]
    UnknownCommand(String),

    #[error("invalid payload for {action}: {reason}")]
    InvalidPayload { action: &'static str, reason: String },

    #[error("model not found: {0}")]
    NotFound(String),

    #[error("unknown view: {0}")]
    UnknownView(String),

    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
