use thiserror::Error;

use atlas_archive::{ArchiveError, ManifestError};
use atlas_loader::LoaderError;
use atlas_registry::RegistryError;
use atlas_types::TypeError;

/// Failures of a [`Fetcher`](crate::Fetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported url scheme {scheme:?} in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error! status: {status} ({url})")]
    Status { url: String, status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Failures of the load queue bookkeeping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("unknown queue ticket {0}")]
    UnknownTicket(usize),

    #[error(transparent)]
    Transition(#[from] TypeError),

    #[error("load queue lock poisoned: {0}")]
    Poisoned(String),
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Outcome of a failed acquisition.
///
/// Messages are flattened to strings so one outcome can be handed to every
/// caller waiting on the same job.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("network error: {0}")]
    Network(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AcquireResult<T> = Result<T, AcquireError>;

impl From<FetchError> for AcquireError {
    fn from(e: FetchError) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<ArchiveError> for AcquireError {
    fn from(e: ArchiveError) -> Self {
        Self::Archive(e.to_string())
    }
}

impl From<ManifestError> for AcquireError {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e.to_string())
    }
}

impl From<LoaderError> for AcquireError {
    fn from(e: LoaderError) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<RegistryError> for AcquireError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound { id } => Self::NotFound(id),
            other => Self::Registry(other.to_string()),
        }
    }
}

impl From<QueueError> for AcquireError {
    fn from(e: QueueError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<TypeError> for AcquireError {
    fn from(e: TypeError) -> Self {
        Self::Internal(e.to_string())
    }
}
