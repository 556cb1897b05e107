//! Error types for registry operations.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No asset is registered under this id.
    #[error("model not found: {id}")]
    NotFound { id: String },

    /// A writer panicked while holding the registry lock.
    #[error("registry lock poisoned: {0}")]
    Poisoned(String),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
