use thiserror::Error;

/// Errors raised while decoding or reading a bundle container.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("malformed archive: {0}")]
    Malformed(String),

    #[error("required {what} missing from archive (expected an entry ending in {suffix:?})")]
    MissingEntry { what: &'static str, suffix: String },

    #[error("failed to read entry {path}: {reason}")]
    EntryRead { path: String, reason: String },

    #[error("entry {path} is not valid UTF-8")]
    NotUtf8 { path: String },

    #[error("failed to write archive: {0}")]
    Write(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors raised while locating or parsing the bundle manifest.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest not found")]
    NotFound,

    #[error("manifest is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("manifest has no folders array")]
    MissingFolders,

    #[error("manifest folders array is empty")]
    EmptyFolders,

    #[error("manifest folder at index {index} is not a non-empty string")]
    InvalidFolder { index: usize },
}

pub type ManifestResult<T> = Result<T, ManifestError>;
