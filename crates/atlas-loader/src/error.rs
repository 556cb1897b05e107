use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// The codec rejected the buffer. Carries the codec's own message.
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("scene graph nesting exceeds {max} levels")]
    TooDeep { max: usize },
}

pub type LoaderResult<T> = Result<T, LoaderError>;
