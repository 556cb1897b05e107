use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid color literal: {0}")]
    InvalidColor(String),

    #[error("color out of range: {0:#x} (max 0xffffff)")]
    ColorOutOfRange(u32),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("empty model id")]
    EmptyModelId,
}
