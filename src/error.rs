use std::io;
use thiserror::Error;

/// Why a candidate position was not identified as a given format.
///
/// None of these are fatal. The scanner treats every variant as
/// "not this format here" and moves on to the next handler or position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("insufficient data: need {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("signature not matched")]
    NotMatched,
}

impl Rejection {
    /// True for the ordinary "no match here" outcome.
    pub fn is_not_matched(&self) -> bool {
        matches!(self, Rejection::NotMatched)
    }
}

/// Errors raised while opening or scanning a source image
#[derive(Debug, Error)]
pub enum CarveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Source is empty: {0}")]
    EmptySource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CarveError>;
