use thiserror::Error;

use crate::retry::Retryable;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures while parsing a stored request template. These are structural:
/// the file is wrong, and retrying cannot help.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request line (expected `GET|POST <path> <protocol>`): {0:?}")]
    MalformedRequestLine(String),

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("non-blank content after the body line (the body must be a single line): {0:?}")]
    TrailingContent(String),
}

/// Error type for probe and replay operations.
///
/// Only `Transport` is retryable; everything else means the template or the
/// configuration is wrong and must surface immediately.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("template has no Host header")]
    MissingHost,

    #[error("unsupported scheme in url {0:?} (only http and https)")]
    UnsupportedScheme(String),

    #[error("invalid test url {0:?}")]
    InvalidUrl(String),

    #[error("transport fault: {0}")]
    Transport(String),
}

impl Error {
    pub(crate) fn transport(err: impl std::fmt::Display) -> Self {
        Error::Transport(err.to_string())
    }
}

impl Retryable for Error {
    fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
