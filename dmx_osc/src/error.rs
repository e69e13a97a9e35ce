//! Error types for OSC transport setup.

use std::{fmt, io};

/// Errors raised while opening a packet source.
#[derive(Debug)]
pub enum SourceError {
    /// The listen URI does not carry a supported scheme.
    UnsupportedScheme(String),
    /// The listen URI could not be parsed into a bind address.
    InvalidUri(String),
    /// Binding the transport failed.
    Bind(io::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::UnsupportedScheme(uri) => write!(f, "unsupported OSC scheme in '{uri}'"),
            SourceError::InvalidUri(uri) => write!(f, "invalid OSC listen URI '{uri}'"),
            SourceError::Bind(err) => write!(f, "failed to bind OSC transport: {err}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Bind(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> Self {
        SourceError::Bind(err)
    }
}

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
