// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors surfaced by registry and policy operations.
///
/// All variants are non-fatal: the registry is left exactly as it was
/// before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("source '{name}' is already tracked")]
    DuplicateSource { name: String },

    #[error("source '{name}' is not tracked")]
    UnknownSource { name: String },

    #[error("source name must not be empty")]
    InvalidName,
}

impl SourceError {
    pub(crate) fn duplicate(name: &str) -> Self {
        SourceError::DuplicateSource {
            name: name.to_string(),
        }
    }

    pub(crate) fn unknown(name: &str) -> Self {
        SourceError::UnknownSource {
            name: name.to_string(),
        }
    }
}
