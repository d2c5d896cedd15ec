//! Top-level error type

use super::BackendError;
use super::ConfigError;
use super::FieldError;

/// Errors returned by grid operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend collaborator failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A row field could not be read as the requested type.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation named a row the grid does not hold.
    #[error("Unknown row '{0}'")]
    UnknownRow(String),

    /// The operation named a column the schema does not define.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

impl Error {
    /// Returns the backend error, if this is one.
    pub fn as_backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}
