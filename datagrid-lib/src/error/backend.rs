//! Backend collaborator error types

/// Errors reported by the data store behind the grid.
///
/// Every [`DataSource`](crate::api::DataSource), [`Mutate`](crate::api::Mutate)
/// and [`UserDirectory`](crate::api::UserDirectory) implementation reports
/// failures with this type.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The addressed row does not exist.
    #[error("Row '{id}' not found")]
    NotFound {
        /// Identity of the missing row.
        id: String,
    },

    /// The backend refused the request.
    #[error("Request rejected: {message}")]
    Rejected {
        /// Message returned by the backend.
        message: String,
    },

    /// A stored record could not be mapped to or from its storage format.
    #[error("Storage mapping error: {0}")]
    Storage(#[from] StorageError),
}

impl BackendError {
    /// Creates a new unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a new not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new rejected error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Returns `true` if repeating the request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors raised while converting rows to and from storage records.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// A serialized user list did not parse.
    #[error("Column '{column}' holds an invalid user list: {message}")]
    InvalidUserList {
        /// UI key of the column.
        column: String,
        /// Parser message.
        message: String,
    },

    /// A stored value has a type the column cannot hold.
    #[error("Column '{column}' cannot hold a {actual} value")]
    UnsupportedValue {
        /// UI key of the column.
        column: String,
        /// JSON type found in storage.
        actual: &'static str,
    },
}
