//! Storage-specific error type wrapping sqlx errors.

use medtrack_domain::error::{BoxError, InitializationError, MedTrackError, QueryError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored timestamp is not valid RFC 3339.
    #[error("invalid stored timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// `COUNT(*)` produced a value that does not fit a count.
    #[error("invalid row count {0}")]
    InvalidCount(i64),
}

impl StorageError {
    fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Database(sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. })
                | Self::Timestamp(_)
                | Self::InvalidCount(_)
        )
    }

    pub(crate) fn into_open_error(self) -> InitializationError {
        InitializationError::Engine(Box::new(self))
    }

    pub(crate) fn into_schema_error(self) -> InitializationError {
        InitializationError::Schema(Box::new(self))
    }
}

impl From<StorageError> for QueryError {
    fn from(err: StorageError) -> Self {
        let decode = err.is_decode();
        let source: BoxError = Box::new(err);
        if decode {
            Self::Decode(source)
        } else {
            Self::Engine(source)
        }
    }
}

impl From<StorageError> for MedTrackError {
    fn from(err: StorageError) -> Self {
        Self::Query(err.into())
    }
}
