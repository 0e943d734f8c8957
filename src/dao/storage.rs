use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A concurrent writer updated the record first; nothing was written.
    #[error("storage write conflict: {message}")]
    Conflict { message: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        StorageError::Conflict {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn unavailable_keeps_the_backend_cause() {
        let err = StorageError::unavailable(
            "loading match".into(),
            io::Error::new(io::ErrorKind::TimedOut, "socket timed out"),
        );

        assert_eq!(err.to_string(), "storage unavailable: loading match");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("socket timed out"));
    }
}
