use std::path::{Path, PathBuf};

/// Errors raised by [`JobStore`](crate::JobStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No storage directory exists for the requested fingerprint.
    #[error("Job not found: {0}")]
    NotFound(String),

    /// A filesystem operation on a job artifact failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
