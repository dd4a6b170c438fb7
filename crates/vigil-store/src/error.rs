use thiserror::Error;

/// Failures while persisting wizard progress.
///
/// Reads never produce these: a missing or unreadable value is reported to
/// callers as absent data. Only mutations of a file-backed store can fail.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing the backing file failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the persisted map failed
    #[error("Store encoding error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Specialized result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
