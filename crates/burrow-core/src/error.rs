use thiserror::Error;

/// Result type for link store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

/// Failures reported by a [`LinkStore`](crate::store::LinkStore) backend.
///
/// A missing code or URL is not an error; stores report it as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("short code or id already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Whether the backend could not be reached or did not answer in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("could not allocate a free short code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },
    #[error("{operation} did not complete within {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u128,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ShortenerError {
    /// Whether the failure was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidUrl(_))
    }

    /// Whether retrying later may succeed.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::AllocationExhausted { .. } | Self::Timeout { .. } => true,
            Self::Storage(err) => err.is_unavailable(),
            _ => false,
        }
    }
}
