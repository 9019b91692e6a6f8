//! Error types for cache operations

use crate::error::AppError;

/// Result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur in cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Key components could not be encoded
    #[error("Key encoding failed: {0}")]
    KeyEncoding(#[from] serde_json::Error),

    /// Cache constructed with zero capacity
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(usize),
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::InvalidCapacity(size) => {
                AppError::Configuration(format!("cache capacity must be positive, got {}", size))
            }
            _ => AppError::Cache(err.to_string()),
        }
    }
}
