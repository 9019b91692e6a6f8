//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Index search attempted before a build completed
    #[error("Index is not built")]
    IndexUnready,

    /// Background index build failed
    #[error("Index build failed: {0}")]
    IndexBuildFailed(String),

    /// Item is missing required data (skipped during indexing and scans)
    #[error("Malformed item: {0}")]
    MalformedItem(String),

    /// Caller supplied a filter that cannot be evaluated
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),
}

impl From<validator::ValidationErrors> for SearchError {
    fn from(err: validator::ValidationErrors) -> Self {
        SearchError::InvalidConfiguration(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidFilter(msg) => AppError::Validation(msg),
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            _ => AppError::Search(err.to_string()),
        }
    }
}
