//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A lookup or removal referenced a property that has no index.
    #[error("no index on property: {0}")]
    NoSuchIndex(String),

    /// An index on this property is already registered.
    #[error("index already exists on property: {0}")]
    IndexExists(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
