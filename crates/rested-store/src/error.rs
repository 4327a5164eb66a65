use rested_index::IndexError;

/// Failure reported by a persistence hook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistError {
    /// The hook reported a failure.
    #[error("persistence failed: {0}")]
    Failed(String),

    /// A synchronous hook panicked while saving.
    #[error("persistence hook panicked: {0}")]
    Panicked(String),

    /// A callback-style hook dropped its completion handle without reporting.
    #[error("persistence hook abandoned the save")]
    Abandoned,
}

impl PersistError {
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }
}

/// Errors from collection operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Index schema or lookup error (`NoSuchIndex`, `IndexExists`).
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The persistence hook failed; the mutation was rolled back.
    #[error("rolled back: {0}")]
    Persistence(#[from] PersistError),

    /// Serializing the collection failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns `true` if this error came from a rolled-back mutation.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
