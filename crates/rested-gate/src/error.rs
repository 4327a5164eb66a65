use crate::config::Verb;

/// Error returned by a user-supplied rights predicate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PredicateError(pub String);

impl PredicateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Why a rights predicate was latched off.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The predicate returned an error.
    #[error("{verb} predicate failed: {reason}")]
    PredicateFailed { verb: Verb, reason: String },

    /// The predicate panicked.
    #[error("{verb} predicate panicked: {reason}")]
    PredicatePanicked { verb: Verb, reason: String },
}

impl GateError {
    /// The verb whose predicate broke.
    pub fn verb(&self) -> Verb {
        match self {
            Self::PredicateFailed { verb, .. } | Self::PredicatePanicked { verb, .. } => *verb,
        }
    }
}
