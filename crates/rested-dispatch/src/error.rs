use thiserror::Error;

/// A list query that cannot be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{param} must be a positive integer, got {value:?}")]
    InvalidNumber { param: &'static str, value: String },

    #[error("{0} requires pageSize")]
    MissingPageSize(&'static str),

    #[error("pageAfter names an unknown id: {0}")]
    UnknownPageAfter(String),

    #[error("orderBy names an unknown field: {0}")]
    UnknownOrderBy(String),
}

impl QueryError {
    /// `true` when the query referenced something that does not exist, as
    /// opposed to being malformed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownPageAfter(_) | Self::UnknownOrderBy(_))
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
