use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid resource id: {0:?}")]
    InvalidId(String),

    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),
}

/// A payload was rejected by a resource's construction or `edit` path.
///
/// The optional `code` is a machine-readable discriminator that transports
/// surface alongside the message (e.g. as an `x-error-code` header).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub code: Option<String>,
}

impl ValidationError {
    /// Create a validation error without a machine code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Attach a machine-readable code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Shorthand for a required field that is missing or has the wrong type.
    pub fn missing_field(field: &str) -> Self {
        Self::new(format!("missing or invalid field '{field}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_is_message() {
        let err = ValidationError::new("Name is empty");
        assert_eq!(err.to_string(), "Name is empty");
        assert!(err.code.is_none());
    }

    #[test]
    fn validation_error_with_code() {
        let err = ValidationError::new("Name fail").with_code("namefail");
        assert_eq!(err.code.as_deref(), Some("namefail"));
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = ValidationError::missing_field("rating");
        assert!(err.message.contains("rating"));
    }
}
