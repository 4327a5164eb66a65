use rested_gate::AllowedMethods;
use rested_store::StoreError;
use rested_types::{ResourceId, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::QueryError;

/// Human-readable error with an optional machine code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

impl From<ValidationError> for ErrorDetail {
    fn from(e: ValidationError) -> Self {
        Self {
            message: e.message,
            code: e.code,
        }
    }
}

impl From<&StoreError> for ErrorDetail {
    fn from(e: &StoreError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<&QueryError> for ErrorDetail {
    fn from(e: &QueryError) -> Self {
        Self::new(e.to_string())
    }
}

/// Result of a dispatched operation, independent of any transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ok { body: Value },
    Created { location: ResourceId },
    NoContent,
    NotModified,
    NotFound,
    Conflict,
    MethodNotAllowed { allowed: AllowedMethods },
    BadRequest { error: ErrorDetail },
    UnsupportedMediaType,
    InternalError { error: ErrorDetail },
}

impl Outcome {
    pub fn bad_request(error: impl Into<ErrorDetail>) -> Self {
        Self::BadRequest {
            error: error.into(),
        }
    }

    pub fn internal(error: impl Into<ErrorDetail>) -> Self {
        Self::InternalError {
            error: error.into(),
        }
    }

    /// HTTP status code for this outcome.
    pub fn status(&self) -> u16 {
        match self {
            Self::Ok { .. } => 200,
            Self::Created { .. } => 201,
            Self::NoContent => 204,
            Self::NotModified => 304,
            Self::BadRequest { .. } => 400,
            Self::NotFound => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::Conflict => 409,
            Self::UnsupportedMediaType => 415,
            Self::InternalError { .. } => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() < 400
    }

    /// Only read verbs produce `Ok` and `NotModified`, so everything else
    /// should be marked uncacheable by the transport.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Self::Ok { .. } | Self::NotModified)
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Ok { body } => Some(body),
            _ => None,
        }
    }

    /// Value for an `Allow` header.
    pub fn allow_header(&self) -> Option<String> {
        match self {
            Self::MethodNotAllowed { allowed } => Some(allowed.header_value()),
            _ => None,
        }
    }

    /// Id of the created resource.
    pub fn location(&self) -> Option<&ResourceId> {
        match self {
            Self::Created { location } => Some(location),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        match self {
            Self::BadRequest { error } | Self::InternalError { error } => Some(error),
            _ => None,
        }
    }

    /// Machine-readable error code, surfaced as `x-error-code` over HTTP.
    pub fn error_code(&self) -> Option<&str> {
        self.error().and_then(|e| e.code.as_deref())
    }
}

impl From<QueryError> for Outcome {
    fn from(e: QueryError) -> Self {
        if e.is_not_found() {
            Self::NotFound
        } else {
            Self::bad_request(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rested_gate::Method;
    use serde_json::json;

    #[test]
    fn status_codes() {
        let cases = [
            (Outcome::Ok { body: json!({}) }, 200),
            (
                Outcome::Created {
                    location: "x".into(),
                },
                201,
            ),
            (Outcome::NoContent, 204),
            (Outcome::NotModified, 304),
            (Outcome::bad_request(ErrorDetail::new("bad")), 400),
            (Outcome::NotFound, 404),
            (
                Outcome::MethodNotAllowed {
                    allowed: AllowedMethods::new(),
                },
                405,
            ),
            (Outcome::Conflict, 409),
            (Outcome::UnsupportedMediaType, 415),
            (Outcome::internal(ErrorDetail::new("boom")), 500),
        ];
        for (outcome, status) in cases {
            assert_eq!(outcome.status(), status, "{outcome:?}");
        }
    }

    #[test]
    fn allow_header_only_on_405() {
        let outcome = Outcome::MethodNotAllowed {
            allowed: [Method::Get, Method::Head, Method::Put].into_iter().collect(),
        };
        assert_eq!(outcome.allow_header().as_deref(), Some("GET, HEAD, PUT"));
        assert_eq!(Outcome::NotFound.allow_header(), None);
    }

    #[test]
    fn validation_code_is_carried() {
        let outcome =
            Outcome::bad_request(ValidationError::new("rating out of range").with_code("range"));
        assert_eq!(outcome.error_code(), Some("range"));
        assert_eq!(outcome.error().unwrap().message, "rating out of range");
    }

    #[test]
    fn query_errors_map_to_status() {
        assert_eq!(
            Outcome::from(QueryError::UnknownOrderBy("color".into())),
            Outcome::NotFound
        );
        assert_eq!(Outcome::from(QueryError::MissingPageSize("pageNum")).status(), 400);
    }

    #[test]
    fn cacheability() {
        assert!(Outcome::Ok { body: json!({}) }.is_cacheable());
        assert!(Outcome::NotModified.is_cacheable());
        assert!(!Outcome::NoContent.is_cacheable());
        assert!(!Outcome::NotFound.is_cacheable());
    }
}
