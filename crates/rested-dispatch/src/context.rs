use std::fmt;

use rested_types::Timestamp;

/// Requested representation of a resource.
///
/// Only JSON is served; anything else is reported as unsupported.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Json,
    Extension(String),
}

impl Format {
    /// Pick the format from a path extension. No extension means JSON.
    pub fn from_extension(ext: Option<&str>) -> Self {
        match ext {
            None | Some("json") => Self::Json,
            Some(other) => Self::Extension(other.to_string()),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Extension(ext) => f.write_str(ext),
        }
    }
}

/// Per-operation input shared by every handler.
#[derive(Clone, Debug)]
pub struct OperationContext<C> {
    /// Caller context handed to rights predicates.
    pub caller: C,
    pub format: Format,
    /// Last-modified marker the caller already has.
    pub if_modified_since: Option<Timestamp>,
}

impl<C> OperationContext<C> {
    pub fn new(caller: C) -> Self {
        Self {
            caller,
            format: Format::Json,
            if_modified_since: None,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_if_modified_since(mut self, since: Timestamp) -> Self {
        self.if_modified_since = Some(since);
        self
    }

    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_decides_format() {
        assert_eq!(Format::from_extension(None), Format::Json);
        assert_eq!(Format::from_extension(Some("json")), Format::Json);
        assert_eq!(
            Format::from_extension(Some("jpeg")),
            Format::Extension("jpeg".into())
        );
        assert!(!Format::from_extension(Some("JSON")).is_json());
    }

    #[test]
    fn context_defaults_to_json() {
        let ctx = OperationContext::new("anon");
        assert!(ctx.is_json());
        assert!(ctx.if_modified_since.is_none());
    }
}
