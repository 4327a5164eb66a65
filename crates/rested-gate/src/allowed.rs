use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Request methods a collection can advertise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of methods permitted for one caller on one resource.
///
/// An empty set means the caller should be told the resource does not exist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedMethods(BTreeSet<Method>);

impl AllowedMethods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, method: Method) {
        self.0.insert(method);
    }

    pub fn contains(&self, method: Method) -> bool {
        self.0.contains(&method)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Method> + '_ {
        self.0.iter().copied()
    }

    /// Comma-separated value for an `Allow` header.
    pub fn header_value(&self) -> String {
        self.iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Method> for AllowedMethods {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AllowedMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_is_ordered() {
        let allowed: AllowedMethods = [Method::Put, Method::Head, Method::Get].into_iter().collect();
        assert_eq!(allowed.header_value(), "GET, HEAD, PUT");
        assert_eq!(allowed.len(), 3);
    }

    #[test]
    fn empty_set() {
        let allowed = AllowedMethods::new();
        assert!(allowed.is_empty());
        assert_eq!(allowed.header_value(), "");
    }
}
