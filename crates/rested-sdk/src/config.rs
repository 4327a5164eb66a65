use std::collections::BTreeMap;
use std::path::Path;

use rested_gate::RightsSetting;
use serde::{Deserialize, Serialize};

use crate::error::SdkResult;

/// Settings for one mounted collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Properties to index when the collection is mounted.
    pub indexes: Vec<String>,
    /// `true`, `false`, or a per-verb table. Defaults to denying everything.
    pub rights: RightsSetting,
}

/// Top-level configuration, keyed by collection name.
///
/// ```toml
/// [collections.beer]
/// indexes = ["rating"]
/// rights = { read = true, create = true }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestedConfig {
    pub collections: BTreeMap<String, CollectionConfig>,
}

impl RestedConfig {
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Settings for `name`, compared case-insensitively.
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, config)| config)
    }
}
