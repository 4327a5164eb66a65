use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PredicateError;
use crate::predicate::PredicateFn;

/// One of the four gated verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Create, Verb::Read, Verb::Update, Verb::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// How one verb is decided.
pub enum Rule<R, C> {
    Allow,
    Deny,
    /// Evaluated per operation against the caller context and the resource.
    Predicate(Arc<PredicateFn<R, C>>),
}

impl<R, C> Rule<R, C> {
    /// A fallible predicate. An `Err` latches the verb to permanent denial.
    pub fn predicate<F, E>(f: F) -> Self
    where
        F: Fn(&C, &R) -> Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self::Predicate(Arc::new(move |ctx: &C, resource: &R| {
            f(ctx, resource).map_err(|e| PredicateError::new(e.to_string()))
        }))
    }

    /// An infallible predicate. A panic still latches the verb.
    pub fn check<F>(f: F) -> Self
    where
        F: Fn(&C, &R) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(move |ctx: &C, resource: &R| Ok(f(ctx, resource))))
    }
}

impl<R, C> Clone for Rule<R, C> {
    fn clone(&self) -> Self {
        match self {
            Self::Allow => Self::Allow,
            Self::Deny => Self::Deny,
            Self::Predicate(f) => Self::Predicate(Arc::clone(f)),
        }
    }
}

impl<R, C> From<bool> for Rule<R, C> {
    fn from(value: bool) -> Self {
        if value {
            Self::Allow
        } else {
            Self::Deny
        }
    }
}

impl<R, C> fmt::Debug for Rule<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// RightsConfig
// ---------------------------------------------------------------------------

/// Per-verb rules. Verbs left unset deny.
pub struct VerbRules<R, C> {
    pub create: Option<Rule<R, C>>,
    pub read: Option<Rule<R, C>>,
    pub update: Option<Rule<R, C>>,
    pub delete: Option<Rule<R, C>>,
}

impl<R, C> VerbRules<R, C> {
    pub fn new() -> Self {
        Self {
            create: None,
            read: None,
            update: None,
            delete: None,
        }
    }

    pub fn create(mut self, rule: impl Into<Rule<R, C>>) -> Self {
        self.create = Some(rule.into());
        self
    }

    pub fn read(mut self, rule: impl Into<Rule<R, C>>) -> Self {
        self.read = Some(rule.into());
        self
    }

    pub fn update(mut self, rule: impl Into<Rule<R, C>>) -> Self {
        self.update = Some(rule.into());
        self
    }

    pub fn delete(mut self, rule: impl Into<Rule<R, C>>) -> Self {
        self.delete = Some(rule.into());
        self
    }

    pub fn get(&self, verb: Verb) -> Option<&Rule<R, C>> {
        match verb {
            Verb::Create => self.create.as_ref(),
            Verb::Read => self.read.as_ref(),
            Verb::Update => self.update.as_ref(),
            Verb::Delete => self.delete.as_ref(),
        }
    }
}

impl<R, C> Default for VerbRules<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rights configuration for a collection.
pub enum RightsConfig<R, C> {
    /// One rule for all four verbs. A predicate here is shared: if it breaks,
    /// every verb is denied.
    All(Rule<R, C>),
    /// Independent rules per verb.
    PerVerb(VerbRules<R, C>),
}

impl<R, C> RightsConfig<R, C> {
    pub fn allow_all() -> Self {
        Self::All(Rule::Allow)
    }

    pub fn deny_all() -> Self {
        Self::All(Rule::Deny)
    }

    /// `false` for every verb means the collection is not exposed at all.
    pub fn denies_everything(&self) -> bool {
        match self {
            Self::All(Rule::Deny) => true,
            Self::All(_) => false,
            Self::PerVerb(rules) => Verb::ALL
                .iter()
                .all(|verb| matches!(rules.get(*verb), None | Some(Rule::Deny))),
        }
    }
}

impl<R, C> Default for RightsConfig<R, C> {
    fn default() -> Self {
        Self::deny_all()
    }
}

impl<R, C> From<bool> for RightsConfig<R, C> {
    fn from(value: bool) -> Self {
        Self::All(value.into())
    }
}

// ---------------------------------------------------------------------------
// Serializable settings
// ---------------------------------------------------------------------------

/// Per-verb booleans as they appear in configuration files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

/// The data-only subset of [`RightsConfig`]: `rights = true` or
/// `rights = { read = true, delete = false }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RightsSetting {
    All(bool),
    PerVerb(VerbSetting),
}

impl Default for RightsSetting {
    fn default() -> Self {
        Self::All(false)
    }
}

impl<R, C> From<RightsSetting> for RightsConfig<R, C> {
    fn from(setting: RightsSetting) -> Self {
        match setting {
            RightsSetting::All(value) => value.into(),
            RightsSetting::PerVerb(verbs) => Self::PerVerb(VerbRules {
                create: verbs.create.map(Rule::from),
                read: verbs.read.map(Rule::from),
                update: verbs.update.map(Rule::from),
                delete: verbs.delete.map(Rule::from),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Config = RightsConfig<(), ()>;

    #[test]
    fn default_denies_everything() {
        assert!(Config::default().denies_everything());
        assert!(Config::from(false).denies_everything());
        assert!(!Config::from(true).denies_everything());
        assert!(Config::PerVerb(VerbRules::new()).denies_everything());
        assert!(!Config::PerVerb(VerbRules::new().read(true)).denies_everything());
        assert!(!Config::PerVerb(VerbRules::new().update(Rule::check(|_: &(), _: &()| false)))
            .denies_everything());
    }

    #[test]
    fn setting_from_toml_bool() {
        #[derive(Deserialize)]
        struct Doc {
            rights: RightsSetting,
        }
        let doc: Doc = toml::from_str("rights = true").unwrap();
        assert_eq!(doc.rights, RightsSetting::All(true));
    }

    #[test]
    fn setting_from_toml_table() {
        #[derive(Deserialize)]
        struct Doc {
            rights: RightsSetting,
        }
        let doc: Doc = toml::from_str("rights = { read = true, delete = false }").unwrap();
        assert_eq!(
            doc.rights,
            RightsSetting::PerVerb(VerbSetting {
                read: Some(true),
                delete: Some(false),
                ..Default::default()
            })
        );
    }

    #[test]
    fn setting_converts_to_rules() {
        let config: Config = RightsSetting::PerVerb(VerbSetting {
            read: Some(true),
            ..Default::default()
        })
        .into();
        let RightsConfig::PerVerb(rules) = config else {
            panic!("expected per-verb rules");
        };
        assert!(matches!(rules.read, Some(Rule::Allow)));
        assert!(rules.create.is_none());
    }

    #[test]
    fn verb_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Verb::Delete).unwrap(), "\"delete\"");
        assert_eq!(Verb::Update.to_string(), "update");
    }
}
