//! Rights gating for Rested.
//!
//! Every operation on a resource is gated by one of four verbs (create, read,
//! update, delete). A [`RightsPolicy`] answers "may this caller do that to
//! this resource?" and computes the [`AllowedMethods`] used to tell
//! "forbidden" apart from "not found".
//!
//! # Quick Start
//!
//! ```rust
//! use rested_gate::{RightsConfig, RightsPolicy, Rule, Verb, VerbRules};
//!
//! # #[derive(Clone, serde::Serialize)]
//! # struct Note { id: Option<rested_types::ResourceId> }
//! # impl rested_types::Resource for Note {
//! #     const KIND: rested_types::ResourceKind = rested_types::ResourceKind::new(
//! #         rested_types::IdentityMode::ClientAssigned,
//! #         rested_types::Mutability::Immutable,
//! #     );
//! #     fn from_payload(
//! #         id: Option<rested_types::ResourceId>,
//! #         _: &rested_types::Payload,
//! #     ) -> Result<Self, rested_types::ValidationError> {
//! #         Ok(Self { id })
//! #     }
//! #     fn id(&self) -> Option<&rested_types::ResourceId> { self.id.as_ref() }
//! # }
//! let config = RightsConfig::PerVerb(
//!     VerbRules::new()
//!         .read(Rule::Allow)
//!         .delete(Rule::check(|user: &String, _: &Note| user == "admin")),
//! );
//! let policy = RightsPolicy::new(config);
//! let note = Note { id: None };
//!
//! assert!(policy.may(Verb::Read, &"guest".to_string(), &note));
//! assert!(!policy.may(Verb::Delete, &"guest".to_string(), &note));
//! assert!(!policy.may(Verb::Create, &"admin".to_string(), &note));
//! ```
//!
//! # Fail-closed predicates
//!
//! A predicate that returns an error or panics is latched to
//! [`PredicateState::Broken`] and denies for the rest of the policy's life.

pub mod allowed;
pub mod config;
pub mod error;
pub mod policy;
pub mod predicate;

pub use allowed::{AllowedMethods, Method};
pub use config::{RightsConfig, RightsSetting, Rule, Verb, VerbRules, VerbSetting};
pub use error::{GateError, PredicateError};
pub use policy::RightsPolicy;
pub use predicate::{LatchedPredicate, PredicateFn, PredicateState};
