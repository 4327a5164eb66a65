//! High-level API for Rested.
//!
//! Mount typed resource collections under case-insensitive names, each with
//! its own rights, indexes and persistence hook, and hand the resulting
//! dispatchers to whatever transport serves them.
//!
//! # Quick Start
//!
//! ```rust
//! use rested_sdk::{CollectionOptions, OperationContext, Registry};
//! # use rested_sdk::{IdentityMode, Mutability, Payload, Resource, ResourceId, ResourceKind, ValidationError};
//! # #[derive(Clone, serde::Serialize)]
//! # struct Beer { id: Option<ResourceId>, name: String }
//! # impl Resource for Beer {
//! #     const KIND: ResourceKind = ResourceKind::new(IdentityMode::ClientAssigned, Mutability::Mutable);
//! #     fn from_payload(id: Option<ResourceId>, p: &Payload) -> Result<Self, ValidationError> {
//! #         let name = p.get("name").and_then(|v| v.as_str()).ok_or_else(|| ValidationError::missing_field("name"))?;
//! #         Ok(Self { id, name: name.to_string() })
//! #     }
//! #     fn id(&self) -> Option<&ResourceId> { self.id.as_ref() }
//! # }
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = Registry::new();
//! let beer = registry
//!     .mount::<Beer, ()>("beer", CollectionOptions::new().with_rights(true))
//!     .unwrap();
//!
//! let ctx = OperationContext::new(());
//! let outcome = beer
//!     .dispatcher
//!     .put_one(&ctx, &"Orval".into(), &serde_json::json!({ "name": "Orval" }))
//!     .await;
//! assert_eq!(outcome.status(), 201);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod registry;

pub use config::{CollectionConfig, RestedConfig};
pub use error::{SdkError, SdkResult};
pub use registry::{CollectionOptions, Mount, Registry};

// Re-export key types
pub use rested_dispatch::{Dispatcher, Format, ListQuery, OperationContext, Outcome, Request};
pub use rested_gate::{RightsConfig, RightsSetting, Rule, Verb, VerbRules};
pub use rested_store::{CallbackHook, Completion, NoPersistence, PersistenceHook, ResourceCollection, SyncHook};
pub use rested_types::{
    Filter, IdentityMode, Mutability, Payload, Resource, ResourceId, ResourceKind, Timestamp,
    ValidationError,
};
