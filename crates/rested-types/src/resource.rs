use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::id::ResourceId;

/// Client-supplied data used to construct or edit a resource.
pub type Payload = Value;

/// Query-time filter: field name → expected value, as received from the client.
pub type Filter = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Who assigns identities for a resource type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityMode {
    /// The client supplies the id (`PUT /collection/<id>`).
    ClientAssigned,
    /// The resource generates its own id (`POST /collection`).
    ServerGenerated,
    /// Both paths are supported.
    Flexible,
}

impl IdentityMode {
    pub const fn accepts_client_ids(self) -> bool {
        matches!(self, Self::ClientAssigned | Self::Flexible)
    }

    pub const fn generates_ids(self) -> bool {
        matches!(self, Self::ServerGenerated | Self::Flexible)
    }
}

/// Whether stored resources accept in-place edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    Immutable,
}

/// Static capability set of a resource type.
///
/// Dispatch decisions (may this type be created via `POST`? can it be
/// patched?) are made from this descriptor, never by probing a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pub identity: IdentityMode,
    pub mutability: Mutability,
    /// The type implements [`Resource::matches`].
    pub filterable: bool,
}

impl ResourceKind {
    pub const fn new(identity: IdentityMode, mutability: Mutability) -> Self {
        Self {
            identity,
            mutability,
            filterable: false,
        }
    }

    pub const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub const fn is_mutable(&self) -> bool {
        matches!(self.mutability, Mutability::Mutable)
    }
}

// ---------------------------------------------------------------------------
// Resource trait
// ---------------------------------------------------------------------------

/// A domain value stored in a collection.
///
/// Implementations describe their capabilities through [`Resource::KIND`].
/// The optional operations (`edit`, `create_id`, `matches`) have default
/// bodies that reject; they are only invoked when `KIND` advertises them.
pub trait Resource: Clone + Serialize + Send + Sync + 'static {
    /// Capabilities of this resource type.
    const KIND: ResourceKind;

    /// Build a resource from client data.
    ///
    /// `id` is `Some` when the caller assigns the identity (`PUT`) and `None`
    /// when the store expects the resource to generate one (`POST`).
    fn from_payload(id: Option<ResourceId>, payload: &Payload) -> Result<Self, ValidationError>;

    /// The identity currently carried by this value, if any.
    fn id(&self) -> Option<&ResourceId>;

    /// Validate `patch` and apply it in place.
    fn edit(&mut self, _patch: &Payload) -> Result<(), ValidationError> {
        Err(ValidationError::new("resource does not support edits").with_code("immutable"))
    }

    /// Assign and return a server-generated identity.
    fn create_id(&mut self) -> Option<ResourceId> {
        None
    }

    /// Query-time filtering predicate.
    fn matches(&self, _filter: &Filter) -> bool {
        false
    }

    /// Read a named field for indexing and ordering.
    ///
    /// The default reads the field out of the serde representation; `null`
    /// counts as absent.
    fn field(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(self).ok()? {
            Value::Object(mut map) => match map.remove(name) {
                Some(Value::Null) | None => None,
                Some(value) => Some(value),
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Clone, Debug, Serialize)]
    struct Note {
        id: Option<ResourceId>,
        text: String,
        tag: Option<String>,
    }

    impl Resource for Note {
        const KIND: ResourceKind = ResourceKind::new(IdentityMode::ClientAssigned, Mutability::Immutable);

        fn from_payload(id: Option<ResourceId>, payload: &Payload) -> Result<Self, ValidationError> {
            let text = payload
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ValidationError::missing_field("text"))?;
            Ok(Self {
                id,
                text: text.to_string(),
                tag: None,
            })
        }

        fn id(&self) -> Option<&ResourceId> {
            self.id.as_ref()
        }
    }

    #[test]
    fn identity_mode_capabilities() {
        assert!(IdentityMode::ClientAssigned.accepts_client_ids());
        assert!(!IdentityMode::ClientAssigned.generates_ids());
        assert!(!IdentityMode::ServerGenerated.accepts_client_ids());
        assert!(IdentityMode::ServerGenerated.generates_ids());
        assert!(IdentityMode::Flexible.accepts_client_ids());
        assert!(IdentityMode::Flexible.generates_ids());
    }

    #[test]
    fn kind_builder() {
        let kind = ResourceKind::new(IdentityMode::Flexible, Mutability::Mutable).filterable();
        assert!(kind.filterable);
        assert!(kind.is_mutable());
        assert!(!Note::KIND.is_mutable());
        assert!(!Note::KIND.filterable);
    }

    #[test]
    fn default_capabilities_reject() {
        let mut note = Note::from_payload(Some("n1".into()), &json!({ "text": "hi" })).unwrap();
        let err = note.edit(&json!({ "text": "changed" })).unwrap_err();
        assert_eq!(err.code.as_deref(), Some("immutable"));
        assert_eq!(note.text, "hi");
        assert!(note.create_id().is_none());
        assert!(!note.matches(&Filter::new()));
    }

    #[test]
    fn field_reads_serialized_representation() {
        let note = Note::from_payload(None, &json!({ "text": "hi" })).unwrap();
        assert_eq!(note.field("text"), Some(json!("hi")));
        // `tag` serializes as null and `missing` does not exist at all.
        assert_eq!(note.field("tag"), None);
        assert_eq!(note.field("missing"), None);
    }

    #[test]
    fn construction_failure_is_validation_error() {
        let err = Note::from_payload(None, &json!({ "body": 1 })).unwrap_err();
        assert!(err.message.contains("text"));
    }
}
