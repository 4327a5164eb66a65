use rested_gate::Method;
use rested_types::{Payload, ResourceId};

use crate::query::ListQuery;

/// A verb invocation as handed over by a transport adapter.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    GetOne { id: ResourceId },
    GetAll { query: ListQuery },
    Post { payload: Payload },
    PutOne { id: ResourceId, payload: Payload },
    PutAll { payload: Payload },
    PatchOne { id: ResourceId, payload: Payload },
    DeleteOne { id: ResourceId },
    DeleteAll,
}

impl Request {
    /// Reads may be cached; every other request should not be.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::GetOne { .. } | Self::GetAll { .. })
    }

    /// The request method this invocation arrives under.
    pub fn method(&self) -> Method {
        match self {
            Self::GetOne { .. } | Self::GetAll { .. } => Method::Get,
            Self::Post { .. } => Method::Post,
            Self::PutOne { .. } | Self::PutAll { .. } => Method::Put,
            Self::PatchOne { .. } => Method::Patch,
            Self::DeleteOne { .. } | Self::DeleteAll => Method::Delete,
        }
    }

    /// The single resource addressed, if any.
    pub fn target(&self) -> Option<&ResourceId> {
        match self {
            Self::GetOne { id }
            | Self::PutOne { id, .. }
            | Self::PatchOne { id, .. }
            | Self::DeleteOne { id } => Some(id),
            _ => None,
        }
    }
}
