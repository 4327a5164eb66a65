//! Foundation types for Rested.
//!
//! This crate provides the resource contract and the small value types shared
//! by every other Rested crate.
//!
//! # Key Types
//!
//! - [`Resource`]: Domain value stored in a collection, with a static capability set
//! - [`ResourceKind`]: Identity mode × mutability × filterability of a resource type
//! - [`ResourceId`]: Stable string identity, unique within a collection
//! - [`Timestamp`]: Monotonic last-modified marker used for cache validation
//! - [`ValidationError`]: Rejection raised by resource construction or `edit`

pub mod error;
pub mod id;
pub mod resource;
pub mod temporal;

pub use error::{TypeError, ValidationError};
pub use id::ResourceId;
pub use resource::{Filter, IdentityMode, Mutability, Payload, Resource, ResourceKind};
pub use temporal::Timestamp;
