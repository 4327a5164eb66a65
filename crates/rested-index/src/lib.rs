//! Secondary indexes for Rested collections.
//!
//! An [`IndexSet`] holds zero or more named property indexes. Each index maps
//! a property value to the insertion-ordered bucket of resources sharing it.
//! A reverse map records, per resource, which buckets it currently occupies so
//! that removal never rescans the value space.
//!
//! # Key Types
//!
//! - [`IndexSet`] -- All registered indexes plus the reverse map
//! - [`IndexKey`] -- Canonical, hashable form of a property value
//! - [`IndexError`] -- Schema errors (`NoSuchIndex`, `IndexExists`)
//!
//! The set is a plain data structure; the owning collection decides when to
//! apply updates (only after a mutation commits).

pub mod error;
pub mod key;
pub mod set;

pub use error::{IndexError, IndexResult};
pub use key::IndexKey;
pub use set::IndexSet;
