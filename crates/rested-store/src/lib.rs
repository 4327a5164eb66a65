//! In-memory resource collections for Rested.
//!
//! A [`ResourceCollection`] is the authoritative id → resource map of one
//! resource type. It is the only place state lives; everything above it
//! (rights, dispatch, transports) is stateless.
//!
//! # Mutation discipline
//!
//! 1. Apply: the new map is published as a copy-on-write snapshot, so reads
//!    issued while persistence is pending observe the tentative state.
//! 2. Persist: the [`PersistenceHook`] is awaited with the affected ids.
//! 3. Commit or roll back: on success indexes are updated and
//!    `last_modified` advances; on failure the previous value is restored and
//!    nothing else is touched.
//!
//! No lock is held across the persistence await. Two mutations of the same id
//! issued before the first hook resolves are not serialized against each
//! other; callers that need strict per-id ordering must provide it.
//!
//! # Persistence hooks
//!
//! - [`NoPersistence`] -- default, always succeeds
//! - [`SyncHook`] -- synchronous closure; errors and panics become failures
//! - [`CallbackHook`] -- callback style with a one-shot [`Completion`]

pub mod collection;
pub mod error;
pub mod hook;

pub use collection::{EntryMap, ResourceCollection};
pub use error::{PersistError, StoreError, StoreResult};
pub use hook::{CallbackHook, Completion, NoPersistence, PersistenceHook, SyncHook};
