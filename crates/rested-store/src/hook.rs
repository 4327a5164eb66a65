//! Persistence hooks: the boundary between a collection and durable storage.

use std::any::Any;
use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use async_trait::async_trait;
use rested_types::ResourceId;
use tokio::sync::oneshot;

use crate::error::PersistError;

/// Saves the resources touched by a mutation.
///
/// `ids` lists every id affected by the triggering operation. The collection
/// has already applied the change in memory when `save` runs; returning an
/// error rolls it back.
#[async_trait]
pub trait PersistenceHook: Send + Sync {
    async fn save(&self, ids: &[ResourceId]) -> Result<(), PersistError>;
}

/// The default hook: nothing is persisted and every save succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPersistence;

#[async_trait]
impl PersistenceHook for NoPersistence {
    async fn save(&self, _ids: &[ResourceId]) -> Result<(), PersistError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SyncHook
// ---------------------------------------------------------------------------

/// Adapts a synchronous save function.
///
/// Both an `Err` and a panic inside the function are reported as an
/// asynchronous [`PersistError`]; neither escapes to the caller of the
/// mutation.
pub struct SyncHook<F> {
    save: F,
}

impl<F, E> SyncHook<F>
where
    F: Fn(&[ResourceId]) -> Result<(), E> + Send + Sync,
    E: Display,
{
    pub fn new(save: F) -> Self {
        Self { save }
    }
}

#[async_trait]
impl<F, E> PersistenceHook for SyncHook<F>
where
    F: Fn(&[ResourceId]) -> Result<(), E> + Send + Sync,
    E: Display,
{
    async fn save(&self, ids: &[ResourceId]) -> Result<(), PersistError> {
        match catch_unwind(AssertUnwindSafe(|| (self.save)(ids))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PersistError::failed(e)),
            Err(payload) => Err(PersistError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

// ---------------------------------------------------------------------------
// CallbackHook
// ---------------------------------------------------------------------------

/// One-shot completion handle handed to a [`CallbackHook`] function.
///
/// Exactly one of [`Completion::succeed`] / [`Completion::fail`] should be
/// called. Dropping the handle without calling either fails the save.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Result<(), PersistError>>,
}

impl Completion {
    pub fn succeed(self) {
        self.complete(Ok(()));
    }

    pub fn fail(self, reason: impl Display) {
        self.complete(Err(PersistError::failed(reason)));
    }

    pub fn complete(self, result: Result<(), PersistError>) {
        // The receiver is gone only if the mutation future was dropped.
        let _ = self.tx.send(result);
    }
}

/// Adapts a callback-style save function.
///
/// The function receives the affected ids and a [`Completion`]; it may finish
/// synchronously or move the handle into another task and complete later.
pub struct CallbackHook<F> {
    save: F,
}

impl<F> CallbackHook<F>
where
    F: Fn(Vec<ResourceId>, Completion) + Send + Sync,
{
    pub fn new(save: F) -> Self {
        Self { save }
    }
}

#[async_trait]
impl<F> PersistenceHook for CallbackHook<F>
where
    F: Fn(Vec<ResourceId>, Completion) + Send + Sync,
{
    async fn save(&self, ids: &[ResourceId]) -> Result<(), PersistError> {
        let (tx, rx) = oneshot::channel();
        let completion = Completion { tx };
        let ids = ids.to_vec();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (self.save)(ids, completion))) {
            return Err(PersistError::Panicked(panic_message(payload.as_ref())));
        }
        rx.await.unwrap_or(Err(PersistError::Abandoned))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn ids(raw: &[&str]) -> Vec<ResourceId> {
        raw.iter().map(|s| ResourceId::from(*s)).collect()
    }

    #[tokio::test]
    async fn no_persistence_always_succeeds() {
        assert!(NoPersistence.save(&ids(&["a"])).await.is_ok());
        assert!(NoPersistence.save(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn sync_hook_sees_affected_ids() {
        let seen = Mutex::new(Vec::new());
        let hook = SyncHook::new(|ids: &[ResourceId]| -> Result<(), String> {
            seen.lock().unwrap().extend_from_slice(ids);
            Ok(())
        });
        hook.save(&ids(&["a", "b"])).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn sync_hook_error_becomes_failure() {
        let hook = SyncHook::new(|_: &[ResourceId]| Err("Save failure"));
        assert_eq!(
            hook.save(&ids(&["a"])).await,
            Err(PersistError::Failed("Save failure".into()))
        );
    }

    #[tokio::test]
    async fn sync_hook_panic_becomes_failure() {
        let hook = SyncHook::new(|_: &[ResourceId]| -> Result<(), String> {
            panic!("disk on fire");
        });
        assert_eq!(
            hook.save(&ids(&["a"])).await,
            Err(PersistError::Panicked("disk on fire".into()))
        );
    }

    #[tokio::test]
    async fn callback_hook_completes_later() {
        let hook = CallbackHook::new(|ids: Vec<ResourceId>, done: Completion| {
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                if ids.is_empty() {
                    done.fail("nothing to save");
                } else {
                    done.succeed();
                }
            });
        });
        assert!(hook.save(&ids(&["a"])).await.is_ok());
        assert_eq!(
            hook.save(&[]).await,
            Err(PersistError::Failed("nothing to save".into()))
        );
    }

    #[tokio::test]
    async fn callback_hook_dropped_completion_is_failure() {
        let hook = CallbackHook::new(|_: Vec<ResourceId>, done: Completion| drop(done));
        assert_eq!(hook.save(&ids(&["a"])).await, Err(PersistError::Abandoned));
    }

    #[tokio::test]
    async fn callback_hook_panic_is_failure() {
        let hook = CallbackHook::new(|_: Vec<ResourceId>, _done: Completion| panic!("boom"));
        assert!(matches!(
            hook.save(&ids(&["a"])).await,
            Err(PersistError::Panicked(_))
        ));
    }
}
