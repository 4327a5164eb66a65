use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use tracing::{debug, error};

use crate::config::Verb;
use crate::error::{GateError, PredicateError};

/// A user-supplied rights predicate over a caller context `C` and resource `R`.
pub type PredicateFn<R, C> = dyn Fn(&C, &R) -> Result<bool, PredicateError> + Send + Sync;

/// Lifecycle of a predicate. `Active -> Broken` is the only transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateState {
    Active,
    Broken(GateError),
}

impl PredicateState {
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken(_))
    }
}

/// A predicate that fails closed.
///
/// The first error or panic is recorded and every later evaluation returns
/// `false` without calling the predicate again.
pub struct LatchedPredicate<R, C> {
    verb: Verb,
    f: Arc<PredicateFn<R, C>>,
    broken: OnceLock<GateError>,
}

impl<R, C> LatchedPredicate<R, C> {
    pub fn new(verb: Verb, f: Arc<PredicateFn<R, C>>) -> Self {
        Self {
            verb,
            f,
            broken: OnceLock::new(),
        }
    }

    pub fn state(&self) -> PredicateState {
        match self.broken.get() {
            Some(err) => PredicateState::Broken(err.clone()),
            None => PredicateState::Active,
        }
    }

    /// Evaluate for `verb`. `verb` only labels the failure if this call is
    /// the one that breaks the latch.
    pub fn evaluate(&self, verb: Verb, ctx: &C, resource: &R) -> bool {
        if self.broken.get().is_some() {
            return false;
        }

        let failure = match catch_unwind(AssertUnwindSafe(|| (self.f)(ctx, resource))) {
            Ok(Ok(decision)) => {
                debug!(%verb, decision, "rights predicate evaluated");
                return decision;
            }
            Ok(Err(err)) => GateError::PredicateFailed {
                verb,
                reason: err.to_string(),
            },
            Err(payload) => GateError::PredicatePanicked {
                verb,
                reason: panic_message(payload.as_ref()),
            },
        };

        if self.broken.set(failure.clone()).is_ok() {
            error!(
                configured_for = %self.verb,
                error = %failure,
                "rights predicate broken, denying from now on"
            );
        }
        false
    }
}

impl<R, C> fmt::Debug for LatchedPredicate<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatchedPredicate")
            .field("verb", &self.verb)
            .field("state", &self.state())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
