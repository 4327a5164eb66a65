use std::fmt;
use std::sync::Arc;

use rested_types::Resource;
use tracing::debug;

use crate::allowed::{AllowedMethods, Method};
use crate::config::{RightsConfig, Rule, Verb};
use crate::predicate::{LatchedPredicate, PredicateState};

/// Compiled decision for one verb.
enum Check<R, C> {
    Allow,
    Deny,
    Latched(Arc<LatchedPredicate<R, C>>),
}

impl<R, C> Check<R, C> {
    fn compile(verb: Verb, rule: Option<&Rule<R, C>>) -> Self {
        match rule {
            None | Some(Rule::Deny) => Self::Deny,
            Some(Rule::Allow) => Self::Allow,
            Some(Rule::Predicate(f)) => {
                Self::Latched(Arc::new(LatchedPredicate::new(verb, Arc::clone(f))))
            }
        }
    }

    fn run(&self, verb: Verb, ctx: &C, resource: &R) -> bool {
        match self {
            Self::Allow => true,
            Self::Deny => false,
            Self::Latched(p) => p.evaluate(verb, ctx, resource),
        }
    }

    fn share(&self) -> Self {
        match self {
            Self::Allow => Self::Allow,
            Self::Deny => Self::Deny,
            Self::Latched(p) => Self::Latched(Arc::clone(p)),
        }
    }
}

/// Per-collection rights, compiled from a [`RightsConfig`].
///
/// Predicate latches live as long as the policy.
pub struct RightsPolicy<R, C> {
    create: Check<R, C>,
    read: Check<R, C>,
    update: Check<R, C>,
    delete: Check<R, C>,
}

impl<R, C> RightsPolicy<R, C> {
    pub fn new(config: RightsConfig<R, C>) -> Self {
        match config {
            RightsConfig::All(rule) => {
                // One latch shared by every verb.
                let shared = Check::compile(Verb::Create, Some(&rule));
                Self {
                    create: shared.share(),
                    read: shared.share(),
                    update: shared.share(),
                    delete: shared,
                }
            }
            RightsConfig::PerVerb(rules) => Self {
                create: Check::compile(Verb::Create, rules.create.as_ref()),
                read: Check::compile(Verb::Read, rules.read.as_ref()),
                update: Check::compile(Verb::Update, rules.update.as_ref()),
                delete: Check::compile(Verb::Delete, rules.delete.as_ref()),
            },
        }
    }

    fn check(&self, verb: Verb) -> &Check<R, C> {
        match verb {
            Verb::Create => &self.create,
            Verb::Read => &self.read,
            Verb::Update => &self.update,
            Verb::Delete => &self.delete,
        }
    }

    /// Whether `ctx` may perform `verb` on `resource`.
    pub fn may(&self, verb: Verb, ctx: &C, resource: &R) -> bool {
        self.check(verb).run(verb, ctx, resource)
    }

    pub fn may_create(&self, ctx: &C, resource: &R) -> bool {
        self.may(Verb::Create, ctx, resource)
    }

    pub fn may_read(&self, ctx: &C, resource: &R) -> bool {
        self.may(Verb::Read, ctx, resource)
    }

    pub fn may_update(&self, ctx: &C, resource: &R) -> bool {
        self.may(Verb::Update, ctx, resource)
    }

    pub fn may_delete(&self, ctx: &C, resource: &R) -> bool {
        self.may(Verb::Delete, ctx, resource)
    }

    /// State of the predicate behind `verb`. Plain allow/deny rules are
    /// always `Active`.
    pub fn predicate_state(&self, verb: Verb) -> PredicateState {
        match self.check(verb) {
            Check::Latched(p) => p.state(),
            Check::Allow | Check::Deny => PredicateState::Active,
        }
    }
}

impl<R: Resource, C> RightsPolicy<R, C> {
    /// Methods `ctx` could use on `resource`, given the rights and the
    /// resource kind's capabilities.
    pub fn allowed_methods(&self, ctx: &C, resource: &R) -> AllowedMethods {
        let kind = R::KIND;
        let mut allowed = AllowedMethods::new();

        if self.may_read(ctx, resource) {
            allowed.insert(Method::Get);
            allowed.insert(Method::Head);
        }

        let create = self.may_create(ctx, resource);
        if create && kind.identity.generates_ids() {
            allowed.insert(Method::Post);
        }

        let update = kind.is_mutable() && self.may_update(ctx, resource);
        if (create && kind.identity.accepts_client_ids()) || update {
            allowed.insert(Method::Put);
        }
        if update {
            allowed.insert(Method::Patch);
        }

        if self.may_delete(ctx, resource) {
            allowed.insert(Method::Delete);
        }

        debug!(allowed = %allowed, "computed allowed methods");
        allowed
    }
}

impl<R, C> Default for RightsPolicy<R, C> {
    fn default() -> Self {
        Self::new(RightsConfig::default())
    }
}

impl<R, C> fmt::Debug for RightsPolicy<R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("RightsPolicy");
        for verb in Verb::ALL {
            let label = match self.check(verb) {
                Check::Allow => "allow".to_string(),
                Check::Deny => "deny".to_string(),
                Check::Latched(p) => format!("{:?}", p.state()),
            };
            s.field(verb.as_str(), &label);
        }
        s.finish()
    }
}
