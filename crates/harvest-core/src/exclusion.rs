//! Exclusion tokens: at most one live attempt per lock key.
//!
//! A lock key is the actor plus a scope chosen by the discipline. With the
//! default [`LockScope::Shared`] an actor can run one attempt of any
//! discipline at a time; a discipline that returns its own
//! [`LockScope::Named`] scope only excludes attempts of the same kind.

use std::collections::BTreeMap;

use harvest_types::{ActorId, AttemptId};

/// The discipline-supplied part of a lock key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockScope {
    /// Keyed by the actor alone.
    Shared,
    /// Keyed by the actor and a discipline-chosen name.
    Named(&'static str),
}

/// Identifies what an exclusion token guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockKey {
    /// The actor holding the lock.
    pub actor: ActorId,
    /// The scope within that actor.
    pub scope: LockScope,
}

/// Proof that an attempt owns its lock key.
///
/// Tokens cannot be cloned; releasing one consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct ExclusionToken {
    key: LockKey,
    attempt: AttemptId,
}

impl ExclusionToken {
    /// The guarded key.
    pub const fn key(&self) -> LockKey {
        self.key
    }

    /// The attempt holding the key.
    pub const fn attempt(&self) -> AttemptId {
        self.attempt
    }
}

/// Registry of held lock keys.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRegistry {
    held: BTreeMap<LockKey, AttemptId>,
}

impl ExclusionRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            held: BTreeMap::new(),
        }
    }

    /// Take `key` for `attempt`, or return `None` if it is already held.
    pub fn try_acquire(&mut self, key: LockKey, attempt: AttemptId) -> Option<ExclusionToken> {
        if self.held.contains_key(&key) {
            return None;
        }
        self.held.insert(key, attempt);
        Some(ExclusionToken { key, attempt })
    }

    /// Give a key back. Returns `false` if the registry did not record this
    /// token as the holder.
    pub fn release(&mut self, token: ExclusionToken) -> bool {
        match self.held.get(&token.key) {
            Some(holder) if *holder == token.attempt => {
                self.held.remove(&token.key);
                true
            }
            _ => false,
        }
    }

    /// Whether `key` is currently held.
    pub fn is_held(&self, key: &LockKey) -> bool {
        self.held.contains_key(key)
    }

    /// The attempt holding `key`, if any.
    pub fn holder(&self, key: &LockKey) -> Option<AttemptId> {
        self.held.get(key).copied()
    }

    /// Number of held keys.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Whether no key is held.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key(actor: ActorId, scope: LockScope) -> LockKey {
        LockKey { actor, scope }
    }

    #[test]
    fn second_acquire_is_refused() {
        let mut registry = ExclusionRegistry::new();
        let actor = ActorId::new();
        let first = registry.try_acquire(key(actor, LockScope::Shared), AttemptId::new());
        assert!(first.is_some());
        let second = registry.try_acquire(key(actor, LockScope::Shared), AttemptId::new());
        assert!(second.is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn release_frees_key_immediately() {
        let mut registry = ExclusionRegistry::new();
        let actor = ActorId::new();
        let token = registry
            .try_acquire(key(actor, LockScope::Named("fishing")), AttemptId::new())
            .unwrap();
        assert!(registry.release(token));
        assert!(!registry.is_held(&key(actor, LockScope::Named("fishing"))));
        assert!(registry
            .try_acquire(key(actor, LockScope::Named("fishing")), AttemptId::new())
            .is_some());
    }

    #[test]
    fn scopes_are_independent() {
        let mut registry = ExclusionRegistry::new();
        let actor = ActorId::new();
        let fishing = registry.try_acquire(key(actor, LockScope::Named("fishing")), AttemptId::new());
        let mining = registry.try_acquire(key(actor, LockScope::Named("mining")), AttemptId::new());
        assert!(fishing.is_some());
        assert!(mining.is_some());
    }

    #[test]
    fn actors_are_independent() {
        let mut registry = ExclusionRegistry::new();
        let a = registry.try_acquire(key(ActorId::new(), LockScope::Shared), AttemptId::new());
        let b = registry.try_acquire(key(ActorId::new(), LockScope::Shared), AttemptId::new());
        assert!(a.is_some() && b.is_some());
    }

    #[test]
    fn holder_reports_attempt() {
        let mut registry = ExclusionRegistry::new();
        let actor = ActorId::new();
        let attempt = AttemptId::new();
        let _token = registry.try_acquire(key(actor, LockScope::Shared), attempt).unwrap();
        assert_eq!(registry.holder(&key(actor, LockScope::Shared)), Some(attempt));
    }
}
