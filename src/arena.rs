//! Scope arena: keep-alive storage for scope objects.
//!
//! Other components refer to scopes by [`ScopeHandle`] and resolve the
//! handle through the arena on each use, so nothing can dangle: the arena
//! is the sole owner, it lives exactly as long as its session, and handles
//! from a dead session have no arena left to resolve against.
//!
//! The arena guarantees liveness, not uniqueness: registration appends
//! unconditionally, duplicates are allowed, and there is no removal. It
//! grows monotonically until the session is dropped.

use std::sync::Mutex;

use tracing::trace;

use crate::engine::ScopeData;

// ============================================================================
// Scope Handle
// ============================================================================

/// Index of a scope registered in a session's [`ScopeArena`].
///
/// Handles are only meaningful for the arena that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeHandle(u32);

impl ScopeHandle {
    /// The arena slot this handle refers to.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// Scope Arena
// ============================================================================

/// Append-only arena owning scope objects for one session's lifetime.
///
/// Any sub-provider of the owning session may register scopes; the arena
/// is never shared across sessions.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Mutex<Vec<ScopeData>>,
}

impl ScopeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        ScopeArena::default()
    }

    /// Register a scope, returning its handle.
    ///
    /// Appends unconditionally: registering the same scope twice yields
    /// two handles to two copies.
    pub fn register(&self, scope: ScopeData) -> ScopeHandle {
        let mut scopes = self.scopes.lock().expect("scope arena lock poisoned");
        let handle = ScopeHandle(scopes.len() as u32);
        trace!(handle = handle.index(), owner = %scope.owner, "scope registered");
        scopes.push(scope);
        handle
    }

    /// Resolve a handle to the scope it refers to.
    ///
    /// Returns `None` for a handle this arena never issued.
    pub fn get(&self, handle: ScopeHandle) -> Option<ScopeData> {
        let scopes = self.scopes.lock().expect("scope arena lock poisoned");
        scopes.get(handle.index()).cloned()
    }

    /// Number of registered scopes.
    pub fn len(&self) -> usize {
        self.scopes.lock().expect("scope arena lock poisoned").len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ElementId, ScopeKind};

    fn block_scope(owner: u64) -> ScopeData {
        ScopeData {
            kind: ScopeKind::Block,
            owner: ElementId::new(owner),
        }
    }

    #[test]
    fn register_returns_resolvable_handle() {
        let arena = ScopeArena::new();
        let handle = arena.register(block_scope(1));

        assert_eq!(arena.get(handle), Some(block_scope(1)));
    }

    #[test]
    fn duplicates_are_allowed() {
        let arena = ScopeArena::new();
        let first = arena.register(block_scope(7));
        let second = arena.register(block_scope(7));

        assert_ne!(first, second);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(first), arena.get(second));
    }

    #[test]
    fn growth_is_monotonic() {
        let arena = ScopeArena::new();
        assert!(arena.is_empty());

        for i in 0..5 {
            let handle = arena.register(block_scope(i));
            assert_eq!(handle.index(), i as usize);
        }
        assert_eq!(arena.len(), 5);
    }

    #[test]
    fn foreign_handle_resolves_to_none() {
        let arena = ScopeArena::new();
        let other = ScopeArena::new();
        let handle = other.register(block_scope(1));
        // `handle` has index 0 but this arena is empty.
        assert_eq!(arena.get(handle), None);
    }
}
