//! Per-session completion-context cache.
//!
//! Memoizes the engine-built resolution context per (containing file,
//! enclosing callable) key. Building a context is expensive, so the cache
//! guarantees at-most-one build per key even when several threads ask for
//! the same key at once: each key gets a slot, and the slot's lock is held
//! for the duration of the first build (single-flight). Distinct keys
//! build in parallel.
//!
//! Entries are never invalidated mid-session; keys are scoped to one
//! session's lifetime and the whole cache drops with it. Builder errors
//! are returned to the caller but not memoized, so a later call may retry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::engine::{CallableId, CompletionContext, FileId};
use crate::error::SessionResult;

type Slot = Arc<Mutex<Option<Arc<CompletionContext>>>>;

/// Single-flight memo from (file, enclosing callable) to a completion
/// context.
#[derive(Debug, Default)]
pub struct CompletionContextCache {
    slots: Mutex<HashMap<(FileId, CallableId), Slot>>,
}

impl CompletionContextCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        CompletionContextCache::default()
    }

    /// Return the memoized context for the key, building it once if absent.
    ///
    /// Concurrent calls with the same key during construction block on the
    /// slot and observe the single built value; they never trigger a
    /// duplicate build.
    pub fn get_or_build<F>(
        &self,
        file: FileId,
        callable: CallableId,
        build: F,
    ) -> SessionResult<Arc<CompletionContext>>
    where
        F: FnOnce() -> SessionResult<CompletionContext>,
    {
        let slot = {
            let mut slots = self.slots.lock().expect("completion cache lock poisoned");
            Arc::clone(slots.entry((file, callable)).or_default())
        };

        // The map lock is released before building, so only callers of
        // this key serialize here.
        let mut guard = slot.lock().expect("completion slot lock poisoned");
        if let Some(context) = guard.as_ref() {
            debug!(%file, %callable, "completion context cache hit");
            return Ok(Arc::clone(context));
        }

        debug!(%file, %callable, "building completion context");
        let built = Arc::new(build()?);
        *guard = Some(Arc::clone(&built));
        Ok(built)
    }

    /// Number of contexts built so far.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().expect("completion cache lock poisoned");
        slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .expect("completion slot lock poisoned")
                    .is_some()
            })
            .count()
    }

    /// Whether no context has been built yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
