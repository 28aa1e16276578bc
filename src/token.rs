//! Validity tokens: epoch-scoped capability objects.
//!
//! A [`ValidityToken`] represents "the source model has not changed since
//! this token was issued". The model side owns an [`EpochSource`]; every
//! session captures a token at creation and re-checks it before any
//! stateful access. Advancing the epoch invalidates all outstanding tokens
//! at once, which turns "use of stale analysis results" from a silent bug
//! into an explicit, testable error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{SessionError, SessionResult};

// ============================================================================
// Epoch Source
// ============================================================================

/// Generation counter for the mutable source model.
///
/// The owner of the source tree holds one `EpochSource` and calls
/// [`advance`](EpochSource::advance) whenever the tree mutates (or when a
/// read-confinement scope ends). Tokens issued before the advance become
/// invalid; tokens are never "repaired".
///
/// Cloning is cheap and shares the underlying counter, so the model owner
/// can hand clones to whatever component drives change notifications.
#[derive(Debug, Clone, Default)]
pub struct EpochSource {
    epoch: Arc<AtomicU64>,
}

impl EpochSource {
    /// Create a new epoch source starting at epoch zero.
    pub fn new() -> Self {
        EpochSource::default()
    }

    /// Issue a token bound to the current epoch.
    pub fn issue(&self) -> ValidityToken {
        ValidityToken {
            epoch: Arc::clone(&self.epoch),
            issued_at: self.epoch.load(Ordering::Acquire),
        }
    }

    /// Advance the epoch, invalidating every outstanding token.
    ///
    /// Returns the new epoch value.
    pub fn advance(&self) -> u64 {
        let next = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(epoch = next, "source model epoch advanced");
        next
    }

    /// The current epoch value.
    pub fn current(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}

// ============================================================================
// Validity Token
// ============================================================================

/// Capability object held by a session and all of its derived views.
///
/// A token is pure data: checking it has no side effects, and invalidation
/// is driven solely by the [`EpochSource`] it was issued from. Clones share
/// the issuing epoch, so a session and its context-dependent copies go
/// stale together.
#[derive(Debug, Clone)]
pub struct ValidityToken {
    epoch: Arc<AtomicU64>,
    issued_at: u64,
}

impl ValidityToken {
    /// Whether the epoch has not advanced since this token was issued.
    pub fn is_valid(&self) -> bool {
        self.epoch.load(Ordering::Acquire) == self.issued_at
    }

    /// Assert the token is still valid.
    ///
    /// Fails with [`SessionError::StaleSession`] once the epoch has
    /// advanced. Every stateful accessor on a session or derived object
    /// calls this as its first step.
    pub fn ensure_valid(&self) -> SessionResult<()> {
        let current = self.epoch.load(Ordering::Acquire);
        if current != self.issued_at {
            return Err(SessionError::StaleSession {
                issued_at: self.issued_at,
                current,
            });
        }
        Ok(())
    }

    /// The epoch this token was issued at.
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_valid() {
        let epochs = EpochSource::new();
        let token = epochs.issue();

        assert!(token.is_valid());
        assert!(token.ensure_valid().is_ok());
    }

    #[test]
    fn advance_invalidates_outstanding_tokens() {
        let epochs = EpochSource::new();
        let token = epochs.issue();

        epochs.advance();

        assert!(!token.is_valid());
        assert!(matches!(
            token.ensure_valid(),
            Err(SessionError::StaleSession {
                issued_at: 0,
                current: 1,
            })
        ));
    }

    #[test]
    fn token_issued_after_advance_is_valid() {
        let epochs = EpochSource::new();
        epochs.advance();
        epochs.advance();

        let token = epochs.issue();
        assert!(token.is_valid());
        assert_eq!(token.issued_at(), 2);
    }

    #[test]
    fn cloned_token_goes_stale_with_original() {
        let epochs = EpochSource::new();
        let token = epochs.issue();
        let clone = token.clone();

        epochs.advance();

        assert!(!token.is_valid());
        assert!(!clone.is_valid());
    }

    #[test]
    fn cloned_source_shares_counter() {
        let epochs = EpochSource::new();
        let other = epochs.clone();
        let token = epochs.issue();

        other.advance();

        assert_eq!(epochs.current(), 1);
        assert!(!token.is_valid());
    }

    #[test]
    fn checking_a_token_has_no_side_effects() {
        let epochs = EpochSource::new();
        let token = epochs.issue();

        for _ in 0..3 {
            assert!(token.is_valid());
        }
        assert_eq!(epochs.current(), 0);
    }
}
