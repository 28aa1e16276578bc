//! Error types for session operations.
//!
//! All errors are reported synchronously to the immediate caller; no
//! retries happen at this layer. The taxonomy is small and deliberate:
//!
//! - [`SessionError::StaleSession`]: the model epoch advanced under a
//!   live session — a correctness hazard, never silently ignored.
//! - [`SessionError::ResolutionUnavailable`]: the engine cannot produce a
//!   resolve state for the requested element.
//! - [`SessionError::NestedContextDependentSession`]: precondition
//!   violation on speculative-copy creation.
//! - [`SessionError::ElementNotFound`]: a structural precondition failed,
//!   e.g. no enclosing callable for an expression.
//! - [`SessionError::Engine`]: bridge for engine failures that are not a
//!   missing resolve state.
//!
//! Note that "no receiver resolves" in the receiver probe is a normal
//! negative result (`Ok(false)`), not an error.

use thiserror::Error;

use crate::engine::{ElementId, EngineError};

// ============================================================================
// Unified Error Type
// ============================================================================

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session's token was invalidated by a model mutation.
    ///
    /// Any object derived from the session is stale too; the caller must
    /// drop the session and build a new one against the current model.
    #[error("stale session: model epoch advanced (token issued at {issued_at}, now {current})")]
    StaleSession { issued_at: u64, current: u64 },

    /// The external engine cannot resolve state for the input element.
    #[error("resolution unavailable for {element}")]
    ResolutionUnavailable { element: ElementId },

    /// A context-dependent copy was requested from a session that is
    /// already context-dependent. Nesting speculative states is disallowed.
    #[error("cannot create a context-dependent copy of a context-dependent session")]
    NestedContextDependentSession,

    /// A structural precondition failed for the given element.
    #[error("no {what} found for {element}")]
    ElementNotFound {
        what: &'static str,
        element: ElementId,
    },

    /// Engine failure that is not a missing resolve state.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// ============================================================================
// Convenience Constructors
// ============================================================================

impl SessionError {
    /// Create a resolution-unavailable error for an element.
    pub fn resolution_unavailable(element: ElementId) -> Self {
        SessionError::ResolutionUnavailable { element }
    }

    /// Create an element-not-found error.
    pub fn element_not_found(what: &'static str, element: ElementId) -> Self {
        SessionError::ElementNotFound { what, element }
    }

    /// Whether this error means the session went stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, SessionError::StaleSession { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
