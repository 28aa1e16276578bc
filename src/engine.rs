//! The external resolution engine seam.
//!
//! All algorithmic weight — name resolution, type inference, incremental
//! semantic-model construction — lives behind [`ResolveEngine`]. This
//! module defines that trait plus the opaque handles and value types that
//! cross it. Session code passes the handles through without interpreting
//! them; only the engine knows what they mean.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Opaque Handles
// ============================================================================

/// Handle to a source element (a node in the host's source tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Create a new element ID.
    pub fn new(id: u64) -> Self {
        ElementId(id)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "elem_{}", self.0)
    }
}

/// Handle to a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new file ID.
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file_{}", self.0)
    }
}

/// Handle to a callable symbol (function, method, constructor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallableId(pub u64);

impl CallableId {
    /// Create a new callable ID.
    pub fn new(id: u64) -> Self {
        CallableId(id)
    }
}

impl fmt::Display for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callable_{}", self.0)
    }
}

/// Handle to a resolved symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u64);

impl SymbolId {
    /// Create a new symbol ID.
    pub fn new(id: u64) -> Self {
        SymbolId(id)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym_{}", self.0)
    }
}

/// Handle to a resolved type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u64);

impl TypeId {
    /// Create a new type ID.
    pub fn new(id: u64) -> Self {
        TypeId(id)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type_{}", self.0)
    }
}

/// Handle to an implicit receiver candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReceiverId(pub u64);

impl ReceiverId {
    /// Create a new receiver ID.
    pub fn new(id: u64) -> Self {
        ReceiverId(id)
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recv_{}", self.0)
    }
}

/// Handle to an engine-side resolve state: the engine's snapshot of
/// semantic bindings for a region of source.
///
/// A session holds exactly one of these. Context-dependent sessions hold a
/// different, temporary state produced by
/// [`ResolveEngine::completion_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolveStateId(pub u64);

impl ResolveStateId {
    /// Create a new resolve state ID.
    pub fn new(id: u64) -> Self {
        ResolveStateId(id)
    }
}

impl fmt::Display for ResolveStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state_{}", self.0)
    }
}

// ============================================================================
// Value Types
// ============================================================================

/// Kind of a lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// File/module level scope.
    Module,
    /// Scope introduced by a type or object declaration.
    Declaration,
    /// Body of a function, method, or lambda.
    Callable,
    /// Plain block scope.
    Block,
}

/// Scope description returned by the engine and kept alive by the
/// session's scope arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeData {
    /// What kind of scope this is.
    pub kind: ScopeKind,
    /// The element that introduces the scope.
    pub owner: ElementId,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Hint,
}

/// A single diagnostic attached to a source element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How severe the finding is.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// The element the diagnostic is attached to.
    pub element: ElementId,
}

impl Diagnostic {
    /// Whether this diagnostic is an error (as opposed to a warning or hint).
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Receiver used for a single-candidate resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallReceiver {
    /// No implicit receiver: the candidate must be directly callable.
    None,
    /// One candidate from the implicit receiver tower.
    Implicit(ReceiverId),
}

/// Outcome of a single-candidate resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOutcome {
    /// The candidate was applicable to the call site.
    pub applicable: bool,
    /// Resolution completed but produced diagnostic errors.
    pub has_errors: bool,
}

impl CandidateOutcome {
    /// An attempt counts as a success only when the candidate applied and
    /// resolution completed without diagnostic errors.
    pub fn is_success(&self) -> bool {
        self.applicable && !self.has_errors
    }
}

/// Precomputed resolution context for one (file, enclosing callable) pair.
///
/// Built by [`ResolveEngine::completion_context`] and memoized per session
/// by the completion-context cache. The embedded state is the one the
/// context was built against; tower and candidate queries go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionContext {
    /// Resolve state the context was built against.
    pub state: ResolveStateId,
    /// Containing file.
    pub file: FileId,
    /// Enclosing callable the context is scoped to.
    pub callable: CallableId,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by the external resolution engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine cannot produce a resolve state for the element, e.g.
    /// because the element is not attached to any analyzable source root.
    #[error("no resolve state available for {element}")]
    StateUnavailable { element: ElementId },

    /// The element handle no longer refers to a live node in the source
    /// tree.
    #[error("{element} is detached from the source tree")]
    DetachedElement { element: ElementId },

    /// Engine-internal failure (bug or unexpected state on the engine side).
    #[error("engine internal error: {message}")]
    Internal { message: String },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Engine Trait
// ============================================================================

/// Capabilities the external resolution engine must provide.
///
/// Sessions forward every semantic query here, always passing the resolve
/// state they were built against. Implementations are expected to be
/// internally synchronized: this crate calls the engine from whichever
/// thread holds the session, with no extra locking.
pub trait ResolveEngine: Send + Sync {
    /// Get or build the resolve state for an element.
    fn resolve_state(&self, element: ElementId) -> EngineResult<ResolveStateId>;

    /// Get or build a temporary, speculative resolve state for completion
    /// analysis over `element`, layered on `base`. Must not affect the
    /// state `base` refers to.
    fn completion_state(
        &self,
        element: ElementId,
        base: ResolveStateId,
    ) -> EngineResult<ResolveStateId>;

    /// Build the resolution context for one (file, enclosing callable)
    /// pair. Expensive; callers memoize through the per-session cache.
    fn completion_context(
        &self,
        state: ResolveStateId,
        file: FileId,
        callable: CallableId,
    ) -> EngineResult<CompletionContext>;

    /// The innermost enclosing callable of `element`, if any.
    fn enclosing_callable(
        &self,
        state: ResolveStateId,
        element: ElementId,
    ) -> EngineResult<Option<CallableId>>;

    /// Implicit receivers in scope at `reference`, innermost first.
    fn implicit_receiver_tower(
        &self,
        context: &CompletionContext,
        reference: ElementId,
    ) -> EngineResult<Vec<ReceiverId>>;

    /// Check one specific candidate against a call site (single-candidate
    /// resolution, not full overload resolution).
    fn resolve_single_candidate(
        &self,
        context: &CompletionContext,
        candidate: CallableId,
        receiver: CallReceiver,
        explicit_receiver: Option<ElementId>,
    ) -> EngineResult<CandidateOutcome>;

    /// Lexical scopes visible at `element`, innermost first.
    fn scopes_at(&self, state: ResolveStateId, element: ElementId)
        -> EngineResult<Vec<ScopeData>>;

    /// The resolved type of an expression or declaration.
    fn type_of(&self, state: ResolveStateId, element: ElementId) -> EngineResult<TypeId>;

    /// Diagnostics for a whole file.
    fn diagnostics_for(
        &self,
        state: ResolveStateId,
        file: FileId,
    ) -> EngineResult<Vec<Diagnostic>>;

    /// The symbol a reference element resolves to, if any.
    fn symbol_at(
        &self,
        state: ResolveStateId,
        element: ElementId,
    ) -> EngineResult<Option<SymbolId>>;

    /// The nearest enclosing declaration of `element`, if any.
    fn containing_declaration(
        &self,
        state: ResolveStateId,
        element: ElementId,
    ) -> EngineResult<Option<ElementId>>;

    /// Full call resolution for a reference, if it is a call site.
    fn resolve_call(
        &self,
        state: ResolveStateId,
        reference: ElementId,
    ) -> EngineResult<Option<CallableId>>;
}

// ============================================================================
// Tests
// ============================================================================
