//! Analysis sessions: the per-request semantic facade.
//!
//! A session binds one anchor element, one resolve state from the external
//! engine, and one validity token. Sub-providers are constructed lazily
//! (once, single-flight) and stay identity-stable for the session's
//! lifetime; all of them re-check the token on every query.
//!
//! Sessions come in two flavors: a *primary* session tied to the real
//! resolution state, and a *context-dependent* session tied to a
//! speculative state built for one completion request. A
//! context-dependent session refuses to produce another copy — nesting
//! speculative states is disallowed.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::arena::ScopeArena;
use crate::cache::CompletionContextCache;
use crate::engine::{ElementId, EngineError, ResolveEngine, ResolveStateId};
use crate::error::{SessionError, SessionResult};
use crate::providers::{
    CallResolver, ContainingDeclarationProvider, DiagnosticProvider, ScopeProvider,
    SymbolProvider, TypeProvider,
};
use crate::token::{EpochSource, ValidityToken};

#[cfg(feature = "receiver-probe")]
use crate::engine::{CallableId, FileId};

// ============================================================================
// Session Kind
// ============================================================================

/// Which resolution state a session is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Tied to the real, current resolution state.
    Primary,
    /// Tied to a speculative state built for one completion request.
    ContextDependent,
}

// ============================================================================
// Session Options
// ============================================================================

/// Options for creating a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Label used in log records for this session.
    pub label: Option<String>,
    /// Construct all sub-providers eagerly at session creation.
    pub precache_providers: bool,
}

impl SessionOptions {
    /// Create default options.
    pub fn new() -> Self {
        SessionOptions::default()
    }

    /// Set the log label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Construct all sub-providers eagerly.
    pub fn with_precached_providers(mut self) -> Self {
        self.precache_providers = true;
        self
    }
}

// ============================================================================
// Session Core
// ============================================================================

/// State shared between a session and its sub-providers.
///
/// Providers hold this by `Arc`; the session's provider slots live outside
/// the core, so there is no reference cycle.
pub(crate) struct SessionCore {
    pub(crate) engine: Arc<dyn ResolveEngine>,
    pub(crate) token: ValidityToken,
    pub(crate) anchor: ElementId,
    pub(crate) state: ResolveStateId,
    pub(crate) kind: SessionKind,
    pub(crate) scopes: ScopeArena,
    pub(crate) completion_contexts: CompletionContextCache,
}

// ============================================================================
// Analysis Session
// ============================================================================

/// Facade over the external engine for one source element.
///
/// All accessors fail with [`SessionError::StaleSession`] once the model
/// epoch advances; drop the session and build a new one in that case.
pub struct AnalysisSession {
    core: Arc<SessionCore>,
    scope: OnceLock<ScopeProvider>,
    types: OnceLock<TypeProvider>,
    diagnostics: OnceLock<DiagnosticProvider>,
    calls: OnceLock<CallResolver>,
    symbols: OnceLock<SymbolProvider>,
    containing: OnceLock<ContainingDeclarationProvider>,
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("anchor", &self.core.anchor)
            .field("state", &self.core.state)
            .field("kind", &self.core.kind)
            .finish_non_exhaustive()
    }
}

impl AnalysisSession {
    /// Create a primary session for a source element.
    ///
    /// Resolves the engine's state for `element` and issues a fresh token
    /// from `epochs`. Fails with [`SessionError::ResolutionUnavailable`]
    /// when the engine cannot produce a resolve state, e.g. for an element
    /// detached from any source root.
    pub fn for_element(
        engine: Arc<dyn ResolveEngine>,
        epochs: &EpochSource,
        element: ElementId,
    ) -> SessionResult<Self> {
        Self::for_element_with(engine, epochs, element, SessionOptions::default())
    }

    /// Create a primary session with explicit options.
    pub fn for_element_with(
        engine: Arc<dyn ResolveEngine>,
        epochs: &EpochSource,
        element: ElementId,
        options: SessionOptions,
    ) -> SessionResult<Self> {
        let state = match engine.resolve_state(element) {
            Ok(state) => state,
            Err(EngineError::StateUnavailable { .. }) | Err(EngineError::DetachedElement { .. }) => {
                return Err(SessionError::resolution_unavailable(element));
            }
            Err(err) => return Err(err.into()),
        };

        let token = epochs.issue();
        debug!(
            anchor = %element,
            %state,
            epoch = token.issued_at(),
            label = options.label.as_deref().unwrap_or("analysis"),
            "opened primary session"
        );

        let session = Self::assemble(engine, token, element, state, SessionKind::Primary);
        if options.precache_providers {
            session.precache()?;
        }
        Ok(session)
    }

    fn assemble(
        engine: Arc<dyn ResolveEngine>,
        token: ValidityToken,
        anchor: ElementId,
        state: ResolveStateId,
        kind: SessionKind,
    ) -> Self {
        AnalysisSession {
            core: Arc::new(SessionCore {
                engine,
                token,
                anchor,
                state,
                kind,
                scopes: ScopeArena::new(),
                completion_contexts: CompletionContextCache::new(),
            }),
            scope: OnceLock::new(),
            types: OnceLock::new(),
            diagnostics: OnceLock::new(),
            calls: OnceLock::new(),
            symbols: OnceLock::new(),
            containing: OnceLock::new(),
        }
    }

    fn precache(&self) -> SessionResult<()> {
        self.scope_provider()?;
        self.type_provider()?;
        self.diagnostic_provider()?;
        self.call_resolver()?;
        self.symbol_provider()?;
        self.containing_declaration_provider()?;
        Ok(())
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// The anchor element this session was built for.
    pub fn anchor(&self) -> ElementId {
        self.core.anchor
    }

    /// Whether this session is primary or context-dependent.
    pub fn kind(&self) -> SessionKind {
        self.core.kind
    }

    /// The validity token the session is bound to.
    pub fn token(&self) -> &ValidityToken {
        &self.core.token
    }

    /// The engine resolve state backing this session.
    pub fn resolve_state(&self) -> ResolveStateId {
        self.core.state
    }

    /// Number of scopes registered in the session's arena so far.
    pub fn registered_scopes(&self) -> SessionResult<usize> {
        self.core.token.ensure_valid()?;
        Ok(self.core.scopes.len())
    }

    // ========================================================================
    // Sub-Provider Accessors
    // ========================================================================

    /// The scope provider, constructed on first access.
    pub fn scope_provider(&self) -> SessionResult<&ScopeProvider> {
        self.core.token.ensure_valid()?;
        Ok(self
            .scope
            .get_or_init(|| ScopeProvider::new(Arc::clone(&self.core))))
    }

    /// The type provider, constructed on first access.
    pub fn type_provider(&self) -> SessionResult<&TypeProvider> {
        self.core.token.ensure_valid()?;
        Ok(self
            .types
            .get_or_init(|| TypeProvider::new(Arc::clone(&self.core))))
    }

    /// The diagnostic provider, constructed on first access.
    pub fn diagnostic_provider(&self) -> SessionResult<&DiagnosticProvider> {
        self.core.token.ensure_valid()?;
        Ok(self
            .diagnostics
            .get_or_init(|| DiagnosticProvider::new(Arc::clone(&self.core))))
    }

    /// The call resolver, constructed on first access.
    pub fn call_resolver(&self) -> SessionResult<&CallResolver> {
        self.core.token.ensure_valid()?;
        Ok(self
            .calls
            .get_or_init(|| CallResolver::new(Arc::clone(&self.core))))
    }

    /// The symbol provider, constructed on first access.
    pub fn symbol_provider(&self) -> SessionResult<&SymbolProvider> {
        self.core.token.ensure_valid()?;
        Ok(self
            .symbols
            .get_or_init(|| SymbolProvider::new(Arc::clone(&self.core))))
    }

    /// The containing-declaration provider, constructed on first access.
    pub fn containing_declaration_provider(
        &self,
    ) -> SessionResult<&ContainingDeclarationProvider> {
        self.core.token.ensure_valid()?;
        Ok(self
            .containing
            .get_or_init(|| ContainingDeclarationProvider::new(Arc::clone(&self.core))))
    }

    // ========================================================================
    // Context-Dependent Copies
    // ========================================================================

    /// Build a session sharing this session's anchor and token, backed by
    /// a temporary resolution state for speculative completion analysis.
    ///
    /// Fails with [`SessionError::NestedContextDependentSession`] when
    /// called on a session that is already context-dependent; nothing is
    /// constructed in that case.
    pub fn create_context_dependent_copy(&self) -> SessionResult<AnalysisSession> {
        self.core.token.ensure_valid()?;
        if self.core.kind == SessionKind::ContextDependent {
            return Err(SessionError::NestedContextDependentSession);
        }

        let state = self
            .core
            .engine
            .completion_state(self.core.anchor, self.core.state)?;
        debug!(anchor = %self.core.anchor, %state, "opened context-dependent copy");

        Ok(Self::assemble(
            Arc::clone(&self.core.engine),
            self.core.token.clone(),
            self.core.anchor,
            state,
            SessionKind::ContextDependent,
        ))
    }

    // ========================================================================
    // Receiver Probe (temporary diagnostic hook)
    // ========================================================================

    /// Try to resolve `candidate` at `reference` against each receiver in
    /// scope: the no-receiver case first, then implicit receivers from
    /// innermost to outermost. Stops at the first attempt that is
    /// applicable and free of diagnostic errors.
    ///
    /// Returns `Ok(false)` when no receiver yields a success; that is a
    /// normal negative result. Fails with
    /// [`SessionError::ElementNotFound`] when `reference` has no
    /// enclosing callable.
    #[cfg(feature = "receiver-probe")]
    pub fn resolve_and_check_receivers(
        &self,
        candidate: CallableId,
        file: FileId,
        reference: ElementId,
        explicit_receiver: Option<ElementId>,
    ) -> SessionResult<bool> {
        self.call_resolver()?
            .check_receivers(candidate, file, reference, explicit_receiver)
    }
}

// ============================================================================
// Tests
// ============================================================================
