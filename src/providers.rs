//! Sub-providers: capability-specific views over a session.
//!
//! Each provider is a thin adapter holding a back-reference to the owning
//! session's core. Every query re-checks the session token, then forwards
//! to the external engine with the session's resolve state. Providers hold
//! no other state, so memoizing them (which the session does) is a
//! performance concern, not a correctness one.

use std::sync::Arc;

use tracing::trace;

use crate::arena::ScopeHandle;
use crate::engine::{CallableId, Diagnostic, ElementId, FileId, ScopeData, SymbolId, TypeId};
use crate::error::SessionResult;
use crate::session::SessionCore;

#[cfg(feature = "receiver-probe")]
use crate::engine::CallReceiver;
#[cfg(feature = "receiver-probe")]
use crate::error::SessionError;
#[cfg(feature = "receiver-probe")]
use tracing::debug;

// ============================================================================
// Scope Provider
// ============================================================================

/// Queries over the lexical scopes visible at a source position.
///
/// Scope objects returned by the engine are registered in the session's
/// arena; callers receive handles and resolve them back through this
/// provider, so scope data stays alive exactly as long as the session.
pub struct ScopeProvider {
    core: Arc<SessionCore>,
}

impl std::fmt::Debug for ScopeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeProvider")
            .field("anchor", &self.core.anchor)
            .field("state", &self.core.state)
            .finish_non_exhaustive()
    }
}

impl ScopeProvider {
    pub(crate) fn new(core: Arc<SessionCore>) -> Self {
        ScopeProvider { core }
    }

    /// Scopes visible at `element`, innermost first, as arena handles.
    pub fn scopes_at(&self, element: ElementId) -> SessionResult<Vec<ScopeHandle>> {
        self.core.token.ensure_valid()?;
        trace!(%element, "querying scopes");
        let scopes = self.core.engine.scopes_at(self.core.state, element)?;
        Ok(scopes
            .into_iter()
            .map(|scope| self.core.scopes.register(scope))
            .collect())
    }

    /// Resolve a handle returned by [`scopes_at`](Self::scopes_at).
    ///
    /// `None` for a handle this session never issued.
    pub fn resolve(&self, handle: ScopeHandle) -> SessionResult<Option<ScopeData>> {
        self.core.token.ensure_valid()?;
        Ok(self.core.scopes.get(handle))
    }
}

// ============================================================================
// Type Provider
// ============================================================================

/// Type queries.
pub struct TypeProvider {
    core: Arc<SessionCore>,
}

impl TypeProvider {
    pub(crate) fn new(core: Arc<SessionCore>) -> Self {
        TypeProvider { core }
    }

    /// The resolved type of an expression or declaration.
    pub fn type_of(&self, element: ElementId) -> SessionResult<TypeId> {
        self.core.token.ensure_valid()?;
        trace!(%element, "querying type");
        Ok(self.core.engine.type_of(self.core.state, element)?)
    }
}

// ============================================================================
// Diagnostic Provider
// ============================================================================

/// Diagnostics queries.
pub struct DiagnosticProvider {
    core: Arc<SessionCore>,
}

impl DiagnosticProvider {
    pub(crate) fn new(core: Arc<SessionCore>) -> Self {
        DiagnosticProvider { core }
    }

    /// All diagnostics for a file under the session's resolve state.
    pub fn diagnostics_for(&self, file: FileId) -> SessionResult<Vec<Diagnostic>> {
        self.core.token.ensure_valid()?;
        trace!(%file, "querying diagnostics");
        Ok(self.core.engine.diagnostics_for(self.core.state, file)?)
    }
}

// ============================================================================
// Call Resolver
// ============================================================================

/// Call-resolution queries.
pub struct CallResolver {
    core: Arc<SessionCore>,
}

impl CallResolver {
    pub(crate) fn new(core: Arc<SessionCore>) -> Self {
        CallResolver { core }
    }

    /// Resolve a call-site reference to its target callable, if any.
    pub fn resolve_call(&self, reference: ElementId) -> SessionResult<Option<CallableId>> {
        self.core.token.ensure_valid()?;
        trace!(%reference, "resolving call");
        Ok(self.core.engine.resolve_call(self.core.state, reference)?)
    }

    /// Probe `candidate` against the implicit receiver tower at
    /// `reference`: the no-receiver case first, then each implicit
    /// receiver innermost to outermost, stopping at the first attempt
    /// that is applicable and diagnostic-clean.
    #[cfg(feature = "receiver-probe")]
    pub(crate) fn check_receivers(
        &self,
        candidate: CallableId,
        file: FileId,
        reference: ElementId,
        explicit_receiver: Option<ElementId>,
    ) -> SessionResult<bool> {
        self.core.token.ensure_valid()?;

        let callable = self
            .core
            .engine
            .enclosing_callable(self.core.state, reference)?
            .ok_or_else(|| SessionError::element_not_found("enclosing callable", reference))?;

        let core = &self.core;
        let context = core.completion_contexts.get_or_build(file, callable, || {
            Ok(core.engine.completion_context(core.state, file, callable)?)
        })?;

        let outcome = self.core.engine.resolve_single_candidate(
            &context,
            candidate,
            CallReceiver::None,
            explicit_receiver,
        )?;
        debug!(%candidate, receiver = "none", success = outcome.is_success(), "receiver probe");
        if outcome.is_success() {
            return Ok(true);
        }

        for receiver in self
            .core
            .engine
            .implicit_receiver_tower(&context, reference)?
        {
            let outcome = self.core.engine.resolve_single_candidate(
                &context,
                candidate,
                CallReceiver::Implicit(receiver),
                explicit_receiver,
            )?;
            debug!(%candidate, %receiver, success = outcome.is_success(), "receiver probe");
            if outcome.is_success() {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

// ============================================================================
// Symbol Provider
// ============================================================================

/// Symbol queries.
pub struct SymbolProvider {
    core: Arc<SessionCore>,
}

impl SymbolProvider {
    pub(crate) fn new(core: Arc<SessionCore>) -> Self {
        SymbolProvider { core }
    }

    /// The symbol a reference element resolves to, if any.
    pub fn symbol_at(&self, element: ElementId) -> SessionResult<Option<SymbolId>> {
        self.core.token.ensure_valid()?;
        trace!(%element, "querying symbol");
        Ok(self.core.engine.symbol_at(self.core.state, element)?)
    }
}

// ============================================================================
// Containing Declaration Provider
// ============================================================================

/// Structural queries about enclosing declarations.
pub struct ContainingDeclarationProvider {
    core: Arc<SessionCore>,
}

impl ContainingDeclarationProvider {
    pub(crate) fn new(core: Arc<SessionCore>) -> Self {
        ContainingDeclarationProvider { core }
    }

    /// The nearest enclosing declaration of `element`, if any.
    pub fn containing_declaration(&self, element: ElementId) -> SessionResult<Option<ElementId>> {
        self.core.token.ensure_valid()?;
        trace!(%element, "querying containing declaration");
        Ok(self
            .core
            .engine
            .containing_declaration(self.core.state, element)?)
    }

    /// The innermost enclosing callable of `element`, if any.
    pub fn enclosing_callable(&self, element: ElementId) -> SessionResult<Option<CallableId>> {
        self.core.token.ensure_valid()?;
        trace!(%element, "querying enclosing callable");
        Ok(self
            .core
            .engine
            .enclosing_callable(self.core.state, element)?)
    }
}
