//! Validity-scoped, cached semantic-analysis sessions.
//!
//! This crate implements the "analyze-on-demand over a mutable source tree"
//! pattern used by IDE-side semantic facades:
//!
//! - A short-lived [`session::AnalysisSession`] is bound to one source
//!   element and one [`token::ValidityToken`].
//! - Derived views (scope, type, diagnostic, call-resolution, symbol,
//!   containing-declaration providers) are built lazily with single-flight
//!   memoization and stay identity-stable for the session's lifetime.
//! - When the underlying model mutates, [`token::EpochSource::advance`]
//!   invalidates every outstanding session and derived object atomically;
//!   stale access fails fast with [`error::SessionError::StaleSession`].
//!
//! The heavy semantic machinery (name resolution, type inference,
//! incremental model construction) lives behind the
//! [`engine::ResolveEngine`] trait. This crate is the coordination layer in
//! front of it: it owns nothing but tokens, memos, and the scope arena.

pub mod arena;
pub mod cache;
pub mod engine;
pub mod error;
pub mod providers;
pub mod session;
pub mod token;
