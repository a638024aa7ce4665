//! Crate-wide error taxonomy.
//!
//! A single closed sum type crosses every module boundary (spec §7). Leaf
//! modules that need a narrower error (e.g. [`crate::graph`]) define their own
//! `thiserror` enum and convert into [`CoreError`] with `#[from]`, the way
//! `vestige-core::codebase::patterns::PatternError` feeds into its crate error.

use thiserror::Error;

/// The core's error taxonomy (spec §7).
///
/// Never fatal by itself: `Degraded` in particular represents a successful
/// call that fell back to a heuristic, not a failure.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CoreError {
    /// Target key/entity/claim/decision missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Status outside the closed set, malformed confidence triple, missing
    /// required policy key, or similar caller error.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying I/O deadline expired.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Store/provider/audit error surfaced opaquely with a short code.
    #[error("backend error ({code}): {message}")]
    Backend {
        /// Short, stable code identifying the failing collaborator.
        code: String,
        /// Human-readable detail.
        message: String,
    },

    /// A write could not be serialized (e.g. lost CAS on a status transition).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A provider call returned empty/invalid input and the core fell back to
    /// its heuristic path. The call still succeeded; this variant is only
    /// ever wrapped in a [`WithDegraded`](crate::provider::WithDegraded) marker
    /// alongside a real result, never returned bare from a public API.
    #[error("degraded: {0}")]
    Degraded(String),
}

impl CoreError {
    /// Build a [`CoreError::Backend`] from a collaborator's opaque failure.
    pub fn backend(code: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Backend {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CoreError>;
