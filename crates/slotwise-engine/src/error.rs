//! Error types for engine operations.
//!
//! Absence of a weekly rule or presence of a full-day exception is *not* an
//! error — closed days are a normal empty result. Errors cover malformed
//! input, unknown ids, and commit-time booking races.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed input: bad time range, duplicate weekly rule, booking
    /// against an inactive provider, and similar caller mistakes.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Unknown provider or appointment id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested window is no longer free at commit time. The caller
    /// must re-select; the engine never retries internally.
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
