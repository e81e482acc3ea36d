//! Crate-wide error taxonomy.
//!
//! Per-order rule violations are local and non-fatal: the service turns them
//! into a rejected submission or a failed result without aborting sibling
//! orders. Storage errors abort the enclosing operation as a whole.

use thiserror::Error;

/// Errors surfaced by the rules engine, validator, store, and service.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing request fields, rejected before touching game state.
    #[error("validation error: {0}")]
    Validation(String),

    /// An order that conflicts with map, occupancy, or adjacency rules, or
    /// that names an origin the unit does not occupy.
    #[error("rule violation: {0}")]
    RuleViolation(String),

    /// An unknown game, turn, order, unit, territory, or variant reference.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A persistence failure; aborts the enclosing request.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
