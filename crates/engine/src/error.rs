//! The module contains the errors the engine can throw.
//!
//! The taxonomy follows how callers are expected to react:
//!
//! - [`Validation`] bad input shape or values; the caller must fix the request.
//! - [`HasChildren`] structural constraint violation when deleting a goal.
//! - [`InsufficientFunds`] a withdrawal exceeds the available balance.
//! - [`ConcurrencyConflict`] lock contention on a goal subtree; retryable.
//! - [`NotFound`] unknown goal, entry or plan id.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`HasChildren`]: EngineError::HasChildren
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`ConcurrencyConflict`]: EngineError::ConcurrencyConflict
//!  [`NotFound`]: EngineError::NotFound
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Goal has children: {0}")]
    HasChildren(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
}

impl EngineError {
    /// Returns `true` when the caller may retry the same request unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::HasChildren(a), Self::HasChildren(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::ConcurrencyConflict(a), Self::ConcurrencyConflict(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            _ => false,
        }
    }
}
