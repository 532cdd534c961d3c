//! Unified error types for the domain layer
//!
//! Every fallible constructor or parser in this crate returns `DomainError`, so adapters can
//! report validation problems without falling back to `String` or `anyhow`.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., coordinate out of range, empty identifier)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects read back from strings)
    #[error("Parse error: {0}")]
    Parse(String),

    /// State transition not allowed
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl DomainError {
    /// Creates a validation error for malformed input.
    ///
    /// # Example
    /// ```ignore
    /// if raw.is_empty() {
    ///     return Err(DomainError::validation("navigator id cannot be empty"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    /// True for errors the caller caused (bad input rather than bad state).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Parse(_))
    }
}
