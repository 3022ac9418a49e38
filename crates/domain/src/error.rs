//! Unified error types for the domain layer
//!
//! Value objects (dice, recharge ranges, challenge ratings, ability keys)
//! validate on construction and report failures through [`DomainError`].

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., a value outside its allowed range)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects built from stat-block text)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for invariant violations.
    ///
    /// Use this when a value parses but breaks a domain rule:
    /// - Recharge ranges outside 1..=6 or with `min > max`
    /// - Challenge ratings with a zero denominator
    ///
    /// # Example
    /// ```ignore
    /// if min > max {
    ///     return Err(DomainError::validation("recharge min exceeds max"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// # Example
    /// ```ignore
    /// impl FromStr for AbilityKey {
    ///     type Err = DomainError;
    ///     fn from_str(s: &str) -> Result<Self, Self::Err> {
    ///         Self::from_code(s).ok_or_else(|| DomainError::parse(format!("Unknown ability: {}", s)))
    ///     }
    /// }
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
