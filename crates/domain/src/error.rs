//! Unified error types for the domain layer
//!
//! Validation *issues* found on a character are not errors: rule modules
//! return them as plain strings. `DomainError` covers payloads that cannot be
//! turned into the data model at all.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Parse error (for value objects such as ability codes)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A character payload did not match the data model
    #[error("Invalid character: {0}")]
    InvalidCharacter(String),
}

impl DomainError {
    /// Creates a parse error for string-to-type conversion failures.
    ///
    /// Use this in `FromStr` implementations when the input string
    /// doesn't match any known variant or format.
    ///
    /// # Example
    /// ```ignore
    /// impl FromStr for Ability {
    ///     type Err = DomainError;
    ///     fn from_str(s: &str) -> Result<Self, Self::Err> {
    ///         match s {
    ///             "STR" => Ok(Self::Str),
    ///             _ => Err(DomainError::parse(format!("Unknown ability: {}", s))),
    ///         }
    ///     }
    /// }
    /// ```
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Wrap a deserialization failure of a character payload.
    pub fn invalid_character(msg: impl Into<String>) -> Self {
        Self::InvalidCharacter(msg.into())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_character(err.to_string())
    }
}
