//! Unified error types for the domain layer
//!
//! `DomainError` covers validation and parsing of domain values;
//! `VariableError` is the Variable Store contract violation taxonomy.

use thiserror::Error;

use crate::variables::VariableType;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if data.variable.is_empty() {
    ///     return Err(DomainError::validation("adjValue has no target variable"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }
}

/// Variable Store contract violations.
///
/// These are local to the failing write: the evaluator records them and
/// carries on with the rest of the operation list.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VariableError {
    #[error("Unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("Variable {name} already exists as {existing}, cannot create it as {requested}")]
    DuplicateVariable {
        name: String,
        existing: VariableType,
        requested: VariableType,
    },

    #[error("Type mismatch on {name}: expected {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: VariableType,
        got: VariableType,
    },
}

impl VariableError {
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownVariable { name: name.into() }
    }

    pub fn type_mismatch(name: impl Into<String>, expected: VariableType, got: VariableType) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
            got,
        }
    }

    /// Name of the variable the failed write targeted.
    pub fn variable_name(&self) -> &str {
        match self {
            Self::UnknownVariable { name }
            | Self::DuplicateVariable { name, .. }
            | Self::TypeMismatch { name, .. } => name,
        }
    }
}
