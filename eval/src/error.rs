//! Evaluation error types.

use meld_core::InstanceId;
use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A variable, property or global name did not resolve.
    #[error("Unresolved name '{name}'")]
    UnresolvedName { name: String },

    #[error("type error: {message}")]
    TypeError { message: String },

    /// A `[1..1]` association end has no link.
    #[error("Missing required association end '{end}' on {instance}")]
    MissingRequiredAssociation { instance: InstanceId, end: String },

    #[error("Unknown operation '{operation}' on {class}")]
    UnknownOperation { class: String, operation: String },

    #[error("Operation '{operation}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        operation: String,
        expected: String,
        actual: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Evaluation depth limit {limit} exceeded")]
    DepthExceeded { limit: usize },
}

impl EvalError {
    pub fn unresolved_name(name: impl Into<String>) -> Self {
        Self::UnresolvedName { name: name.into() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
        }
    }

    pub fn missing_required_association(instance: InstanceId, end: impl Into<String>) -> Self {
        Self::MissingRequiredAssociation {
            instance,
            end: end.into(),
        }
    }

    pub fn unknown_operation(class: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            class: class.into(),
            operation: operation.into(),
        }
    }

    pub fn arity_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        actual: usize,
    ) -> Self {
        Self::ArityMismatch {
            operation: operation.into(),
            expected: expected.into(),
            actual,
        }
    }

    /// Errors that null propagation turns into `Null` inside derivations.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EvalError::UnresolvedName { .. }
                | EvalError::TypeError { .. }
                | EvalError::MissingRequiredAssociation { .. }
        )
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
