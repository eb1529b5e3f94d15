//! Constraint checking errors.

use meld_core::GraphError;
use meld_mutation::MutationError;
use thiserror::Error;

/// Result type for constraint checking.
pub type ConstraintResult<T> = Result<T, ConstraintError>;

/// Failures of the checker itself. A constraint that evaluates to false, or
/// whose expression fails, is a [`crate::Violation`], not an error.
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}
