//! Binding error types.

use meld_core::GraphError;
use meld_eval::EvalError;
use meld_mutation::MutationError;
use thiserror::Error;

/// Result type for binding operations.
pub type BindingResult<T> = Result<T, BindingError>;

/// Errors that can occur while deriving implied relationships.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("Kernel element missing from registry: {name}")]
    MissingKernel { name: String },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl BindingError {
    pub fn missing_kernel(name: impl Into<String>) -> Self {
        Self::MissingKernel { name: name.into() }
    }
}
