//! Common error types for Meld.

use crate::{AssociationId, ClassId, InstanceId, LinkId};
use thiserror::Error;

/// Errors that can occur during raw store operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Instance not found.
    #[error("Instance not found: {0}")]
    InstanceNotFound(InstanceId),

    /// Link not found.
    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    /// Class not found.
    #[error("Class not found: {0}")]
    ClassNotFound(ClassId),

    /// Association not found.
    #[error("Association not found: {0}")]
    AssociationNotFound(AssociationId),

    /// Invalid operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for raw store operations.
pub type GraphResult<T> = Result<T, GraphError>;
