//! Mutation error types.

use meld_core::{GraphError, InstanceId};
use thiserror::Error;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Invalid attribute writes.
#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("Unknown attribute: {attr} on class {class}")]
    UnknownAttribute { class: String, attr: String },

    #[error("Cannot write derived attribute: {attr} on class {class}")]
    DerivedAttribute { class: String, attr: String },

    #[error("Cannot modify read-only attribute: {attr} on class {class}")]
    ReadOnlyAttribute { class: String, attr: String },

    #[error("Invalid attribute type: expected {expected}, got {actual} for {attr}")]
    WrongType {
        attr: String,
        expected: String,
        actual: String,
    },

    #[error("Attribute {attr} has multiplicity {multiplicity} but got {count} value(s)")]
    MultiplicityViolation {
        attr: String,
        multiplicity: String,
        count: usize,
    },
}

impl AttributeError {
    pub fn unknown_attribute(class: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            class: class.into(),
            attr: attr.into(),
        }
    }

    pub fn derived_attribute(class: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::DerivedAttribute {
            class: class.into(),
            attr: attr.into(),
        }
    }

    pub fn read_only_attribute(class: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::ReadOnlyAttribute {
            class: class.into(),
            attr: attr.into(),
        }
    }

    pub fn wrong_type(
        attr: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::WrongType {
            attr: attr.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn multiplicity_violation(
        attr: impl Into<String>,
        multiplicity: impl ToString,
        count: usize,
    ) -> Self {
        Self::MultiplicityViolation {
            attr: attr.into(),
            multiplicity: multiplicity.to_string(),
            count,
        }
    }
}

/// Invalid link writes.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Unknown association: {name}")]
    UnknownAssociation { name: String },

    #[error("End {end} of {association} expects {expected}, got {actual}")]
    TypeMismatch {
        association: String,
        end: String,
        expected: String,
        actual: String,
    },

    #[error("End {end} of {association} would exceed its upper bound {upper} on {instance}")]
    MultiplicityViolation {
        association: String,
        end: String,
        upper: u32,
        instance: InstanceId,
    },

    #[error("Duplicate link {from} -> {to} in {association}")]
    DuplicateLink {
        association: String,
        from: InstanceId,
        to: InstanceId,
    },

    #[error("Cannot write derived end {end} of {association}")]
    DerivedEnd { association: String, end: String },

    #[error("{instance} already has a composite owner; cannot link through {association}")]
    CompositeOwnerConflict {
        association: String,
        instance: InstanceId,
    },

    #[error("No link {from} -> {to} in {association}")]
    LinkNotFound {
        association: String,
        from: InstanceId,
        to: InstanceId,
    },
}

impl LinkError {
    pub fn unknown_association(name: impl Into<String>) -> Self {
        Self::UnknownAssociation { name: name.into() }
    }

    pub fn type_mismatch(
        association: impl Into<String>,
        end: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            association: association.into(),
            end: end.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn multiplicity_violation(
        association: impl Into<String>,
        end: impl Into<String>,
        upper: u32,
        instance: InstanceId,
    ) -> Self {
        Self::MultiplicityViolation {
            association: association.into(),
            end: end.into(),
            upper,
            instance,
        }
    }

    pub fn duplicate_link(
        association: impl Into<String>,
        from: InstanceId,
        to: InstanceId,
    ) -> Self {
        Self::DuplicateLink {
            association: association.into(),
            from,
            to,
        }
    }

    pub fn derived_end(association: impl Into<String>, end: impl Into<String>) -> Self {
        Self::DerivedEnd {
            association: association.into(),
            end: end.into(),
        }
    }

    pub fn composite_owner_conflict(association: impl Into<String>, instance: InstanceId) -> Self {
        Self::CompositeOwnerConflict {
            association: association.into(),
            instance,
        }
    }

    pub fn link_not_found(
        association: impl Into<String>,
        from: InstanceId,
        to: InstanceId,
    ) -> Self {
        Self::LinkNotFound {
            association: association.into(),
            from,
            to,
        }
    }
}

/// Errors that can occur during mutation execution.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Unknown class: {name}")]
    UnknownType { name: String },

    #[error("Cannot instantiate abstract class: {name}")]
    AbstractType { name: String },

    #[error("Instance not found: {0}")]
    InstanceNotFound(InstanceId),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl MutationError {
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self::AbstractType { name: name.into() }
    }
}
