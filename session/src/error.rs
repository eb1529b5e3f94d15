//! Session error types.

use thiserror::Error;

/// Errors surfaced by the model facade.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Metamodel construction error.
    #[error("registry error: {0}")]
    RegistryError(#[from] meld_registry::RegistryError),

    /// Store write rejected.
    #[error("mutation error: {0}")]
    MutationError(#[from] meld_mutation::MutationError),

    /// Evaluation error.
    #[error("evaluation error: {0}")]
    EvalError(#[from] meld_eval::EvalError),

    #[error("binding error: {0}")]
    BindingError(#[from] meld_binding::BindingError),

    #[error("constraint error: {0}")]
    ConstraintError(#[from] meld_constraint::ConstraintError),

    #[error("journal error: {0}")]
    JournalError(#[from] meld_journal::JournalError),

    #[error("graph error: {0}")]
    GraphError(#[from] meld_core::GraphError),

    #[error("unknown class: {name}")]
    UnknownClass { name: String },

    #[error("unknown association: {name}")]
    UnknownAssociation { name: String },

    #[error("unknown property {name} on {class}")]
    UnknownProperty { class: String, name: String },

    /// Derived association ends cannot be written.
    #[error("property {name} is derived")]
    DerivedProperty { name: String },

    /// An association end was given a value that is not an instance.
    #[error("property {property} expects instances, got {found}")]
    NotAnInstance {
        property: String,
        found: &'static str,
    },

    /// A library declaration names an element that is not loaded.
    #[error("unresolved library name: {name}")]
    UnresolvedLibraryName { name: String },

    #[error("library element already loaded: {name}")]
    DuplicateLibraryElement { name: String },
}

impl SessionError {
    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }

    pub fn unknown_association(name: impl Into<String>) -> Self {
        Self::UnknownAssociation { name: name.into() }
    }

    pub fn unknown_property(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownProperty {
            class: class.into(),
            name: name.into(),
        }
    }

    pub fn derived_property(name: impl Into<String>) -> Self {
        Self::DerivedProperty { name: name.into() }
    }

    pub fn not_an_instance(property: impl Into<String>, found: &'static str) -> Self {
        Self::NotAnInstance {
            property: property.into(),
            found,
        }
    }

    pub fn unresolved_library_name(name: impl Into<String>) -> Self {
        Self::UnresolvedLibraryName { name: name.into() }
    }

    pub fn duplicate_library_element(name: impl Into<String>) -> Self {
        Self::DuplicateLibraryElement { name: name.into() }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
