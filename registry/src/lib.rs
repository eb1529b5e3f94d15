//! Meld Registry
//!
//! Runtime metamodel lookup: class and association definitions with their
//! attributes, operations, constraints and semantic-binding rules.
//! The registry is immutable after construction via RegistryBuilder.

mod builder;
mod registry;
mod types;

pub use builder::{
    AssociationBuilder, ClassBuilder, RegistryBuilder, RegistryError, RegistryResult,
};
pub use registry::Registry;
pub use types::*;
