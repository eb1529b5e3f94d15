//! Meld Core Types
//!
//! This crate provides the foundational types used throughout Meld:
//! - Identity types (InstanceId, LinkId, ClassId, AssociationId)
//! - Content-derived library identifiers (ElementId)
//! - Value types (the Value enum and typed collections)
//! - Entity structures (Instance, Link)
//! - Common error types

mod element_id;
mod entity;
mod error;
mod id;
mod value;

pub use element_id::*;
pub use entity::*;
pub use error::*;
pub use id::*;
pub use value::*;
