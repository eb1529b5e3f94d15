//! Meld Graph Storage
//!
//! This crate provides the raw instance/link arena with indexed access:
//! - Instance and link storage keyed by opaque handles
//! - Class index: Find instances by class
//! - Association index: Find links by association
//! - Adjacency index: Ordered links from/to an instance per association
//!
//! No metamodel rule is checked here; validation lives in `meld-mutation`.

mod graph;
mod index;

pub use graph::*;
