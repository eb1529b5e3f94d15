//! Meld Session
//!
//! The in-process entry points over a metamodel runtime.
//!
//! Responsibilities:
//! - Own the registry, store, native procedures and loaded library
//! - Route property reads through the evaluator and writes through validation
//! - Load library units with content-derived element ids
//! - Run semantic binding and constraint checks against the loaded library
//! - Journal every stored write
//!
//! # Module Structure
//!
//! - `model` - Model, the facade
//! - `library` - Library units, loading and qualified-name resolution
//! - `error` - Error types

mod error;
mod library;
mod model;

pub use error::{SessionError, SessionResult};
pub use library::{Library, LibraryElement, LibraryUnit};
pub use model::Model;
