//! Meld Binding
//!
//! Derives implied specialization and subsetting edges from the semantic
//! binding rules declared on metaclasses.
//!
//! Responsibilities:
//! - Evaluate rule conditions against an instance
//! - Resolve each rule's base concept through the library
//! - Create implied edges that are not already implied by other generals
//! - Remove implied edges that became stale or redundant
//!
//! # Module Structure
//!
//! - `engine` - BindingEngine, the bind/re-bind entry points
//! - `condition` - Condition evaluation
//! - `config` - BindingConfig
//! - `report` - What a binding pass changed
//! - `error` - Error types

mod condition;
mod config;
mod engine;
mod error;
mod report;

pub use config::BindingConfig;
pub use engine::BindingEngine;
pub use error::{BindingError, BindingResult};
pub use report::{BindingReport, ImpliedEdge};
