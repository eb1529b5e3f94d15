//! Meld Eval
//!
//! Interpreter for derivation and operation expressions.
//!
//! Responsibilities:
//! - Evaluate expression trees against the instance/link store
//! - Resolve properties (stored attributes, links, derived values)
//! - Invoke declarative and native operations
//! - Recover from navigation errors inside derivations (null propagation)
//!
//! Evaluation never mutates the store.

mod bindings;
mod collection;
mod config;
mod context;
mod error;
mod eval;
mod native;

pub use bindings::Bindings;
pub use config::{EngineConfig, EvalMode};
pub use context::EvalContext;
pub use error::{EvalError, EvalResult};
pub use native::{GlobalResolver, NativeFn, NativeProcedure, NativeTable};
