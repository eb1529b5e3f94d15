//! Meld Constraint
//!
//! Checks verification and implied-relationship constraints and unmet lower
//! bounds on instances, reporting them as violations.

mod checker;
mod error;
mod violation;

pub use checker::ConstraintChecker;
pub use error::{ConstraintError, ConstraintResult};
pub use violation::{Violation, ViolationCause, ViolationSeverity, Violations};
