//! Meld Mutation
//!
//! Validated writes to the instance/link store.
//!
//! Responsibilities:
//! - Validate attribute values against type, derived/read-only flags and multiplicity
//! - Validate links against end types, upper bounds, uniqueness and composite ownership
//! - Cascade deletion along composite ends
//! - Report unmet lower bounds on demand
//!
//! # Module Structure
//!
//! - `executor` - Main MutationExecutor that coordinates operations
//! - `ops/` - Individual operation implementations (create, set, link, delete)
//! - `validation` - Attribute value validation and lower-bound checks
//! - `ownership` - Composite owner/part lookups
//! - `error` - Error types for mutation failures
//! - `result` - Result types for mutation outcomes

mod error;
mod executor;
mod ops;
mod ownership;
mod result;
mod validation;

pub use error::{AttributeError, LinkError, MutationError, MutationResult};
pub use executor::MutationExecutor;
pub use ownership::{composite_owner, owned_parts};
pub use result::{DeletedEntities, LowerBoundViolation, UnlinkOutcome};
pub use validation::{types_compatible, validate_lower_bounds};
