//! Meld Tests
//!
//! Integration test support: scenarios of steps run against a kernel model,
//! assertions on what each step changed, and shared library fixtures.
//!
//! # Module Structure
//!
//! - `scenario` - Scenario builder and runner, the World steps act on
//! - `assertion` - Step outcome assertions
//! - `fixtures` - Library units and model builders
//! - `error` - Harness errors

pub mod assertion;
pub mod error;
pub mod fixtures;
pub mod scenario;

pub mod prelude {
    pub use crate::assertion::{Assertion, AssertionBuilder, StepOutcome};
    pub use crate::error::{StepError, TestError, TestResult};
    pub use crate::fixtures::*;
    pub use crate::scenario::{Scenario, World};
    pub use meld_core::{InstanceId, Value};
    pub use meld_resolver::kernel::{BASE_ANYTHING, BASE_OBJECT, BASE_PARTS, BASE_THINGS};
    pub use meld_resolver::Visibility;
    pub use meld_session::{LibraryElement, LibraryUnit, Model, SessionError, SessionResult};
}
