//! Meld Resolver
//!
//! The kernel metamodel and the type-system algorithms defined on it:
//! supertype closure with conjugation, inherited and visible memberships,
//! and redefinition shadowing.
//!
//! Declarative algorithms are registry operations evaluated by `meld-eval`.
//! The membership algorithms need explicit cycle bookkeeping and are native
//! procedures threading an [`ExclusionSet`].

mod exclusion;
#[cfg(test)]
mod fixture;
pub mod kernel;
mod memberships;
mod queries;
mod visibility;

pub use exclusion::ExclusionSet;
pub use kernel::{kernel_registry, register_kernel};
pub use memberships::register_natives;
pub use queries::*;
pub use visibility::Visibility;
