//! Mutation result types.

use meld_core::{InstanceId, Link};

/// Everything removed by a cascading delete.
#[derive(Debug, Clone, Default)]
pub struct DeletedEntities {
    /// Deleted instances, owned parts first.
    pub instances: Vec<InstanceId>,
    /// Links removed because they touched a deleted instance.
    pub links: Vec<Link>,
}

impl DeletedEntities {
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// A property whose lower bound is not met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowerBoundViolation {
    pub instance: InstanceId,
    /// Attribute or association end name.
    pub property: String,
    pub lower: u32,
    pub count: usize,
}

/// Outcome of removing a link.
#[derive(Debug, Clone)]
pub struct UnlinkOutcome {
    pub link: Link,
    /// Ends left below their lower bound by the removal.
    pub violations: Vec<LowerBoundViolation>,
}
