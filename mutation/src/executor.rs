//! Mutation executor - coordinates mutation operations.
//!
//! The executor delegates to specialized operation modules in `ops/`:
//! - `ops/create.rs` - instance creation with attribute defaults
//! - `ops/delete.rs` - instance deletion with composite cascade
//! - `ops/link.rs` - link creation and removal
//! - `ops/set.rs` - attribute updates

use meld_core::{AssociationId, InstanceId, LinkId, Value};
use meld_graph::Graph;
use meld_registry::Registry;

use crate::error::MutationResult;
use crate::ops;
use crate::result::{DeletedEntities, LowerBoundViolation, UnlinkOutcome};
use crate::validation;

/// Mutation executor.
pub struct MutationExecutor<'r, 'g> {
    registry: &'r Registry,
    graph: &'g mut Graph,
}

impl<'r, 'g> MutationExecutor<'r, 'g> {
    /// Create a new executor.
    pub fn new(registry: &'r Registry, graph: &'g mut Graph) -> Self {
        Self { registry, graph }
    }

    /// Create an instance of a concrete class.
    pub fn create_instance(&mut self, class_name: &str) -> MutationResult<InstanceId> {
        ops::create_instance(self.registry, self.graph, class_name)
    }

    /// Write an attribute.
    pub fn set_attribute(
        &mut self,
        instance: InstanceId,
        name: &str,
        value: Value,
    ) -> MutationResult<()> {
        ops::set_attribute(self.registry, self.graph, instance, name, value)
    }

    /// Append a link.
    pub fn create_link(
        &mut self,
        association: AssociationId,
        source: InstanceId,
        target: InstanceId,
    ) -> MutationResult<LinkId> {
        ops::create_link(self.registry, self.graph, association, source, target, None)
    }

    /// Insert a link at a position among the source's targets.
    pub fn create_link_at(
        &mut self,
        association: AssociationId,
        source: InstanceId,
        target: InstanceId,
        position: usize,
    ) -> MutationResult<LinkId> {
        ops::create_link(
            self.registry,
            self.graph,
            association,
            source,
            target,
            Some(position),
        )
    }

    /// Remove the link between two instances.
    pub fn remove_link(
        &mut self,
        association: AssociationId,
        source: InstanceId,
        target: InstanceId,
    ) -> MutationResult<UnlinkOutcome> {
        ops::remove_link(self.registry, self.graph, association, source, target)
    }

    /// Remove a link by id.
    pub fn remove_link_by_id(&mut self, link: LinkId) -> MutationResult<UnlinkOutcome> {
        ops::remove_link_by_id(self.registry, self.graph, link)
    }

    /// Delete an instance and everything it owns.
    pub fn delete_instance(&mut self, instance: InstanceId) -> MutationResult<DeletedEntities> {
        ops::delete_instance(self.registry, self.graph, instance)
    }

    /// Unmet lower bounds on an instance.
    pub fn validate_lower_bounds(
        &self,
        instance: InstanceId,
    ) -> MutationResult<Vec<LowerBoundViolation>> {
        validation::validate_lower_bounds(self.registry, self.graph, instance)
    }
}
