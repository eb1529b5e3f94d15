//! Instance deletion with composite cascade.

use std::collections::HashSet;

use meld_core::InstanceId;
use meld_graph::Graph;
use meld_registry::Registry;
use tracing::debug;

use crate::error::{MutationError, MutationResult};
use crate::ownership::owned_parts;
use crate::result::DeletedEntities;

/// Delete an instance, every instance it owns through composite ends
/// (transitively), and all links touching any of them.
///
/// Parts are deleted before their owner.
pub fn delete_instance(
    registry: &Registry,
    graph: &mut Graph,
    instance: InstanceId,
) -> MutationResult<DeletedEntities> {
    if !graph.contains_instance(instance) {
        return Err(MutationError::InstanceNotFound(instance));
    }

    let mut order = Vec::new();
    let mut visited = HashSet::new();
    collect_post_order(registry, graph, instance, &mut visited, &mut order);

    let mut deleted = DeletedEntities::default();
    for id in order {
        let links = graph.delete_instance(id)?;
        deleted.links.extend(links);
        deleted.instances.push(id);
    }

    debug!(
        root = %instance,
        instances = deleted.instance_count(),
        links = deleted.link_count(),
        "deleted instance"
    );
    Ok(deleted)
}

fn collect_post_order(
    registry: &Registry,
    graph: &Graph,
    id: InstanceId,
    visited: &mut HashSet<InstanceId>,
    order: &mut Vec<InstanceId>,
) {
    if !visited.insert(id) {
        return;
    }
    for part in owned_parts(registry, graph, id) {
        collect_post_order(registry, graph, part, visited, order);
    }
    order.push(id);
}
