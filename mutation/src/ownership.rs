//! Composite ownership lookups.

use meld_core::{EndSide, InstanceId, LinkId};
use meld_graph::Graph;
use meld_registry::Registry;

/// The composite owner of an instance, with the owning link.
pub fn composite_owner(
    registry: &Registry,
    graph: &Graph,
    instance: InstanceId,
) -> Option<(InstanceId, LinkId)> {
    graph.links_involving(instance).find_map(|link_id| {
        let link = graph.get_link(link_id)?;
        let assoc = registry.get_association(link.association_id)?;
        match assoc.composite_side()? {
            EndSide::Target if link.target == instance => Some((link.source, link_id)),
            EndSide::Source if link.source == instance => Some((link.target, link_id)),
            _ => None,
        }
    })
}

/// Instances directly owned by an instance through composite ends, in link order.
pub fn owned_parts(registry: &Registry, graph: &Graph, owner: InstanceId) -> Vec<InstanceId> {
    let mut parts = Vec::new();
    for link_id in graph.links_involving(owner) {
        let Some(link) = graph.get_link(link_id) else {
            continue;
        };
        let Some(assoc) = registry.get_association(link.association_id) else {
            continue;
        };
        match assoc.composite_side() {
            Some(EndSide::Target) if link.source == owner => parts.push(link.target),
            Some(EndSide::Source) if link.target == owner => parts.push(link.source),
            _ => {}
        }
    }
    parts
}
