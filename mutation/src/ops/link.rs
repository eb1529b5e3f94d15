//! Link creation and removal.

use meld_core::{AssociationId, EndSide, GraphError, InstanceId, LinkId};
use meld_graph::Graph;
use meld_registry::{AssociationDef, Registry};
use tracing::debug;

use crate::error::{LinkError, MutationError, MutationResult};
use crate::ownership::composite_owner;
use crate::result::{LowerBoundViolation, UnlinkOutcome};

/// Create a link `source -> target`, optionally at a position among the
/// source's existing targets.
///
/// Checks, in order: derived ends, end types, uniqueness, upper bounds on
/// both ends, and single composite ownership of the part.
pub fn create_link(
    registry: &Registry,
    graph: &mut Graph,
    association_id: AssociationId,
    source: InstanceId,
    target: InstanceId,
    position: Option<usize>,
) -> MutationResult<LinkId> {
    let assoc = lookup(registry, association_id)?;
    let source_end = assoc.end(EndSide::Source);
    let target_end = assoc.end(EndSide::Target);

    for end in [source_end, target_end] {
        if end.derived {
            return Err(LinkError::derived_end(&assoc.name, &end.name).into());
        }
    }

    for (side, instance) in [(EndSide::Source, source), (EndSide::Target, target)] {
        let class_id = graph
            .class_of(instance)
            .map_err(|_| MutationError::InstanceNotFound(instance))?;
        let expected = assoc.end_class(side);
        if !registry.is_subclass(class_id, expected) {
            return Err(LinkError::type_mismatch(
                &assoc.name,
                &assoc.end(side).name,
                registry.class_name(expected).unwrap_or("<unknown>"),
                registry.class_name(class_id).unwrap_or("<unknown>"),
            )
            .into());
        }
    }

    if (source_end.unique || target_end.unique)
        && !graph.find_links(association_id, source, target).is_empty()
    {
        return Err(LinkError::duplicate_link(&assoc.name, source, target).into());
    }

    if let Some(upper) = target_end.multiplicity.upper {
        if graph.links_from(source, association_id).len() + 1 > upper as usize {
            return Err(
                LinkError::multiplicity_violation(&assoc.name, &target_end.name, upper, source)
                    .into(),
            );
        }
    }
    if let Some(upper) = source_end.multiplicity.upper {
        if graph.links_to(target, association_id).len() + 1 > upper as usize {
            return Err(
                LinkError::multiplicity_violation(&assoc.name, &source_end.name, upper, target)
                    .into(),
            );
        }
    }

    let part = match assoc.composite_side() {
        Some(EndSide::Target) => Some(target),
        Some(EndSide::Source) => Some(source),
        None => None,
    };
    if let Some(part) = part {
        if composite_owner(registry, graph, part).is_some() {
            return Err(LinkError::composite_owner_conflict(&assoc.name, part).into());
        }
    }

    let id = graph.create_link_at(association_id, source, target, position)?;
    debug!(link = %id, association = %assoc.name, %source, %target, "created link");
    Ok(id)
}

/// Remove the link `source -> target`, reporting ends left below their
/// lower bound.
pub fn remove_link(
    registry: &Registry,
    graph: &mut Graph,
    association_id: AssociationId,
    source: InstanceId,
    target: InstanceId,
) -> MutationResult<UnlinkOutcome> {
    let assoc = lookup(registry, association_id)?;
    let link_id = graph
        .find_links(association_id, source, target)
        .first()
        .copied()
        .ok_or_else(|| LinkError::link_not_found(&assoc.name, source, target))?;
    remove_link_by_id(registry, graph, link_id)
}

/// Remove a link by id.
pub fn remove_link_by_id(
    registry: &Registry,
    graph: &mut Graph,
    link_id: LinkId,
) -> MutationResult<UnlinkOutcome> {
    let association_id = graph
        .get_link(link_id)
        .map(|l| l.association_id)
        .ok_or(GraphError::LinkNotFound(link_id))?;
    let assoc = lookup(registry, association_id)?;

    for side in [EndSide::Source, EndSide::Target] {
        let end = assoc.end(side);
        if end.derived {
            return Err(LinkError::derived_end(&assoc.name, &end.name).into());
        }
    }

    let link = graph.remove_link(link_id)?;
    let mut violations = Vec::new();

    let target_end = assoc.end(EndSide::Target);
    let remaining = graph.links_from(link.source, association_id).len();
    if !target_end.multiplicity.meets_lower(remaining) {
        violations.push(LowerBoundViolation {
            instance: link.source,
            property: target_end.name.clone(),
            lower: target_end.multiplicity.lower,
            count: remaining,
        });
    }

    let source_end = assoc.end(EndSide::Source);
    let remaining = graph.links_to(link.target, association_id).len();
    if !source_end.multiplicity.meets_lower(remaining) {
        violations.push(LowerBoundViolation {
            instance: link.target,
            property: source_end.name.clone(),
            lower: source_end.multiplicity.lower,
            count: remaining,
        });
    }

    debug!(
        link = %link_id,
        association = %assoc.name,
        violations = violations.len(),
        "removed link"
    );
    Ok(UnlinkOutcome { link, violations })
}

fn lookup(registry: &Registry, id: AssociationId) -> MutationResult<&AssociationDef> {
    registry
        .get_association(id)
        .ok_or_else(|| LinkError::unknown_association(id.to_string()).into())
}
