//! Attribute writes.

use meld_core::{InstanceId, Value};
use meld_graph::Graph;
use meld_registry::Registry;
use tracing::trace;

use crate::error::{MutationError, MutationResult};
use crate::validation::validate_attribute;

/// Write an attribute on an instance. `Null` or an empty collection clears it.
pub fn set_attribute(
    registry: &Registry,
    graph: &mut Graph,
    instance: InstanceId,
    name: &str,
    value: Value,
) -> MutationResult<()> {
    let class_id = graph
        .class_of(instance)
        .map_err(|_| MutationError::InstanceNotFound(instance))?;
    let class_name = registry.class_name(class_id).unwrap_or("<unknown>");

    let stored = validate_attribute(
        registry,
        graph,
        class_name,
        registry.find_attr(class_id, name),
        name,
        value,
    )?;

    trace!(instance = %instance, attr = name, value = %stored, "set attribute");
    graph.set_slot(instance, name, stored)?;
    Ok(())
}
