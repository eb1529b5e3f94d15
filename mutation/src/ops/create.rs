//! Instance creation.

use meld_core::InstanceId;
use meld_graph::Graph;
use meld_registry::Registry;
use tracing::debug;

use crate::error::{MutationError, MutationResult};
use crate::validation::apply_defaults;

/// Create an instance of a concrete class, seeding attribute defaults.
pub fn create_instance(
    registry: &Registry,
    graph: &mut Graph,
    class_name: &str,
) -> MutationResult<InstanceId> {
    let class_def = registry
        .get_class_by_name(class_name)
        .ok_or_else(|| MutationError::unknown_type(class_name))?;

    if class_def.is_abstract {
        return Err(MutationError::abstract_type(class_name));
    }

    let slots = apply_defaults(registry, class_def.id);
    let id = graph.create_instance(class_def.id, slots);
    debug!(instance = %id, class = class_name, "created instance");
    Ok(id)
}
