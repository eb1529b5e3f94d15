//! Attribute validation helpers for mutation operations.

use meld_core::{Attributes, ClassId, Collection, EndSide, InstanceId, Value};
use meld_graph::Graph;
use meld_registry::{AttrDef, Registry};

use crate::error::{AttributeError, MutationError, MutationResult};
use crate::result::LowerBoundViolation;

/// Validate an attribute write and return the value in the form it is stored.
///
/// Single-valued attributes take a scalar. Multi-valued attributes take a
/// collection (a scalar is treated as a one-element collection) and are
/// stored with the collection kind their ordered/unique flags select. Lower
/// bounds are not checked here; see [`validate_lower_bounds`].
pub fn validate_attribute(
    registry: &Registry,
    graph: &Graph,
    class_name: &str,
    attr_def: Option<&AttrDef>,
    attr_name: &str,
    value: Value,
) -> MutationResult<Value> {
    let attr_def =
        attr_def.ok_or_else(|| AttributeError::unknown_attribute(class_name, attr_name))?;

    if attr_def.derived {
        return Err(AttributeError::derived_attribute(class_name, attr_name).into());
    }
    if attr_def.read_only {
        return Err(AttributeError::read_only_attribute(class_name, attr_name).into());
    }
    if value.is_null() {
        return Ok(Value::Null);
    }

    if attr_def.multiplicity.is_single() {
        if let Value::Collection(c) = &value {
            return Err(
                AttributeError::multiplicity_violation(attr_name, attr_def.multiplicity, c.len())
                    .into(),
            );
        }
        check_type(registry, graph, attr_def, &value)?;
        return Ok(value);
    }

    let items = value.into_items();
    for item in &items {
        check_type(registry, graph, attr_def, item)?;
    }
    let collection = Collection::from_items(attr_def.collection_kind(), items);
    if attr_def.multiplicity.exceeds_upper(collection.len()) {
        return Err(AttributeError::multiplicity_violation(
            attr_name,
            attr_def.multiplicity,
            collection.len(),
        )
        .into());
    }
    if collection.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Collection(collection))
}

fn check_type(
    registry: &Registry,
    graph: &Graph,
    attr_def: &AttrDef,
    value: &Value,
) -> Result<(), AttributeError> {
    if types_compatible(registry, graph, &attr_def.type_name, value) {
        Ok(())
    } else {
        Err(AttributeError::wrong_type(
            &attr_def.name,
            &attr_def.type_name,
            value.type_name(),
        ))
    }
}

/// Check if a value conforms to a declared type name.
pub fn types_compatible(registry: &Registry, graph: &Graph, expected: &str, value: &Value) -> bool {
    match (expected, value) {
        ("Any", _) | (_, Value::Null) => true,
        ("Boolean", Value::Bool(_)) => true,
        ("Integer", Value::Int(_)) => true,
        // Integers widen to reals
        ("Real", Value::Int(_)) | ("Real", Value::Real(_)) => true,
        ("String", Value::String(_)) => true,
        (class_name, Value::Instance(id)) => graph
            .class_of(*id)
            .map(|class_id| registry.is_subclass_by_name(class_id, class_name))
            .unwrap_or(false),
        _ => false,
    }
}

/// Apply default values for every non-derived attribute of a class.
pub fn apply_defaults(registry: &Registry, class_id: ClassId) -> Attributes {
    let mut slots = Attributes::new();
    for attr_def in registry.all_attrs(class_id) {
        if attr_def.derived {
            continue;
        }
        if let Some(default) = &attr_def.default {
            slots.insert(attr_def.name.clone(), default.clone());
        }
    }
    slots
}

/// List every stored attribute and non-derived association end of an
/// instance whose lower bound is not met.
pub fn validate_lower_bounds(
    registry: &Registry,
    graph: &Graph,
    instance: InstanceId,
) -> MutationResult<Vec<LowerBoundViolation>> {
    let stored = graph
        .get_instance(instance)
        .ok_or(MutationError::InstanceNotFound(instance))?;
    let class_id = stored.class_id;
    let mut violations = Vec::new();

    for attr_def in registry.all_attrs(class_id) {
        if attr_def.derived || !attr_def.multiplicity.is_required() {
            continue;
        }
        let count = stored
            .get_slot(&attr_def.name)
            .map(|v| v.cardinality())
            .unwrap_or(0);
        if !attr_def.multiplicity.meets_lower(count) {
            violations.push(LowerBoundViolation {
                instance,
                property: attr_def.name.clone(),
                lower: attr_def.multiplicity.lower,
                count,
            });
        }
    }

    for assoc in registry.all_associations() {
        for side in [EndSide::Target, EndSide::Source] {
            let end = assoc.end(side);
            let owner = assoc.end_class(side.opposite());
            if end.derived
                || !end.multiplicity.is_required()
                || !registry.is_subclass(class_id, owner)
            {
                continue;
            }
            let count = match side {
                EndSide::Target => graph.links_from(instance, assoc.id).len(),
                EndSide::Source => graph.links_to(instance, assoc.id).len(),
            };
            if !end.multiplicity.meets_lower(count) {
                violations.push(LowerBoundViolation {
                    instance,
                    property: end.name.clone(),
                    lower: end.multiplicity.lower,
                    count,
                });
            }
        }
    }

    Ok(violations)
}
