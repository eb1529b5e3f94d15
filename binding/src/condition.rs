//! Binding rule conditions.

use meld_core::{InstanceId, Value};
use meld_eval::{EvalContext, EvalResult};
use meld_registry::Condition;
use meld_resolver::specializes;

/// Whether `condition` holds for `instance`.
///
/// Feature-only conditions are false for non-features. A library type the
/// library cannot resolve never matches.
pub(crate) fn holds(
    ctx: &mut EvalContext<'_>,
    instance: InstanceId,
    condition: &Condition,
) -> EvalResult<bool> {
    match condition {
        Condition::Default => Ok(true),
        Condition::IsEnd => feature_flag(ctx, instance, "isEnd"),
        Condition::IsComposite => feature_flag(ctx, instance, "isComposite"),
        Condition::TypedBy(type_name) => typed_by(ctx, instance, type_name),
        Condition::OwningTypeTypedBy(type_name) => {
            if !is_feature(ctx, instance) {
                return Ok(false);
            }
            let Some(owning_type) = ctx.get_property(instance, "owningType")?.as_instance() else {
                return Ok(false);
            };
            if is_feature(ctx, owning_type) {
                return typed_by(ctx, owning_type, type_name);
            }
            let Some(base) = resolve(ctx, type_name) else {
                return Ok(false);
            };
            specializes(ctx, owning_type, base)
        }
        Condition::And(conditions) => {
            for condition in conditions {
                if !holds(ctx, instance, condition)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(conditions) => {
            for condition in conditions {
                if holds(ctx, instance, condition)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Not(condition) => Ok(!holds(ctx, instance, condition)?),
    }
}

fn is_feature(ctx: &EvalContext<'_>, instance: InstanceId) -> bool {
    ctx.conforms(&Value::Instance(instance), "Feature", false)
}

fn resolve(ctx: &EvalContext<'_>, qualified_name: &str) -> Option<InstanceId> {
    ctx.resolve_global(qualified_name)
        .ok()
        .and_then(|v| v.as_instance())
}

fn feature_flag(ctx: &mut EvalContext<'_>, instance: InstanceId, flag: &str) -> EvalResult<bool> {
    if !is_feature(ctx, instance) {
        return Ok(false);
    }
    Ok(ctx.get_property(instance, flag)?.as_bool().unwrap_or(false))
}

/// A feature is typed by `type_name` when one of its types specializes it.
fn typed_by(ctx: &mut EvalContext<'_>, feature: InstanceId, type_name: &str) -> EvalResult<bool> {
    if !is_feature(ctx, feature) {
        return Ok(false);
    }
    let Some(base) = resolve(ctx, type_name) else {
        return Ok(false);
    };
    for ty in ctx.get_property(feature, "type")?.instances() {
        if specializes(ctx, ty, base)? {
            return Ok(true);
        }
    }
    Ok(false)
}
