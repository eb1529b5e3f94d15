//! Typed entry points over the kernel operations.
//!
//! Thin wrappers that invoke the registry operations on an [`EvalContext`]
//! and hand back instance handles.

use meld_core::{CollectionKind, InstanceId, Value};
use meld_eval::{EvalContext, EvalResult};

fn call(
    ctx: &mut EvalContext<'_>,
    target: InstanceId,
    operation: &str,
    args: Vec<Value>,
) -> EvalResult<Vec<InstanceId>> {
    Ok(ctx
        .invoke_operation(&Value::Instance(target), operation, args)?
        .instances())
}

/// Direct supertypes, or the original type of a conjugated type.
pub fn supertypes(
    ctx: &mut EvalContext<'_>,
    ty: InstanceId,
    exclude_implied: bool,
) -> EvalResult<Vec<InstanceId>> {
    call(ctx, ty, "supertypes", vec![Value::Bool(exclude_implied)])
}

/// The type itself followed by every transitive supertype.
pub fn all_supertypes(ctx: &mut EvalContext<'_>, ty: InstanceId) -> EvalResult<Vec<InstanceId>> {
    call(ctx, ty, "allSupertypes", vec![])
}

pub fn specializes(
    ctx: &mut EvalContext<'_>,
    ty: InstanceId,
    supertype: InstanceId,
) -> EvalResult<bool> {
    let result = ctx.invoke_operation(
        &Value::Instance(ty),
        "specializes",
        vec![Value::Instance(supertype)],
    )?;
    Ok(result.as_bool().unwrap_or(false))
}

pub fn inherited_memberships(
    ctx: &mut EvalContext<'_>,
    ty: InstanceId,
) -> EvalResult<Vec<InstanceId>> {
    call(ctx, ty, "inheritedMemberships", vec![])
}

pub fn visible_memberships(
    ctx: &mut EvalContext<'_>,
    namespace: InstanceId,
    is_recursive: bool,
    include_all: bool,
) -> EvalResult<Vec<InstanceId>> {
    call(
        ctx,
        namespace,
        "visibleMemberships",
        vec![
            Value::empty(CollectionKind::Set),
            Value::Bool(is_recursive),
            Value::Bool(include_all),
        ],
    )
}

/// Feature and its transitive redefinitions, the feature first.
pub fn all_redefined_features(
    ctx: &mut EvalContext<'_>,
    feature: InstanceId,
) -> EvalResult<Vec<InstanceId>> {
    call(ctx, feature, "allRedefinedFeatures", vec![])
}
