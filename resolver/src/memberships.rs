//! Membership resolution natives.
//!
//! Each procedure threads the namespaces and types already being expanded as
//! [`ExclusionSet`]s, so import cycles and conjugation cycles terminate.
//! Nested calls go back through [`EvalContext::invoke_operation`] so the most
//! specific override runs and the depth limit applies.

use std::collections::HashMap;

use meld_core::{InstanceId, Value};
use meld_eval::{EvalContext, EvalError, EvalResult, NativeTable};
use tracing::trace;

use crate::exclusion::ExclusionSet;
use crate::visibility::Visibility;

/// Register every membership procedure the kernel operations refer to.
pub fn register_natives(natives: &mut NativeTable) {
    natives.register_fn("namespace_imported_memberships", namespace_imported_memberships);
    natives.register_fn("namespace_public_memberships", namespace_public_memberships);
    natives.register_fn("namespace_protected_memberships", namespace_protected_memberships);
    natives.register_fn("namespace_visible_memberships", namespace_visible_memberships);
    natives.register_fn("type_visible_memberships", type_visible_memberships);
    natives.register_fn("type_inheritable_memberships", type_inheritable_memberships);
    natives.register_fn("type_inherited_memberships", type_inherited_memberships);
    natives.register_fn("type_non_private_memberships", type_non_private_memberships);
    natives.register_fn("type_remove_redefined_features", type_remove_redefined_features);
}

// ==================== Argument Helpers ====================

fn self_id(self_value: &Value) -> EvalResult<InstanceId> {
    self_value.as_instance().ok_or_else(|| {
        EvalError::type_error(format!("expected an element, got {}", self_value.type_name()))
    })
}

fn set_arg(args: &[Value], index: usize) -> ExclusionSet {
    args.get(index).map(ExclusionSet::from_value).unwrap_or_default()
}

fn bool_arg(args: &[Value], index: usize) -> bool {
    args.get(index).and_then(Value::as_bool).unwrap_or(false)
}

fn to_value(ids: &[InstanceId]) -> Value {
    Value::ordered_set(ids.iter().map(|id| Value::Instance(*id)))
}

/// Append `items` to `into`, skipping ids already present.
fn extend_unique(into: &mut Vec<InstanceId>, items: impl IntoIterator<Item = InstanceId>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

fn instances(
    ctx: &mut EvalContext<'_>,
    id: InstanceId,
    property: &str,
) -> EvalResult<Vec<InstanceId>> {
    Ok(ctx.get_property(id, property)?.instances())
}

/// Read a single-valued end, treating a missing required link as absent.
fn optional_instance(
    ctx: &mut EvalContext<'_>,
    id: InstanceId,
    property: &str,
) -> EvalResult<Option<InstanceId>> {
    match ctx.get_property(id, property) {
        Ok(value) => Ok(value.as_instance()),
        Err(err) if err.is_recoverable() => Ok(None),
        Err(err) => Err(err),
    }
}

fn visibility(ctx: &mut EvalContext<'_>, relationship: InstanceId) -> EvalResult<Visibility> {
    Ok(Visibility::from_value(&ctx.get_property(relationship, "visibility")?))
}

fn is_kind_of(ctx: &EvalContext<'_>, id: InstanceId, class_name: &str) -> bool {
    ctx.conforms(&Value::Instance(id), class_name, false)
}

fn invoke(
    ctx: &mut EvalContext<'_>,
    target: InstanceId,
    operation: &str,
    args: Vec<Value>,
) -> EvalResult<Vec<InstanceId>> {
    Ok(ctx
        .invoke_operation(&Value::Instance(target), operation, args)?
        .instances())
}

// ==================== Namespace ====================

/// Memberships reached through one import, or none if its namespace is
/// already being expanded.
fn import_memberships(
    ctx: &mut EvalContext<'_>,
    import: InstanceId,
    excluded: &ExclusionSet,
) -> EvalResult<Vec<InstanceId>> {
    let Some(namespace) = optional_instance(ctx, import, "importedNamespace")? else {
        return Ok(Vec::new());
    };
    if excluded.contains(namespace) {
        trace!(%import, %namespace, "import already being expanded");
        return Ok(Vec::new());
    }
    let is_recursive = ctx
        .get_property(import, "isRecursive")?
        .as_bool()
        .unwrap_or(false);
    invoke(
        ctx,
        namespace,
        "visibleMemberships",
        vec![excluded.to_value(), Value::Bool(is_recursive), Value::Bool(false)],
    )
}

fn imported(
    ctx: &mut EvalContext<'_>,
    namespace: InstanceId,
    excluded: &ExclusionSet,
    only: Option<Visibility>,
) -> EvalResult<Vec<InstanceId>> {
    if excluded.contains(namespace) {
        return Ok(Vec::new());
    }
    let excluded = excluded.with(namespace);
    let mut result = Vec::new();
    for import in instances(ctx, namespace, "ownedImport")? {
        if let Some(wanted) = only {
            if visibility(ctx, import)? != wanted {
                continue;
            }
        }
        let memberships = import_memberships(ctx, import, &excluded)?;
        extend_unique(&mut result, memberships);
    }
    Ok(result)
}

/// Owned memberships and imports of one visibility, imports expanded.
fn memberships_of_visibility(
    ctx: &mut EvalContext<'_>,
    namespace: InstanceId,
    wanted: Visibility,
    excluded: &ExclusionSet,
) -> EvalResult<Vec<InstanceId>> {
    let mut result = Vec::new();
    for membership in instances(ctx, namespace, "ownedMembership")? {
        if visibility(ctx, membership)? == wanted {
            result.push(membership);
        }
    }
    let imported = imported(ctx, namespace, excluded, Some(wanted))?;
    extend_unique(&mut result, imported);
    Ok(result)
}

fn namespace_imported_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let namespace = self_id(self_value)?;
    let result = imported(ctx, namespace, &set_arg(args, 0), None)?;
    Ok(to_value(&result))
}

fn namespace_public_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let namespace = self_id(self_value)?;
    let result = memberships_of_visibility(ctx, namespace, Visibility::Public, &set_arg(args, 0))?;
    Ok(to_value(&result))
}

fn namespace_protected_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let namespace = self_id(self_value)?;
    let result =
        memberships_of_visibility(ctx, namespace, Visibility::Protected, &set_arg(args, 0))?;
    Ok(to_value(&result))
}

/// Visible memberships of a namespace without inheritance.
fn own_visible(
    ctx: &mut EvalContext<'_>,
    namespace: InstanceId,
    excluded: &ExclusionSet,
    is_recursive: bool,
    include_all: bool,
) -> EvalResult<Vec<InstanceId>> {
    let mut result = if include_all {
        let mut all = instances(ctx, namespace, "ownedMembership")?;
        let imported = imported(ctx, namespace, excluded, None)?;
        extend_unique(&mut all, imported);
        all
    } else {
        memberships_of_visibility(ctx, namespace, Visibility::Public, excluded)?
    };

    if is_recursive && !excluded.contains(namespace) {
        let excluded = excluded.with(namespace);
        for membership in result.clone() {
            let Some(element) = optional_instance(ctx, membership, "memberElement")? else {
                continue;
            };
            if element == namespace
                || excluded.contains(element)
                || !is_kind_of(ctx, element, "Namespace")
            {
                continue;
            }
            let nested = invoke(
                ctx,
                element,
                "visibleMemberships",
                vec![excluded.to_value(), Value::Bool(true), Value::Bool(include_all)],
            )?;
            extend_unique(&mut result, nested);
        }
    }
    Ok(result)
}

fn namespace_visible_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let namespace = self_id(self_value)?;
    let result = own_visible(
        ctx,
        namespace,
        &set_arg(args, 0),
        bool_arg(args, 1),
        bool_arg(args, 2),
    )?;
    Ok(to_value(&result))
}

// ==================== Type ====================

fn inheritable(
    ctx: &mut EvalContext<'_>,
    ty: InstanceId,
    excluded_namespaces: &ExclusionSet,
    excluded_types: &ExclusionSet,
    exclude_implied: bool,
) -> EvalResult<Vec<InstanceId>> {
    let excluded_types = excluded_types.with(ty);
    let supertypes = invoke(ctx, ty, "supertypes", vec![Value::Bool(exclude_implied)])?;
    let mut result = Vec::new();
    for supertype in supertypes {
        if excluded_types.contains(supertype) {
            continue;
        }
        let memberships = invoke(
            ctx,
            supertype,
            "nonPrivateMemberships",
            vec![
                excluded_namespaces.to_value(),
                excluded_types.to_value(),
                Value::Bool(exclude_implied),
            ],
        )?;
        extend_unique(&mut result, memberships);
    }
    Ok(result)
}

fn inherited(
    ctx: &mut EvalContext<'_>,
    ty: InstanceId,
    excluded_namespaces: &ExclusionSet,
    excluded_types: &ExclusionSet,
    exclude_implied: bool,
) -> EvalResult<Vec<InstanceId>> {
    let candidates = inheritable(ctx, ty, excluded_namespaces, excluded_types, exclude_implied)?;
    remove_redefined(ctx, ty, candidates)
}

/// Drop inherited memberships whose feature is shadowed by redefinition.
///
/// A candidate goes if another candidate's feature redefines its feature
/// (directly or transitively), or if one of the type's owned features
/// redefines any feature in its redefinition chain.
fn remove_redefined(
    ctx: &mut EvalContext<'_>,
    ty: InstanceId,
    candidates: Vec<InstanceId>,
) -> EvalResult<Vec<InstanceId>> {
    let mut chains: HashMap<InstanceId, Vec<InstanceId>> = HashMap::new();
    let mut chain = |ctx: &mut EvalContext<'_>,
                     feature: InstanceId|
     -> EvalResult<Vec<InstanceId>> {
        if let Some(found) = chains.get(&feature) {
            return Ok(found.clone());
        }
        let found = invoke(ctx, feature, "allRedefinedFeatures", vec![])?;
        chains.insert(feature, found.clone());
        Ok(found)
    };

    let mut redefined_by_owned = Vec::new();
    for owned in instances(ctx, ty, "ownedFeature")? {
        let redefined = chain(ctx, owned)?;
        extend_unique(&mut redefined_by_owned, redefined.into_iter().filter(|f| *f != owned));
    }

    let mut features = Vec::with_capacity(candidates.len());
    for membership in &candidates {
        let feature = optional_instance(ctx, *membership, "memberElement")?
            .filter(|element| is_kind_of(ctx, *element, "Feature"));
        let redefined = match feature {
            Some(feature) => chain(ctx, feature)?,
            None => Vec::new(),
        };
        features.push((feature, redefined));
    }

    let mut result = Vec::with_capacity(candidates.len());
    for (index, membership) in candidates.iter().enumerate() {
        let (Some(feature), _) = &features[index] else {
            result.push(*membership);
            continue;
        };
        let shadowed_by_candidate = features.iter().enumerate().any(|(other, (f, redefines))| {
            other != index && *f != Some(*feature) && redefines.contains(feature)
        });
        let shadowed_by_owned = redefined_by_owned.contains(feature);
        if shadowed_by_candidate || shadowed_by_owned {
            trace!(%ty, %membership, %feature, "redefined feature hidden");
            continue;
        }
        result.push(*membership);
    }
    Ok(result)
}

fn type_inheritable_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let ty = self_id(self_value)?;
    let result = inheritable(ctx, ty, &set_arg(args, 0), &set_arg(args, 1), bool_arg(args, 2))?;
    Ok(to_value(&result))
}

fn type_inherited_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let ty = self_id(self_value)?;
    let result = inherited(ctx, ty, &set_arg(args, 0), &set_arg(args, 1), bool_arg(args, 2))?;
    Ok(to_value(&result))
}

fn type_non_private_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let ty = self_id(self_value)?;
    let excluded_namespaces = set_arg(args, 0);
    let mut result = memberships_of_visibility(ctx, ty, Visibility::Public, &excluded_namespaces)?;
    let protected =
        memberships_of_visibility(ctx, ty, Visibility::Protected, &excluded_namespaces)?;
    extend_unique(&mut result, protected);
    let inherited = inherited(ctx, ty, &excluded_namespaces, &set_arg(args, 1), bool_arg(args, 2))?;
    extend_unique(&mut result, inherited);
    Ok(to_value(&result))
}

fn type_remove_redefined_features(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let ty = self_id(self_value)?;
    let candidates = args.first().map(Value::instances).unwrap_or_default();
    let result = remove_redefined(ctx, ty, candidates)?;
    Ok(to_value(&result))
}

fn type_visible_memberships(
    ctx: &mut EvalContext<'_>,
    self_value: &Value,
    args: &[Value],
) -> EvalResult<Value> {
    let ty = self_id(self_value)?;
    let excluded = set_arg(args, 0);
    let include_all = bool_arg(args, 2);
    let mut result = own_visible(ctx, ty, &excluded, bool_arg(args, 1), include_all)?;
    for membership in inherited(ctx, ty, &excluded, &ExclusionSet::new(), false)? {
        if include_all || visibility(ctx, membership)? == Visibility::Public {
            extend_unique(&mut result, [membership]);
        }
    }
    Ok(to_value(&result))
}
