//! Kernel metamodel registration.
//!
//! Elements, namespaces and memberships, types and features, and the
//! relationship metaclasses that connect them. Derived properties and the
//! declarative type-system operations are expressions; the membership
//! algorithms delegate to the native procedures in [`crate::register_natives`].

use meld_ast::build::*;
use meld_ast::{Expr, IterKind};
use meld_core::Value;
use meld_registry::{
    AttrDef, Condition, ConstraintDef, EndDef, ImpliedKind, Multiplicity, OperationDef,
    ParamDef, Registry, RegistryBuilder, RegistryResult,
};

/// Library concept every classifier specializes.
pub const BASE_ANYTHING: &str = "Base::Anything";
/// Library concept every class specializes.
pub const BASE_OBJECT: &str = "Base::Object";
/// Library feature every feature subsets.
pub const BASE_THINGS: &str = "Base::things";
/// Library feature every composite feature subsets.
pub const BASE_PARTS: &str = "Base::parts";

/// Build a registry holding only the kernel metamodel.
pub fn kernel_registry() -> RegistryResult<Registry> {
    let mut builder = RegistryBuilder::new();
    register_kernel(&mut builder)?;
    builder.build()
}

/// Register the kernel metaclasses and associations.
pub fn register_kernel(builder: &mut RegistryBuilder) -> RegistryResult<()> {
    register_elements(builder)?;
    register_types(builder)?;
    register_relationships(builder)?;
    register_associations(builder)
}

fn empty_set() -> Expr {
    set_of(vec![])
}

fn excluded_param(name: &str, of: &str) -> ParamDef {
    ParamDef::new(name, of).many().with_default(empty_set())
}

fn bool_param(name: &str) -> ParamDef {
    ParamDef::new(name, "Boolean").with_default(lit(false))
}

fn many_ordered(name: &str, type_name: &str) -> AttrDef {
    AttrDef::new(name, type_name).many().ordered()
}

fn register_elements(builder: &mut RegistryBuilder) -> RegistryResult<()> {
    builder
        .add_class("Element")
        .abstract_class()
        .attr(AttrDef::new("name", "String"))
        .derived_attr(
            AttrDef::new("owningNamespace", "Namespace"),
            this()
                .nav("referencingMembership")
                .nav("membershipOwningNamespace")
                .first(),
        )
        .done()?;

    builder
        .add_class("Namespace")
        .extends("Element")
        .derived_attr(
            many_ordered("ownedMember", "Element"),
            this().nav("ownedMembership").nav("memberElement").as_ordered_set(),
        )
        .derived_attr(
            many_ordered("membership", "Membership"),
            this()
                .nav("ownedMembership")
                .union(this().call("importedMemberships", vec![])),
        )
        .derived_attr(
            many_ordered("member", "Element"),
            this().nav("membership").nav("memberElement").as_ordered_set(),
        )
        .constraint(ConstraintDef::verification(
            "validateNamespaceDistinguishability",
            this()
                .nav("ownedMember")
                .reject("m", var("m").nav("name").is_null())
                .iterate(IterKind::IsUnique, "m", var("m").nav("name")),
        ))
        .operation(
            OperationDef::native("importedMemberships", "namespace_imported_memberships")
                .param(excluded_param("excluded", "Namespace")),
        )
        .operation(
            OperationDef::native("publicMemberships", "namespace_public_memberships")
                .param(excluded_param("excluded", "Namespace")),
        )
        .operation(
            OperationDef::native("protectedMemberships", "namespace_protected_memberships")
                .param(excluded_param("excluded", "Namespace")),
        )
        .operation(
            OperationDef::native("visibleMemberships", "namespace_visible_memberships")
                .param(excluded_param("excluded", "Namespace"))
                .param(bool_param("isRecursive"))
                .param(bool_param("includeAll")),
        )
        .done()?;

    Ok(())
}

fn register_types(builder: &mut RegistryBuilder) -> RegistryResult<()> {
    // if isConjugated then ownedConjugator.originalType
    // else (ownedSpecialization, minus implied ones when asked).general
    let supertypes = if_then_else(
        this().nav("isConjugated"),
        this().nav("ownedConjugator").nav("originalType").as_ordered_set(),
        if_then_else(
            var("excludeImplied"),
            this()
                .nav("ownedSpecialization")
                .reject("s", var("s").nav("isImplied")),
            this().nav("ownedSpecialization"),
        )
        .nav("general")
        .as_ordered_set(),
    );
    let all_supertypes = ordered_set_of(vec![this()]).union(
        this().closure("t", var("t").call("supertypes", vec![lit(false)])),
    );

    builder
        .add_class("Type")
        .extends("Namespace")
        .attr(AttrDef::new("isAbstract", "Boolean").with_default(false))
        .derived_attr(
            AttrDef::new("isConjugated", "Boolean"),
            this().nav("ownedConjugator").not_empty(),
        )
        .derived_attr(
            many_ordered("inheritedMembership", "Membership"),
            this().call("inheritedMemberships", vec![]),
        )
        .derive(
            "membership",
            this()
                .nav("ownedMembership")
                .union(this().call("importedMemberships", vec![]))
                .union(this().nav("inheritedMembership")),
        )
        .derived_attr(
            many_ordered("ownedFeature", "Feature"),
            this().nav("ownedMember").select("m", var("m").is_kind_of("Feature")),
        )
        .derived_attr(
            many_ordered("feature", "Feature"),
            this().nav("member").select("m", var("m").is_kind_of("Feature")),
        )
        .operation(
            OperationDef::expr("supertypes", supertypes).param(bool_param("excludeImplied")),
        )
        .operation(OperationDef::expr("allSupertypes", all_supertypes))
        .operation(
            OperationDef::expr(
                "specializes",
                this().call("allSupertypes", vec![]).includes(var("supertype")),
            )
            .param(ParamDef::new("supertype", "Type"))
            .returns(Multiplicity::ONE),
        )
        .operation(
            OperationDef::native("inheritableMemberships", "type_inheritable_memberships")
                .param(excluded_param("excludedNamespaces", "Namespace"))
                .param(excluded_param("excludedTypes", "Type"))
                .param(bool_param("excludeImplied")),
        )
        .operation(
            OperationDef::native("inheritedMemberships", "type_inherited_memberships")
                .param(excluded_param("excludedNamespaces", "Namespace"))
                .param(excluded_param("excludedTypes", "Type"))
                .param(bool_param("excludeImplied")),
        )
        .operation(
            OperationDef::native("nonPrivateMemberships", "type_non_private_memberships")
                .param(excluded_param("excludedNamespaces", "Namespace"))
                .param(excluded_param("excludedTypes", "Type"))
                .param(bool_param("excludeImplied")),
        )
        .operation(
            OperationDef::native("removeRedefinedFeatures", "type_remove_redefined_features")
                .param(ParamDef::new("memberships", "Membership").many()),
        )
        .operation(
            OperationDef::native("visibleMemberships", "type_visible_memberships")
                .param(excluded_param("excluded", "Namespace"))
                .param(bool_param("isRecursive"))
                .param(bool_param("includeAll")),
        )
        .done()?;

    builder
        .add_class("Classifier")
        .extends("Type")
        .binding(ImpliedKind::Specialization, BASE_ANYTHING, Condition::Default)
        .constraint(ConstraintDef::implicit_relationship(
            "checkClassifierSpecialization",
            this().call("specializes", vec![global(BASE_ANYTHING)]),
        ))
        .done()?;

    builder
        .add_class("Class")
        .extends("Classifier")
        .binding(ImpliedKind::Specialization, BASE_OBJECT, Condition::Default)
        .done()?;

    let owned_of_kind = |kind: &str| {
        this()
            .nav("ownedSpecialization")
            .select("s", var("s").is_kind_of(kind))
    };

    builder
        .add_class("Feature")
        .extends("Type")
        .attr(AttrDef::new("isEnd", "Boolean").with_default(false))
        .attr(AttrDef::new("isComposite", "Boolean").with_default(false))
        .derived_attr(many_ordered("ownedSubsetting", "Subsetting"), owned_of_kind("Subsetting"))
        .derived_attr(
            many_ordered("ownedRedefinition", "Redefinition"),
            owned_of_kind("Redefinition"),
        )
        .derived_attr(many_ordered("ownedTyping", "FeatureTyping"), owned_of_kind("FeatureTyping"))
        .derived_attr(
            many_ordered("type", "Type"),
            this()
                .nav("ownedTyping")
                .nav("general")
                .union(this().nav("ownedSubsetting").nav("general").nav("type"))
                .as_ordered_set(),
        )
        .derived_attr(
            AttrDef::new("owningType", "Type"),
            if_then_else(
                this().nav("owningNamespace").is_kind_of("Type"),
                this().nav("owningNamespace"),
                null(),
            ),
        )
        .constraint(ConstraintDef::verification(
            "validateRedefinitionNotSelf",
            this().nav("ownedRedefinition").nav("general").excludes(this()),
        ))
        .operation(OperationDef::expr(
            "allRedefinedFeatures",
            ordered_set_of(vec![this()]).union(this().closure(
                "f",
                var("f").nav("ownedRedefinition").nav("general"),
            )),
        ))
        .operation(
            OperationDef::expr(
                "redefines",
                this()
                    .nav("ownedRedefinition")
                    .nav("general")
                    .includes(var("redefinedFeature")),
            )
            .param(ParamDef::new("redefinedFeature", "Feature"))
            .returns(Multiplicity::ONE),
        )
        .operation(
            OperationDef::expr(
                "subsetsChain",
                this()
                    .closure("f", var("f").nav("ownedSubsetting").nav("general"))
                    .includes(var("subsettedFeature")),
            )
            .param(ParamDef::new("subsettedFeature", "Feature"))
            .returns(Multiplicity::ONE),
        )
        .binding(ImpliedKind::Subsetting, BASE_PARTS, Condition::IsComposite)
        .binding(ImpliedKind::Subsetting, BASE_THINGS, Condition::Default)
        .done()?;

    Ok(())
}

fn register_relationships(builder: &mut RegistryBuilder) -> RegistryResult<()> {
    builder
        .add_class("Relationship")
        .abstract_class()
        .extends("Element")
        .attr(AttrDef::new("isImplied", "Boolean").with_default(false))
        .done()?;

    builder
        .add_class("Membership")
        .extends("Relationship")
        .attr(AttrDef::new("visibility", "String").with_default(Value::from("public")))
        .attr(AttrDef::new("memberName", "String"))
        .done()?;

    builder
        .add_class("Import")
        .extends("Relationship")
        .attr(AttrDef::new("visibility", "String").with_default(Value::from("public")))
        .attr(AttrDef::new("isRecursive", "Boolean").with_default(false))
        .done()?;

    for (name, parent) in [
        ("Specialization", "Relationship"),
        ("Subsetting", "Specialization"),
        ("Redefinition", "Subsetting"),
        ("FeatureTyping", "Specialization"),
        ("Conjugation", "Relationship"),
    ] {
        builder.add_class(name).extends(parent).done()?;
    }

    Ok(())
}

fn register_associations(builder: &mut RegistryBuilder) -> RegistryResult<()> {
    builder
        .add_association("NamespaceOwnedMembership")
        .source(EndDef::new("membershipOwningNamespace", "Namespace").optional())
        .target(EndDef::new("ownedMembership", "Membership").ordered().composite())
        .done()?;

    builder
        .add_association("MembershipMemberElement")
        .source(EndDef::new("referencingMembership", "Membership"))
        .target(EndDef::new("memberElement", "Element").one())
        .done()?;

    builder
        .add_association("NamespaceOwnedImport")
        .source(EndDef::new("importOwningNamespace", "Namespace").optional())
        .target(EndDef::new("ownedImport", "Import").ordered().composite())
        .done()?;

    builder
        .add_association("ImportImportedNamespace")
        .source(EndDef::new("importOf", "Import").non_navigable())
        .target(EndDef::new("importedNamespace", "Namespace").one())
        .done()?;

    builder
        .add_association("TypeOwnedSpecialization")
        .source(EndDef::new("specific", "Type").optional())
        .target(
            EndDef::new("ownedSpecialization", "Specialization")
                .ordered()
                .composite(),
        )
        .done()?;

    builder
        .add_association("SpecializationGeneral")
        .source(EndDef::new("generalOf", "Specialization").non_navigable())
        .target(EndDef::new("general", "Type").one())
        .done()?;

    builder
        .add_association("TypeOwnedConjugator")
        .source(EndDef::new("conjugatedType", "Type").optional())
        .target(
            EndDef::new("ownedConjugator", "Conjugation")
                .optional()
                .composite(),
        )
        .done()?;

    builder
        .add_association("ConjugationOriginalType")
        .source(EndDef::new("conjugationOf", "Conjugation").non_navigable())
        .target(EndDef::new("originalType", "Type").one())
        .done()?;

    Ok(())
}
