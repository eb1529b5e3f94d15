//! Metamodel definition types.

use meld_ast::Expr;
use meld_core::{AssociationId, ClassId, CollectionKind, EndSide, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Lower/upper bound on the number of values a property may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    pub lower: u32,
    /// `None` means unbounded (`*`).
    pub upper: Option<u32>,
}

impl Multiplicity {
    /// `[0..1]`
    pub const OPTIONAL: Multiplicity = Multiplicity {
        lower: 0,
        upper: Some(1),
    };
    /// `[1..1]`
    pub const ONE: Multiplicity = Multiplicity {
        lower: 1,
        upper: Some(1),
    };
    /// `[0..*]`
    pub const MANY: Multiplicity = Multiplicity {
        lower: 0,
        upper: None,
    };
    /// `[1..*]`
    pub const ONE_OR_MORE: Multiplicity = Multiplicity {
        lower: 1,
        upper: None,
    };

    pub fn new(lower: u32, upper: Option<u32>) -> Self {
        Self { lower, upper }
    }

    /// Single-valued properties read as a scalar rather than a collection.
    pub fn is_single(&self) -> bool {
        self.upper == Some(1)
    }

    pub fn is_required(&self) -> bool {
        self.lower > 0
    }

    /// Check if `count` values exceed the upper bound.
    pub fn exceeds_upper(&self, count: usize) -> bool {
        match self.upper {
            Some(max) => count > max as usize,
            None => false,
        }
    }

    /// Check if `count` values satisfy the lower bound.
    pub fn meets_lower(&self, count: usize) -> bool {
        count >= self.lower as usize
    }

    pub fn admits(&self, count: usize) -> bool {
        self.meets_lower(count) && !self.exceeds_upper(count)
    }
}

impl Default for Multiplicity {
    fn default() -> Self {
        Multiplicity::OPTIONAL
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) if upper == self.lower => write!(f, "[{}]", upper),
            Some(upper) => write!(f, "[{}..{}]", self.lower, upper),
            None => write!(f, "[{}..*]", self.lower),
        }
    }
}

/// Attribute definition within a class.
#[derive(Debug, Clone)]
pub struct AttrDef {
    /// Attribute name.
    pub name: String,
    /// Value type name (Boolean, Integer, Real, String, Any, or a class name).
    pub type_name: String,
    pub multiplicity: Multiplicity,
    /// Computed on demand by a derivation constraint, never stored.
    pub derived: bool,
    pub read_only: bool,
    pub ordered: bool,
    pub unique: bool,
    /// Default value applied at instance creation.
    pub default: Option<Value>,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            multiplicity: Multiplicity::OPTIONAL,
            derived: false,
            read_only: false,
            ordered: false,
            unique: true,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.multiplicity = Multiplicity::ONE;
        self
    }

    pub fn many(mut self) -> Self {
        self.multiplicity = Multiplicity::MANY;
        self
    }

    pub fn multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    pub fn non_unique(mut self) -> Self {
        self.unique = false;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Collection kind used when the attribute is multi-valued.
    pub fn collection_kind(&self) -> CollectionKind {
        CollectionKind::from_flags(self.ordered, self.unique)
    }
}

/// Operation parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub type_name: String,
    pub multiplicity: Multiplicity,
    /// Evaluated when the caller omits the argument.
    pub default: Option<Expr>,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            multiplicity: Multiplicity::ONE,
            default: None,
        }
    }

    pub fn many(mut self) -> Self {
        self.multiplicity = Multiplicity::MANY;
        self
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

/// How an operation computes its result.
#[derive(Debug, Clone)]
pub enum OperationBody {
    /// A declarative expression evaluated with `self` and the parameters bound.
    Expr(Expr),
    /// Name of a procedure in the native table.
    Native(String),
}

/// Operation definition.
#[derive(Debug, Clone)]
pub struct OperationDef {
    pub name: String,
    pub params: Vec<ParamDef>,
    pub result: Multiplicity,
    pub body: OperationBody,
}

impl OperationDef {
    /// An operation with a declarative body.
    pub fn expr(name: impl Into<String>, body: Expr) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            result: Multiplicity::MANY,
            body: OperationBody::Expr(body),
        }
    }

    /// An operation backed by a native procedure.
    pub fn native(name: impl Into<String>, procedure: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            result: Multiplicity::MANY,
            body: OperationBody::Native(procedure.into()),
        }
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, result: Multiplicity) -> Self {
        self.result = result;
        self
    }

    /// Number of parameters without a default.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }
}

/// What a constraint is used for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Computes the value of a derived attribute or association end.
    Derivation { property: String },
    /// A Boolean check over well-formed instances.
    Verification,
    /// A Boolean check that an implied relationship is present.
    ImplicitRelationship,
}

/// Constraint definition.
#[derive(Debug, Clone)]
pub struct ConstraintDef {
    pub name: String,
    pub kind: ConstraintKind,
    pub expr: Expr,
}

impl ConstraintDef {
    pub fn derivation(property: impl Into<String>, expr: Expr) -> Self {
        let property = property.into();
        Self {
            name: format!("derive_{}", property),
            kind: ConstraintKind::Derivation { property },
            expr,
        }
    }

    pub fn verification(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Verification,
            expr,
        }
    }

    pub fn implicit_relationship(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::ImplicitRelationship,
            expr,
        }
    }

    /// The property this constraint derives, if it is a derivation.
    pub fn derived_property(&self) -> Option<&str> {
        match &self.kind {
            ConstraintKind::Derivation { property } => Some(property),
            _ => None,
        }
    }
}

/// Kind of relationship a binding rule implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImpliedKind {
    Specialization,
    Subsetting,
}

impl ImpliedKind {
    /// Metaclass the implied edge is instantiated from.
    pub fn metaclass(&self) -> &'static str {
        match self {
            ImpliedKind::Specialization => "Specialization",
            ImpliedKind::Subsetting => "Subsetting",
        }
    }
}

/// Structural condition guarding a binding rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Always holds.
    Default,
    /// The instance is typed by the named library type (or a subtype).
    TypedBy(String),
    /// The instance is an end feature.
    IsEnd,
    /// The instance is a composite feature.
    IsComposite,
    /// The instance's owning type is typed by the named library type.
    OwningTypeTypedBy(String),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And(conditions)
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or(conditions)
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }
}

/// A semantic-binding rule: when `condition` holds, the instance gets an
/// implied edge of `kind` to the library element named `base`.
#[derive(Debug, Clone)]
pub struct BindingRule {
    pub kind: ImpliedKind,
    /// Qualified name of the library concept to bind to.
    pub base: String,
    pub condition: Condition,
}

impl BindingRule {
    pub fn new(kind: ImpliedKind, base: impl Into<String>, condition: Condition) -> Self {
        Self {
            kind,
            base: base.into(),
            condition,
        }
    }
}

/// Class definition.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub id: ClassId,
    pub name: String,
    pub is_abstract: bool,
    /// Direct superclasses in declaration order.
    pub superclass_ids: Vec<ClassId>,
    pub attributes: HashMap<String, AttrDef>,
    pub operations: HashMap<String, OperationDef>,
    pub constraints: Vec<ConstraintDef>,
    pub binding_rules: Vec<BindingRule>,
}

impl ClassDef {
    /// Get an own attribute definition by name.
    pub fn get_attr(&self, name: &str) -> Option<&AttrDef> {
        self.attributes.get(name)
    }

    /// Get an own operation definition by name.
    pub fn get_operation(&self, name: &str) -> Option<&OperationDef> {
        self.operations.get(name)
    }
}

/// Aggregation of an association end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationKind {
    #[default]
    None,
    Shared,
    /// The instance at the opposite end owns the instances reached through this end.
    Composite,
}

/// One end of an association.
#[derive(Debug, Clone)]
pub struct EndDef {
    pub name: String,
    /// Class of the instances this end points at.
    pub type_name: String,
    pub multiplicity: Multiplicity,
    pub derived: bool,
    pub navigable: bool,
    pub ordered: bool,
    pub unique: bool,
    pub aggregation: AggregationKind,
    /// Names of ends this end subsets.
    pub subsets: Vec<String>,
    /// Names of ends this end redefines.
    pub redefines: Vec<String>,
}

impl EndDef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            multiplicity: Multiplicity::MANY,
            derived: false,
            navigable: true,
            ordered: false,
            unique: true,
            aggregation: AggregationKind::None,
            subsets: Vec::new(),
            redefines: Vec::new(),
        }
    }

    pub fn multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn optional(self) -> Self {
        self.multiplicity(Multiplicity::OPTIONAL)
    }

    pub fn one(self) -> Self {
        self.multiplicity(Multiplicity::ONE)
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn non_navigable(mut self) -> Self {
        self.navigable = false;
        self
    }

    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    pub fn non_unique(mut self) -> Self {
        self.unique = false;
        self
    }

    pub fn composite(mut self) -> Self {
        self.aggregation = AggregationKind::Composite;
        self
    }

    pub fn shared(mut self) -> Self {
        self.aggregation = AggregationKind::Shared;
        self
    }

    pub fn subsets(mut self, end_name: impl Into<String>) -> Self {
        self.subsets.push(end_name.into());
        self
    }

    pub fn redefines(mut self, end_name: impl Into<String>) -> Self {
        self.redefines.push(end_name.into());
        self
    }

    pub fn is_composite(&self) -> bool {
        self.aggregation == AggregationKind::Composite
    }

    pub fn collection_kind(&self) -> CollectionKind {
        CollectionKind::from_flags(self.ordered, self.unique)
    }
}

/// Association definition.
///
/// Every link is stored as `(association, source, target)`. `ends[0]` types
/// the source and `ends[1]` types the target; navigating `ends[1]` from a
/// source yields targets.
#[derive(Debug, Clone)]
pub struct AssociationDef {
    pub id: AssociationId,
    pub name: String,
    pub ends: [EndDef; 2],
    /// Resolved classes of `ends[0]` and `ends[1]`.
    pub end_classes: [ClassId; 2],
}

impl AssociationDef {
    pub fn end(&self, side: EndSide) -> &EndDef {
        &self.ends[side.index()]
    }

    pub fn end_class(&self, side: EndSide) -> ClassId {
        self.end_classes[side.index()]
    }

    /// The side whose end has the given name.
    pub fn side_of(&self, end_name: &str) -> Option<EndSide> {
        if self.ends[1].name == end_name {
            Some(EndSide::Target)
        } else if self.ends[0].name == end_name {
            Some(EndSide::Source)
        } else {
            None
        }
    }

    /// The composite end, if any.
    pub fn composite_side(&self) -> Option<EndSide> {
        if self.ends[1].is_composite() {
            Some(EndSide::Target)
        } else if self.ends[0].is_composite() {
            Some(EndSide::Source)
        } else {
            None
        }
    }
}

/// A navigable association end: the association plus the side being reached.
///
/// Navigating an `EndRef` with side `Target` from a source instance yields the
/// link targets; side `Source` yields link sources from a target instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndRef {
    pub association: AssociationId,
    pub side: EndSide,
}

impl EndRef {
    pub fn new(association: AssociationId, side: EndSide) -> Self {
        Self { association, side }
    }

    /// The side the navigating instance sits on.
    pub fn from_side(&self) -> EndSide {
        self.side.opposite()
    }
}

/// Precomputed subclass relationships.
#[derive(Debug, Default)]
pub struct SubtypeIndex {
    /// For each class, the set of all its subclasses (transitive).
    subtypes: HashMap<ClassId, HashSet<ClassId>>,
    /// For each class, the set of all its superclasses (transitive).
    supertypes: HashMap<ClassId, HashSet<ClassId>>,
}

impl SubtypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from class definitions. Assumes the hierarchy is acyclic.
    pub fn build(classes: &HashMap<ClassId, ClassDef>) -> Self {
        let mut index = Self::new();

        for &class_id in classes.keys() {
            index.subtypes.insert(class_id, HashSet::new());
            index.supertypes.insert(class_id, HashSet::new());
        }

        for (class_id, class_def) in classes {
            let mut stack: Vec<ClassId> = class_def.superclass_ids.clone();
            let mut seen = HashSet::new();
            while let Some(super_id) = stack.pop() {
                if !seen.insert(super_id) {
                    continue;
                }
                if let Some(set) = index.supertypes.get_mut(class_id) {
                    set.insert(super_id);
                }
                if let Some(set) = index.subtypes.get_mut(&super_id) {
                    set.insert(*class_id);
                }
                if let Some(super_def) = classes.get(&super_id) {
                    stack.extend(super_def.superclass_ids.iter().copied());
                }
            }
        }

        index
    }

    /// Check if `sub` is `super_type` or one of its subclasses.
    pub fn is_subtype(&self, sub: ClassId, super_type: ClassId) -> bool {
        if sub == super_type {
            return true;
        }
        self.supertypes
            .get(&sub)
            .map(|set| set.contains(&super_type))
            .unwrap_or(false)
    }

    /// Get all subclasses of a class (not including the class itself).
    pub fn get_subtypes(&self, class_id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.subtypes
            .get(&class_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get all superclasses of a class (not including the class itself).
    pub fn get_supertypes(&self, class_id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.supertypes
            .get(&class_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}
