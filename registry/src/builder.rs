//! RegistryBuilder for constructing an immutable Registry.

use crate::{
    AssociationDef, AttrDef, BindingRule, ClassDef, Condition, ConstraintDef, EndDef, ImpliedKind,
    OperationDef, Registry, SubtypeIndex,
};
use meld_ast::Expr;
use meld_core::{AssociationId, ClassId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during registry construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate class name: {0}")]
    DuplicateClassName(String),

    #[error("Duplicate association name: {0}")]
    DuplicateAssociationName(String),

    #[error("Unknown superclass '{superclass}' of class {class}")]
    UnknownSuperclass { class: String, superclass: String },

    #[error("Inheritance cycle detected involving class: {0}")]
    InheritanceCycle(String),

    #[error("Association {association} is missing its {side} end")]
    IncompleteAssociation { association: String, side: &'static str },

    #[error("Unknown end type '{type_name}' in association {association}")]
    UnknownEndType {
        association: String,
        type_name: String,
    },

    #[error("Association {0} has two composite ends")]
    TwoCompositeEnds(String),

    #[error("End {end} of association {association} refers to unknown end '{referenced}'")]
    UnknownEndReference {
        association: String,
        end: String,
        referenced: String,
    },
}

/// Result type for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug)]
struct PendingClass {
    id: ClassId,
    name: String,
    is_abstract: bool,
    superclass_names: Vec<String>,
    attributes: HashMap<String, AttrDef>,
    operations: HashMap<String, OperationDef>,
    constraints: Vec<ConstraintDef>,
    binding_rules: Vec<BindingRule>,
}

#[derive(Debug)]
struct PendingAssociation {
    id: AssociationId,
    name: String,
    ends: [EndDef; 2],
}

/// Builder for constructing an immutable Registry.
///
/// Classes may name superclasses and associations may name end types that
/// are declared later; names are resolved in [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    /// Next class ID to allocate.
    next_class_id: u32,
    /// Next association ID to allocate.
    next_association_id: u32,

    /// Classes being built, in declaration order.
    classes: Vec<PendingClass>,
    /// Class name to ID mapping.
    class_names: HashMap<String, ClassId>,

    /// Associations being built, in declaration order.
    associations: Vec<PendingAssociation>,
    /// Association name to ID mapping.
    association_names: HashMap<String, AssociationId>,
}

impl RegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class definition.
    pub fn add_class(&mut self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder {
            builder: self,
            name: name.into(),
            superclass_names: Vec::new(),
            attributes: HashMap::new(),
            operations: HashMap::new(),
            constraints: Vec::new(),
            binding_rules: Vec::new(),
            is_abstract: false,
        }
    }

    /// Add an association definition.
    pub fn add_association(&mut self, name: impl Into<String>) -> AssociationBuilder<'_> {
        AssociationBuilder {
            builder: self,
            name: name.into(),
            source: None,
            target: None,
        }
    }

    /// Look up the ID allocated to a declared class.
    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    /// Build the immutable Registry.
    pub fn build(self) -> RegistryResult<Registry> {
        // Resolve superclass names
        let mut classes: HashMap<ClassId, ClassDef> = HashMap::new();
        for pending in self.classes {
            let mut superclass_ids = Vec::new();
            for super_name in &pending.superclass_names {
                match self.class_names.get(super_name) {
                    Some(&id) => superclass_ids.push(id),
                    None => {
                        return Err(RegistryError::UnknownSuperclass {
                            class: pending.name.clone(),
                            superclass: super_name.clone(),
                        })
                    }
                }
            }
            classes.insert(
                pending.id,
                ClassDef {
                    id: pending.id,
                    name: pending.name,
                    is_abstract: pending.is_abstract,
                    superclass_ids,
                    attributes: pending.attributes,
                    operations: pending.operations,
                    constraints: pending.constraints,
                    binding_rules: pending.binding_rules,
                },
            );
        }

        check_acyclic(&classes)?;

        // Resolve end types and check end references
        let end_names: Vec<String> = self
            .associations
            .iter()
            .flat_map(|a| a.ends.iter().map(|e| e.name.clone()))
            .collect();

        let mut associations: HashMap<AssociationId, AssociationDef> = HashMap::new();
        for pending in self.associations {
            let mut end_classes = [ClassId::new(0); 2];
            for (i, end) in pending.ends.iter().enumerate() {
                end_classes[i] = match self.class_names.get(&end.type_name) {
                    Some(&id) => id,
                    None => {
                        return Err(RegistryError::UnknownEndType {
                            association: pending.name.clone(),
                            type_name: end.type_name.clone(),
                        })
                    }
                };
                for referenced in end.subsets.iter().chain(end.redefines.iter()) {
                    if !end_names.contains(referenced) {
                        return Err(RegistryError::UnknownEndReference {
                            association: pending.name.clone(),
                            end: end.name.clone(),
                            referenced: referenced.clone(),
                        });
                    }
                }
            }

            if pending.ends[0].is_composite() && pending.ends[1].is_composite() {
                return Err(RegistryError::TwoCompositeEnds(pending.name));
            }

            associations.insert(
                pending.id,
                AssociationDef {
                    id: pending.id,
                    name: pending.name,
                    ends: pending.ends,
                    end_classes,
                },
            );
        }

        let subtype_index = SubtypeIndex::build(&classes);

        Ok(Registry::new(
            classes,
            self.class_names,
            associations,
            self.association_names,
            subtype_index,
        ))
    }
}

/// Depth-first search over superclass edges; a back edge is a cycle.
fn check_acyclic(classes: &HashMap<ClassId, ClassDef>) -> RegistryResult<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit(
        id: ClassId,
        classes: &HashMap<ClassId, ClassDef>,
        marks: &mut HashMap<ClassId, Mark>,
    ) -> RegistryResult<()> {
        match marks.get(&id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let name = classes
                    .get(&id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| id.to_string());
                return Err(RegistryError::InheritanceCycle(name));
            }
            None => {}
        }
        marks.insert(id, Mark::Visiting);
        if let Some(class_def) = classes.get(&id) {
            for &super_id in &class_def.superclass_ids {
                visit(super_id, classes, marks)?;
            }
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut ids: Vec<ClassId> = classes.keys().copied().collect();
    ids.sort();
    for id in ids {
        visit(id, classes, &mut marks)?;
    }
    Ok(())
}

/// Builder for a class definition.
pub struct ClassBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    name: String,
    superclass_names: Vec<String>,
    attributes: HashMap<String, AttrDef>,
    operations: HashMap<String, OperationDef>,
    constraints: Vec<ConstraintDef>,
    binding_rules: Vec<BindingRule>,
    is_abstract: bool,
}

impl<'a> ClassBuilder<'a> {
    /// Add a superclass by name.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass_names.push(superclass.into());
        self
    }

    /// Mark as abstract.
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add an attribute.
    pub fn attr(mut self, attr: AttrDef) -> Self {
        self.attributes.insert(attr.name.clone(), attr);
        self
    }

    /// Add a derived attribute together with its derivation.
    pub fn derived_attr(mut self, attr: AttrDef, expr: Expr) -> Self {
        let attr = attr.derived();
        self.constraints
            .push(ConstraintDef::derivation(attr.name.clone(), expr));
        self.attributes.insert(attr.name.clone(), attr);
        self
    }

    /// Add a derivation for a property declared elsewhere (e.g. a derived end).
    pub fn derive(mut self, property: impl Into<String>, expr: Expr) -> Self {
        self.constraints.push(ConstraintDef::derivation(property, expr));
        self
    }

    /// Add an operation.
    pub fn operation(mut self, operation: OperationDef) -> Self {
        self.operations.insert(operation.name.clone(), operation);
        self
    }

    /// Add a constraint.
    pub fn constraint(mut self, constraint: ConstraintDef) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Add a semantic-binding rule.
    pub fn binding(
        mut self,
        kind: ImpliedKind,
        base: impl Into<String>,
        condition: Condition,
    ) -> Self {
        self.binding_rules
            .push(BindingRule::new(kind, base, condition));
        self
    }

    /// Finish building this class.
    pub fn done(self) -> RegistryResult<ClassId> {
        if self.builder.class_names.contains_key(&self.name) {
            return Err(RegistryError::DuplicateClassName(self.name));
        }

        let id = ClassId::new(self.builder.next_class_id);
        self.builder.next_class_id += 1;

        self.builder.class_names.insert(self.name.clone(), id);
        self.builder.classes.push(PendingClass {
            id,
            name: self.name,
            is_abstract: self.is_abstract,
            superclass_names: self.superclass_names,
            attributes: self.attributes,
            operations: self.operations,
            constraints: self.constraints,
            binding_rules: self.binding_rules,
        });

        Ok(id)
    }
}

/// Builder for an association definition.
pub struct AssociationBuilder<'a> {
    builder: &'a mut RegistryBuilder,
    name: String,
    source: Option<EndDef>,
    target: Option<EndDef>,
}

impl<'a> AssociationBuilder<'a> {
    /// The end typed by link sources (`ends[0]`).
    pub fn source(mut self, end: EndDef) -> Self {
        self.source = Some(end);
        self
    }

    /// The end typed by link targets (`ends[1]`).
    pub fn target(mut self, end: EndDef) -> Self {
        self.target = Some(end);
        self
    }

    /// Finish building this association.
    pub fn done(self) -> RegistryResult<AssociationId> {
        if self.builder.association_names.contains_key(&self.name) {
            return Err(RegistryError::DuplicateAssociationName(self.name));
        }
        let source = self.source.ok_or_else(|| RegistryError::IncompleteAssociation {
            association: self.name.clone(),
            side: "source",
        })?;
        let target = self.target.ok_or_else(|| RegistryError::IncompleteAssociation {
            association: self.name.clone(),
            side: "target",
        })?;

        let id = AssociationId::new(self.builder.next_association_id);
        self.builder.next_association_id += 1;

        self.builder.association_names.insert(self.name.clone(), id);
        self.builder.associations.push(PendingAssociation {
            id,
            name: self.name,
            ends: [source, target],
        });

        Ok(id)
    }
}
