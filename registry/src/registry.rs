//! The Registry - immutable metamodel lookup.

use crate::{
    AssociationDef, AttrDef, BindingRule, ClassDef, ConstraintDef, EndDef, EndRef, OperationDef,
    SubtypeIndex,
};
use meld_core::{AssociationId, ClassId, EndSide};
use std::collections::{HashMap, HashSet, VecDeque};

/// The Registry provides runtime lookup of class and association definitions.
/// It is immutable after construction.
#[derive(Debug)]
pub struct Registry {
    /// Class definitions by ID.
    classes: HashMap<ClassId, ClassDef>,
    /// Class ID lookup by name.
    class_names: HashMap<String, ClassId>,

    /// Association definitions by ID.
    associations: HashMap<AssociationId, AssociationDef>,
    /// Association ID lookup by name.
    association_names: HashMap<String, AssociationId>,

    /// Precomputed subclass relationships.
    subtype_index: SubtypeIndex,
    /// For each class: itself, then its superclasses breadth-first.
    linearizations: HashMap<ClassId, Vec<ClassId>>,
    /// For each class: every end navigable from its instances.
    navigable_ends: HashMap<ClassId, Vec<EndRef>>,
}

impl Registry {
    pub(crate) fn new(
        classes: HashMap<ClassId, ClassDef>,
        class_names: HashMap<String, ClassId>,
        associations: HashMap<AssociationId, AssociationDef>,
        association_names: HashMap<String, AssociationId>,
        subtype_index: SubtypeIndex,
    ) -> Self {
        let linearizations = classes
            .keys()
            .map(|&id| (id, linearize(id, &classes)))
            .collect();

        let mut association_ids: Vec<AssociationId> = associations.keys().copied().collect();
        association_ids.sort();

        let mut navigable_ends: HashMap<ClassId, Vec<EndRef>> = HashMap::new();
        for &class_id in classes.keys() {
            let mut ends = Vec::new();
            for assoc_id in &association_ids {
                let assoc = &associations[assoc_id];
                for side in [EndSide::Target, EndSide::Source] {
                    let end = assoc.end(side);
                    let owner = assoc.end_class(side.opposite());
                    if end.navigable && subtype_index.is_subtype(class_id, owner) {
                        ends.push(EndRef::new(*assoc_id, side));
                    }
                }
            }
            navigable_ends.insert(class_id, ends);
        }

        Self {
            classes,
            class_names,
            associations,
            association_names,
            subtype_index,
            linearizations,
            navigable_ends,
        }
    }

    // ==================== Class Lookups ====================

    /// Get a class definition by name.
    pub fn get_class_by_name(&self, name: &str) -> Option<&ClassDef> {
        self.class_names.get(name).and_then(|id| self.classes.get(id))
    }

    /// Get a class definition by ID.
    pub fn get_class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(&id)
    }

    /// Get a class ID by name.
    pub fn get_class_id(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    /// Get a class name by ID.
    pub fn class_name(&self, id: ClassId) -> Option<&str> {
        self.classes.get(&id).map(|c| c.name.as_str())
    }

    /// Get all class definitions.
    pub fn all_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    /// Get the number of classes.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    // ==================== Association Lookups ====================

    /// Get an association definition by name.
    pub fn get_association_by_name(&self, name: &str) -> Option<&AssociationDef> {
        self.association_names
            .get(name)
            .and_then(|id| self.associations.get(id))
    }

    /// Get an association definition by ID.
    pub fn get_association(&self, id: AssociationId) -> Option<&AssociationDef> {
        self.associations.get(&id)
    }

    /// Get an association ID by name.
    pub fn get_association_id(&self, name: &str) -> Option<AssociationId> {
        self.association_names.get(name).copied()
    }

    /// All associations in declaration order.
    pub fn all_associations(&self) -> Vec<&AssociationDef> {
        let mut all: Vec<&AssociationDef> = self.associations.values().collect();
        all.sort_by_key(|a| a.id);
        all
    }

    // ==================== Subclass Queries ====================

    /// Check if `sub` is `super_class` or one of its subclasses.
    pub fn is_subclass(&self, sub: ClassId, super_class: ClassId) -> bool {
        self.subtype_index.is_subtype(sub, super_class)
    }

    /// Check subclassing by name. Unknown names are never subclasses.
    pub fn is_subclass_by_name(&self, sub: ClassId, super_name: &str) -> bool {
        self.get_class_id(super_name)
            .map(|super_id| self.is_subclass(sub, super_id))
            .unwrap_or(false)
    }

    /// All superclasses of a class, not including the class itself.
    pub fn all_superclasses(&self, class_id: ClassId) -> Vec<ClassId> {
        self.linearization(class_id)
            .iter()
            .skip(1)
            .copied()
            .collect()
    }

    /// Get all subclasses of a class (not including the class itself).
    pub fn get_subclasses(&self, class_id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.subtype_index.get_subtypes(class_id)
    }

    /// The class followed by its superclasses, most specific first.
    pub fn linearization(&self, class_id: ClassId) -> &[ClassId] {
        self.linearizations
            .get(&class_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    // ==================== Feature Lookups ====================

    /// Get an attribute definition, including inherited attributes.
    pub fn find_attr(&self, class_id: ClassId, name: &str) -> Option<&AttrDef> {
        self.linearization(class_id)
            .iter()
            .filter_map(|id| self.classes.get(id))
            .find_map(|c| c.get_attr(name))
    }

    /// Get all attributes for a class including inherited ones; the most
    /// specific definition of a name wins.
    pub fn all_attrs(&self, class_id: ClassId) -> Vec<&AttrDef> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for class_def in self
            .linearization(class_id)
            .iter()
            .filter_map(|id| self.classes.get(id))
        {
            let mut own: Vec<&AttrDef> = class_def.attributes.values().collect();
            own.sort_by(|a, b| a.name.cmp(&b.name));
            for attr in own {
                if seen.insert(attr.name.as_str()) {
                    result.push(attr);
                }
            }
        }
        result
    }

    /// Get an operation definition, including inherited operations.
    pub fn find_operation(&self, class_id: ClassId, name: &str) -> Option<&OperationDef> {
        self.linearization(class_id)
            .iter()
            .filter_map(|id| self.classes.get(id))
            .find_map(|c| c.get_operation(name))
    }

    /// Every association end navigable from instances of a class.
    pub fn navigable_ends_for_class(&self, class_id: ClassId) -> &[EndRef] {
        self.navigable_ends
            .get(&class_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get the definition of a referenced end.
    pub fn end_def(&self, end: EndRef) -> Option<&EndDef> {
        self.associations
            .get(&end.association)
            .map(|a| a.end(end.side))
    }

    /// Class of the instances navigating an end.
    pub fn end_owner(&self, end: EndRef) -> Option<ClassId> {
        self.associations
            .get(&end.association)
            .map(|a| a.end_class(end.from_side()))
    }

    /// Resolve an end name navigable from a class.
    ///
    /// An end that redefines `name` hides it when its owning class is more
    /// specific than the owner of the redefined end.
    pub fn find_end(&self, class_id: ClassId, name: &str) -> Option<EndRef> {
        let linearization = self.linearization(class_id);
        let rank = |end: &EndRef| {
            self.end_owner(*end)
                .and_then(|owner| linearization.iter().position(|c| *c == owner))
                .unwrap_or(usize::MAX)
        };

        self.navigable_ends_for_class(class_id)
            .iter()
            .filter_map(|end_ref| {
                let def = self.end_def(*end_ref)?;
                if def.name == name {
                    Some((rank(end_ref), 1, *end_ref))
                } else if def.redefines.iter().any(|r| r == name) {
                    Some((rank(end_ref), 0, *end_ref))
                } else {
                    None
                }
            })
            .min_by_key(|(rank, exact, _)| (*rank, *exact))
            .map(|(_, _, end_ref)| end_ref)
    }

    /// Ends navigable from a class that subset the given end.
    pub fn subsetting_ends(&self, class_id: ClassId, end: EndRef) -> Vec<EndRef> {
        let Some(name) = self.end_def(end).map(|e| e.name.as_str()) else {
            return Vec::new();
        };
        self.navigable_ends_for_class(class_id)
            .iter()
            .filter(|candidate| {
                self.end_def(**candidate)
                    .map(|def| def.subsets.iter().any(|s| s == name))
                    .unwrap_or(false)
            })
            .copied()
            .collect()
    }

    // ==================== Constraint Lookups ====================

    /// All constraints for a class, most specific class first.
    pub fn constraints_for_class(&self, class_id: ClassId) -> Vec<&ConstraintDef> {
        self.linearization(class_id)
            .iter()
            .filter_map(|id| self.classes.get(id))
            .flat_map(|c| c.constraints.iter())
            .collect()
    }

    /// The most specific derivation of a property.
    pub fn derivation_for(&self, class_id: ClassId, property: &str) -> Option<&ConstraintDef> {
        self.constraints_for_class(class_id)
            .into_iter()
            .find(|c| c.derived_property() == Some(property))
    }

    /// Binding rules for a class and its superclasses, most specific class first.
    pub fn binding_rules_for_class(&self, class_id: ClassId) -> Vec<&BindingRule> {
        self.linearization(class_id)
            .iter()
            .filter_map(|id| self.classes.get(id))
            .flat_map(|c| c.binding_rules.iter())
            .collect()
    }
}

/// Breadth-first over declared superclasses, first occurrence wins.
fn linearize(class_id: ClassId, classes: &HashMap<ClassId, ClassDef>) -> Vec<ClassId> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([class_id]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        order.push(id);
        if let Some(class_def) = classes.get(&id) {
            queue.extend(class_def.superclass_ids.iter().copied());
        }
    }
    order
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            classes: HashMap::new(),
            class_names: HashMap::new(),
            associations: HashMap::new(),
            association_names: HashMap::new(),
            subtype_index: SubtypeIndex::new(),
            linearizations: HashMap::new(),
            navigable_ends: HashMap::new(),
        }
    }
}
