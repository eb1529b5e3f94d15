//! Library units and qualified-name resolution.
//!
//! A [`LibraryUnit`] is a tree of element declarations loaded into a
//! [`Model`] as ordinary kernel instances. Every loaded element gets an
//! [`ElementId`] derived from its qualified name, so the same library loaded
//! into two models carries the same ids.

use std::collections::{BTreeMap, HashMap};

use meld_core::{ElementId, InstanceId, Value};
use meld_eval::GlobalResolver;
use meld_resolver::Visibility;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{SessionError, SessionResult};
use crate::model::Model;

/// A top-level library namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryUnit {
    pub name: String,
    #[serde(default)]
    pub members: Vec<LibraryElement>,
}

impl LibraryUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn member(mut self, element: LibraryElement) -> Self {
        self.members.push(element);
        self
    }

    pub fn id(&self) -> ElementId {
        ElementId::for_unit(&self.name)
    }
}

/// One declared element and the elements it owns.
///
/// `specializes`, `typed_by` and `redefines` hold qualified names of
/// already-loaded elements or of elements of the same unit. `specializes`
/// becomes a Subsetting when the element is a Feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryElement {
    pub metaclass: String,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub specializes: Vec<String>,
    #[serde(default)]
    pub typed_by: Vec<String>,
    #[serde(default)]
    pub redefines: Vec<String>,
    #[serde(default)]
    pub members: Vec<LibraryElement>,
}

impl LibraryElement {
    pub fn new(metaclass: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metaclass: metaclass.into(),
            name: name.into(),
            attributes: BTreeMap::new(),
            specializes: Vec::new(),
            typed_by: Vec::new(),
            redefines: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn specializes(mut self, general: impl Into<String>) -> Self {
        self.specializes.push(general.into());
        self
    }

    pub fn typed_by(mut self, ty: impl Into<String>) -> Self {
        self.typed_by.push(ty.into());
        self
    }

    pub fn redefines(mut self, feature: impl Into<String>) -> Self {
        self.redefines.push(feature.into());
        self
    }

    pub fn member(mut self, element: LibraryElement) -> Self {
        self.members.push(element);
        self
    }
}

/// Loaded library elements, by qualified name and by element id.
#[derive(Debug, Default)]
pub struct Library {
    by_name: HashMap<String, InstanceId>,
    by_element: HashMap<ElementId, InstanceId>,
    loaded: HashMap<InstanceId, (ElementId, String)>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an element by qualified name (`Base::Anything`).
    pub fn resolve(&self, qualified_name: &str) -> Option<InstanceId> {
        self.by_name.get(qualified_name).copied()
    }

    pub fn instance(&self, element: ElementId) -> Option<InstanceId> {
        self.by_element.get(&element).copied()
    }

    pub fn element_id(&self, instance: InstanceId) -> Option<ElementId> {
        self.loaded.get(&instance).map(|(element, _)| *element)
    }

    pub fn qualified_name(&self, instance: InstanceId) -> Option<&str> {
        self.loaded.get(&instance).map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    fn register(
        &mut self,
        qualified_name: String,
        element: ElementId,
        instance: InstanceId,
    ) {
        self.by_name.insert(qualified_name.clone(), instance);
        self.by_element.insert(element, instance);
        self.loaded.insert(instance, (element, qualified_name));
    }
}

impl GlobalResolver for Library {
    fn resolve_global(&self, qualified_name: &str) -> Option<InstanceId> {
        self.resolve(qualified_name)
    }
}

/// Where a declaration sits: its unit and its path inside the unit.
struct Scope<'a> {
    unit: ElementId,
    unit_name: &'a str,
}

impl Scope<'_> {
    fn local_path(&self, parent: Option<&str>, name: &str) -> String {
        match parent {
            Some(parent) => format!("{parent}::{name}"),
            None => name.to_string(),
        }
    }

    fn qualified_name(&self, local_path: &str) -> String {
        format!("{}::{}", self.unit_name, local_path)
    }
}

/// Names and instances of a unit being loaded, registered in the library
/// only once the whole unit has loaded.
#[derive(Default)]
struct Staged {
    created: Vec<InstanceId>,
    names: Vec<(String, ElementId, InstanceId)>,
}

impl Staged {
    fn contains(&self, element: ElementId) -> bool {
        self.names.iter().any(|(_, id, _)| *id == element)
    }

    fn resolve(&self, qualified_name: &str) -> Option<InstanceId> {
        self.names
            .iter()
            .find(|(name, _, _)| name == qualified_name)
            .map(|(_, _, instance)| *instance)
    }
}

/// Load a unit: create every element with a public membership in its
/// owner, then relate elements to their generals once all names exist.
/// A unit that fails to load leaves neither names nor instances behind.
pub(crate) fn load(model: &mut Model, unit: &LibraryUnit) -> SessionResult<ElementId> {
    let scope = Scope {
        unit: unit.id(),
        unit_name: &unit.name,
    };
    if model.library().instance(scope.unit).is_some() {
        return Err(SessionError::duplicate_library_element(&unit.name));
    }

    let mut staged = Staged::default();
    if let Err(err) = populate(model, unit, &scope, &mut staged) {
        for instance in staged.created.into_iter().rev() {
            if !model.graph().contains_instance(instance) {
                continue;
            }
            if let Err(cleanup) = model.delete_instance(instance) {
                warn!(%instance, error = %cleanup, "could not remove partially loaded element");
            }
        }
        return Err(err);
    }

    let elements = staged.names.len() - 1;
    for (qualified_name, element_id, instance) in staged.names {
        model
            .library_mut()
            .register(qualified_name, element_id, instance);
    }
    debug!(unit = %unit.name, elements, "library loaded");
    Ok(scope.unit)
}

fn populate<'u>(
    model: &mut Model,
    unit: &'u LibraryUnit,
    scope: &Scope<'_>,
    staged: &mut Staged,
) -> SessionResult<()> {
    let namespace = model.create_instance("Namespace")?;
    staged.created.push(namespace);
    model.set_property(namespace, "name", Value::from(unit.name.as_str()))?;
    staged.names.push((unit.name.clone(), scope.unit, namespace));

    let mut declared = Vec::new();
    for element in &unit.members {
        declare(model, scope, namespace, None, element, staged, &mut declared)?;
    }
    for (instance, element) in &declared {
        relate(model, staged, *instance, element)?;
    }
    Ok(())
}

fn declare<'u>(
    model: &mut Model,
    scope: &Scope<'_>,
    owner: InstanceId,
    parent: Option<&str>,
    element: &'u LibraryElement,
    staged: &mut Staged,
    declared: &mut Vec<(InstanceId, &'u LibraryElement)>,
) -> SessionResult<()> {
    let local_path = scope.local_path(parent, &element.name);
    let qualified_name = scope.qualified_name(&local_path);
    let element_id = ElementId::nested(&scope.unit, &local_path);
    if model.library().instance(element_id).is_some() || staged.contains(element_id) {
        return Err(SessionError::duplicate_library_element(qualified_name));
    }

    let instance = model.create_instance(&element.metaclass)?;
    staged.created.push(instance);
    model.set_property(instance, "name", Value::from(element.name.as_str()))?;
    for (name, value) in &element.attributes {
        model.set_property(instance, name, value.clone())?;
    }
    model.add_member(owner, instance, Visibility::Public)?;
    staged.names.push((qualified_name, element_id, instance));
    declared.push((instance, element));

    for member in &element.members {
        declare(model, scope, instance, Some(&local_path), member, staged, declared)?;
    }
    Ok(())
}

fn relate(
    model: &mut Model,
    staged: &Staged,
    instance: InstanceId,
    element: &LibraryElement,
) -> SessionResult<()> {
    let is_feature = model
        .context()
        .conforms(&Value::Instance(instance), "Feature", false);
    let general_metaclass = if is_feature {
        "Subsetting"
    } else {
        "Specialization"
    };

    let relations = element
        .specializes
        .iter()
        .map(|name| (general_metaclass, name))
        .chain(element.typed_by.iter().map(|name| ("FeatureTyping", name)))
        .chain(element.redefines.iter().map(|name| ("Redefinition", name)));
    for (metaclass, name) in relations {
        let general = staged
            .resolve(name)
            .or_else(|| model.library().resolve(name))
            .ok_or_else(|| SessionError::unresolved_library_name(name))?;
        model.specialize(metaclass, instance, general)?;
    }
    Ok(())
}
