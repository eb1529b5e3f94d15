//! The model facade.

use std::collections::HashMap;

use meld_ast::Expr;
use meld_binding::{BindingConfig, BindingEngine, BindingReport};
use meld_constraint::{ConstraintChecker, Violations};
use meld_core::{AssociationId, ClassId, ElementId, EndSide, InstanceId, LinkId, Value};
use meld_eval::{Bindings, EngineConfig, EvalContext, NativeTable};
use meld_graph::Graph;
use meld_journal::{Journal, JournalRecord, ReplayStats};
use meld_mutation::{
    validate_lower_bounds, DeletedEntities, LowerBoundViolation, MutationExecutor, UnlinkOutcome,
};
use meld_registry::{AssociationDef, EndDef, EndRef, Registry};
use meld_resolver::{kernel_registry, register_natives, Visibility};
use tracing::trace;

use crate::error::{SessionError, SessionResult};
use crate::library::{self, Library, LibraryUnit};

/// A metamodel, the instances and links stored against it, and the loaded
/// library.
///
/// Reads take `&self` and writes `&mut self`, so no evaluation can observe a
/// half-applied mutation. Every stored write is appended to the model's
/// journal; derived values never are.
pub struct Model {
    registry: Registry,
    natives: NativeTable,
    graph: Graph,
    library: Library,
    engine_config: EngineConfig,
    binding_config: BindingConfig,
    journal: Journal,
}

impl Model {
    /// An empty model over the kernel metamodel.
    pub fn new() -> SessionResult<Self> {
        Ok(Self::with_registry(kernel_registry()?))
    }

    /// An empty model over a custom metamodel.
    ///
    /// Binding and library loading need the kernel classes; build the
    /// registry with [`meld_resolver::register_kernel`] to use them.
    pub fn with_registry(registry: Registry) -> Self {
        let mut natives = NativeTable::new();
        register_natives(&mut natives);
        Self {
            registry,
            natives,
            graph: Graph::new(),
            library: Library::new(),
            engine_config: EngineConfig::default(),
            binding_config: BindingConfig::default(),
            journal: Journal::new(),
        }
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    pub fn with_binding_config(mut self, config: BindingConfig) -> Self {
        self.binding_config = config;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub(crate) fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    /// Native procedures, for hosts that register their own.
    pub fn natives_mut(&mut self) -> &mut NativeTable {
        &mut self.natives
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Hand the journal over and start a new one.
    pub fn take_journal(&mut self) -> Journal {
        std::mem::take(&mut self.journal)
    }

    /// An evaluation context with the library as global scope.
    pub fn context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.registry, &self.graph, &self.natives)
            .with_globals(&self.library)
            .with_config(self.engine_config.clone())
    }

    fn exec(&mut self) -> MutationExecutor<'_, '_> {
        MutationExecutor::new(&self.registry, &mut self.graph)
    }

    fn class_id(&self, class_name: &str) -> SessionResult<ClassId> {
        self.registry
            .get_class_id(class_name)
            .ok_or_else(|| SessionError::unknown_class(class_name))
    }

    fn association_id(&self, association: &str) -> SessionResult<AssociationId> {
        self.registry
            .get_association_id(association)
            .ok_or_else(|| SessionError::unknown_association(association))
    }

    // ==================== Store ====================

    pub fn create_instance(&mut self, class_name: &str) -> SessionResult<InstanceId> {
        let instance = self.exec().create_instance(class_name)?;
        self.journal.append(JournalRecord::CreateInstance {
            instance,
            class: class_name.to_string(),
        });
        Ok(instance)
    }

    /// Delete an instance and, depth first, everything it owns compositely.
    pub fn delete_instance(&mut self, instance: InstanceId) -> SessionResult<DeletedEntities> {
        let deleted = self.exec().delete_instance(instance)?;
        self.journal
            .append(JournalRecord::DeleteInstance { instance });
        Ok(deleted)
    }

    /// Read any property: stored attribute, association end, or derived.
    pub fn get_property(&self, instance: InstanceId, name: &str) -> SessionResult<Value> {
        Ok(self.context().get_property(instance, name)?)
    }

    /// Write an attribute, or replace the links of an association end.
    pub fn set_property(
        &mut self,
        instance: InstanceId,
        name: &str,
        value: Value,
    ) -> SessionResult<()> {
        let class_id = self.graph.class_of(instance)?;
        if self.registry.find_attr(class_id, name).is_some() {
            self.exec().set_attribute(instance, name, value.clone())?;
            self.journal.append(JournalRecord::SetAttribute {
                instance,
                name: name.to_string(),
                value,
            });
            return Ok(());
        }

        let end = self.registry.find_end(class_id, name).ok_or_else(|| {
            SessionError::unknown_property(
                self.registry.class_name(class_id).unwrap_or_default(),
                name,
            )
        })?;
        self.set_end(instance, name, end, value)
    }

    fn set_end(
        &mut self,
        instance: InstanceId,
        name: &str,
        end: EndRef,
        value: Value,
    ) -> SessionResult<()> {
        if self.registry.end_def(end).map_or(false, |def| def.derived) {
            return Err(SessionError::derived_property(name));
        }
        let others = match value {
            Value::Null => Vec::new(),
            Value::Instance(other) => vec![other],
            Value::Collection(collection) => collection
                .iter()
                .map(|item| {
                    item.as_instance()
                        .ok_or_else(|| SessionError::not_an_instance(name, item.type_name()))
                })
                .collect::<SessionResult<Vec<_>>>()?,
            other => return Err(SessionError::not_an_instance(name, other.type_name())),
        };

        let pairs: Vec<(InstanceId, InstanceId)> = others
            .into_iter()
            .map(|other| match end.side {
                EndSide::Target => (instance, other),
                EndSide::Source => (other, instance),
            })
            .collect();

        // Dry run on a copy: a rejected write leaves the store untouched.
        let existing = end_links(&self.graph, instance, end);
        let mut trial = self.graph.clone();
        replace_end_links(
            &mut MutationExecutor::new(&self.registry, &mut trial),
            end.association,
            &existing,
            &pairs,
        )?;

        for link in existing {
            self.remove_link_by_id(link)?;
        }
        for (source, target) in pairs {
            self.link(end.association, source, target, None)?;
        }
        Ok(())
    }

    pub fn create_link(
        &mut self,
        association: &str,
        source: InstanceId,
        target: InstanceId,
    ) -> SessionResult<LinkId> {
        let association = self.association_id(association)?;
        self.link(association, source, target, None)
    }

    /// Insert a link at a position among the source's targets.
    pub fn create_link_at(
        &mut self,
        association: &str,
        source: InstanceId,
        target: InstanceId,
        position: usize,
    ) -> SessionResult<LinkId> {
        let association = self.association_id(association)?;
        self.link(association, source, target, Some(position))
    }

    fn link(
        &mut self,
        association: AssociationId,
        source: InstanceId,
        target: InstanceId,
        position: Option<usize>,
    ) -> SessionResult<LinkId> {
        let mut exec = self.exec();
        let link = match position {
            Some(position) => exec.create_link_at(association, source, target, position),
            None => exec.create_link(association, source, target),
        }?;
        let name = self
            .registry
            .get_association(association)
            .map(|def| def.name.clone())
            .unwrap_or_default();
        self.journal.append(JournalRecord::CreateLink {
            link,
            association: name,
            source,
            target,
            position,
        });
        Ok(link)
    }

    pub fn remove_link(
        &mut self,
        association: &str,
        source: InstanceId,
        target: InstanceId,
    ) -> SessionResult<UnlinkOutcome> {
        let association = self.association_id(association)?;
        let outcome = self.exec().remove_link(association, source, target)?;
        self.journal.append(JournalRecord::RemoveLink {
            link: outcome.link.id,
        });
        Ok(outcome)
    }

    pub fn remove_link_by_id(&mut self, link: LinkId) -> SessionResult<UnlinkOutcome> {
        let outcome = self.exec().remove_link_by_id(link)?;
        self.journal.append(JournalRecord::RemoveLink { link });
        Ok(outcome)
    }

    /// Targets linked from `instance`, in link order.
    pub fn linked_targets(
        &self,
        association: &str,
        instance: InstanceId,
    ) -> SessionResult<Vec<InstanceId>> {
        let association = self.association_id(association)?;
        Ok(self.graph.targets(instance, association))
    }

    /// Sources linking to `instance`, in link order.
    pub fn linked_sources(
        &self,
        association: &str,
        instance: InstanceId,
    ) -> SessionResult<Vec<InstanceId>> {
        let association = self.association_id(association)?;
        Ok(self.graph.sources(instance, association))
    }

    /// Unmet lower bounds of an instance's attributes and ends.
    pub fn validate_lower_bounds(
        &self,
        instance: InstanceId,
    ) -> SessionResult<Vec<LowerBoundViolation>> {
        Ok(validate_lower_bounds(&self.registry, &self.graph, instance)?)
    }

    // ==================== Evaluation ====================

    /// Invoke an operation with arguments passed by parameter name.
    /// Parameters left out take their declared default.
    pub fn invoke_operation(
        &self,
        instance: InstanceId,
        name: &str,
        args: &HashMap<String, Value>,
    ) -> SessionResult<Value> {
        Ok(self
            .context()
            .invoke_operation_named(&Value::Instance(instance), name, args)?)
    }

    /// Evaluate an expression with `self_value` as `self`.
    pub fn evaluate(&self, expr: &Expr, self_value: &Value) -> SessionResult<Value> {
        Ok(self
            .context()
            .evaluate(expr, self_value, &Bindings::new())?)
    }

    // ==================== Metamodel ====================

    /// Names of a class's superclasses, nearest first, excluding the class.
    pub fn all_superclasses(&self, class_name: &str) -> SessionResult<Vec<&str>> {
        let class_id = self.class_id(class_name)?;
        Ok(self
            .registry
            .all_superclasses(class_id)
            .into_iter()
            .filter_map(|id| self.registry.class_name(id))
            .collect())
    }

    /// Association ends instances of a class can navigate.
    pub fn navigable_ends_for_class(&self, class_name: &str) -> SessionResult<Vec<&EndDef>> {
        let class_id = self.class_id(class_name)?;
        Ok(self
            .registry
            .navigable_ends_for_class(class_id)
            .iter()
            .filter_map(|end| self.registry.end_def(*end))
            .collect())
    }

    pub fn all_associations(&self) -> Vec<&AssociationDef> {
        self.registry.all_associations()
    }

    // ==================== Kernel helpers ====================

    /// Own `element` in `namespace` through a new membership.
    pub fn add_member(
        &mut self,
        namespace: InstanceId,
        element: InstanceId,
        visibility: Visibility,
    ) -> SessionResult<InstanceId> {
        let membership = self.create_instance("Membership")?;
        if visibility != Visibility::default() {
            self.set_property(membership, "visibility", visibility.into())?;
        }
        self.create_link("NamespaceOwnedMembership", namespace, membership)?;
        self.create_link("MembershipMemberElement", membership, element)?;
        Ok(membership)
    }

    /// Relate `specific` to `general` through a new explicit relationship of
    /// a Specialization metaclass (Specialization, Subsetting, Redefinition,
    /// FeatureTyping).
    pub fn specialize(
        &mut self,
        metaclass: &str,
        specific: InstanceId,
        general: InstanceId,
    ) -> SessionResult<InstanceId> {
        let relationship = self.create_instance(metaclass)?;
        self.create_link("TypeOwnedSpecialization", specific, relationship)?;
        self.create_link("SpecializationGeneral", relationship, general)?;
        Ok(relationship)
    }

    // ==================== Library ====================

    /// Load a library unit and return its element id.
    pub fn load_library(&mut self, unit: &LibraryUnit) -> SessionResult<ElementId> {
        library::load(self, unit)
    }

    // ==================== Binding and checking ====================

    /// Derive implied edges for one type.
    pub fn bind(&mut self, instance: InstanceId) -> SessionResult<BindingReport> {
        let mut report = BindingReport::default();
        let result = BindingEngine::new(&self.registry, &self.natives, &self.library)
            .with_config(self.binding_config.clone())
            .with_engine_config(self.engine_config.clone())
            .bind_into(&mut self.graph, instance, &mut report);
        self.record_binding(&report);
        result?;
        Ok(report)
    }

    /// Derive implied edges for every type in the model.
    pub fn bind_all(&mut self) -> SessionResult<BindingReport> {
        let mut report = BindingReport::default();
        let result = BindingEngine::new(&self.registry, &self.natives, &self.library)
            .with_config(self.binding_config.clone())
            .with_engine_config(self.engine_config.clone())
            .bind_all_into(&mut self.graph, &mut report);
        self.record_binding(&report);
        result?;
        Ok(report)
    }

    fn record_binding(&mut self, report: &BindingReport) {
        for edge in &report.created {
            trace!(relationship = %edge.relationship, "recording implied edge");
            self.journal.append(JournalRecord::CreateInstance {
                instance: edge.relationship,
                class: edge.kind.metaclass().to_string(),
            });
            self.journal.append(JournalRecord::SetAttribute {
                instance: edge.relationship,
                name: "isImplied".to_string(),
                value: Value::Bool(true),
            });
            self.journal.append(JournalRecord::CreateLink {
                link: edge.owning_link,
                association: "TypeOwnedSpecialization".to_string(),
                source: edge.specific,
                target: edge.relationship,
                position: None,
            });
            self.journal.append(JournalRecord::CreateLink {
                link: edge.general_link,
                association: "SpecializationGeneral".to_string(),
                source: edge.relationship,
                target: edge.general,
                position: None,
            });
        }
        for edge in &report.removed {
            self.journal.append(JournalRecord::DeleteInstance {
                instance: edge.relationship,
            });
        }
    }

    fn checker(&self) -> ConstraintChecker<'_> {
        ConstraintChecker::new(&self.registry, &self.natives)
            .with_globals(&self.library)
            .with_config(self.engine_config.clone())
    }

    /// Check the constraints and lower bounds of one instance.
    pub fn check_instance(&self, instance: InstanceId) -> SessionResult<Violations> {
        Ok(self.checker().check_instance(&self.graph, instance)?)
    }

    /// Check every instance.
    pub fn check_all(&self) -> SessionResult<Violations> {
        Ok(self.checker().check_all(&self.graph)?)
    }

    // ==================== Journal ====================

    /// Apply a recorded journal to this model's store.
    ///
    /// Replayed writes are not appended to this model's journal, and the
    /// library index is not rebuilt from them.
    pub fn replay(&mut self, journal: &Journal) -> SessionResult<ReplayStats> {
        Ok(journal.replay(&self.registry, &mut self.graph)?)
    }
}

fn end_links(graph: &Graph, instance: InstanceId, end: EndRef) -> Vec<LinkId> {
    match end.side {
        EndSide::Target => graph.links_from(instance, end.association).to_vec(),
        EndSide::Source => graph.links_to(instance, end.association).to_vec(),
    }
}

fn replace_end_links(
    exec: &mut MutationExecutor<'_, '_>,
    association: AssociationId,
    existing: &[LinkId],
    pairs: &[(InstanceId, InstanceId)],
) -> SessionResult<()> {
    for &link in existing {
        exec.remove_link_by_id(link)?;
    }
    for &(source, target) in pairs {
        exec.create_link(association, source, target)?;
    }
    Ok(())
}
