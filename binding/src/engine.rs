//! The binding engine.

use std::collections::HashSet;

use meld_core::{AssociationId, ClassId, InstanceId, Value};
use meld_eval::{EngineConfig, EvalContext, GlobalResolver, NativeTable};
use meld_graph::Graph;
use meld_mutation::MutationExecutor;
use meld_registry::{ImpliedKind, Registry};
use meld_resolver::{all_supertypes, specializes, supertypes};
use tracing::debug;

use crate::condition;
use crate::config::BindingConfig;
use crate::error::{BindingError, BindingResult};
use crate::report::{BindingReport, ImpliedEdge};

/// Derives implied edges for types and features.
///
/// Binding a type first binds its explicit generals and the bases its rules
/// name, so whether an implied edge is redundant does not depend on the
/// order types are visited in.
pub struct BindingEngine<'a> {
    registry: &'a Registry,
    natives: &'a NativeTable,
    globals: &'a dyn GlobalResolver,
    engine_config: EngineConfig,
    config: BindingConfig,
}

impl<'a> BindingEngine<'a> {
    pub fn new(
        registry: &'a Registry,
        natives: &'a NativeTable,
        globals: &'a dyn GlobalResolver,
    ) -> Self {
        Self {
            registry,
            natives,
            globals,
            engine_config: EngineConfig::default(),
            config: BindingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    /// Bind one type (and, first, everything it depends on).
    pub fn bind(&self, graph: &mut Graph, instance: InstanceId) -> BindingResult<BindingReport> {
        let mut report = BindingReport::default();
        self.bind_into(graph, instance, &mut report)?;
        Ok(report)
    }

    /// Like [`bind`](Self::bind), recording into `report` as it goes. On
    /// error `report` still lists the edges already created or removed.
    pub fn bind_into(
        &self,
        graph: &mut Graph,
        instance: InstanceId,
        report: &mut BindingReport,
    ) -> BindingResult<()> {
        let mut visited = HashSet::new();
        self.bind_type(graph, instance, &mut visited, report)
    }

    /// Bind every type in the graph.
    pub fn bind_all(&self, graph: &mut Graph) -> BindingResult<BindingReport> {
        let mut report = BindingReport::default();
        self.bind_all_into(graph, &mut report)?;
        Ok(report)
    }

    pub fn bind_all_into(&self, graph: &mut Graph, report: &mut BindingReport) -> BindingResult<()> {
        let type_class = self.kernel_class("Type")?;
        let mut visited = HashSet::new();
        for instance in graph.all_instance_ids() {
            let Ok(class_id) = graph.class_of(instance) else {
                continue;
            };
            if self.registry.is_subclass(class_id, type_class) {
                self.bind_type(graph, instance, &mut visited, report)?;
            }
        }
        Ok(())
    }

    fn ctx<'g>(&'g self, graph: &'g Graph) -> EvalContext<'g> {
        EvalContext::new(self.registry, graph, self.natives)
            .with_globals(self.globals)
            .with_config(self.engine_config.clone())
    }

    fn kernel_class(&self, name: &str) -> BindingResult<ClassId> {
        self.registry
            .get_class_id(name)
            .ok_or_else(|| BindingError::missing_kernel(name))
    }

    fn association(&self, name: &str) -> BindingResult<AssociationId> {
        self.registry
            .get_association_id(name)
            .ok_or_else(|| BindingError::missing_kernel(name))
    }

    fn bind_type(
        &self,
        graph: &mut Graph,
        instance: InstanceId,
        visited: &mut HashSet<InstanceId>,
        report: &mut BindingReport,
    ) -> BindingResult<()> {
        if !visited.insert(instance) {
            return Ok(());
        }
        let class_id = graph.class_of(instance)?;
        if !self.registry.is_subclass(class_id, self.kernel_class("Type")?) {
            return Ok(());
        }

        let explicit = supertypes(&mut self.ctx(graph), instance, true)?;
        for general in explicit {
            self.bind_type(graph, general, visited, report)?;
        }

        let wanted = self.wanted_bases(graph, instance, class_id, report)?;
        for (base, _) in &wanted {
            self.bind_type(graph, *base, visited, report)?;
        }

        let mut kept = Vec::new();
        for edge in self.implied_edges(graph, instance)? {
            let still_wanted = wanted
                .iter()
                .any(|(base, kind)| *base == edge.general && *kind == edge.kind);
            if still_wanted {
                kept.push(edge);
            } else {
                debug!(specific = %edge.specific, general = %edge.general, "stale implied edge");
                self.remove(graph, edge, report)?;
            }
        }

        for (base, kind) in wanted {
            if base == instance || kept.iter().any(|edge| edge.general == base) {
                continue;
            }
            let (redundant, cyclic) = {
                let mut ctx = self.ctx(graph);
                (
                    all_supertypes(&mut ctx, instance)?.contains(&base),
                    specializes(&mut ctx, base, instance)?,
                )
            };
            if redundant {
                debug!(%instance, %base, "implied edge redundant");
                continue;
            }
            if cyclic {
                debug!(%instance, %base, "implied edge would close a cycle");
                continue;
            }
            let edge = self.create(graph, instance, base, kind)?;
            report.created.push(edge.clone());
            kept.push(edge);
        }

        if self.config.suppress_redundant {
            for edge in kept {
                if self.reachable_otherwise(graph, &edge)? {
                    debug!(specific = %edge.specific, general = %edge.general, "implied edge suppressed");
                    self.remove(graph, edge, report)?;
                }
            }
        }
        Ok(())
    }

    /// Resolved bases of the first satisfied rule per base concept.
    fn wanted_bases(
        &self,
        graph: &Graph,
        instance: InstanceId,
        class_id: ClassId,
        report: &mut BindingReport,
    ) -> BindingResult<Vec<(InstanceId, ImpliedKind)>> {
        let mut ctx = self.ctx(graph);
        let mut decided: Vec<&str> = Vec::new();
        let mut wanted = Vec::new();
        for rule in self.registry.binding_rules_for_class(class_id) {
            if decided.contains(&rule.base.as_str()) {
                continue;
            }
            if !condition::holds(&mut ctx, instance, &rule.condition)? {
                continue;
            }
            decided.push(&rule.base);
            match self.globals.resolve_global(&rule.base) {
                Some(base) => wanted.push((base, rule.kind)),
                None => {
                    debug!(base = %rule.base, "binding base not in library");
                    if !report.unresolved.contains(&rule.base) {
                        report.unresolved.push(rule.base.clone());
                    }
                }
            }
        }
        Ok(wanted)
    }

    fn implied_edges(
        &self,
        graph: &Graph,
        instance: InstanceId,
    ) -> BindingResult<Vec<ImpliedEdge>> {
        let owned = self.association("TypeOwnedSpecialization")?;
        let to_general = self.association("SpecializationGeneral")?;
        let mut ctx = self.ctx(graph);
        let mut edges = Vec::new();
        for relationship in ctx.get_property(instance, "ownedSpecialization")?.instances() {
            let implied = ctx
                .get_property(relationship, "isImplied")?
                .as_bool()
                .unwrap_or(false);
            if !implied {
                continue;
            }
            let Some(general) = general_of(&mut ctx, relationship)? else {
                continue;
            };
            let Some(owning_link) = graph.find_links(owned, instance, relationship).first().copied()
            else {
                continue;
            };
            let Some(general_link) = graph
                .find_links(to_general, relationship, general)
                .first()
                .copied()
            else {
                continue;
            };
            let kind = if ctx.conforms(&Value::Instance(relationship), "Subsetting", false) {
                ImpliedKind::Subsetting
            } else {
                ImpliedKind::Specialization
            };
            edges.push(ImpliedEdge {
                relationship,
                specific: instance,
                general,
                kind,
                owning_link,
                general_link,
            });
        }
        Ok(edges)
    }

    /// Whether the edge's general is reachable through another owned
    /// specialization of its specific type.
    fn reachable_otherwise(&self, graph: &Graph, edge: &ImpliedEdge) -> BindingResult<bool> {
        let mut ctx = self.ctx(graph);
        for relationship in ctx
            .get_property(edge.specific, "ownedSpecialization")?
            .instances()
        {
            if relationship == edge.relationship {
                continue;
            }
            let Some(general) = general_of(&mut ctx, relationship)? else {
                continue;
            };
            if all_supertypes(&mut ctx, general)?.contains(&edge.general) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn create(
        &self,
        graph: &mut Graph,
        specific: InstanceId,
        general: InstanceId,
        kind: ImpliedKind,
    ) -> BindingResult<ImpliedEdge> {
        let owned = self.association("TypeOwnedSpecialization")?;
        let to_general = self.association("SpecializationGeneral")?;
        let mut exec = MutationExecutor::new(self.registry, graph);
        let relationship = exec.create_instance(kind.metaclass())?;
        exec.set_attribute(relationship, "isImplied", Value::Bool(true))?;
        let owning_link = exec.create_link(owned, specific, relationship)?;
        let general_link = exec.create_link(to_general, relationship, general)?;
        debug!(%specific, %general, ?kind, "implied edge created");
        Ok(ImpliedEdge {
            relationship,
            specific,
            general,
            kind,
            owning_link,
            general_link,
        })
    }

    fn remove(
        &self,
        graph: &mut Graph,
        edge: ImpliedEdge,
        report: &mut BindingReport,
    ) -> BindingResult<()> {
        MutationExecutor::new(self.registry, graph).delete_instance(edge.relationship)?;
        report.removed.push(edge);
        Ok(())
    }
}

/// The general of a relationship, or `None` once it has been deleted.
fn general_of(
    ctx: &mut EvalContext<'_>,
    relationship: InstanceId,
) -> BindingResult<Option<InstanceId>> {
    match ctx.get_property(relationship, "general") {
        Ok(general) => Ok(general.as_instance()),
        Err(err) if err.is_recoverable() => Ok(None),
        Err(err) => Err(err.into()),
    }
}
