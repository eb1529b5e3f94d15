//! Constraint checker.

use std::collections::HashSet;

use meld_core::{InstanceId, Value};
use meld_eval::{Bindings, EngineConfig, EvalContext, EvalMode, GlobalResolver, NativeTable};
use meld_graph::Graph;
use meld_mutation::validate_lower_bounds;
use meld_registry::{ConstraintDef, ConstraintKind, Registry};
use tracing::trace;

use crate::error::ConstraintResult;
use crate::violation::{Violation, ViolationSeverity, Violations};

/// Evaluates the non-derivation constraints of each instance's class in
/// verification mode, so evaluation errors surface instead of becoming null.
///
/// A constraint redeclared under the same name by a subclass replaces the
/// inherited one.
pub struct ConstraintChecker<'a> {
    registry: &'a Registry,
    natives: &'a NativeTable,
    globals: Option<&'a dyn GlobalResolver>,
    config: EngineConfig,
    check_lower_bounds: bool,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(registry: &'a Registry, natives: &'a NativeTable) -> Self {
        Self {
            registry,
            natives,
            globals: None,
            config: EngineConfig::default(),
            check_lower_bounds: true,
        }
    }

    pub fn with_globals(mut self, globals: &'a dyn GlobalResolver) -> Self {
        self.globals = Some(globals);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_lower_bounds(mut self, check: bool) -> Self {
        self.check_lower_bounds = check;
        self
    }

    /// Check one instance.
    pub fn check_instance(
        &self,
        graph: &Graph,
        instance: InstanceId,
    ) -> ConstraintResult<Violations> {
        let class_id = graph.class_of(instance)?;
        let mut ctx = EvalContext::new(self.registry, graph, self.natives)
            .with_config(self.config.clone())
            .with_mode(EvalMode::Verification);
        if let Some(globals) = self.globals {
            ctx = ctx.with_globals(globals);
        }

        let mut violations = Violations::new();
        let mut seen = HashSet::new();
        for constraint in self.registry.constraints_for_class(class_id) {
            if constraint.derived_property().is_some() || !seen.insert(constraint.name.as_str()) {
                continue;
            }
            if let Some(violation) = self.check(&mut ctx, instance, constraint) {
                violations.push(violation);
            }
        }

        if self.check_lower_bounds {
            for unmet in validate_lower_bounds(self.registry, graph, instance)? {
                violations.push(Violation::lower_bound(unmet));
            }
        }
        Ok(violations)
    }

    /// Check every instance in the graph.
    pub fn check_all(&self, graph: &Graph) -> ConstraintResult<Violations> {
        let mut violations = Violations::new();
        for instance in graph.all_instance_ids() {
            violations.merge(self.check_instance(graph, instance)?);
        }
        Ok(violations)
    }

    fn check(
        &self,
        ctx: &mut EvalContext<'_>,
        instance: InstanceId,
        constraint: &ConstraintDef,
    ) -> Option<Violation> {
        let severity = match constraint.kind {
            ConstraintKind::ImplicitRelationship => ViolationSeverity::Warning,
            _ => ViolationSeverity::Error,
        };
        let result = ctx.evaluate(&constraint.expr, &Value::Instance(instance), &Bindings::new());
        trace!(%instance, constraint = %constraint.name, ?result, "constraint checked");
        let detail = match result {
            Ok(Value::Bool(true)) => return None,
            Ok(Value::Bool(false)) => "does not hold".to_string(),
            Ok(other) => format!("evaluated to {} instead of Boolean", other.type_name()),
            Err(err) => format!("could not be evaluated: {err}"),
        };
        Some(Violation::constraint(
            instance,
            severity,
            &constraint.name,
            detail,
        ))
    }
}
