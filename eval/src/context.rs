//! Evaluation context: the engine handle shared by expressions and native
//! procedures.

use std::collections::HashMap;

use meld_ast::Expr;
use meld_core::{ClassId, Collection, CollectionKind, EndSide, InstanceId, Value};
use meld_graph::Graph;
use meld_registry::{EndRef, Multiplicity, OperationBody, OperationDef, Registry};
use tracing::trace;

use crate::bindings::Bindings;
use crate::config::{EngineConfig, EvalMode};
use crate::error::{EvalError, EvalResult};
use crate::native::{GlobalResolver, NativeTable};

/// Evaluation state over a read-only view of the model.
///
/// One context may serve many top-level calls. Memoized derived values are
/// dropped whenever the outermost call returns, so they never outlive a
/// single query.
pub struct EvalContext<'a> {
    registry: &'a Registry,
    graph: &'a Graph,
    natives: &'a NativeTable,
    globals: Option<&'a dyn GlobalResolver>,
    config: EngineConfig,
    mode: EvalMode,
    /// Nesting of derived-property and operation evaluation.
    depth: usize,
    /// Nesting of public entry points.
    active: usize,
    memo: HashMap<(InstanceId, String), Value>,
}

impl<'a> EvalContext<'a> {
    pub fn new(registry: &'a Registry, graph: &'a Graph, natives: &'a NativeTable) -> Self {
        Self {
            registry,
            graph,
            natives,
            globals: None,
            config: EngineConfig::default(),
            mode: EvalMode::Derivation,
            depth: 0,
            active: 0,
            memo: HashMap::new(),
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

    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Entry Points ====================

    /// Evaluate an expression with `self_value` as `self`.
    pub fn evaluate(
        &mut self,
        expr: &Expr,
        self_value: &Value,
        bindings: &Bindings,
    ) -> EvalResult<Value> {
        self.entry(|ctx| ctx.eval(expr, self_value, bindings))
    }

    /// Read a property (attribute or association end, stored or derived).
    pub fn get_property(&mut self, instance: InstanceId, name: &str) -> EvalResult<Value> {
        self.entry(|ctx| ctx.property(instance, name))
    }

    /// Invoke an operation on an instance.
    pub fn invoke_operation(
        &mut self,
        self_value: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        self.entry(|ctx| ctx.invoke(self_value, name, args))
    }

    /// Invoke an operation with arguments keyed by parameter name.
    pub fn invoke_operation_named(
        &mut self,
        self_value: &Value,
        name: &str,
        args: &HashMap<String, Value>,
    ) -> EvalResult<Value> {
        self.entry(|ctx| ctx.invoke_named(self_value, name, args))
    }

    /// Resolve a qualified name through the library.
    pub fn resolve_global(&self, qualified_name: &str) -> EvalResult<Value> {
        self.globals
            .and_then(|g| g.resolve_global(qualified_name))
            .map(Value::Instance)
            .ok_or_else(|| EvalError::unresolved_name(qualified_name))
    }

    fn entry<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.active += 1;
        let result = f(self);
        self.active -= 1;
        if self.active == 0 {
            self.memo.clear();
        }
        result
    }

    // ==================== Model Access ====================

    pub fn class_of(&self, instance: InstanceId) -> EvalResult<ClassId> {
        self.graph
            .class_of(instance)
            .map_err(|_| EvalError::type_error(format!("dangling instance handle {}", instance)))
    }

    pub fn class_name(&self, class_id: ClassId) -> &'a str {
        self.registry.class_name(class_id).unwrap_or("<unknown>")
    }

    /// Whether a value conforms to a type name. `exact` requires the value's
    /// own class (or primitive type) to match.
    pub fn conforms(&self, value: &Value, type_name: &str, exact: bool) -> bool {
        match (value, type_name) {
            (Value::Null, _) => false,
            (_, "OclAny") | (_, "Any") => !exact,
            (Value::Bool(_), "Boolean") => true,
            (Value::Int(_), "Integer") => true,
            (Value::Int(_), "Real") => !exact,
            (Value::Real(_), "Real") => true,
            (Value::String(_), "String") => true,
            (Value::Collection(_), "Collection") => !exact,
            (Value::Collection(c), name) => c.kind().name() == name,
            (Value::Instance(id), name) => {
                let Ok(class_id) = self.graph.class_of(*id) else {
                    return false;
                };
                if exact {
                    self.registry.get_class_id(name) == Some(class_id)
                } else {
                    self.registry.is_subclass_by_name(class_id, name)
                }
            }
            _ => false,
        }
    }

    pub(crate) fn recovering(&self) -> bool {
        self.mode == EvalMode::Derivation && self.config.recover_errors
    }

    /// Apply null propagation: `Ok(None)` when the error was recovered.
    pub(crate) fn recover(&self, result: EvalResult<Value>) -> EvalResult<Option<Value>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() && self.recovering() => {
                trace!(error = %err, "recovered as null");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn enter(&mut self) -> EvalResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ==================== Properties ====================

    pub(crate) fn property(&mut self, instance: InstanceId, name: &str) -> EvalResult<Value> {
        let registry = self.registry;
        let class_id = self.class_of(instance)?;

        if let Some(attr) = registry.find_attr(class_id, name) {
            if attr.derived {
                return self.derived(
                    instance,
                    class_id,
                    name,
                    attr.multiplicity,
                    attr.collection_kind(),
                );
            }
            let stored = self
                .graph
                .get_instance(instance)
                .and_then(|i| i.get_slot(name))
                .cloned();
            return Ok(match stored {
                Some(value) => value,
                None if attr.multiplicity.is_single() => Value::Null,
                None => Value::empty(attr.collection_kind()),
            });
        }

        if let Some(end_ref) = registry.find_end(class_id, name) {
            return self.end_value(instance, class_id, end_ref);
        }

        // Derivations may also introduce properties with no stored feature.
        if registry.derivation_for(class_id, name).is_some() {
            return self.derived(
                instance,
                class_id,
                name,
                Multiplicity::MANY,
                CollectionKind::Set,
            );
        }

        Err(EvalError::unresolved_name(format!(
            "{}::{}",
            self.class_name(class_id),
            name
        )))
    }

    fn end_value(
        &mut self,
        instance: InstanceId,
        class_id: ClassId,
        end_ref: EndRef,
    ) -> EvalResult<Value> {
        let registry = self.registry;
        let end = registry
            .end_def(end_ref)
            .ok_or_else(|| EvalError::unresolved_name(format!("{:?}", end_ref)))?;

        if end.derived {
            return self.derived(
                instance,
                class_id,
                &end.name,
                end.multiplicity,
                end.collection_kind(),
            );
        }

        let linked = match end_ref.side {
            EndSide::Target => self.graph.targets(instance, end_ref.association),
            EndSide::Source => self.graph.sources(instance, end_ref.association),
        };
        let mut collection =
            Collection::from_items(end.collection_kind(), linked.into_iter().map(Value::Instance));

        for subsetting in registry.subsetting_ends(class_id, end_ref) {
            if subsetting == end_ref {
                continue;
            }
            for item in self.end_value(instance, class_id, subsetting)?.into_items() {
                if !collection.contains(&item) {
                    collection.push(item);
                }
            }
        }

        if end.multiplicity.is_single() {
            return match collection.into_items().into_iter().next() {
                Some(value) => Ok(value),
                None if end.multiplicity.is_required() => Err(
                    EvalError::missing_required_association(instance, &end.name),
                ),
                None => Ok(Value::Null),
            };
        }
        Ok(Value::Collection(collection))
    }

    fn derived(
        &mut self,
        instance: InstanceId,
        class_id: ClassId,
        name: &str,
        multiplicity: Multiplicity,
        kind: CollectionKind,
    ) -> EvalResult<Value> {
        let key = (instance, name.to_string());
        if self.config.memoize {
            if let Some(value) = self.memo.get(&key) {
                return Ok(value.clone());
            }
        }

        let registry = self.registry;
        let constraint = registry.derivation_for(class_id, name).ok_or_else(|| {
            EvalError::unresolved_name(format!("{}::{}", self.class_name(class_id), name))
        })?;

        self.enter()?;
        trace!(%instance, property = name, depth = self.depth, "derive");
        let result = self.eval(&constraint.expr, &Value::Instance(instance), &Bindings::new());
        self.leave();

        let value = shape(result?, multiplicity, kind);
        if self.config.memoize {
            self.memo.insert(key, value.clone());
        }
        Ok(value)
    }

    // ==================== Operations ====================

    pub(crate) fn invoke(
        &mut self,
        self_value: &Value,
        name: &str,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let instance = self_value.as_instance().ok_or_else(|| {
            EvalError::type_error(format!(
                "cannot invoke {} on {}",
                name,
                self_value.type_name()
            ))
        })?;
        let registry = self.registry;
        let class_id = self.class_of(instance)?;
        let operation = registry
            .find_operation(class_id, name)
            .ok_or_else(|| EvalError::unknown_operation(self.class_name(class_id), name))?;

        let required = operation.required_params();
        let total = operation.params.len();
        if args.len() < required || args.len() > total {
            let expected = if required == total {
                total.to_string()
            } else {
                format!("{}..{}", required, total)
            };
            return Err(EvalError::arity_mismatch(name, expected, args.len()));
        }

        self.enter()?;
        trace!(%instance, operation = name, depth = self.depth, "invoke");
        let slots = args.into_iter().map(Some).collect();
        let result = self.invoke_body(self_value, operation, slots);
        self.leave();
        result
    }

    /// Invoke with arguments keyed by parameter name. Omitted parameters
    /// take their default; omitting one without a default is an arity error.
    pub(crate) fn invoke_named(
        &mut self,
        self_value: &Value,
        name: &str,
        args: &HashMap<String, Value>,
    ) -> EvalResult<Value> {
        let instance = self_value.as_instance().ok_or_else(|| {
            EvalError::type_error(format!(
                "cannot invoke {} on {}",
                name,
                self_value.type_name()
            ))
        })?;
        let registry = self.registry;
        let class_id = self.class_of(instance)?;
        let operation = registry
            .find_operation(class_id, name)
            .ok_or_else(|| EvalError::unknown_operation(self.class_name(class_id), name))?;

        if let Some(unknown) = args
            .keys()
            .find(|key| !operation.params.iter().any(|p| &p.name == *key))
        {
            return Err(EvalError::unresolved_name(format!("{}({})", name, unknown)));
        }
        let mut slots = Vec::with_capacity(operation.params.len());
        for param in &operation.params {
            let slot = args.get(&param.name).cloned();
            if slot.is_none() && param.default.is_none() {
                return Err(EvalError::arity_mismatch(
                    name,
                    operation.required_params().to_string(),
                    args.len(),
                ));
            }
            slots.push(slot);
        }

        self.enter()?;
        trace!(%instance, operation = name, depth = self.depth, "invoke");
        let result = self.invoke_body(self_value, operation, slots);
        self.leave();
        result
    }

    fn invoke_body(
        &mut self,
        self_value: &Value,
        operation: &'a OperationDef,
        slots: Vec<Option<Value>>,
    ) -> EvalResult<Value> {
        let mut bindings = Bindings::new();
        let mut values = Vec::with_capacity(operation.params.len());
        let mut slots = slots.into_iter();
        for param in &operation.params {
            let value = match slots.next().flatten() {
                Some(value) => value,
                None => match &param.default {
                    Some(default) => self.eval(default, self_value, &bindings)?,
                    None => Value::Null,
                },
            };
            bindings.insert(param.name.clone(), value.clone());
            values.push(value);
        }

        let result = match &operation.body {
            OperationBody::Expr(body) => self.eval(body, self_value, &bindings)?,
            OperationBody::Native(procedure) => {
                let natives = self.natives;
                let native = natives.get(procedure).ok_or_else(|| {
                    EvalError::unknown_operation("<native>", procedure.as_str())
                })?;
                native.call(self, self_value, &values)?
            }
        };
        Ok(shape_result(result, operation.result))
    }

    pub(crate) fn call_native(
        &mut self,
        name: &str,
        self_value: &Value,
        args: &[Value],
    ) -> EvalResult<Value> {
        let natives = self.natives;
        let native = natives
            .get(name)
            .ok_or_else(|| EvalError::unknown_operation("<native>", name))?;
        native.call(self, self_value, args)
    }
}

/// Coerce a derived value to its feature's multiplicity and collection kind.
fn shape(value: Value, multiplicity: Multiplicity, kind: CollectionKind) -> Value {
    if multiplicity.is_single() {
        return match value {
            Value::Collection(c) => c.into_items().into_iter().next().unwrap_or(Value::Null),
            other => other,
        };
    }
    match value {
        Value::Collection(c) if c.kind() == kind => Value::Collection(c),
        other => Value::Collection(Collection::from_items(kind, other.into_items())),
    }
}

/// Coerce an operation result to its declared multiplicity. Collections keep
/// the kind the body produced.
fn shape_result(value: Value, multiplicity: Multiplicity) -> Value {
    match value {
        Value::Collection(_) if !multiplicity.is_single() => value,
        other => shape(other, multiplicity, CollectionKind::Set),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meld_ast::build::*;
    use meld_ast::BinaryOp;
    use meld_core::attrs;
    use meld_registry::{AttrDef, EndDef, OperationDef, ParamDef, RegistryBuilder};
    use pretty_assertions::assert_eq;

    fn test_registry() -> Registry {
        let mut builder = RegistryBuilder::new();
        builder
            .add_class("Node")
            .attr(AttrDef::new("name", "String"))
            .derived_attr(AttrDef::new("label", "String"), this().nav("name"))
            .derived_attr(AttrDef::new("broken", "String"), this().nav("missing"))
            .operation(OperationDef::expr(
                "reach",
                this().closure("n", var("n").nav("next")),
            ))
            .operation(
                OperationDef::expr(
                    "greet",
                    binary(BinaryOp::Concat, this().nav("name"), var("suffix")),
                )
                .param(ParamDef::new("suffix", "String").with_default(lit("!")))
                .returns(Multiplicity::ONE),
            )
            .operation(OperationDef::expr("spin", this().call("spin", vec![])))
            .operation(OperationDef::native("fanOut", "countNext").returns(Multiplicity::ONE))
            .done()
            .unwrap();
        builder
            .add_class("Ticket")
            .done()
            .unwrap();
        builder
            .add_association("NodeNext")
            .source(EndDef::new("previous", "Node"))
            .target(EndDef::new("next", "Node").ordered())
            .done()
            .unwrap();
        builder
            .add_association("TicketHolder")
            .source(EndDef::new("tickets", "Ticket"))
            .target(EndDef::new("holder", "Node").one())
            .done()
            .unwrap();
        builder.build().unwrap()
    }

    fn count_next(
        ctx: &mut EvalContext<'_>,
        self_value: &Value,
        _args: &[Value],
    ) -> EvalResult<Value> {
        let id = self_value
            .as_instance()
            .ok_or_else(|| EvalError::type_error("expected instance"))?;
        let next = ctx.get_property(id, "next")?;
        Ok(Value::Int(next.cardinality() as i64))
    }

    fn node(registry: &Registry, graph: &mut Graph, name: &str) -> InstanceId {
        let class_id = registry.get_class_id("Node").unwrap();
        graph.create_instance(class_id, attrs! { "name" => name })
    }

    fn link(registry: &Registry, graph: &mut Graph, from: InstanceId, to: InstanceId) {
        let assoc = registry.get_association_id("NodeNext").unwrap();
        graph.create_link(assoc, from, to).unwrap();
    }

    // ========== TEST: navigation_follows_link_order ==========
    #[test]
    fn test_navigation_follows_link_order() {
        // GIVEN a -> b, a -> c
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let b = node(&registry, &mut graph, "b");
        let c = node(&registry, &mut graph, "c");
        link(&registry, &mut graph, a, b);
        link(&registry, &mut graph, a, c);
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives);

        // WHEN
        let next = ctx.get_property(a, "next").unwrap();
        let previous = ctx.get_property(b, "previous").unwrap();

        // THEN
        assert_eq!(next, Value::ordered_set(vec![b.into(), c.into()]));
        assert_eq!(previous, Value::set(vec![a.into()]));
    }

    // ========== TEST: implicit_collect_over_collection ==========
    #[test]
    fn test_implicit_collect_over_collection() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let b = node(&registry, &mut graph, "b");
        let c = node(&registry, &mut graph, "c");
        link(&registry, &mut graph, a, b);
        link(&registry, &mut graph, a, c);
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives);

        let names = ctx
            .evaluate(&this().nav("next").nav("name"), &a.into(), &Bindings::new())
            .unwrap();

        assert_eq!(names, Value::sequence(vec!["b".into(), "c".into()]));
    }

    // ========== TEST: closure_excludes_source_unless_reachable ==========
    #[test]
    fn test_closure_excludes_source_unless_reachable() {
        // GIVEN a -> b -> c
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let b = node(&registry, &mut graph, "b");
        let c = node(&registry, &mut graph, "c");
        link(&registry, &mut graph, a, b);
        link(&registry, &mut graph, b, c);

        // WHEN reach from a
        let natives = NativeTable::new();
        let acyclic = EvalContext::new(&registry, &graph, &natives)
            .invoke_operation(&a.into(), "reach", vec![])
            .unwrap();

        // THEN a is not included
        assert_eq!(acyclic, Value::set(vec![b.into(), c.into()]));

        // WHEN c -> a closes a cycle
        link(&registry, &mut graph, c, a);
        let cyclic = EvalContext::new(&registry, &graph, &natives)
            .invoke_operation(&a.into(), "reach", vec![])
            .unwrap();

        // THEN the fixed point terminates AND a is reachable from itself
        assert_eq!(cyclic, Value::set(vec![b.into(), c.into(), a.into()]));
    }

    // ========== TEST: derived_attribute_evaluates_derivation ==========
    #[test]
    fn test_derived_attribute_evaluates_derivation() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives);

        assert_eq!(ctx.get_property(a, "label").unwrap(), Value::from("a"));
    }

    // ========== TEST: unresolved_name_recovers_only_in_derivation_mode ==========
    #[test]
    fn test_unresolved_name_recovers_only_in_derivation_mode() {
        // GIVEN a derivation navigating a property that does not exist
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let natives = NativeTable::new();

        // WHEN read in derivation mode
        let derived = EvalContext::new(&registry, &graph, &natives)
            .get_property(a, "broken")
            .unwrap();

        // THEN it recovers as null
        assert_eq!(derived, Value::Null);

        // WHEN read in verification mode
        let verified = EvalContext::new(&registry, &graph, &natives)
            .with_mode(EvalMode::Verification)
            .get_property(a, "broken");

        // THEN the error surfaces
        assert!(matches!(verified, Err(EvalError::UnresolvedName { .. })));
    }

    // ========== TEST: operation_defaults_and_arity ==========
    #[test]
    fn test_operation_defaults_and_arity() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives);

        let defaulted = ctx.invoke_operation(&a.into(), "greet", vec![]).unwrap();
        let explicit = ctx
            .invoke_operation(&a.into(), "greet", vec!["?".into()])
            .unwrap();
        let too_many = ctx.invoke_operation(&a.into(), "greet", vec!["?".into(), "?".into()]);
        let unknown = ctx.invoke_operation(&a.into(), "shout", vec![]);

        assert_eq!(defaulted, Value::from("a!"));
        assert_eq!(explicit, Value::from("a?"));
        assert!(matches!(too_many, Err(EvalError::ArityMismatch { actual: 2, .. })));
        assert!(matches!(unknown, Err(EvalError::UnknownOperation { .. })));
    }

    // ========== TEST: named_arguments ==========
    #[test]
    fn test_named_arguments() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives);

        let mut args = HashMap::new();
        let defaulted = ctx.invoke_operation_named(&a.into(), "greet", &args).unwrap();
        args.insert("suffix".to_string(), Value::from("?"));
        let explicit = ctx.invoke_operation_named(&a.into(), "greet", &args).unwrap();
        args.insert("volume".to_string(), Value::Int(11));
        let unknown = ctx.invoke_operation_named(&a.into(), "greet", &args);

        assert_eq!(defaulted, Value::from("a!"));
        assert_eq!(explicit, Value::from("a?"));
        assert!(matches!(unknown, Err(EvalError::UnresolvedName { .. })));
    }

    // ========== TEST: native_procedure_reads_properties ==========
    #[test]
    fn test_native_procedure_reads_properties() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let b = node(&registry, &mut graph, "b");
        link(&registry, &mut graph, a, b);
        let mut natives = NativeTable::new();
        natives.register_fn("countNext", count_next);
        let mut ctx = EvalContext::new(&registry, &graph, &natives);

        let result = ctx.invoke_operation(&a.into(), "fanOut", vec![]).unwrap();

        assert_eq!(result, Value::Int(1));
    }

    // ========== TEST: unbounded_recursion_hits_depth_limit ==========
    #[test]
    fn test_unbounded_recursion_hits_depth_limit() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives)
            .with_config(EngineConfig::default().with_max_depth(16));

        let result = ctx.invoke_operation(&a.into(), "spin", vec![]);

        assert_eq!(result, Err(EvalError::DepthExceeded { limit: 16 }));
        // AND the context is usable afterwards
        assert_eq!(ctx.get_property(a, "label").unwrap(), Value::from("a"));
    }

    // ========== TEST: missing_required_association ==========
    #[test]
    fn test_missing_required_association() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let ticket = graph.create_instance(registry.get_class_id("Ticket").unwrap(), attrs!());
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives);

        let direct = ctx.get_property(ticket, "holder");
        let navigated = ctx
            .evaluate(&this().nav("holder"), &ticket.into(), &Bindings::new())
            .unwrap();

        assert!(matches!(
            direct,
            Err(EvalError::MissingRequiredAssociation { .. })
        ));
        assert_eq!(navigated, Value::Null);
    }

    // ========== TEST: negating_min_integer_is_an_error ==========
    #[test]
    fn test_negating_min_integer_is_an_error() {
        let registry = test_registry();
        let graph = Graph::new();
        let natives = NativeTable::new();
        let mut ctx =
            EvalContext::new(&registry, &graph, &natives).with_mode(EvalMode::Verification);

        let overflow = ctx.evaluate(&neg(lit(i64::MIN)), &Value::Null, &Bindings::new());
        let negated = ctx.evaluate(&neg(lit(i64::MAX)), &Value::Null, &Bindings::new());

        assert!(matches!(overflow, Err(EvalError::TypeError { .. })));
        assert_eq!(negated.unwrap(), Value::Int(-i64::MAX));
    }

    // ========== TEST: globals_and_type_tests ==========
    #[test]
    fn test_globals_and_type_tests() {
        let registry = test_registry();
        let mut graph = Graph::new();
        let a = node(&registry, &mut graph, "a");
        let globals: HashMap<String, InstanceId> = [("Lib::a".to_string(), a)].into();
        let natives = NativeTable::new();
        let mut ctx = EvalContext::new(&registry, &graph, &natives).with_globals(&globals);
        let none = Value::Null;

        let resolved = ctx.evaluate(&global("Lib::a"), &none, &Bindings::new());
        let unknown = ctx.evaluate(&global("Lib::zzz"), &none, &Bindings::new());
        let is_node = ctx.evaluate(&global("Lib::a").is_kind_of("Node"), &none, &Bindings::new());
        let is_ticket = ctx.evaluate(&global("Lib::a").is_type_of("Ticket"), &none, &Bindings::new());
        let bad_cast = ctx
            .with_mode(EvalMode::Verification)
            .evaluate(&global("Lib::a").as_type("Ticket"), &none, &Bindings::new());

        assert_eq!(resolved.unwrap(), Value::Instance(a));
        assert!(matches!(unknown, Err(EvalError::UnresolvedName { .. })));
        assert_eq!(is_node.unwrap(), Value::Bool(true));
        assert_eq!(is_ticket.unwrap(), Value::Bool(false));
        assert!(matches!(bad_cast, Err(EvalError::TypeError { .. })));
    }
}
