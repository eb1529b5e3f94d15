//! Native procedure table and library name resolution.

use std::collections::HashMap;
use std::fmt;

use meld_core::{InstanceId, Value};

use crate::context::EvalContext;
use crate::error::EvalResult;

/// An operation implemented in Rust.
///
/// The context gives the procedure the same view of the model as a
/// declarative body: property reads, operation calls and sub-expressions.
pub trait NativeProcedure: Send + Sync {
    fn call(
        &self,
        ctx: &mut EvalContext<'_>,
        self_value: &Value,
        args: &[Value],
    ) -> EvalResult<Value>;
}

/// Plain function signature accepted as a native procedure.
pub type NativeFn = fn(&mut EvalContext<'_>, &Value, &[Value]) -> EvalResult<Value>;

impl<F> NativeProcedure for F
where
    F: Fn(&mut EvalContext<'_>, &Value, &[Value]) -> EvalResult<Value> + Send + Sync,
{
    fn call(
        &self,
        ctx: &mut EvalContext<'_>,
        self_value: &Value,
        args: &[Value],
    ) -> EvalResult<Value> {
        self(ctx, self_value, args)
    }
}

/// Native procedures by name.
#[derive(Default)]
pub struct NativeTable {
    procedures: HashMap<String, Box<dyn NativeProcedure>>,
}

impl NativeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, procedure: impl NativeProcedure + 'static) {
        self.procedures.insert(name.into(), Box::new(procedure));
    }

    pub fn register_fn(&mut self, name: impl Into<String>, procedure: NativeFn) {
        self.register(name, procedure);
    }

    pub fn get(&self, name: &str) -> Option<&dyn NativeProcedure> {
        self.procedures.get(name).map(|p| p.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }
}

impl fmt::Debug for NativeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.procedures.keys().collect();
        names.sort();
        f.debug_struct("NativeTable").field("procedures", &names).finish()
    }
}

/// Resolves qualified names to library elements.
pub trait GlobalResolver {
    fn resolve_global(&self, qualified_name: &str) -> Option<InstanceId>;
}

impl GlobalResolver for HashMap<String, InstanceId> {
    fn resolve_global(&self, qualified_name: &str) -> Option<InstanceId> {
        self.get(qualified_name).copied()
    }
}
