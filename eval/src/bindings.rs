//! Variable bindings for expression evaluation.

use meld_core::Value;

/// Variables in scope: operation parameters, `let` and iterator variables.
///
/// Later bindings shadow earlier ones with the same name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    vars: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.vars.push((name.into(), value));
    }

    /// A copy of these bindings with one more variable.
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        let mut extended = self.clone();
        extended.insert(name, value);
        extended
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of all bound variables.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
