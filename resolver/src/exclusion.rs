//! Exclusion sets for cycle-safe recursion.

use std::collections::BTreeSet;

use meld_core::{InstanceId, Value};

/// Handles already being expanded by an enclosing call.
///
/// Recursive membership algorithms pass `with(self)` to every nested call, so
/// each level sees a strictly larger set and cycles terminate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ids: BTreeSet<InstanceId>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the instances of an operation argument. Null is empty.
    pub fn from_value(value: &Value) -> Self {
        Self {
            ids: value.instances().into_iter().collect(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::set(self.ids.iter().map(|id| Value::Instance(*id)))
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.ids.contains(&id)
    }

    /// A copy of this set including `id`. `id` must not already be present.
    pub fn with(&self, id: InstanceId) -> Self {
        debug_assert!(
            !self.ids.contains(&id),
            "exclusion set must grow strictly: {} already excluded",
            id
        );
        let mut ids = self.ids.clone();
        ids.insert(id);
        Self { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<InstanceId> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = InstanceId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
