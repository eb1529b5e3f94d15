//! Binding outcomes.

use meld_core::{InstanceId, LinkId};
use meld_registry::ImpliedKind;

/// One implied relationship instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpliedEdge {
    /// The Specialization or Subsetting instance.
    pub relationship: InstanceId,
    pub specific: InstanceId,
    pub general: InstanceId,
    pub kind: ImpliedKind,
    /// Link from the specific type to the relationship.
    pub owning_link: LinkId,
    /// Link from the relationship to the general.
    pub general_link: LinkId,
}

/// What a binding pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingReport {
    pub created: Vec<ImpliedEdge>,
    pub removed: Vec<ImpliedEdge>,
    /// Base concepts a satisfied rule named but the library could not resolve.
    pub unresolved: Vec<String>,
}

impl BindingReport {
    /// True when the pass neither created nor removed an edge.
    pub fn is_unchanged(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}
