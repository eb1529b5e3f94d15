//! Indexes for efficient store lookups.

use meld_core::{AssociationId, ClassId, InstanceId, LinkId};
use std::collections::{BTreeSet, HashMap};

/// Class index: ClassId -> Set<InstanceId>
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    index: HashMap<ClassId, BTreeSet<InstanceId>>,
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_id: ClassId, instance_id: InstanceId) {
        self.index.entry(class_id).or_default().insert(instance_id);
    }

    pub fn remove(&mut self, class_id: ClassId, instance_id: InstanceId) {
        if let Some(set) = self.index.get_mut(&class_id) {
            set.remove(&instance_id);
            if set.is_empty() {
                self.index.remove(&class_id);
            }
        }
    }

    pub fn get(&self, class_id: ClassId) -> impl Iterator<Item = InstanceId> + '_ {
        self.index
            .get(&class_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

/// Association index: AssociationId -> Set<LinkId>
#[derive(Debug, Clone, Default)]
pub struct AssociationIndex {
    index: HashMap<AssociationId, BTreeSet<LinkId>>,
}

impl AssociationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, association_id: AssociationId, link_id: LinkId) {
        self.index.entry(association_id).or_default().insert(link_id);
    }

    pub fn remove(&mut self, association_id: AssociationId, link_id: LinkId) {
        if let Some(set) = self.index.get_mut(&association_id) {
            set.remove(&link_id);
            if set.is_empty() {
                self.index.remove(&association_id);
            }
        }
    }

    pub fn get(&self, association_id: AssociationId) -> impl Iterator<Item = LinkId> + '_ {
        self.index
            .get(&association_id)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}

/// Adjacency index: (InstanceId, AssociationId) -> ordered links, per direction.
///
/// Outgoing lists keep the order of the target end; incoming lists keep the
/// order links were created in.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyIndex {
    /// Links where the instance is the source.
    outgoing: HashMap<(InstanceId, AssociationId), Vec<LinkId>>,
    /// Links where the instance is the target.
    incoming: HashMap<(InstanceId, AssociationId), Vec<LinkId>>,
    /// All links involving an instance on either side.
    all: HashMap<InstanceId, BTreeSet<LinkId>>,
}

impl AdjacencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a link; `position` places it within the source's outgoing
    /// list (clamped), `None` appends.
    pub fn insert(
        &mut self,
        link_id: LinkId,
        association_id: AssociationId,
        source: InstanceId,
        target: InstanceId,
        position: Option<usize>,
    ) {
        let out = self.outgoing.entry((source, association_id)).or_default();
        match position {
            Some(pos) => out.insert(pos.min(out.len()), link_id),
            None => out.push(link_id),
        }
        self.incoming
            .entry((target, association_id))
            .or_default()
            .push(link_id);
        self.all.entry(source).or_default().insert(link_id);
        self.all.entry(target).or_default().insert(link_id);
    }

    pub fn remove(
        &mut self,
        link_id: LinkId,
        association_id: AssociationId,
        source: InstanceId,
        target: InstanceId,
    ) {
        for (map, key) in [
            (&mut self.outgoing, (source, association_id)),
            (&mut self.incoming, (target, association_id)),
        ] {
            if let Some(list) = map.get_mut(&key) {
                list.retain(|id| *id != link_id);
                if list.is_empty() {
                    map.remove(&key);
                }
            }
        }
        for instance in [source, target] {
            if let Some(set) = self.all.get_mut(&instance) {
                set.remove(&link_id);
                if set.is_empty() {
                    self.all.remove(&instance);
                }
            }
        }
    }

    /// Links from an instance along an association, in order.
    pub fn outgoing(&self, source: InstanceId, association_id: AssociationId) -> &[LinkId] {
        self.outgoing
            .get(&(source, association_id))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Links to an instance along an association, in order.
    pub fn incoming(&self, target: InstanceId, association_id: AssociationId) -> &[LinkId] {
        self.incoming
            .get(&(target, association_id))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all links involving an instance.
    pub fn involving(&self, instance: InstanceId) -> impl Iterator<Item = LinkId> + '_ {
        self.all
            .get(&instance)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }
}
