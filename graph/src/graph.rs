//! Instance/link arena.

use crate::index::{AdjacencyIndex, AssociationIndex, ClassIndex};
use meld_core::{
    AssociationId, Attributes, ClassId, GraphError, GraphResult, Instance, InstanceId, Link,
    LinkId, Value,
};
use std::collections::HashMap;

/// ID allocator for instances and links.
#[derive(Debug, Clone, Default)]
struct IdAllocator {
    next_instance_id: u64,
    next_link_id: u64,
}

impl IdAllocator {
    fn new() -> Self {
        Self {
            next_instance_id: 1,
            next_link_id: 1,
        }
    }

    fn alloc_instance_id(&mut self) -> InstanceId {
        let id = InstanceId::new(self.next_instance_id);
        self.next_instance_id += 1;
        id
    }

    fn alloc_link_id(&mut self) -> LinkId {
        let id = LinkId::new(self.next_link_id);
        self.next_link_id += 1;
        id
    }
}

/// The in-memory instance/link store.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Instance storage
    instances: HashMap<InstanceId, Instance>,
    /// Link storage
    links: HashMap<LinkId, Link>,
    /// ID allocator
    id_alloc: IdAllocator,
    /// Class index
    class_index: ClassIndex,
    /// Association index
    association_index: AssociationIndex,
    /// Adjacency index
    adj_index: AdjacencyIndex,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
            links: HashMap::new(),
            id_alloc: IdAllocator::new(),
            class_index: ClassIndex::new(),
            association_index: AssociationIndex::new(),
            adj_index: AdjacencyIndex::new(),
        }
    }

    // ==================== Instance Operations ====================

    /// Create a new instance with the given class and slots.
    pub fn create_instance(&mut self, class_id: ClassId, slots: Attributes) -> InstanceId {
        let id = self.id_alloc.alloc_instance_id();
        self.class_index.insert(class_id, id);
        self.instances
            .insert(id, Instance::new(id, class_id, slots));
        id
    }

    /// Get an instance by ID.
    pub fn get_instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(&id)
    }

    pub fn contains_instance(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Class of an instance.
    pub fn class_of(&self, id: InstanceId) -> GraphResult<ClassId> {
        self.instances
            .get(&id)
            .map(|i| i.class_id)
            .ok_or(GraphError::InstanceNotFound(id))
    }

    /// Store a slot value on an instance. `Null` clears the slot.
    pub fn set_slot(&mut self, id: InstanceId, name: &str, value: Value) -> GraphResult<()> {
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(GraphError::InstanceNotFound(id))?;
        instance.set_slot(name, value);
        Ok(())
    }

    /// Delete an instance and every link touching it. Returns the removed links.
    pub fn delete_instance(&mut self, id: InstanceId) -> GraphResult<Vec<Link>> {
        let class_id = self.class_of(id)?;

        let links_to_delete: Vec<LinkId> = self.adj_index.involving(id).collect();
        let mut removed = Vec::with_capacity(links_to_delete.len());
        for link_id in links_to_delete {
            removed.push(self.remove_link(link_id)?);
        }

        self.instances.remove(&id);
        self.class_index.remove(class_id, id);

        Ok(removed)
    }

    // ==================== Link Operations ====================

    /// Append a link.
    pub fn create_link(
        &mut self,
        association_id: AssociationId,
        source: InstanceId,
        target: InstanceId,
    ) -> GraphResult<LinkId> {
        self.create_link_at(association_id, source, target, None)
    }

    /// Create a link, optionally at a position among the source's targets.
    pub fn create_link_at(
        &mut self,
        association_id: AssociationId,
        source: InstanceId,
        target: InstanceId,
        position: Option<usize>,
    ) -> GraphResult<LinkId> {
        for end in [source, target] {
            if !self.instances.contains_key(&end) {
                return Err(GraphError::InstanceNotFound(end));
            }
        }

        let id = self.id_alloc.alloc_link_id();
        self.association_index.insert(association_id, id);
        self.adj_index
            .insert(id, association_id, source, target, position);
        self.links
            .insert(id, Link::new(id, association_id, source, target));
        Ok(id)
    }

    /// Get a link by ID.
    pub fn get_link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Remove a link.
    pub fn remove_link(&mut self, id: LinkId) -> GraphResult<Link> {
        let link = self.links.remove(&id).ok_or(GraphError::LinkNotFound(id))?;
        self.association_index.remove(link.association_id, id);
        self.adj_index
            .remove(id, link.association_id, link.source, link.target);
        Ok(link)
    }

    // ==================== Query Operations ====================

    /// Links from a source along an association, in target-end order.
    pub fn links_from(&self, source: InstanceId, association_id: AssociationId) -> &[LinkId] {
        self.adj_index.outgoing(source, association_id)
    }

    /// Links to a target along an association, in creation order.
    pub fn links_to(&self, target: InstanceId, association_id: AssociationId) -> &[LinkId] {
        self.adj_index.incoming(target, association_id)
    }

    /// Targets linked from a source, in order.
    pub fn targets(&self, source: InstanceId, association_id: AssociationId) -> Vec<InstanceId> {
        self.links_from(source, association_id)
            .iter()
            .filter_map(|id| self.links.get(id).map(|l| l.target))
            .collect()
    }

    /// Sources linked to a target, in order.
    pub fn sources(&self, target: InstanceId, association_id: AssociationId) -> Vec<InstanceId> {
        self.links_to(target, association_id)
            .iter()
            .filter_map(|id| self.links.get(id).map(|l| l.source))
            .collect()
    }

    /// Links between a specific source and target.
    pub fn find_links(
        &self,
        association_id: AssociationId,
        source: InstanceId,
        target: InstanceId,
    ) -> Vec<LinkId> {
        self.links_from(source, association_id)
            .iter()
            .filter(|id| {
                self.links
                    .get(id)
                    .map(|l| l.target == target)
                    .unwrap_or(false)
            })
            .copied()
            .collect()
    }

    /// All links involving an instance on either side.
    pub fn links_involving(&self, id: InstanceId) -> impl Iterator<Item = LinkId> + '_ {
        self.adj_index.involving(id)
    }

    /// Find instances of exactly the given class.
    pub fn instances_by_class(&self, class_id: ClassId) -> impl Iterator<Item = InstanceId> + '_ {
        self.class_index.get(class_id)
    }

    /// Find links of an association.
    pub fn links_by_association(
        &self,
        association_id: AssociationId,
    ) -> impl Iterator<Item = LinkId> + '_ {
        self.association_index.get(association_id)
    }

    // ==================== Statistics ====================

    /// Get the number of instances in the store.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Get the number of links in the store.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Get all instance IDs in creation order.
    pub fn all_instance_ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Get all link IDs in creation order.
    pub fn all_link_ids(&self) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self.links.keys().copied().collect();
        ids.sort();
        ids
    }
}
