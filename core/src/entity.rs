//! Entity structures for Meld.
//!
//! Instances and links are the two kinds of stored entity.

use crate::{AssociationId, Attributes, ClassId, EndSide, InstanceId, LinkId, Value};

/// A typed instance in the store.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Unique identifier for this instance.
    pub id: InstanceId,
    /// Class of this instance, fixed at creation.
    pub class_id: ClassId,
    /// Directly stored attribute slots.
    pub slots: Attributes,
}

impl Instance {
    /// Create a new instance with the given slots.
    pub fn new(id: InstanceId, class_id: ClassId, slots: Attributes) -> Self {
        Self {
            id,
            class_id,
            slots,
        }
    }

    /// Get a stored slot by name.
    pub fn get_slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Store a slot value. Storing `Null` clears the slot.
    pub fn set_slot(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if value.is_null() {
            self.slots.remove(&name);
        } else {
            self.slots.insert(name, value);
        }
    }

    /// Remove a slot.
    pub fn clear_slot(&mut self, name: &str) -> Option<Value> {
        self.slots.remove(name)
    }
}

/// A directed link between two instances, typed by an association.
///
/// Links are never mutated after creation; changing an end means removing
/// the link and creating a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub id: LinkId,
    pub association_id: AssociationId,
    pub source: InstanceId,
    pub target: InstanceId,
}

impl Link {
    pub fn new(
        id: LinkId,
        association_id: AssociationId,
        source: InstanceId,
        target: InstanceId,
    ) -> Self {
        Self {
            id,
            association_id,
            source,
            target,
        }
    }

    /// The instance sitting on the given side.
    pub fn end(&self, side: EndSide) -> InstanceId {
        match side {
            EndSide::Source => self.source,
            EndSide::Target => self.target,
        }
    }

    /// Check if this link touches an instance on either side.
    pub fn involves(&self, instance: InstanceId) -> bool {
        self.source == instance || self.target == instance
    }
}
