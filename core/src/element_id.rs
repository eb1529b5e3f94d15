//! Content-derived identifiers for library elements.
//!
//! Library elements get ids that depend only on their qualified names, so
//! loading the same library twice yields the same ids. A top-level unit's id
//! is a name-based UUID in [`LIBRARY_NAMESPACE`]; a nested element's id is
//! a name-based UUID in its container's namespace.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespace for top-level library unit ids.
pub const LIBRARY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b9e_4a7d_5e30_9c11_d84f_0a6b_3e72);

/// Stable identifier of a library element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Id of a top-level library unit.
    pub fn for_unit(qualified_name: &str) -> Self {
        Self(Uuid::new_v5(&LIBRARY_NAMESPACE, qualified_name.as_bytes()))
    }

    /// Id of an element nested in `container`, addressed by its local path.
    pub fn nested(container: &ElementId, local_path: &str) -> Self {
        Self(Uuid::new_v5(&container.0, local_path.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ElementId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
