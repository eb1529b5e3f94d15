//! Journal entry types.

use std::fmt;

use meld_core::{InstanceId, LinkId, Value};
use serde::{Deserialize, Serialize};

/// Log sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Lsn(pub u64);

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lsn:{}", self.0)
    }
}

/// One stored mutation. Classes and associations are recorded by name so a
/// journal replays into any registry that declares them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalRecord {
    CreateInstance {
        instance: InstanceId,
        class: String,
    },
    SetAttribute {
        instance: InstanceId,
        name: String,
        value: Value,
    },
    CreateLink {
        link: LinkId,
        association: String,
        source: InstanceId,
        target: InstanceId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    RemoveLink {
        link: LinkId,
    },
    /// Cascades on replay exactly as it did when recorded.
    DeleteInstance {
        instance: InstanceId,
    },
}

/// A record with its sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub lsn: Lsn,
    #[serde(flatten)]
    pub record: JournalRecord,
}
