//! In-memory journal and replay.

use std::collections::HashMap;

use meld_core::{Collection, InstanceId, LinkId, Value};
use meld_graph::Graph;
use meld_mutation::MutationExecutor;
use meld_registry::Registry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entry::{JournalEntry, JournalRecord, Lsn};
use crate::error::{JournalError, JournalResult};

/// Ordered record of stored mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

/// Outcome of a replay: how many entries ran and where recorded handles
/// ended up in the target store.
#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    pub applied: usize,
    instances: HashMap<InstanceId, InstanceId>,
    links: HashMap<LinkId, LinkId>,
}

impl ReplayStats {
    /// The replayed handle for a recorded instance.
    pub fn instance(&self, recorded: InstanceId) -> Option<InstanceId> {
        self.instances.get(&recorded).copied()
    }

    pub fn link(&self, recorded: LinkId) -> Option<LinkId> {
        self.links.get(&recorded).copied()
    }
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record and return its sequence number.
    pub fn append(&mut self, record: JournalRecord) -> Lsn {
        let lsn = Lsn(self.entries.len() as u64 + 1);
        self.entries.push(JournalEntry { lsn, record });
        lsn
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> JournalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> JournalResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply every entry to `graph` through validated writes.
    ///
    /// Replaying into an empty store reproduces the recorded model up to
    /// handle renaming; the returned stats map recorded handles to new ones.
    pub fn replay(&self, registry: &Registry, graph: &mut Graph) -> JournalResult<ReplayStats> {
        let mut stats = ReplayStats::default();
        for entry in &self.entries {
            apply(registry, graph, entry, &mut stats)?;
            stats.applied += 1;
        }
        debug!(
            entries = stats.applied,
            instances = stats.instances.len(),
            "journal replayed"
        );
        Ok(stats)
    }
}

fn apply(
    registry: &Registry,
    graph: &mut Graph,
    entry: &JournalEntry,
    stats: &mut ReplayStats,
) -> JournalResult<()> {
    let lsn = entry.lsn;
    let instance = |stats: &ReplayStats, recorded: InstanceId| {
        stats
            .instance(recorded)
            .ok_or_else(|| JournalError::unknown_instance(lsn, recorded))
    };
    let mut exec = MutationExecutor::new(registry, graph);

    match &entry.record {
        JournalRecord::CreateInstance {
            instance: recorded,
            class,
        } => {
            let created = exec
                .create_instance(class)
                .map_err(|e| JournalError::replay(lsn, e))?;
            stats.instances.insert(*recorded, created);
        }
        JournalRecord::SetAttribute {
            instance: recorded,
            name,
            value,
        } => {
            let target = instance(stats, *recorded)?;
            let value = remap(value, stats, lsn)?;
            exec.set_attribute(target, name, value)
                .map_err(|e| JournalError::replay(lsn, e))?;
        }
        JournalRecord::CreateLink {
            link,
            association,
            source,
            target,
            position,
        } => {
            let association_id = registry
                .get_association_id(association)
                .ok_or_else(|| JournalError::unknown_association(lsn, association.as_str()))?;
            let source = instance(stats, *source)?;
            let target = instance(stats, *target)?;
            let created = match position {
                Some(position) => exec.create_link_at(association_id, source, target, *position),
                None => exec.create_link(association_id, source, target),
            }
            .map_err(|e| JournalError::replay(lsn, e))?;
            stats.links.insert(*link, created);
        }
        JournalRecord::RemoveLink { link } => {
            let replayed = stats
                .link(*link)
                .ok_or_else(|| JournalError::unknown_link(lsn, *link))?;
            exec.remove_link_by_id(replayed)
                .map_err(|e| JournalError::replay(lsn, e))?;
        }
        JournalRecord::DeleteInstance {
            instance: recorded,
        } => {
            let target = instance(stats, *recorded)?;
            exec.delete_instance(target)
                .map_err(|e| JournalError::replay(lsn, e))?;
        }
    }
    Ok(())
}

/// Rewrite instance handles inside an attribute value.
fn remap(value: &Value, stats: &ReplayStats, lsn: Lsn) -> JournalResult<Value> {
    Ok(match value {
        Value::Instance(recorded) => Value::Instance(
            stats
                .instance(*recorded)
                .ok_or_else(|| JournalError::unknown_instance(lsn, *recorded))?,
        ),
        Value::Collection(collection) => {
            let mut items = Vec::with_capacity(collection.len());
            for item in collection.iter() {
                items.push(remap(item, stats, lsn)?);
            }
            Value::Collection(Collection::from_items(collection.kind(), items))
        }
        other => other.clone(),
    })
}
