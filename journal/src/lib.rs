//! Meld Journal
//!
//! Record and replay of stored mutations.
//!
//! Responsibilities:
//! - Record every successful write to instances, attributes and links
//! - Serialize the record to and from JSON
//! - Replay a record into an empty store, mapping recorded handles to fresh ones
//!
//! Derived values are never recorded; replay recomputes them on demand.

mod entry;
mod error;
mod journal;

pub use entry::{JournalEntry, JournalRecord, Lsn};
pub use error::{JournalError, JournalResult};
pub use journal::{Journal, ReplayStats};
