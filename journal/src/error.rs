//! Journal error types.

use meld_core::{InstanceId, LinkId};
use meld_mutation::MutationError;
use thiserror::Error;

use crate::entry::Lsn;

/// Result type for journal operations.
pub type JournalResult<T> = Result<T, JournalError>;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("{lsn}: instance {instance} was never created in this journal")]
    UnknownInstance { lsn: Lsn, instance: InstanceId },

    #[error("{lsn}: link {link} was never created in this journal")]
    UnknownLink { lsn: Lsn, link: LinkId },

    #[error("{lsn}: unknown association {name}")]
    UnknownAssociation { lsn: Lsn, name: String },

    #[error("{lsn}: replay failed: {source}")]
    Replay {
        lsn: Lsn,
        #[source]
        source: MutationError,
    },

    #[error("Journal is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl JournalError {
    pub fn unknown_instance(lsn: Lsn, instance: InstanceId) -> Self {
        Self::UnknownInstance { lsn, instance }
    }

    pub fn unknown_link(lsn: Lsn, link: LinkId) -> Self {
        Self::UnknownLink { lsn, link }
    }

    pub fn unknown_association(lsn: Lsn, name: impl Into<String>) -> Self {
        Self::UnknownAssociation {
            lsn,
            name: name.into(),
        }
    }

    pub fn replay(lsn: Lsn, source: MutationError) -> Self {
        Self::Replay { lsn, source }
    }
}
