//! Shared data models for the lock coordinator

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tranca_common::LockMode;

/// A held lock, as exposed by status snapshots
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLock {
    #[serde(rename = "resourceId")]
    pub resource: String,
    #[serde(rename = "sessionId")]
    pub session: String,
    pub mode: LockMode,
    pub held_since: DateTime<Utc>,
}

/// A queued, not-yet-granted request, as exposed by queue snapshots
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingLock {
    #[serde(rename = "resourceId")]
    pub resource: String,
    #[serde(rename = "sessionId")]
    pub session: String,
    pub mode: LockMode,
    pub waiting_since: DateTime<Utc>,
}

/// Aggregate counts over a snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSummary {
    pub total: usize,
    pub readers: usize,
    pub writers: usize,
    pub resources: usize,
}

impl LockSummary {
    /// Summarize held locks
    pub fn of_active(locks: &[ActiveLock]) -> Self {
        Self::from_parts(locks.iter().map(|l| (l.resource.as_str(), l.mode)))
    }

    /// Summarize queued requests
    pub fn of_pending(queue: &[PendingLock]) -> Self {
        Self::from_parts(queue.iter().map(|p| (p.resource.as_str(), p.mode)))
    }

    fn from_parts<'a>(parts: impl Iterator<Item = (&'a str, LockMode)>) -> Self {
        let mut summary = LockSummary::default();
        let mut resources = BTreeSet::new();
        for (resource, mode) in parts {
            summary.total += 1;
            match mode {
                LockMode::Read => summary.readers += 1,
                LockMode::Write => summary.writers += 1,
            }
            resources.insert(resource);
        }
        summary.resources = resources.len();
        summary
    }
}
