use chrono::{DateTime, Utc};
use std::cmp::Ordering;

pub mod scopes {
    pub const PROJECT: &str = "PRJ";
    pub const DIRECTORY: &str = "DIR";
    pub const FILE: &str = "FIL";
}

pub mod statuses {
    pub const PROCESSED: &str = "P";
    /// Analysis never completed.
    pub const UNPROCESSED: &str = "U";
}

pub mod review_statuses {
    pub const OPEN: &str = "OPEN";
    pub const REOPENED: &str = "REOPENED";
    pub const RESOLVED: &str = "RESOLVED";
    pub const CLOSED: &str = "CLOSED";
}

/// A node of the resource tree (project, module, directory or file).
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub long_name: String,
    pub scope: String,
    pub qualifier: String,
    /// Enclosing project; `None` for a top-level project.
    pub root_id: Option<i64>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// One analysis run's recorded state for a resource.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: i64,
    pub resource_id: i64,
    pub root_project_id: Option<i64>,
    /// Snapshot of the top-level project for the same run; `None` on that snapshot itself.
    pub root_snapshot_id: Option<i64>,
    pub scope: String,
    pub qualifier: String,
    pub status: String,
    pub islast: bool,
    pub purged: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Metric {
    pub id: i64,
    pub name: String,
    pub delete_historical_data: bool,
}

/// Read projection of a snapshot used to decide history trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeableSnapshot {
    pub snapshot_id: i64,
    pub date: DateTime<Utc>,
    pub has_events: bool,
    pub is_last: bool,
}

impl Ord for PurgeableSnapshot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.snapshot_id.cmp(&other.snapshot_id))
    }
}

impl PartialOrd for PurgeableSnapshot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
