/// Trait for reporting purge progress.
///
/// CLI implements with indicatif spinners, tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_purge_start(&self, _project_count: usize) {}
    fn on_project_start(&self, _project_id: i64, _long_name: &str) {}
    fn on_aborted_builds_deleted(&self, _project_id: i64, _snapshots: usize) {}
    fn on_snapshot_cleaned(&self, _snapshot_id: i64) {}
    fn on_resource_disabled(&self, _resource_id: i64) {}
    fn on_purge_complete(&self, _disabled: usize, _duration_secs: f64) {}
    fn on_tree_delete_start(&self, _root_id: i64) {}
    fn on_tree_delete_complete(&self, _resources: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
