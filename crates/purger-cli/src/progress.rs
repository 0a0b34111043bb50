use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use purger_core::ProgressReporter;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// CLI progress reporter: one spinner per operation, a check line when it ends.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.guard();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn set_message(&self, message: String) {
        if let Some(pb) = self.guard().as_ref() {
            pb.set_message(message);
        }
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.guard().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_purge_start(&self, project_count: usize) {
        self.set_bar(spinner(format!("Purging {} projects...", project_count)));
    }

    fn on_project_start(&self, project_id: i64, long_name: &str) {
        self.set_message(format!("Cleaning {} [id={}]", long_name, project_id));
    }

    fn on_aborted_builds_deleted(&self, project_id: i64, snapshots: usize) {
        self.set_message(format!(
            "Deleted {} aborted snapshots of project {}",
            snapshots, project_id
        ));
    }

    fn on_snapshot_cleaned(&self, snapshot_id: i64) {
        self.set_message(format!("Cleaned snapshot {}", snapshot_id));
    }

    fn on_resource_disabled(&self, resource_id: i64) {
        self.set_message(format!("Disabled resource {}", resource_id));
    }

    fn on_purge_complete(&self, disabled: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Purge complete: {} resources disabled in {:.2}s",
            "✓".green(),
            disabled,
            duration_secs
        );
    }

    fn on_tree_delete_start(&self, root_id: i64) {
        self.set_bar(spinner(format!("Deleting resource tree {}...", root_id)));
    }

    fn on_tree_delete_complete(&self, resources: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Tree deleted: {} resources in {:.2}s",
            "✓".green(),
            resources,
            duration_secs
        );
    }
}
