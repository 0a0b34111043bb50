use crate::config::{PurgeConfig, DEFAULT_BATCH_SIZE};
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::purge::{tree, PurgeCommands, SnapshotQuery};
use crate::storage::models::{statuses, PurgeableSnapshot, Resource};
use crate::storage::{BatchSession, Database};
use ahash::AHashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct PurgeEngine {
    db: Database,
    batch_size: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeResult {
    pub projects: usize,
    pub aborted_snapshots_deleted: usize,
    pub history_snapshots_deleted: usize,
    pub snapshots_purged: usize,
    pub resources_disabled: usize,
    pub duration: Duration,
}

impl PurgeResult {
    /// True when the run deleted, purged and disabled nothing.
    pub fn is_noop(&self) -> bool {
        self.aborted_snapshots_deleted == 0
            && self.history_snapshots_deleted == 0
            && self.snapshots_purged == 0
            && self.resources_disabled == 0
    }
}

impl PurgeEngine {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn open(db_path: &str) -> Result<Self, Error> {
        Ok(Self::new(Database::open(db_path)?))
    }

    pub fn from_config(config: &PurgeConfig) -> Result<Self, Error> {
        Ok(Self::open(&config.db_path)?.with_batch_size(config.batch_size))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn commands<'conn>(&self, session: &BatchSession<'conn>) -> PurgeCommands<'conn> {
        PurgeCommands::new(session).with_batch_size(self.batch_size)
    }

    /// Run the retention policy over a project and all of its descendant projects:
    /// 1. Per project, delete aborted builds
    /// 2. Per project, trim history under every non-last, not yet purged project snapshot
    /// 3. Per project, disable resources that dropped out of the live tree
    ///
    /// A commit follows each project's history pass and each project's orphan
    /// pass. When project N fails, the work of projects 1..N-1 stays committed
    /// and only project N's open transaction is rolled back. Rerunning is safe
    /// because already-purged snapshots are skipped.
    pub fn purge(
        &self,
        root_resource_id: i64,
        scopes_without_history: &[String],
        reporter: &dyn ProgressReporter,
    ) -> Result<PurgeResult, Error> {
        let start = Instant::now();
        let session = self.db.open_batch_session()?;
        let commands = self.commands(&session);

        let projects = tree::load_project_tree(session.connection(), root_resource_id)?;
        reporter.on_purge_start(projects.len());

        let mut result = PurgeResult {
            projects: projects.len(),
            ..PurgeResult::default()
        };

        for project in &projects {
            info!("-> Clean {} [id={}]", project.long_name, project.id);
            reporter.on_project_start(project.id, &project.long_name);

            let aborted = delete_aborted_builds(project, &commands)?;
            if aborted > 0 {
                reporter.on_aborted_builds_deleted(project.id, aborted);
            }
            result.aborted_snapshots_deleted += aborted;

            purge_history(project, scopes_without_history, &commands, reporter, &mut result)?;
            session.commit()?;
        }

        for project in &projects {
            let disabled = commands.for_each_resource_to_disable(project.id, |resource_id| {
                commands.disable_resource(resource_id)?;
                reporter.on_resource_disabled(resource_id);
                Ok(())
            })?;
            if disabled > 0 {
                info!("<- Disabled {} orphan resources of {}", disabled, project.long_name);
            }
            result.resources_disabled += disabled;
            session.commit()?;
        }

        session.close()?;

        result.duration = start.elapsed();
        reporter.on_purge_complete(result.resources_disabled, result.duration.as_secs_f64());
        debug!(
            "Purge of {} completed in {:.2}s: {:?}",
            root_resource_id,
            result.duration.as_secs_f64(),
            result
        );
        Ok(result)
    }

    /// Snapshots of a resource that history trimming may consider, oldest first.
    pub fn select_purgeable_snapshots(&self, resource_id: i64) -> Result<Vec<PurgeableSnapshot>, Error> {
        let mut result = self.db.select_purgeable_snapshots_with_events(resource_id)?;
        let mut seen: AHashSet<i64> = result.iter().map(|s| s.snapshot_id).collect();
        for snapshot in self.db.select_purgeable_snapshots_without_events(resource_id)? {
            if seen.insert(snapshot.snapshot_id) {
                result.push(snapshot);
            }
        }
        result.sort();
        Ok(result)
    }

    /// Hard-delete a project, every descendant project and all of their
    /// resources. Descendants go before ancestors. Returns the number of
    /// resource rows deleted.
    pub fn delete_resource_tree(
        &self,
        root_project_id: i64,
        reporter: &dyn ProgressReporter,
    ) -> Result<usize, Error> {
        let start = Instant::now();
        let session = self.db.open_batch_session()?;
        let commands = self.commands(&session);
        let conn = session.connection();

        tree::get_resource(conn, root_project_id)?;
        reporter.on_tree_delete_start(root_project_id);

        let mut deleted = 0;
        for project_id in tree::project_ids_bottom_up(conn, root_project_id)? {
            let resource_ids = tree::select_resource_ids_by_root_id(conn, project_id)?;
            deleted += commands.delete_resources(&resource_ids)?;
        }
        session.close()?;

        info!("Deleted resource tree {} ({} resources)", root_project_id, deleted);
        reporter.on_tree_delete_complete(deleted, start.elapsed().as_secs_f64());
        Ok(deleted)
    }

    /// Cascading delete of whatever the query matches, with no retention policy
    /// applied. Returns the number of snapshot rows deleted.
    pub fn delete_snapshots(&self, query: &SnapshotQuery) -> Result<usize, Error> {
        let session = self.db.open_batch_session()?;
        let deleted = self.commands(&session).delete_snapshots(query)?;
        session.close()?;
        info!("Deleted {} snapshots", deleted);
        Ok(deleted)
    }
}

/// Delete the unfinished runs of a project. Detection looks at the project's
/// own snapshots; deletion first takes every aborted snapshot of runs rooted
/// at the project, then any aborted snapshot of the project itself that
/// belongs to a run rooted higher up.
fn delete_aborted_builds(project: &Resource, commands: &PurgeCommands<'_>) -> Result<usize, Error> {
    let own = SnapshotQuery::new()
        .with_resource_id(project.id)
        .with_islast(false)
        .with_statuses([statuses::UNPROCESSED]);
    if commands.select_snapshot_ids(&own)?.is_empty() {
        return Ok(0);
    }

    info!("<- Delete aborted builds");
    let run = SnapshotQuery::new()
        .with_root_project_id(project.id)
        .with_islast(false)
        .with_statuses([statuses::UNPROCESSED]);
    let deleted = commands.delete_snapshots(&run)?;
    Ok(deleted + commands.delete_snapshots(&own)?)
}

fn purge_history(
    project: &Resource,
    scopes_without_history: &[String],
    commands: &PurgeCommands<'_>,
    reporter: &dyn ProgressReporter,
    result: &mut PurgeResult,
) -> Result<(), Error> {
    let anchors = commands.select_snapshot_ids(
        &SnapshotQuery::new()
            .with_resource_id(project.id)
            .with_islast(false)
            .with_not_purged(true),
    )?;

    for anchor_id in anchors {
        info!("<- Clean snapshot {}", anchor_id);

        if !scopes_without_history.is_empty() {
            let query = SnapshotQuery::new()
                .with_root_snapshot_id(anchor_id)
                .with_islast(false)
                .with_scopes(scopes_without_history.iter().cloned());
            result.history_snapshots_deleted += commands.delete_snapshots(&query)?;
        }

        let descendants = SnapshotQuery::new()
            .with_root_snapshot_id(anchor_id)
            .with_not_purged(true);
        result.snapshots_purged += commands.purge_snapshots(&descendants)?;

        // anchor last: a rerun after a failure above still finds it unpurged
        let anchor = SnapshotQuery::new().with_id(anchor_id).with_not_purged(true);
        result.snapshots_purged += commands.purge_snapshots(&anchor)?;

        reporter.on_snapshot_cleaned(anchor_id);
    }
    Ok(())
}
