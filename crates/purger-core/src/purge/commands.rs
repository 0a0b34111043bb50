use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::Error;
use crate::purge::query::SnapshotQuery;
use crate::storage::models::review_statuses;
use crate::storage::BatchSession;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

/// Snapshot-keyed data removed with the snapshot rows, children before parents.
const SNAPSHOT_DELETE_CASCADE: &[&str] = &[
    "DELETE FROM dependencies WHERE from_snapshot_id IN ({ids}) OR to_snapshot_id IN ({ids})",
    "DELETE FROM duplications_index WHERE snapshot_id IN ({ids})",
    "DELETE FROM events WHERE snapshot_id IN ({ids})",
    "DELETE FROM measure_data WHERE snapshot_id IN ({ids}) \
     OR measure_id IN (SELECT id FROM project_measures WHERE snapshot_id IN ({ids}))",
    "DELETE FROM project_measures WHERE snapshot_id IN ({ids})",
    "DELETE FROM snapshot_sources WHERE snapshot_id IN ({ids})",
    "DELETE FROM rule_failures WHERE snapshot_id IN ({ids})",
    "DELETE FROM graphs WHERE snapshot_id IN ({ids})",
];

const DELETE_SNAPSHOTS: &str = "DELETE FROM snapshots WHERE id IN ({ids})";

/// Bulky data stripped by a soft purge. Events, violations and the
/// remaining measures stay with the snapshot.
const SNAPSHOT_PURGE_CASCADE: &[&str] = &[
    "DELETE FROM dependencies WHERE from_snapshot_id IN ({ids}) OR to_snapshot_id IN ({ids})",
    "DELETE FROM duplications_index WHERE snapshot_id IN ({ids})",
    "DELETE FROM snapshot_sources WHERE snapshot_id IN ({ids})",
    "DELETE FROM graphs WHERE snapshot_id IN ({ids})",
    "DELETE FROM measure_data WHERE snapshot_id IN ({ids}) \
     OR measure_id IN (SELECT id FROM project_measures WHERE snapshot_id IN ({ids}))",
    "DELETE FROM project_measures WHERE snapshot_id IN ({ids}) \
     AND metric_id IN (SELECT id FROM metrics WHERE delete_historical_data = 1)",
];

const MARK_SNAPSHOTS_PURGED: &str = "UPDATE snapshots SET purge_status = 1 WHERE id IN ({ids})";

const SELECT_SNAPSHOT_IDS_BY_RESOURCE: &str =
    "SELECT id FROM snapshots WHERE project_id IN ({ids}) ORDER BY id";

/// Resource-keyed data removed once the resources' snapshots are gone.
const RESOURCE_DELETE_CASCADE: &[&str] = &[
    "DELETE FROM project_links WHERE project_id IN ({ids})",
    "DELETE FROM properties WHERE resource_id IN ({ids})",
    "DELETE FROM resource_index WHERE resource_id IN ({ids})",
    "DELETE FROM group_roles WHERE resource_id IN ({ids})",
    "DELETE FROM user_roles WHERE resource_id IN ({ids})",
    "DELETE FROM manual_measures WHERE resource_id IN ({ids})",
    "DELETE FROM review_comments WHERE review_id IN \
     (SELECT id FROM reviews WHERE resource_id IN ({ids}))",
    "DELETE FROM action_plans_reviews WHERE review_id IN \
     (SELECT id FROM reviews WHERE resource_id IN ({ids})) \
     OR action_plan_id IN (SELECT id FROM action_plans WHERE project_id IN ({ids}))",
    "DELETE FROM reviews WHERE resource_id IN ({ids})",
    "DELETE FROM action_plans WHERE project_id IN ({ids})",
    "DELETE FROM events WHERE resource_id IN ({ids})",
];

const DELETE_RESOURCES: &str = "DELETE FROM projects WHERE id IN ({ids})";

/// Enabled resources of a project (itself included) left without a last snapshot.
const SELECT_RESOURCE_IDS_TO_DISABLE: &str = "SELECT p.id FROM projects p \
     WHERE (p.id = ?1 OR p.root_id = ?1) AND p.enabled = 1 \
     AND NOT EXISTS (SELECT s.id FROM snapshots s WHERE s.islast = 1 AND s.project_id = p.id)";

/// Snapshot and resource mutations executed inside one `BatchSession`.
///
/// The commands never commit; the caller owns the session and decides where
/// the transaction boundaries are.
pub struct PurgeCommands<'conn> {
    conn: &'conn Connection,
    batch_size: usize,
}

impl<'conn> PurgeCommands<'conn> {
    pub fn new(session: &BatchSession<'conn>) -> Self {
        Self {
            conn: session.connection(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn select_snapshot_ids(&self, query: &SnapshotQuery) -> Result<Vec<i64>, Error> {
        let (clause, values) = snapshot_filter(query);
        let sql = format!("SELECT s.id FROM snapshots s{} ORDER BY s.id", clause);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(values), |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Hard-delete the matching snapshots and everything keyed by them.
    /// Returns the number of snapshot rows deleted.
    pub fn delete_snapshots(&self, query: &SnapshotQuery) -> Result<usize, Error> {
        let ids = self.select_snapshot_ids(query)?;
        self.delete_snapshot_ids(&ids)
    }

    /// Strip bulky data from the matching snapshots and flag them purged.
    /// Returns the number of snapshots flagged.
    pub fn purge_snapshots(&self, query: &SnapshotQuery) -> Result<usize, Error> {
        let ids = self.select_snapshot_ids(query)?;
        let mut purged = 0;
        for chunk in ids.chunks(self.batch_size) {
            for sql in SNAPSHOT_PURGE_CASCADE {
                self.execute_for_ids(sql, chunk)?;
            }
            purged += self.execute_for_ids(MARK_SNAPSHOTS_PURGED, chunk)?;
        }
        if purged > 0 {
            debug!("Purged {} snapshots", purged);
        }
        Ok(purged)
    }

    /// Hard-delete resource rows with their snapshots and resource-keyed data.
    /// Returns the number of resource rows deleted.
    pub fn delete_resources(&self, resource_ids: &[i64]) -> Result<usize, Error> {
        let mut deleted = 0;
        for chunk in resource_ids.chunks(self.batch_size) {
            let snapshot_ids = self.select_ids_for(SELECT_SNAPSHOT_IDS_BY_RESOURCE, chunk)?;
            self.delete_snapshot_ids(&snapshot_ids)?;
            for sql in RESOURCE_DELETE_CASCADE {
                self.execute_for_ids(sql, chunk)?;
            }
            deleted += self.execute_for_ids(DELETE_RESOURCES, chunk)?;
        }
        if deleted > 0 {
            debug!("Deleted {} resources", deleted);
        }
        Ok(deleted)
    }

    /// Stream the resources of `project_id` that should be disabled, calling
    /// `handle` for each id as the rows arrive. Returns the number handled.
    pub fn for_each_resource_to_disable<F>(&self, project_id: i64, mut handle: F) -> Result<usize, Error>
    where
        F: FnMut(i64) -> Result<(), Error>,
    {
        let mut stmt = self.conn.prepare_cached(SELECT_RESOURCE_IDS_TO_DISABLE)?;
        let mut rows = stmt.query(params![project_id])?;
        let mut handled = 0;
        while let Some(row) = rows.next()? {
            if let Some(resource_id) = row.get::<_, Option<i64>>(0)? {
                handle(resource_id)?;
                handled += 1;
            }
        }
        Ok(handled)
    }

    /// Soft-delete one resource: drop its index entries, demote its snapshots,
    /// flag it disabled and close its open reviews.
    pub fn disable_resource(&self, resource_id: i64) -> Result<(), Error> {
        self.conn
            .prepare_cached("DELETE FROM resource_index WHERE resource_id = ?1")?
            .execute(params![resource_id])?;
        self.conn
            .prepare_cached("UPDATE snapshots SET islast = 0 WHERE project_id = ?1")?
            .execute(params![resource_id])?;
        self.conn
            .prepare_cached("UPDATE projects SET enabled = 0 WHERE id = ?1")?
            .execute(params![resource_id])?;
        let now = chrono::Utc::now();
        let closed = self
            .conn
            .prepare_cached(
                "UPDATE reviews SET status = ?2, updated_at = ?3 \
                 WHERE resource_id = ?1 AND status <> ?2",
            )?
            .execute(params![resource_id, review_statuses::CLOSED, now])?;
        debug!("Disabled resource {} ({} reviews closed)", resource_id, closed);
        Ok(())
    }

    fn delete_snapshot_ids(&self, snapshot_ids: &[i64]) -> Result<usize, Error> {
        let mut deleted = 0;
        for chunk in snapshot_ids.chunks(self.batch_size) {
            for sql in SNAPSHOT_DELETE_CASCADE {
                self.execute_for_ids(sql, chunk)?;
            }
            deleted += self.execute_for_ids(DELETE_SNAPSHOTS, chunk)?;
        }
        if deleted > 0 {
            debug!("Deleted {} snapshots", deleted);
        }
        Ok(deleted)
    }

    fn execute_for_ids(&self, template: &str, ids: &[i64]) -> Result<usize, Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = expand_ids(template, ids.len());
        let mut stmt = self.conn.prepare_cached(&sql)?;
        Ok(stmt.execute(params_from_iter(ids.iter()))?)
    }

    fn select_ids_for(&self, template: &str, ids: &[i64]) -> Result<Vec<i64>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = expand_ids(template, ids.len());
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let selected = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(selected)
    }
}

/// Replace every `{ids}` with the numbered placeholders `?1, ..., ?n` so that
/// a template may reference the same id list more than once.
fn expand_ids(template: &str, count: usize) -> String {
    let placeholders = (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    template.replace("{ids}", &placeholders)
}

/// Build the ` WHERE ...` clause (empty when unconstrained) and its bound values.
pub(crate) fn snapshot_filter(query: &SnapshotQuery) -> (String, Vec<Value>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    let mut push_eq = |column: &str, value: Value, conditions: &mut Vec<String>| {
        values.push(value);
        conditions.push(format!("{} = ?{}", column, values.len()));
    };

    if let Some(id) = query.id() {
        push_eq("s.id", Value::Integer(id), &mut conditions);
    }
    if let Some(resource_id) = query.resource_id() {
        push_eq("s.project_id", Value::Integer(resource_id), &mut conditions);
    }
    if let Some(root_project_id) = query.root_project_id() {
        push_eq("s.root_project_id", Value::Integer(root_project_id), &mut conditions);
    }
    if let Some(root_snapshot_id) = query.root_snapshot_id() {
        push_eq("s.root_snapshot_id", Value::Integer(root_snapshot_id), &mut conditions);
    }
    if let Some(islast) = query.islast() {
        push_eq("s.islast", Value::Integer(islast as i64), &mut conditions);
    }
    if query.not_purged() {
        conditions.push("(s.purge_status IS NULL OR s.purge_status = 0)".to_string());
    }

    for (column, codes) in [("s.status", query.statuses()), ("s.scope", query.scopes())] {
        let Some(codes) = codes else { continue };
        if codes.is_empty() {
            conditions.push("0 = 1".to_string());
            continue;
        }
        let mut placeholders = Vec::with_capacity(codes.len());
        for code in codes {
            values.push(Value::Text(code.clone()));
            placeholders.push(format!("?{}", values.len()));
        }
        conditions.push(format!("{} IN ({})", column, placeholders.join(", ")));
    }

    if conditions.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), values)
    }
}
