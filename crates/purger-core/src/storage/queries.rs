use super::models::*;
use super::sqlite::{Database, TABLES};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use tracing::debug;

pub(crate) const RESOURCE_COLUMNS: &str =
    "id, kee, name, long_name, scope, qualifier, root_id, enabled, created_at";

pub(crate) const SNAPSHOT_COLUMNS: &str = "id, project_id, root_project_id, root_snapshot_id, \
     scope, qualifier, status, islast, purge_status, created_at";

pub(crate) fn resource_from_row(row: &Row<'_>) -> Result<Resource> {
    Ok(Resource {
        id: row.get(0)?,
        key: row.get(1)?,
        name: row.get(2)?,
        long_name: row.get(3)?,
        scope: row.get(4)?,
        qualifier: row.get(5)?,
        root_id: row.get(6)?,
        enabled: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn snapshot_from_row(row: &Row<'_>) -> Result<Snapshot> {
    Ok(Snapshot {
        id: row.get(0)?,
        resource_id: row.get(1)?,
        root_project_id: row.get(2)?,
        root_snapshot_id: row.get(3)?,
        scope: row.get(4)?,
        qualifier: row.get(5)?,
        status: row.get(6)?,
        islast: row.get(7)?,
        purged: row.get::<_, Option<i64>>(8)?.unwrap_or(0) != 0,
        created_at: row.get(9)?,
    })
}

/// Load one resource row, or `None` when absent.
pub(crate) fn find_resource(conn: &Connection, id: i64) -> Result<Option<Resource>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM projects WHERE id = ?1",
        RESOURCE_COLUMNS
    ))?;
    stmt.query_row(params![id], resource_from_row).optional()
}

impl Database {
    // ── Resources ────────────────────────────────────────────────

    /// Insert a resource. The `id` field is ignored; the new row id is returned.
    pub fn insert_resource(&self, resource: &Resource) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO projects \
             (kee, name, long_name, scope, qualifier, root_id, enabled, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                resource.key,
                resource.name,
                resource.long_name,
                resource.scope,
                resource.qualifier,
                resource.root_id,
                resource.enabled,
                resource.created_at,
            ],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn get_resource(&self, id: i64) -> Result<Option<Resource>> {
        find_resource(self.connection(), id)
    }

    // ── Snapshots ────────────────────────────────────────────────

    /// Insert a snapshot. The `id` field is ignored; the new row id is returned.
    pub fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO snapshots \
             (project_id, root_project_id, root_snapshot_id, scope, qualifier, status, \
              islast, purge_status, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                snapshot.resource_id,
                snapshot.root_project_id,
                snapshot.root_snapshot_id,
                snapshot.scope,
                snapshot.qualifier,
                snapshot.status,
                snapshot.islast,
                if snapshot.purged { Some(1) } else { None::<i64> },
                snapshot.created_at,
            ],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn get_snapshot(&self, id: i64) -> Result<Option<Snapshot>> {
        let mut stmt = self.connection().prepare_cached(&format!(
            "SELECT {} FROM snapshots WHERE id = ?1",
            SNAPSHOT_COLUMNS
        ))?;
        stmt.query_row(params![id], snapshot_from_row).optional()
    }

    pub fn get_snapshots_for_resource(&self, resource_id: i64) -> Result<Vec<Snapshot>> {
        let mut stmt = self.connection().prepare_cached(&format!(
            "SELECT {} FROM snapshots WHERE project_id = ?1 ORDER BY created_at, id",
            SNAPSHOT_COLUMNS
        ))?;
        let snapshots = stmt
            .query_map(params![resource_id], snapshot_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    // ── Metrics ──────────────────────────────────────────────────

    pub fn insert_metric(&self, name: &str, delete_historical_data: bool) -> Result<i64> {
        self.connection().execute(
            "INSERT INTO metrics (name, delete_historical_data) VALUES (?1, ?2)",
            params![name, delete_historical_data],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    pub fn get_metric(&self, id: i64) -> Result<Option<Metric>> {
        self.connection()
            .query_row(
                "SELECT id, name, delete_historical_data FROM metrics WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Metric {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        delete_historical_data: row.get(2)?,
                    })
                },
            )
            .optional()
    }

    // ── Purgeable Snapshots ──────────────────────────────────────

    pub fn select_purgeable_snapshots_with_events(
        &self,
        resource_id: i64,
    ) -> Result<Vec<PurgeableSnapshot>> {
        self.select_purgeable_snapshots(resource_id, true)
    }

    pub fn select_purgeable_snapshots_without_events(
        &self,
        resource_id: i64,
    ) -> Result<Vec<PurgeableSnapshot>> {
        self.select_purgeable_snapshots(resource_id, false)
    }

    fn select_purgeable_snapshots(
        &self,
        resource_id: i64,
        with_events: bool,
    ) -> Result<Vec<PurgeableSnapshot>> {
        let sql = format!(
            "SELECT s.id, s.created_at, s.islast FROM snapshots s \
             WHERE s.project_id = ?1 AND s.status = ?2 AND s.qualifier <> 'LIB' \
             AND {} EXISTS (SELECT e.id FROM events e WHERE e.snapshot_id = s.id)",
            if with_events { "" } else { "NOT" }
        );
        let mut stmt = self.connection().prepare_cached(&sql)?;
        let snapshots = stmt
            .query_map(params![resource_id, statuses::PROCESSED], |row| {
                Ok(PurgeableSnapshot {
                    snapshot_id: row.get(0)?,
                    date: row.get(1)?,
                    has_events: with_events,
                    is_last: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "{} purgeable snapshots {} events for resource {}",
            snapshots.len(),
            if with_events { "with" } else { "without" },
            resource_id
        );
        Ok(snapshots)
    }

    // ── Maintenance ──────────────────────────────────────────────

    /// Row count for one of the known tables; unknown names are rejected.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        if !TABLES.contains(&table) {
            return Err(rusqlite::Error::InvalidParameterName(table.to_string()));
        }
        self.connection()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
    }
}
