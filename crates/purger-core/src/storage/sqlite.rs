use super::session::BatchSession;
use rusqlite::{Connection, Result};
use tracing::debug;

const SCHEMA_VERSION: i64 = 1;

/// Tables in dependency order: every table is listed before the tables it references.
pub(crate) const TABLES: &[&str] = &[
    "action_plans_reviews",
    "action_plans",
    "review_comments",
    "reviews",
    "user_roles",
    "group_roles",
    "properties",
    "project_links",
    "resource_index",
    "manual_measures",
    "events",
    "graphs",
    "dependencies",
    "duplications_index",
    "snapshot_sources",
    "rule_failures",
    "measure_data",
    "project_measures",
    "metrics",
    "snapshots",
    "projects",
];

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;
        self.conn.set_prepared_statement_cache_capacity(64);
        debug!("SQLite pragmas configured (WAL mode, foreign keys, 64MB cache)");
        Ok(())
    }

    /// Install the schema when `user_version` is behind.
    fn migrate_schema(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(include_str!("schema.sql"))?;
            self.conn
                .execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
            debug!("SQLite schema installed (version {})", SCHEMA_VERSION);
        }
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Open a write-oriented session. Dropping it without `close()` rolls back.
    pub fn open_batch_session(&self) -> Result<BatchSession<'_>> {
        BatchSession::begin(&self.conn)
    }

    pub fn truncate_all(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for table in TABLES {
            tx.execute(&format!("DELETE FROM {}", table), [])?;
        }
        tx.commit()?;
        debug!("All tables truncated");
        Ok(())
    }
}
