use rusqlite::{Connection, Result};
use tracing::{debug, warn};

/// A transactional unit of work over one connection.
///
/// A transaction is open for the whole life of the session. `commit()` makes
/// the work so far durable and starts the next transaction; `close()` commits
/// and ends the session. Dropping an unclosed session rolls back whatever is
/// still uncommitted, so an error propagated with `?` never leaves a partial
/// cascade behind.
pub struct BatchSession<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BatchSession<'conn> {
    pub(crate) fn begin(conn: &'conn Connection) -> Result<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    pub fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT; BEGIN")?;
        debug!("Session checkpoint committed");
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.conn.execute_batch("COMMIT")
    }
}

impl Drop for BatchSession<'_> {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!("Rollback failed while closing session: {}", e);
            } else {
                debug!("Session rolled back");
            }
        }
    }
}
