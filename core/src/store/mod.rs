//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! Analyzers and callers go through store methods — they never execute
//! SQL directly.

mod player_history;
mod snapshot;

pub use player_history::PlayerSnapshotRecord;
pub use snapshot::{
    ClusterBucketRecord, DailyPoint, ExecutiveSummary, PeriodComparison, SnapshotFilters,
    SnapshotRecord,
};

use rusqlite::Connection;

use crate::error::HealthResult;

pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (or create) the history database at `path`.
    pub fn open(path: &str) -> HealthResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance. In-memory
        // databases ignore it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> HealthResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> HealthResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_history.sql"))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
