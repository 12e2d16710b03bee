//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The session, publisher and notifier call store methods. They never
//! execute SQL directly.

use crate::{
    error::PlanResult,
    event::EventLogEntry,
    types::Seq,
};
use rusqlite::{params, Connection};

mod outbox;
mod publication;

pub use outbox::OutboxMessage;

pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) a store backed by a file or SQLite URI.
    pub fn open(path: &str) -> PlanResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn in_memory() -> PlanResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PlanResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(&self, session_id: &str, version: &str) -> PlanResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO session (session_id, version) VALUES (?1, ?2)",
            params![session_id, version],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> PlanResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, seq, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.session_id, entry.seq as i64, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_for_session(&self, session_id: &str) -> PlanResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, seq, event_type, payload
             FROM event_log WHERE session_id = ?1
             ORDER BY seq ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    session_id: row.get(1)?,
                    seq:        row.get::<_, i64>(2)? as Seq,
                    event_type: row.get(3)?,
                    payload:    row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count_of_type(&self, session_id: &str, event_type: &str) -> PlanResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1 AND event_type = ?2",
            params![session_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
