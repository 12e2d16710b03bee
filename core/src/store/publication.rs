use super::SessionStore;
use crate::error::PlanResult;
use rusqlite::{params, OptionalExtension};

impl SessionStore {
    // ── Published schedules ───────────────────────────────────────

    /// Store a published schedule as the next version. Returns the version.
    pub fn save_published_schedule(
        &self,
        session_id: &str,
        shift_count: usize,
        total_cost: f64,
        schedule_json: &str,
    ) -> PlanResult<i64> {
        let version: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM published_schedule WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT INTO published_schedule (session_id, version, shift_count, total_cost, schedule_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![session_id, version, shift_count as i64, total_cost, schedule_json],
        )?;
        Ok(version)
    }

    /// Latest published version and its JSON, if anything was published.
    pub fn latest_published_schedule(&self, session_id: &str) -> PlanResult<Option<(i64, String)>> {
        let row = self
            .conn
            .query_row(
                "SELECT version, schedule_json FROM published_schedule
                 WHERE session_id = ?1 ORDER BY version DESC LIMIT 1",
                params![session_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    pub fn published_count(&self, session_id: &str) -> PlanResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM published_schedule WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
