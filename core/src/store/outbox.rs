use super::SessionStore;
use crate::error::PlanResult;
use rusqlite::params;

/// A queued notification as persisted to SQLite.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxMessage {
    pub id: i64,
    pub channel: String,
    pub employee_id: Option<String>,
    pub payload: String,
}

impl SessionStore {
    // ── Notification outbox ───────────────────────────────────────

    pub fn enqueue_notification(
        &self,
        session_id: &str,
        channel: &str,
        employee_id: Option<&str>,
        payload: &str,
    ) -> PlanResult<()> {
        self.conn.execute(
            "INSERT INTO notification_outbox (session_id, channel, employee_id, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, channel, employee_id, payload],
        )?;
        Ok(())
    }

    /// Queue several messages on one channel. Either all rows are
    /// written or none are.
    pub fn enqueue_notifications(
        &self,
        session_id: &str,
        channel: &str,
        messages: &[(Option<&str>, String)],
    ) -> PlanResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO notification_outbox (session_id, channel, employee_id, payload)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (employee_id, payload) in messages {
                stmt.execute(params![session_id, channel, employee_id, payload])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn outbox(&self, session_id: &str) -> PlanResult<Vec<OutboxMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, channel, employee_id, payload FROM notification_outbox
             WHERE session_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok(OutboxMessage {
                id: row.get(0)?,
                channel: row.get(1)?,
                employee_id: row.get(2)?,
                payload: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn outbox_for_employee(&self, session_id: &str, employee_id: &str) -> PlanResult<Vec<OutboxMessage>> {
        Ok(self
            .outbox(session_id)?
            .into_iter()
            .filter(|m| m.employee_id.as_deref() == Some(employee_id))
            .collect())
    }

    pub fn outbox_count(&self, session_id: &str) -> PlanResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM notification_outbox WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
