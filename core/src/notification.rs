//! Notification collaborator contract.
//!
//! The core hands over fully formed messages and never depends on the
//! result for the correctness of schedule or request state. A failed
//! delivery is reported to the caller as a `Delivery::Failed`.

use crate::{
    error::PlanResult,
    request_desk::{RequestStatus, RequestType},
    schedule::Schedule,
    store::SessionStore,
    types::SessionId,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::rc::Rc;

pub trait Notifier {
    /// Tell every scheduled employee about a freshly published schedule.
    fn broadcast(&mut self, schedule: &Schedule) -> PlanResult<()>;

    /// Tell an employee how their request was decided.
    fn notify_request_status(
        &mut self,
        employee_id: &str,
        request_type: RequestType,
        status: RequestStatus,
    ) -> PlanResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "delivery", content = "reason", rename_all = "snake_case")]
pub enum Delivery {
    Sent,
    Failed(String),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl From<PlanResult<()>> for Delivery {
    fn from(result: PlanResult<()>) -> Self {
        match result {
            Ok(()) => Self::Sent,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Writes every notification to the log and nothing else.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn broadcast(&mut self, schedule: &Schedule) -> PlanResult<()> {
        log::info!(
            "notify: broadcast schedule with {} shifts to {} employees",
            schedule.len(),
            schedule.minutes_by_employee().len(),
        );
        Ok(())
    }

    fn notify_request_status(
        &mut self,
        employee_id: &str,
        request_type: RequestType,
        status: RequestStatus,
    ) -> PlanResult<()> {
        log::info!("notify: {employee_id} {request_type} request {status}");
        Ok(())
    }
}

/// Queues notifications in the session store's outbox table, one row
/// per recipient. Stands in for a real transport.
pub struct OutboxNotifier {
    store: Rc<SessionStore>,
    session_id: SessionId,
}

impl OutboxNotifier {
    pub fn new(store: Rc<SessionStore>, session_id: SessionId) -> Self {
        Self { store, session_id }
    }
}

impl Notifier for OutboxNotifier {
    /// All recipients are queued in one transaction.
    fn broadcast(&mut self, schedule: &Schedule) -> PlanResult<()> {
        let mut per_employee: BTreeMap<&str, Vec<_>> = BTreeMap::new();
        for shift in schedule.shifts() {
            per_employee.entry(shift.employee_id.as_str()).or_default().push(shift);
        }
        let messages: Vec<(Option<&str>, String)> = per_employee
            .into_iter()
            .map(|(employee_id, shifts)| {
                let payload = json!({
                    "kind": "schedule_published",
                    "employeeId": employee_id,
                    "shifts": shifts,
                });
                (Some(employee_id), payload.to_string())
            })
            .collect();
        self.store.enqueue_notifications(&self.session_id, "broadcast", &messages)
    }

    fn notify_request_status(
        &mut self,
        employee_id: &str,
        request_type: RequestType,
        status: RequestStatus,
    ) -> PlanResult<()> {
        let payload = json!({
            "kind": "request_status",
            "employeeId": employee_id,
            "requestType": request_type,
            "status": status,
        });
        self.store.enqueue_notification(
            &self.session_id,
            "request_status",
            Some(employee_id),
            &payload.to_string(),
        )
    }
}
