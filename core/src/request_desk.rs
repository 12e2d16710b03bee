//! Request lifecycle manager.
//!
//! STATE MACHINE (per request):
//!   PENDING ──approve──▶ APPROVED   (terminal)
//!   PENDING ──deny─────▶ DENIED     (terminal)
//!
//! Reviewing a terminal request fails with `InvalidState` and changes
//! nothing: no status overwrite, no schedule change, no notification.
//!
//! ORDER of a review:
//!   1. status is set                                  (`decide`)
//!   2. schedule side effect (approved OFF only) replaces the live schedule
//!   3. notifier is called exactly once with the final status (`notify`)
//! Callers that keep an audit trail record the decision between 2 and 3.
//! Step 3 can fail without undoing 1 or 2.

use crate::{
    error::{PlanError, PlanResult},
    mutation,
    notification::{Delivery, Notifier},
    roster::Roster,
    schedule::{CostModel, Schedule, Shift},
    types::{Day, EmployeeId, RequestId},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    /// Day off. Approval removes the employee's shifts on that day.
    Off,
    AvailabilityChange,
    Swap,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "OFF",
            Self::AvailabilityChange => "AVAILABILITY_CHANGE",
            Self::Swap => "SWAP",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Denied => "DENIED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftRequest {
    pub id: RequestId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub day: Day,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
}

/// A decided request whose employee has not been told yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub request: ShiftRequest,
    pub removed: Vec<Shift>,
    pub schedule_changed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub request: ShiftRequest,
    /// Shifts taken out of the live schedule by this review.
    pub removed: Vec<Shift>,
    /// True when the live schedule was replaced.
    pub schedule_changed: bool,
    pub notification: Delivery,
}

#[derive(Debug, Clone, Default)]
pub struct RequestDesk {
    requests: Vec<ShiftRequest>,
}

impl RequestDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(
        &mut self,
        roster: &Roster,
        employee_id: &str,
        request_type: RequestType,
        day: Day,
    ) -> PlanResult<ShiftRequest> {
        let employee = roster
            .get(employee_id)
            .ok_or_else(|| PlanError::not_found("employee", employee_id))?;
        let request = ShiftRequest {
            id: format!("req-{}", Uuid::new_v4().simple()),
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            day,
            request_type,
            status: RequestStatus::Pending,
        };
        log::info!(
            "request {}: {} submitted {request_type} for {day}",
            request.id,
            request.employee_id,
        );
        self.requests.push(request.clone());
        Ok(request)
    }

    /// Decide a pending request and apply its schedule side effect.
    /// `live` is the caller's current schedule and is replaced in place.
    /// Nobody is notified yet; see `notify`.
    pub fn decide(
        &mut self,
        request_id: &str,
        approve: bool,
        live: &mut Option<Schedule>,
        roster: &Roster,
        model: CostModel,
    ) -> PlanResult<Decision> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| PlanError::not_found("request", request_id))?;
        if request.status.is_terminal() {
            return Err(PlanError::InvalidState {
                request_id: request_id.to_string(),
                status: request.status.to_string(),
            });
        }

        request.status = if approve { RequestStatus::Approved } else { RequestStatus::Denied };
        let request = request.clone();

        let mut removed = Vec::new();
        let mut schedule_changed = false;
        if request.status == RequestStatus::Approved && request.request_type == RequestType::Off {
            if let Some(current) = live.as_ref() {
                let (next, taken) = mutation::remove_shifts_for(
                    current,
                    roster,
                    &request.employee_id,
                    request.day,
                    model,
                );
                *live = Some(next);
                removed = taken;
                schedule_changed = true;
            }
        }

        log::info!(
            "request {}: {} ({} shifts removed)",
            request.id,
            request.status,
            removed.len(),
        );
        Ok(Decision { request, removed, schedule_changed })
    }

    /// Send the one status notification for a decision.
    pub fn notify(decision: Decision, notifier: &mut dyn Notifier) -> ReviewOutcome {
        let Decision { request, removed, schedule_changed } = decision;
        let notification: Delivery = notifier
            .notify_request_status(&request.employee_id, request.request_type, request.status)
            .into();
        if let Delivery::Failed(reason) = &notification {
            log::warn!("request {}: status notification failed: {reason}", request.id);
        }
        ReviewOutcome { request, removed, schedule_changed, notification }
    }

    /// `decide` followed by `notify`.
    pub fn review(
        &mut self,
        request_id: &str,
        approve: bool,
        live: &mut Option<Schedule>,
        roster: &Roster,
        model: CostModel,
        notifier: &mut dyn Notifier,
    ) -> PlanResult<ReviewOutcome> {
        let decision = self.decide(request_id, approve, live, roster, model)?;
        Ok(Self::notify(decision, notifier))
    }

    pub fn get(&self, request_id: &str) -> Option<&ShiftRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    pub fn all(&self) -> &[ShiftRequest] {
        &self.requests
    }

    pub fn pending(&self) -> impl Iterator<Item = &ShiftRequest> {
        self.requests.iter().filter(|r| r.status == RequestStatus::Pending)
    }

    pub fn for_employee<'a>(&'a self, employee_id: &'a str) -> impl Iterator<Item = &'a ShiftRequest> + 'a {
        self.requests.iter().filter(move |r| r.employee_id == employee_id)
    }
}
