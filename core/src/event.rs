//! The session event log.
//!
//! RULE: every state change a session makes is recorded as one
//! `SessionEvent`, in the order it was applied.

use crate::{
    request_desk::{RequestStatus, RequestType},
    types::{Day, EmployeeId, RequestId, Seq, SessionId, ShiftId},
};
use serde::{Deserialize, Serialize};

/// Variants are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionOpened {
        session_id: SessionId,
    },
    RosterLoaded {
        employees: usize,
        forecast_entries: usize,
    },
    ScheduleGenerated {
        shifts: usize,
        total_labor_cost: f64,
        gaps: usize,
    },
    CoverageGapFound {
        day: Day,
        window: String,
        role: String,
        shortfall: u32,
    },
    ShiftMoved {
        shift_id: ShiftId,
        day: Day,
        employee_id: EmployeeId,
        total_labor_cost: f64,
    },
    MoveFellBack {
        shift_id: ShiftId,
        unknown_employee_id: EmployeeId,
    },
    RequestSubmitted {
        request_id: RequestId,
        employee_id: EmployeeId,
        request_type: RequestType,
        day: Day,
    },
    RequestReviewed {
        request_id: RequestId,
        status: RequestStatus,
    },
    ShiftsReconciled {
        request_id: RequestId,
        removed: Vec<ShiftId>,
        total_labor_cost: f64,
    },
    NotificationFailed {
        employee_id: Option<EmployeeId>,
        reason: String,
    },
    SchedulePublished {
        shifts: usize,
        total_labor_cost: f64,
    },
    PublishFailed {
        reason: String,
    },
}

impl SessionEvent {
    /// Stable name for the `event_type` column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionOpened { .. }     => "session_opened",
            Self::RosterLoaded { .. }      => "roster_loaded",
            Self::ScheduleGenerated { .. } => "schedule_generated",
            Self::CoverageGapFound { .. }  => "coverage_gap_found",
            Self::ShiftMoved { .. }        => "shift_moved",
            Self::MoveFellBack { .. }      => "move_fell_back",
            Self::RequestSubmitted { .. }  => "request_submitted",
            Self::RequestReviewed { .. }   => "request_reviewed",
            Self::ShiftsReconciled { .. }  => "shifts_reconciled",
            Self::NotificationFailed { .. }=> "notification_failed",
            Self::SchedulePublished { .. } => "schedule_published",
            Self::PublishFailed { .. }     => "publish_failed",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub session_id: SessionId,
    pub seq: Seq,
    pub event_type: String,
    pub payload: String, // JSON-serialized SessionEvent
}
