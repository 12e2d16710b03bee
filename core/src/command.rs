use crate::{
    request_desk::RequestType,
    types::{Day, EmployeeId, RequestId, ShiftId},
};
use serde::{Deserialize, Serialize};

/// All manager/employee commands a session accepts.
/// Variants are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ManagerCommand {
    Generate,
    MoveShift {
        shift_id:        ShiftId,
        new_day:         Day,
        new_employee_id: EmployeeId,
    },
    SubmitRequest {
        employee_id:  EmployeeId,
        request_type: RequestType,
        day:          Day,
    },
    ReviewRequest {
        request_id: RequestId,
        approve:    bool,
    },
    Publish,
}

/// What a command did, in a shape the runner can print or send back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum CommandReply {
    Generated {
        shifts:           usize,
        gaps:             usize,
        total_labor_cost: f64,
    },
    Moved {
        shift:             crate::schedule::Shift,
        employee_resolved: bool,
        total_labor_cost:  f64,
    },
    Submitted {
        request: crate::request_desk::ShiftRequest,
    },
    Reviewed {
        request:      crate::request_desk::ShiftRequest,
        removed:      usize,
        notification: crate::notification::Delivery,
    },
    Published {
        outcome: crate::publish::PublishOutcome,
    },
}
