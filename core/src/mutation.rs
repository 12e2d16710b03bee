//! Schedule mutation service.
//!
//! Every function here takes a schedule by reference and returns a new
//! one; the input is never edited in place. Cost is always recomputed
//! over all shifts with rates looked up fresh from the roster.

use crate::{
    error::{PlanError, PlanResult},
    roster::Roster,
    schedule::{CostModel, Schedule, Shift},
    types::Day,
};
use serde::{Deserialize, Serialize};

/// What to do when a move names an employee the roster does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePolicy {
    /// Move the day anyway, keep the shift's employee fields as they were.
    #[default]
    FailSoft,
    /// Reject the whole move with `NotFound`.
    Strict,
}

/// Result of a move, including whether the employee lookup fell back.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    pub schedule: Schedule,
    pub shift: Shift,
    pub employee_resolved: bool,
}

pub fn move_shift(
    schedule: &Schedule,
    roster: &Roster,
    shift_id: &str,
    new_day: Day,
    new_employee_id: &str,
    policy: MovePolicy,
    model: CostModel,
) -> PlanResult<Move> {
    if schedule.shift(shift_id).is_none() {
        return Err(PlanError::not_found("shift", shift_id));
    }
    let employee = roster.get(new_employee_id);
    if employee.is_none() && policy == MovePolicy::Strict {
        return Err(PlanError::not_found("employee", new_employee_id));
    }

    let mut moved = None;
    let shifts: Vec<Shift> = schedule
        .shifts()
        .iter()
        .map(|shift| {
            if shift.id != shift_id {
                return shift.clone();
            }
            let mut updated = Shift { day: new_day, ..shift.clone() };
            if let Some(employee) = employee {
                updated.employee_id = employee.id.clone();
                updated.employee_name = employee.name.clone();
                updated.role = employee.role.clone();
            }
            moved = Some(updated.clone());
            updated
        })
        .collect();

    if employee.is_none() {
        log::warn!(
            "move {shift_id}: employee '{new_employee_id}' not on roster, only the day changed"
        );
    }

    let shift = moved.ok_or_else(|| PlanError::not_found("shift", shift_id))?;
    Ok(Move {
        schedule: Schedule::with_shifts(shifts, roster, model),
        shift,
        employee_resolved: employee.is_some(),
    })
}

/// Drop every shift of `employee_id` on `day`. Other shifts are
/// untouched. Returns the new schedule and the removed shifts.
pub fn remove_shifts_for(
    schedule: &Schedule,
    roster: &Roster,
    employee_id: &str,
    day: Day,
    model: CostModel,
) -> (Schedule, Vec<Shift>) {
    let (removed, kept): (Vec<Shift>, Vec<Shift>) = schedule
        .shifts()
        .iter()
        .cloned()
        .partition(|s| s.employee_id == employee_id && s.day == day);
    (Schedule::with_shifts(kept, roster, model), removed)
}
