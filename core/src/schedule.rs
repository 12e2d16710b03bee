//! Shifts, schedules and labor cost.
//!
//! INVARIANT: `Schedule::total_labor_cost` always equals `labor_cost`
//! over its shifts. The only way to build a schedule is
//! `Schedule::with_shifts`, which computes the cost from scratch.

use crate::{
    roster::{hhmm, Roster, TimeWindow},
    types::{Day, EmployeeId, ShiftId},
};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a shift's duration is turned into billable hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    /// Hour component of the end time minus hour component of the start
    /// time. 09:30-17:00 bills 8 hours, 09:00-09:45 bills 0.
    #[default]
    WholeHours,
    /// Real elapsed duration.
    ExactMinutes,
}

impl CostModel {
    pub fn billable_hours(&self, start: NaiveTime, end: NaiveTime) -> f64 {
        match self {
            Self::WholeHours => (i64::from(end.hour()) - i64::from(start.hour())) as f64,
            Self::ExactMinutes => (end - start).num_minutes() as f64 / 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub employee_id: EmployeeId,
    /// Display copy of the employee's name at the last mutation.
    pub employee_name: String,
    /// Display copy of the employee's role at the last mutation.
    pub role: String,
    pub day: Day,
    #[serde(rename = "startTime", with = "hhmm")]
    pub start: NaiveTime,
    #[serde(rename = "endTime", with = "hhmm")]
    pub end: NaiveTime,
}

impl Shift {
    pub fn window(&self) -> TimeWindow {
        TimeWindow { start: self.start, end: self.end }
    }

    pub fn minutes(&self) -> u32 {
        self.window().minutes()
    }
}

/// Sum of `billable_hours × hourly_rate` over `shifts`, in order, with the
/// rate looked up fresh from `roster`. Shifts whose employee is not on
/// the roster contribute nothing.
pub fn labor_cost(shifts: &[Shift], roster: &Roster, model: CostModel) -> f64 {
    shifts.iter().fold(0.0, |total, shift| match roster.hourly_rate(&shift.employee_id) {
        Some(rate) => total + model.billable_hours(shift.start, shift.end) * rate,
        None => total,
    })
}

/// Serialize-only. Build one through `with_shifts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    shifts: Vec<Shift>,
    total_labor_cost: f64,
}

impl Schedule {
    pub fn with_shifts(shifts: Vec<Shift>, roster: &Roster, model: CostModel) -> Self {
        let total_labor_cost = labor_cost(&shifts, roster, model);
        Self { shifts, total_labor_cost }
    }

    pub fn empty() -> Self {
        Self { shifts: Vec::new(), total_labor_cost: 0.0 }
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn into_shifts(self) -> Vec<Shift> {
        self.shifts
    }

    pub fn total_labor_cost(&self) -> f64 {
        self.total_labor_cost
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn shift(&self, id: &str) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.id == id)
    }

    pub fn shifts_for<'a>(
        &'a self,
        employee_id: &'a str,
        day: Day,
    ) -> impl Iterator<Item = &'a Shift> + 'a {
        self.shifts
            .iter()
            .filter(move |s| s.employee_id == employee_id && s.day == day)
    }

    /// Scheduled minutes per employee id.
    pub fn minutes_by_employee(&self) -> BTreeMap<EmployeeId, u32> {
        let mut totals = BTreeMap::new();
        for shift in &self.shifts {
            *totals.entry(shift.employee_id.clone()).or_insert(0) += shift.minutes();
        }
        totals
    }

    /// True when the stored cost matches a fresh recomputation.
    pub fn cost_is_consistent(&self, roster: &Roster, model: CostModel) -> bool {
        labor_cost(&self.shifts, roster, model) == self.total_labor_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn whole_hours_drops_minutes() {
        let model = CostModel::WholeHours;
        assert_eq!(model.billable_hours(at(9, 30), at(17, 0)), 8.0);
        assert_eq!(model.billable_hours(at(9, 0), at(9, 45)), 0.0);
        assert_eq!(model.billable_hours(at(9, 0), at(17, 59)), 8.0);
    }

    #[test]
    fn exact_minutes_keeps_fractions() {
        let model = CostModel::ExactMinutes;
        assert_eq!(model.billable_hours(at(9, 30), at(17, 0)), 7.5);
        assert_eq!(model.billable_hours(at(9, 0), at(9, 45)), 0.75);
    }

    #[test]
    fn shift_serializes_with_contract_field_names() {
        let shift = Shift {
            id: "shf-0001".into(),
            employee_id: "e1".into(),
            employee_name: "Ada".into(),
            role: "cook".into(),
            day: chrono::Weekday::Mon,
            start: at(9, 0),
            end: at(17, 0),
        };
        let json = serde_json::to_value(&shift).unwrap();
        assert_eq!(json["employeeId"], "e1");
        assert_eq!(json["day"], "Mon");
        assert_eq!(json["startTime"], "09:00");
        assert_eq!(json["endTime"], "17:00");
    }
}
