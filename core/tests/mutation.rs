//! Shift mutation tests.
//!
//! Tests cover: moving to a known employee, the fail-soft fallback for an
//! unknown employee, strict rejection, unknown shifts, value semantics,
//! and cost recomputation from the current roster.

use chrono::Weekday;
use shiftplan_core::{
    config::PlannerConfig,
    engine::{generate, GenerationOptions},
    error::PlanError,
    mutation::{move_shift, remove_shifts_for, MovePolicy},
    roster::{Employee, ForecastEntry, Roster, TimeWindow},
    schedule::{CostModel, Schedule},
    session::PlanningSession,
    store::SessionStore,
};
use std::collections::HashMap;

fn employee(id: &str, name: &str, role: &str, rate: f64) -> Employee {
    let week = [
        Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri,
    ];
    let availability: HashMap<_, _> = week
        .into_iter()
        .map(|d| (d, vec![TimeWindow::hours(9, 17).unwrap()]))
        .collect();
    Employee {
        id: id.into(),
        name: name.into(),
        role: role.into(),
        max_hours_per_week: 40.0,
        availability,
        hourly_rate: rate,
    }
}

fn roster() -> Roster {
    Roster::new(vec![
        employee("e1", "Ada Quinn", "cook", 15.0),
        employee("e3", "Cy Ortega", "cashier", 12.5),
    ])
    .unwrap()
}

fn monday_cook() -> Vec<ForecastEntry> {
    vec![ForecastEntry {
        day: Weekday::Mon,
        window: TimeWindow::hours(9, 17).unwrap(),
        role: "cook".into(),
        required_staff: 1,
    }]
}

fn base_schedule(roster: &Roster) -> Schedule {
    generate(roster, &monday_cook(), &GenerationOptions::default()).schedule
}

/// Moving to an unknown employee changes only the day; the shift keeps
/// e1's identity and the cost is unchanged.
#[test]
fn unknown_employee_falls_back_to_day_only_move() {
    let roster = roster();
    let schedule = base_schedule(&roster);

    let moved = move_shift(
        &schedule, &roster, "shf-0001", Weekday::Tue, "e2",
        MovePolicy::FailSoft, CostModel::WholeHours,
    )
    .unwrap();

    assert!(!moved.employee_resolved);
    assert_eq!(moved.shift.day, Weekday::Tue);
    assert_eq!(moved.shift.employee_id, "e1");
    assert_eq!(moved.shift.employee_name, "Ada Quinn");
    assert_eq!(moved.shift.role, "cook");
    assert_eq!(moved.shift.window(), TimeWindow::hours(9, 17).unwrap());
    assert_eq!(moved.schedule.total_labor_cost(), 120.0);
}

/// Moving to a known employee copies their name and role and reprices
/// the shift at their rate.
#[test]
fn known_employee_takes_over_shift() {
    let roster = roster();
    let schedule = base_schedule(&roster);

    let moved = move_shift(
        &schedule, &roster, "shf-0001", Weekday::Wed, "e3",
        MovePolicy::FailSoft, CostModel::WholeHours,
    )
    .unwrap();

    assert!(moved.employee_resolved);
    let shift = moved.schedule.shift("shf-0001").unwrap();
    assert_eq!(shift.employee_id, "e3");
    assert_eq!(shift.employee_name, "Cy Ortega");
    assert_eq!(shift.role, "cashier");
    assert_eq!(shift.day, Weekday::Wed);
    assert_eq!(moved.schedule.total_labor_cost(), 100.0);
}

/// The input schedule is a value: a move never edits it.
#[test]
fn move_leaves_input_schedule_untouched() {
    let roster = roster();
    let schedule = base_schedule(&roster);
    let before = schedule.clone();

    let _ = move_shift(
        &schedule, &roster, "shf-0001", Weekday::Fri, "e3",
        MovePolicy::FailSoft, CostModel::WholeHours,
    )
    .unwrap();

    assert_eq!(schedule, before);
}

/// Moving a shift to its own day and employee is a no-op.
#[test]
fn move_to_same_day_and_employee_is_idempotent() {
    let roster = roster();
    let schedule = base_schedule(&roster);

    let moved = move_shift(
        &schedule, &roster, "shf-0001", Weekday::Mon, "e1",
        MovePolicy::FailSoft, CostModel::WholeHours,
    )
    .unwrap();

    assert_eq!(moved.schedule, schedule);
}

/// Rates are read at mutation time, not carried over from generation.
#[test]
fn cost_uses_current_roster_rates() {
    let schedule = base_schedule(&roster());
    let repriced = Roster::new(vec![employee("e1", "Ada Quinn", "cook", 20.0)]).unwrap();

    let moved = move_shift(
        &schedule, &repriced, "shf-0001", Weekday::Mon, "e1",
        MovePolicy::FailSoft, CostModel::WholeHours,
    )
    .unwrap();

    assert_eq!(moved.schedule.total_labor_cost(), 160.0);
    assert!(moved.schedule.cost_is_consistent(&repriced, CostModel::WholeHours));
}

/// Strict mode rejects an unknown employee outright.
#[test]
fn strict_policy_rejects_unknown_employee() {
    let roster = roster();
    let schedule = base_schedule(&roster);

    let err = move_shift(
        &schedule, &roster, "shf-0001", Weekday::Tue, "e2",
        MovePolicy::Strict, CostModel::WholeHours,
    )
    .unwrap_err();

    assert!(matches!(err, PlanError::NotFound { kind: "employee", .. }), "got {err:?}");
}

/// An unknown shift id is reported, not ignored.
#[test]
fn unknown_shift_is_not_found() {
    let roster = roster();
    let schedule = base_schedule(&roster);

    let err = move_shift(
        &schedule, &roster, "shf-9999", Weekday::Tue, "e1",
        MovePolicy::FailSoft, CostModel::WholeHours,
    )
    .unwrap_err();

    assert!(matches!(err, PlanError::NotFound { kind: "shift", .. }), "got {err:?}");
}

/// Removing an employee's day leaves every other shift alone.
#[test]
fn remove_shifts_for_only_touches_that_employee_and_day() {
    let roster = roster();
    let mut forecast = monday_cook();
    forecast.push(ForecastEntry {
        day: Weekday::Tue,
        window: TimeWindow::hours(9, 12).unwrap(),
        role: "cook".into(),
        required_staff: 1,
    });
    forecast.push(ForecastEntry {
        day: Weekday::Mon,
        window: TimeWindow::hours(9, 12).unwrap(),
        role: "cashier".into(),
        required_staff: 1,
    });
    let schedule = generate(&roster, &forecast, &GenerationOptions::default()).schedule;
    assert_eq!(schedule.len(), 3);

    let (next, removed) = remove_shifts_for(&schedule, &roster, "e1", Weekday::Mon, CostModel::WholeHours);

    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].day, Weekday::Mon);
    assert_eq!(next.len(), 2);
    assert!(next.shifts_for("e1", Weekday::Mon).next().is_none());
    assert!(next.shifts_for("e1", Weekday::Tue).next().is_some());
    assert!(next.shifts_for("e3", Weekday::Mon).next().is_some());
    // 3h cook at 15 + 3h cashier at 12.5
    assert_eq!(next.total_labor_cost(), 82.5);
}

/// Session-level move under strict config leaves the live schedule as
/// it was.
#[test]
fn strict_session_move_keeps_schedule() {
    let config = PlannerConfig { move_policy: MovePolicy::Strict, ..PlannerConfig::default_test() };
    let mut session =
        PlanningSession::build("strict".into(), config, SessionStore::in_memory().unwrap()).unwrap();
    session
        .load(roster().employees().to_vec(), monday_cook())
        .unwrap();
    session.generate().unwrap();
    let before = session.schedule().cloned();

    assert!(session.move_shift("shf-0001", Weekday::Tue, "e2").is_err());
    assert_eq!(session.schedule().cloned(), before);
    assert_eq!(session.event_count("shift_moved").unwrap(), 0);
}

/// A move before anything was generated fails cleanly.
#[test]
fn move_without_schedule_is_not_found() {
    let mut session = PlanningSession::build_test("empty".into()).unwrap();
    let err = session.move_shift("shf-0001", Weekday::Tue, "e1").unwrap_err();
    assert!(matches!(err, PlanError::NotFound { kind: "schedule", .. }));
}
