//! The scheduling engine: (roster, forecast) → schedule.
//!
//! ALGORITHM (greedy, deterministic, not optimal):
//!   1. Cut every forecast window into slots of `slot_minutes`.
//!      Identical (day, slot, role) demand from several entries adds up.
//!   2. Visit slots earliest day/time first, larger headcount first.
//!   3. Fill each seat with the eligible employee that has the fewest
//!      minutes so far, then the lowest rate, then the lowest id.
//!      Eligible = same role, availability covers the slot, cap not
//!      exceeded, not already working an overlapping slot.
//!   4. Seats nobody can take become coverage gaps.
//!   5. Back-to-back slots of one employee on one day merge into a shift.
//!
//! RULES:
//!   - No clock, no RNG, no I/O. Same inputs, same schedule.
//!   - An unfillable slot is never an error.

use crate::{
    roster::{Employee, ForecastEntry, Roster, TimeWindow},
    schedule::{CostModel, Schedule, Shift},
    types::{Day, EmployeeId},
};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    pub slot_minutes: u32,
    pub cost_model: CostModel,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { slot_minutes: 60, cost_model: CostModel::WholeHours }
    }
}

/// Demand the engine could not staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageGap {
    pub day: Day,
    #[serde(flatten)]
    pub window: TimeWindow,
    pub role: String,
    pub required: u32,
    pub filled: u32,
}

impl CoverageGap {
    pub fn shortfall(&self) -> u32 {
        self.required - self.filled
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub schedule: Schedule,
    pub gaps: Vec<CoverageGap>,
}

impl Generation {
    pub fn is_fully_covered(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// A discrete unit of required coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub day: Day,
    pub window: TimeWindow,
    pub role: String,
    pub required: u32,
}

fn minute_of(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

fn time_at(minute: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(minute * 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Expand forecast entries into slots, in visiting order.
pub fn expand_slots(forecast: &[ForecastEntry], slot_minutes: u32) -> Vec<Slot> {
    let step = slot_minutes.max(1);
    let mut demand: BTreeMap<(u32, NaiveTime, NaiveTime, &str), (Day, u32)> = BTreeMap::new();
    for entry in forecast.iter().filter(|e| e.required_staff > 0) {
        let end = minute_of(entry.window.end);
        let mut cursor = minute_of(entry.window.start);
        while cursor < end {
            let next = (cursor + step).min(end);
            let key = (
                entry.day.num_days_from_monday(),
                time_at(cursor),
                time_at(next),
                entry.role.as_str(),
            );
            let staff = &mut demand.entry(key).or_insert((entry.day, 0)).1;
            *staff = staff.saturating_add(entry.required_staff);
            cursor = next;
        }
    }

    let mut slots: Vec<Slot> = demand
        .into_iter()
        .map(|((_, start, end, role), (day, required))| Slot {
            day,
            window: TimeWindow { start, end },
            role: role.to_string(),
            required,
        })
        .collect();
    slots.sort_by(|a, b| {
        (a.day.num_days_from_monday(), a.window.start, Reverse(a.required), &a.role)
            .cmp(&(b.day.num_days_from_monday(), b.window.start, Reverse(b.required), &b.role))
    });
    slots
}

/// Per-employee running totals while slots are being handed out.
#[derive(Default)]
struct Ledger<'a> {
    minutes: HashMap<&'a str, u32>,
    busy: HashMap<(&'a str, Day), Vec<TimeWindow>>,
}

impl<'a> Ledger<'a> {
    fn minutes(&self, id: &str) -> u32 {
        self.minutes.get(id).copied().unwrap_or(0)
    }

    fn is_free(&self, id: &str, day: Day, window: &TimeWindow) -> bool {
        self.busy
            .get(&(id, day))
            .is_none_or(|taken| taken.iter().all(|w| !w.overlaps(window)))
    }

    fn eligible(&self, employee: &Employee, slot: &Slot) -> bool {
        employee.role == slot.role
            && employee.is_available(slot.day, &slot.window)
            && f64::from(self.minutes(&employee.id) + slot.window.minutes()) <= employee.max_minutes()
            && self.is_free(&employee.id, slot.day, &slot.window)
    }

    fn book(&mut self, id: &'a str, day: Day, window: TimeWindow) {
        *self.minutes.entry(id).or_insert(0) += window.minutes();
        self.busy.entry((id, day)).or_default().push(window);
    }
}

pub fn generate(roster: &Roster, forecast: &[ForecastEntry], options: &GenerationOptions) -> Generation {
    let slots = expand_slots(forecast, options.slot_minutes);
    let mut ledger = Ledger::default();
    let mut booked: BTreeMap<(EmployeeId, u32), (Day, Vec<TimeWindow>)> = BTreeMap::new();
    let mut raw_gaps = Vec::new();

    for slot in &slots {
        let mut filled = 0;
        while filled < slot.required {
            let pick = roster
                .employees()
                .iter()
                .filter(|e| ledger.eligible(e, slot))
                .min_by(|a, b| {
                    ledger
                        .minutes(&a.id)
                        .cmp(&ledger.minutes(&b.id))
                        .then(a.hourly_rate.total_cmp(&b.hourly_rate))
                        .then(a.id.cmp(&b.id))
                });
            let Some(employee) = pick else { break };
            ledger.book(&employee.id, slot.day, slot.window);
            booked
                .entry((employee.id.clone(), slot.day.num_days_from_monday()))
                .or_insert_with(|| (slot.day, Vec::new()))
                .1
                .push(slot.window);
            filled += 1;
        }
        if filled < slot.required {
            raw_gaps.push(CoverageGap {
                day: slot.day,
                window: slot.window,
                role: slot.role.clone(),
                required: slot.required,
                filled,
            });
        }
    }

    let shifts = merge_into_shifts(roster, booked);
    let gaps = merge_gaps(raw_gaps);
    let schedule = Schedule::with_shifts(shifts, roster, options.cost_model);

    log::info!(
        "generate: {} slots -> {} shifts, labor cost {:.2}, {} coverage gaps",
        slots.len(),
        schedule.len(),
        schedule.total_labor_cost(),
        gaps.len(),
    );
    for gap in &gaps {
        log::debug!(
            "coverage gap: {} {} {} short {} of {}",
            gap.day,
            gap.window,
            gap.role,
            gap.shortfall(),
            gap.required,
        );
    }

    Generation { schedule, gaps }
}

fn merge_into_shifts(
    roster: &Roster,
    booked: BTreeMap<(EmployeeId, u32), (Day, Vec<TimeWindow>)>,
) -> Vec<Shift> {
    let mut merged: Vec<(Day, TimeWindow, &Employee)> = Vec::new();
    for ((employee_id, _), (day, mut windows)) in booked {
        let Some(employee) = roster.get(&employee_id) else { continue };
        windows.sort_by_key(|w| w.start);
        let mut current: Option<TimeWindow> = None;
        for window in windows {
            current = match current {
                Some(open) if open.end == window.start => {
                    Some(TimeWindow { start: open.start, end: window.end })
                }
                Some(open) => {
                    merged.push((day, open, employee));
                    Some(window)
                }
                None => Some(window),
            };
        }
        if let Some(open) = current {
            merged.push((day, open, employee));
        }
    }

    merged.sort_by(|a, b| {
        (a.0.num_days_from_monday(), a.1.start, &a.2.id)
            .cmp(&(b.0.num_days_from_monday(), b.1.start, &b.2.id))
    });
    merged
        .into_iter()
        .enumerate()
        .map(|(i, (day, window, employee))| Shift {
            id: format!("shf-{:04}", i + 1),
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            role: employee.role.clone(),
            day,
            start: window.start,
            end: window.end,
        })
        .collect()
}

/// Collapse back-to-back gap slots with the same role and shortfall.
fn merge_gaps(mut gaps: Vec<CoverageGap>) -> Vec<CoverageGap> {
    gaps.sort_by(|a, b| {
        (a.day.num_days_from_monday(), &a.role, a.window.start)
            .cmp(&(b.day.num_days_from_monday(), &b.role, b.window.start))
    });
    let mut merged: Vec<CoverageGap> = Vec::with_capacity(gaps.len());
    for gap in gaps {
        match merged.last_mut() {
            Some(last)
                if last.day == gap.day
                    && last.role == gap.role
                    && last.required == gap.required
                    && last.filled == gap.filled
                    && last.window.end == gap.window.start =>
            {
                last.window.end = gap.window.end;
            }
            _ => merged.push(gap),
        }
    }
    merged.sort_by(|a, b| {
        (a.day.num_days_from_monday(), a.window.start, &a.role)
            .cmp(&(b.day.num_days_from_monday(), b.window.start, &b.role))
    });
    merged
}
