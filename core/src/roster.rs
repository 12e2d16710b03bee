//! Roster and demand model, the per-cycle input to generation.
//!
//! Upstream data arrives in a loose wire shape (`RawEmployee`,
//! `RawForecastEntry`). It is normalized and validated here, at the
//! boundary, so the engine only ever sees strict `Employee` and
//! `ForecastEntry` values.

use crate::{
    error::{PlanError, PlanResult},
    types::{Day, EmployeeId},
};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Serde adapter for `"HH:MM"` time-of-day strings.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

pub fn parse_time(raw: &str) -> PlanResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| PlanError::InvalidInput(format!("bad time '{raw}': {e}")))
}

/// Accepts "Mon", "monday", "MON" and so on.
pub fn parse_day(raw: &str) -> PlanResult<Day> {
    raw.trim()
        .parse::<Day>()
        .map_err(|_| PlanError::InvalidInput(format!("unknown day '{raw}'")))
}

/// A same-day interval `[start, end)`. Overnight windows are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> PlanResult<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    /// Whole-hour window, e.g. `TimeWindow::hours(9, 17)`.
    pub fn hours(start: u32, end: u32) -> PlanResult<Self> {
        let at = |h: u32| {
            NaiveTime::from_hms_opt(h, 0, 0)
                .ok_or_else(|| PlanError::InvalidInput(format!("hour {h} out of range")))
        };
        Self::new(at(start)?, at(end)?)
    }

    /// Parse `"09:00-17:00"`.
    pub fn parse(raw: &str) -> PlanResult<Self> {
        let (start, end) = raw
            .split_once('-')
            .ok_or_else(|| PlanError::InvalidInput(format!("bad window '{raw}'")))?;
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn validate(&self) -> PlanResult<()> {
        if self.end <= self.start {
            return Err(PlanError::InvalidInput(format!(
                "window {self} must end after it starts"
            )));
        }
        Ok(())
    }

    pub fn minutes(&self) -> u32 {
        let secs = self.end.num_seconds_from_midnight() - self.start.num_seconds_from_midnight();
        secs / 60
    }

    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: String,
    pub max_hours_per_week: f64,
    /// A day with no windows means the employee cannot work that day.
    #[serde(default)]
    pub availability: HashMap<Day, Vec<TimeWindow>>,
    pub hourly_rate: f64,
}

impl Employee {
    pub fn is_available(&self, day: Day, slot: &TimeWindow) -> bool {
        self.availability
            .get(&day)
            .is_some_and(|windows| windows.iter().any(|w| w.covers(slot)))
    }

    pub fn max_minutes(&self) -> f64 {
        self.max_hours_per_week * 60.0
    }

    fn validate(&self) -> PlanResult<()> {
        if self.id.trim().is_empty() {
            return Err(PlanError::InvalidInput("employee with empty id".into()));
        }
        if self.max_hours_per_week.is_nan() || self.max_hours_per_week < 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "employee {}: max hours must be non-negative",
                self.id
            )));
        }
        if self.hourly_rate.is_nan() || self.hourly_rate < 0.0 {
            return Err(PlanError::InvalidInput(format!(
                "employee {}: hourly rate must be non-negative",
                self.id
            )));
        }
        for window in self.availability.values().flatten() {
            window.validate()?;
        }
        Ok(())
    }
}

/// One line of labor demand: `required_staff` people of `role` for the
/// whole of `window` on `day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastEntry {
    pub day: Day,
    #[serde(flatten)]
    pub window: TimeWindow,
    pub role: String,
    pub required_staff: u32,
}

/// Upper bound on the headcount of a single forecast line.
pub const MAX_REQUIRED_STAFF: u32 = 10_000;

impl ForecastEntry {
    pub fn validate(&self) -> PlanResult<()> {
        if self.required_staff > MAX_REQUIRED_STAFF {
            return Err(PlanError::InvalidInput(format!(
                "forecast entry on {} {} {} asks for {} staff, limit is {MAX_REQUIRED_STAFF}",
                self.day, self.window, self.role, self.required_staff
            )));
        }
        if self.role.trim().is_empty() {
            return Err(PlanError::InvalidInput(format!(
                "forecast entry on {} {} has no role",
                self.day, self.window
            )));
        }
        self.window.validate()
    }
}

pub fn validate_forecast(entries: &[ForecastEntry]) -> PlanResult<()> {
    entries.iter().try_for_each(ForecastEntry::validate)
}

/// Read-only, id-indexed view over the employees of one cycle.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    employees: Vec<Employee>,
    index: HashMap<EmployeeId, usize>,
}

impl Roster {
    /// Validates every employee and rejects duplicate ids.
    /// Employees are kept in id order.
    pub fn new(mut employees: Vec<Employee>) -> PlanResult<Self> {
        employees.sort_by(|a, b| a.id.cmp(&b.id));
        let mut index = HashMap::with_capacity(employees.len());
        for (i, employee) in employees.iter().enumerate() {
            employee.validate()?;
            if index.insert(employee.id.clone(), i).is_some() {
                return Err(PlanError::InvalidInput(format!(
                    "duplicate employee id '{}'",
                    employee.id
                )));
            }
        }
        Ok(Self { employees, index })
    }

    pub fn get(&self, id: &str) -> Option<&Employee> {
        self.index.get(id).map(|&i| &self.employees[i])
    }

    pub fn hourly_rate(&self, id: &str) -> Option<f64> {
        self.get(id).map(|e| e.hourly_rate)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}

// ── Upstream wire shapes ────────────────────────────────────────────

/// Fallbacks applied when upstream omits (or zeroes) a field.
#[derive(Debug, Clone, Copy)]
pub struct RosterDefaults {
    pub max_hours: f64,
    pub hourly_rate: f64,
}

impl Default for RosterDefaults {
    fn default() -> Self {
        Self { max_hours: 40.0, hourly_rate: 15.0 }
    }
}

/// Employee as the roster API delivers it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmployee {
    pub id: String,
    pub full_name: String,
    pub job_title: String,
    #[serde(default)]
    pub weekly_limit: Option<f64>,
    /// Day name to `"HH:MM-HH:MM"` windows.
    #[serde(default)]
    pub availability: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub rate: Option<f64>,
}

impl RawEmployee {
    pub fn normalize(self, defaults: &RosterDefaults) -> PlanResult<Employee> {
        let mut availability: HashMap<Day, Vec<TimeWindow>> = HashMap::new();
        for (day, windows) in &self.availability {
            let day = parse_day(day)?;
            for window in windows {
                availability.entry(day).or_default().push(TimeWindow::parse(window)?);
            }
        }
        // Zero is treated like a missing value, as upstream does.
        let non_zero = |v: Option<f64>| v.filter(|x| *x != 0.0);
        let employee = Employee {
            id: self.id,
            name: self.full_name,
            role: self.job_title,
            max_hours_per_week: non_zero(self.weekly_limit).unwrap_or(defaults.max_hours),
            availability,
            hourly_rate: non_zero(self.rate).unwrap_or(defaults.hourly_rate),
        };
        employee.validate()?;
        Ok(employee)
    }
}

/// Forecast line as the labor-forecast API delivers it. Demand is either
/// a headcount or a labor-hour target spread over the window.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawForecastEntry {
    pub day: String,
    pub start: String,
    pub end: String,
    pub role: String,
    #[serde(default)]
    pub required_staff: Option<u32>,
    #[serde(default)]
    pub labor_hours: Option<f64>,
}

impl RawForecastEntry {
    pub fn normalize(self) -> PlanResult<ForecastEntry> {
        let window = TimeWindow::new(parse_time(&self.start)?, parse_time(&self.end)?)?;
        let required_staff = match (self.required_staff, self.labor_hours) {
            (Some(n), _) => n,
            (None, Some(hours)) if !hours.is_finite() || hours < 0.0 => {
                return Err(PlanError::InvalidInput(format!(
                    "forecast entry {} {} {}: laborHours must be a finite non-negative number, got {hours}",
                    self.day, window, self.role
                )))
            }
            (None, Some(hours)) => {
                let headcount = (hours * 60.0 / f64::from(window.minutes())).ceil();
                if headcount > f64::from(MAX_REQUIRED_STAFF) {
                    return Err(PlanError::InvalidInput(format!(
                        "forecast entry {} {} {}: {hours} labor hours exceeds the staffing limit",
                        self.day, window, self.role
                    )));
                }
                headcount as u32
            }
            _ => {
                return Err(PlanError::InvalidInput(format!(
                    "forecast entry {} {} {} has neither requiredStaff nor laborHours",
                    self.day, window, self.role
                )))
            }
        };
        let entry = ForecastEntry {
            day: parse_day(&self.day)?,
            window,
            role: self.role,
            required_staff,
        };
        entry.validate()?;
        Ok(entry)
    }
}

pub fn normalize_roster(raw: Vec<RawEmployee>, defaults: &RosterDefaults) -> PlanResult<Vec<Employee>> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|r| {
            if !seen.insert(r.id.clone()) {
                return Err(PlanError::InvalidInput(format!("duplicate employee id '{}'", r.id)));
            }
            r.normalize(defaults)
        })
        .collect()
}

pub fn normalize_forecast(raw: Vec<RawForecastEntry>) -> PlanResult<Vec<ForecastEntry>> {
    raw.into_iter().map(RawForecastEntry::normalize).collect()
}
