//! Roster/forecast collaborators.
//!
//! The engine does not care where data came from. Upstream shapes are
//! normalized here (see `roster::RawEmployee`) before anything else
//! sees them, and a failing source can be backed by demo data.

use crate::{
    error::{PlanError, PlanResult},
    rng::{RngStream, SeededRng},
    roster::{
        normalize_forecast, normalize_roster, validate_forecast, Employee, ForecastEntry,
        RawEmployee, RawForecastEntry, RosterDefaults, TimeWindow,
    },
    types::Day,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait RosterSource {
    fn name(&self) -> &'static str;
    fn employees(&self) -> PlanResult<Vec<Employee>>;
    fn forecast(&self) -> PlanResult<Vec<ForecastEntry>>;
}

// ── JSON files ───────────────────────────────────────────────────────

/// Reads upstream-shaped JSON from `roster/employees.json` and
/// `forecast/labor.json` under a data directory.
pub struct JsonFileSource {
    data_dir: PathBuf,
    defaults: RosterDefaults,
}

impl JsonFileSource {
    pub fn new(data_dir: impl Into<PathBuf>, defaults: RosterDefaults) -> Self {
        Self { data_dir: data_dir.into(), defaults }
    }

    fn read<T: DeserializeOwned>(&self, collaborator: &'static str, rel: &str) -> PlanResult<T> {
        let path = self.data_dir.join(rel);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| PlanError::upstream(collaborator, format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| PlanError::upstream(collaborator, format!("cannot parse {}: {e}", path.display())))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl RosterSource for JsonFileSource {
    fn name(&self) -> &'static str {
        "json_file"
    }

    fn employees(&self) -> PlanResult<Vec<Employee>> {
        let raw: Vec<RawEmployee> = self.read("roster", "roster/employees.json")?;
        normalize_roster(raw, &self.defaults)
    }

    fn forecast(&self) -> PlanResult<Vec<ForecastEntry>> {
        let raw: Vec<RawForecastEntry> = self.read("forecast", "forecast/labor.json")?;
        normalize_forecast(raw)
    }
}

// ── Demo data ────────────────────────────────────────────────────────

const FIRST_NAMES: &[&str] = &[
    "Ava", "Ben", "Chloe", "Diego", "Elena", "Farah", "Gus", "Hana", "Ivan", "Jade",
    "Kofi", "Lena", "Marco", "Nia", "Omar", "Priya", "Quinn", "Rosa", "Sam", "Tariq",
];

const LAST_NAMES: &[&str] = &[
    "Alvarez", "Brooks", "Chen", "Dubois", "Ekwueme", "Fischer", "Garcia", "Haddad",
    "Ito", "Johansson", "Kowalski", "Lopez", "Moreau", "Nguyen", "Okafor", "Patel",
];

/// (role, base hourly rate)
const ROLES: &[(&str, f64)] = &[("cook", 16.0), ("cashier", 14.0), ("manager", 22.0)];

const SHIFT_PATTERNS: &[(u32, u32)] = &[(6, 14), (10, 18), (14, 22), (6, 22)];

const WEEK: [Day; 7] = [
    Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri, Day::Sat, Day::Sun,
];

/// Seeded demo roster and forecast. The same seed always yields the same
/// data.
#[derive(Debug, Clone)]
pub struct MockSource {
    seed: u64,
    headcount: usize,
}

impl MockSource {
    pub fn new(seed: u64) -> Self {
        Self { seed, headcount: 9 }
    }

    pub fn with_headcount(mut self, headcount: usize) -> Self {
        self.headcount = headcount;
        self
    }
}

impl RosterSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn employees(&self) -> PlanResult<Vec<Employee>> {
        let mut names = SeededRng::new(self.seed, RngStream::Roster);
        let mut avail = SeededRng::new(self.seed, RngStream::Availability);
        let mut employees = Vec::with_capacity(self.headcount);
        for i in 0..self.headcount {
            // Cycle roles so every role is staffed.
            let (role, base_rate) = ROLES[i % ROLES.len()];
            let name = format!("{} {}", names.pick(FIRST_NAMES), names.pick(LAST_NAMES));
            let cents = names.range_inclusive(0, 300);
            let max_hours = f64::from(*names.pick(&[24u32, 32, 40]));

            let mut availability = HashMap::new();
            for day in WEEK {
                if avail.chance(0.75) {
                    let (start, end) = *avail.pick(SHIFT_PATTERNS);
                    availability.insert(day, vec![TimeWindow::hours(start, end)?]);
                }
            }

            employees.push(Employee {
                id: format!("emp-{}", i + 1),
                name,
                role: role.to_string(),
                max_hours_per_week: max_hours,
                availability,
                hourly_rate: base_rate + f64::from(cents) / 100.0,
            });
        }
        Ok(employees)
    }

    fn forecast(&self) -> PlanResult<Vec<ForecastEntry>> {
        let mut rng = SeededRng::new(self.seed, RngStream::Forecast);
        let mut entries = Vec::new();
        for day in WEEK {
            let weekend = matches!(day, Day::Sat | Day::Sun);
            let rush: u32 = if weekend { 1 } else { 0 };
            for (start, end, role, lo, hi) in [
                (7, 11, "cook", 1, 1),
                (11, 15, "cook", 1, 2),
                (17, 21, "cook", 1, 2),
                (7, 11, "cashier", 1, 1),
                (11, 15, "cashier", 1, 2),
                (17, 21, "cashier", 1, 1),
                (8, 20, "manager", 1, 1),
            ] {
                let extra = if role == "manager" { 0 } else { rush };
                entries.push(ForecastEntry {
                    day,
                    window: TimeWindow::hours(start, end)?,
                    role: role.to_string(),
                    required_staff: rng.range_inclusive(lo, hi) + extra,
                });
            }
        }
        validate_forecast(&entries)?;
        Ok(entries)
    }
}

// ── Fallback ─────────────────────────────────────────────────────────

/// Uses `primary` and transparently switches to `fallback` when the
/// primary fails.
pub struct FallbackSource {
    primary: Box<dyn RosterSource>,
    fallback: Box<dyn RosterSource>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn RosterSource>, fallback: Box<dyn RosterSource>) -> Self {
        Self { primary, fallback }
    }
}

impl RosterSource for FallbackSource {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn employees(&self) -> PlanResult<Vec<Employee>> {
        self.primary.employees().or_else(|e| {
            log::warn!(
                "roster from {} failed ({e}); falling back to {}",
                self.primary.name(),
                self.fallback.name()
            );
            self.fallback.employees()
        })
    }

    fn forecast(&self) -> PlanResult<Vec<ForecastEntry>> {
        self.primary.forecast().or_else(|e| {
            log::warn!(
                "forecast from {} failed ({e}); falling back to {}",
                self.primary.name(),
                self.fallback.name()
            );
            self.fallback.forecast()
        })
    }
}
