use crate::{
    engine::GenerationOptions,
    error::{PlanError, PlanResult},
    mutation::MovePolicy,
    roster::RosterDefaults,
    schedule::CostModel,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Planner settings, read from `planner.json` in the data directory.
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Granularity of coverage slots.
    pub slot_minutes: u32,
    pub cost_model: CostModel,
    pub move_policy: MovePolicy,
    /// Cosmetic pause before generation. Never changes the result.
    pub simulated_latency_ms: u64,
    /// Applied when upstream omits an employee's weekly limit.
    pub default_max_hours: f64,
    /// Applied when upstream omits an employee's rate.
    pub default_hourly_rate: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 60,
            cost_model: CostModel::WholeHours,
            move_policy: MovePolicy::FailSoft,
            simulated_latency_ms: 0,
            default_max_hours: 40.0,
            default_hourly_rate: 15.0,
        }
    }
}

impl PlannerConfig {
    /// Load from the data/ directory.
    /// In tests, use PlannerConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/planner.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PlannerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> PlanResult<()> {
        if !(1..=1440).contains(&self.slot_minutes) {
            return Err(PlanError::InvalidInput(format!(
                "slot_minutes must be within 1..=1440, got {}",
                self.slot_minutes
            )));
        }
        if self.default_max_hours < 0.0 || self.default_hourly_rate < 0.0 {
            return Err(PlanError::InvalidInput(
                "roster defaults must be non-negative".into(),
            ));
        }
        Ok(())
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            slot_minutes: self.slot_minutes,
            cost_model: self.cost_model,
        }
    }

    pub fn roster_defaults(&self) -> RosterDefaults {
        RosterDefaults {
            max_hours: self.default_max_hours,
            hourly_rate: self.default_hourly_rate,
        }
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}
