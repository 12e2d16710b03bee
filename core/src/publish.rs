//! Publish collaborator contract.

use crate::{
    error::PlanResult,
    schedule::Schedule,
    store::SessionStore,
    types::SessionId,
};
use serde::Serialize;
use std::rc::Rc;

pub trait Publisher {
    /// Hand a finished schedule to whoever serves it to employees.
    fn publish(&mut self, schedule: &Schedule) -> PlanResult<()>;
}

/// What happened when the session tried to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published,
    /// Publish succeeded but the broadcast did not go out.
    PublishedWithoutBroadcast(String),
    /// Nothing was broadcast.
    Failed(String),
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Keeps every published schedule as a numbered version in the store.
pub struct StorePublisher {
    store: Rc<SessionStore>,
    session_id: SessionId,
}

impl StorePublisher {
    pub fn new(store: Rc<SessionStore>, session_id: SessionId) -> Self {
        Self { store, session_id }
    }
}

impl Publisher for StorePublisher {
    fn publish(&mut self, schedule: &Schedule) -> PlanResult<()> {
        let json = serde_json::to_string(schedule)?;
        let version = self.store.save_published_schedule(
            &self.session_id,
            schedule.len(),
            schedule.total_labor_cost(),
            &json,
        )?;
        log::debug!("publish: stored schedule version {version}");
        Ok(())
    }
}
