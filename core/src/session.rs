//! The planning session: one manager's view of roster, schedule and
//! requests. There is no global state: every operation goes through a
//! session value owned by the caller.
//!
//! RULES:
//!   - Single writer. Every mutating call takes `&mut self`, so calls
//!     are serialized; a second `generate` can never overlap the first.
//!   - A schedule is replaced as a whole value, never edited in place.
//!   - Collaborator failures (source, publisher, notifier) are caught
//!     here and reported; they never leave state half-updated.
//!   - Every state change is recorded in the event log.

use crate::{
    command::{CommandReply, ManagerCommand},
    config::PlannerConfig,
    engine::{self, CoverageGap, Generation},
    error::{PlanError, PlanResult},
    event::{EventLogEntry, SessionEvent},
    mutation::{self, Move},
    notification::{Delivery, Notifier, OutboxNotifier},
    publish::{PublishOutcome, Publisher, StorePublisher},
    request_desk::{RequestDesk, RequestType, ReviewOutcome, ShiftRequest},
    roster::{validate_forecast, Employee, ForecastEntry, Roster},
    schedule::{Schedule, Shift},
    source::RosterSource,
    store::SessionStore,
    types::{Day, Seq, SessionId},
};
use std::rc::Rc;

pub struct PlanningSession {
    pub session_id: SessionId,
    config:         PlannerConfig,
    roster:         Roster,
    forecast:       Vec<ForecastEntry>,
    schedule:       Option<Schedule>,
    gaps:           Vec<CoverageGap>,
    requests:       RequestDesk,
    seq:            Seq,
    store:          Rc<SessionStore>,
    notifier:       Box<dyn Notifier>,
    publisher:      Box<dyn Publisher>,
}

impl PlanningSession {
    pub fn new(
        session_id: SessionId,
        config: PlannerConfig,
        store: Rc<SessionStore>,
        notifier: Box<dyn Notifier>,
        publisher: Box<dyn Publisher>,
    ) -> PlanResult<Self> {
        config.validate()?;
        store.insert_session(&session_id, env!("CARGO_PKG_VERSION"))?;
        let mut session = Self {
            session_id: session_id.clone(),
            config,
            roster: Roster::default(),
            forecast: Vec::new(),
            schedule: None,
            gaps: Vec::new(),
            requests: RequestDesk::new(),
            seq: 0,
            store,
            notifier,
            publisher,
        };
        session.record(SessionEvent::SessionOpened { session_id });
        Ok(session)
    }

    /// Build a session wired to the store-backed publisher and outbox.
    pub fn build(session_id: SessionId, config: PlannerConfig, store: SessionStore) -> PlanResult<Self> {
        store.migrate()?;
        let store = Rc::new(store);
        let notifier = OutboxNotifier::new(Rc::clone(&store), session_id.clone());
        let publisher = StorePublisher::new(Rc::clone(&store), session_id.clone());
        Self::new(session_id, config, store, Box::new(notifier), Box::new(publisher))
    }

    /// In-memory session with test config.
    pub fn build_test(session_id: SessionId) -> PlanResult<Self> {
        Self::build(session_id, PlannerConfig::default_test(), SessionStore::in_memory()?)
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = publisher;
        self
    }

    // ── Inputs ───────────────────────────────────────────────────

    /// Replace roster and forecast for the next generation cycle.
    /// Invalid input leaves the session as it was.
    pub fn load(&mut self, employees: Vec<Employee>, forecast: Vec<ForecastEntry>) -> PlanResult<()> {
        let roster = Roster::new(employees)?;
        validate_forecast(&forecast)?;
        self.record(SessionEvent::RosterLoaded {
            employees: roster.len(),
            forecast_entries: forecast.len(),
        });
        log::info!(
            "session {}: loaded {} employees, {} forecast entries",
            self.session_id,
            roster.len(),
            forecast.len(),
        );
        self.roster = roster;
        self.forecast = forecast;
        Ok(())
    }

    pub fn load_from(&mut self, source: &dyn RosterSource) -> PlanResult<()> {
        let employees = source.employees()?;
        let forecast = source.forecast()?;
        self.load(employees, forecast)
    }

    // ── Generation ───────────────────────────────────────────────

    pub fn generate(&mut self) -> PlanResult<Generation> {
        let latency = self.config.simulated_latency();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        if self.roster.is_empty() {
            log::warn!("session {}: generating with an empty roster", self.session_id);
        }

        let generation = engine::generate(&self.roster, &self.forecast, &self.config.generation_options());

        self.record(SessionEvent::ScheduleGenerated {
            shifts: generation.schedule.len(),
            total_labor_cost: generation.schedule.total_labor_cost(),
            gaps: generation.gaps.len(),
        });
        for gap in &generation.gaps {
            self.record(SessionEvent::CoverageGapFound {
                day: gap.day,
                window: gap.window.to_string(),
                role: gap.role.clone(),
                shortfall: gap.shortfall(),
            });
        }

        self.schedule = Some(generation.schedule.clone());
        self.gaps = generation.gaps.clone();
        Ok(generation)
    }

    // ── Mutation ─────────────────────────────────────────────────

    pub fn move_shift(&mut self, shift_id: &str, new_day: Day, new_employee_id: &str) -> PlanResult<Move> {
        let current = self.current_schedule()?;
        let moved = mutation::move_shift(
            current,
            &self.roster,
            shift_id,
            new_day,
            new_employee_id,
            self.config.move_policy,
            self.config.cost_model,
        )?;

        if !moved.employee_resolved {
            self.record(SessionEvent::MoveFellBack {
                shift_id: shift_id.to_string(),
                unknown_employee_id: new_employee_id.to_string(),
            });
        }
        self.record(SessionEvent::ShiftMoved {
            shift_id: shift_id.to_string(),
            day: moved.shift.day,
            employee_id: moved.shift.employee_id.clone(),
            total_labor_cost: moved.schedule.total_labor_cost(),
        });

        self.schedule = Some(moved.schedule.clone());
        Ok(moved)
    }

    // ── Requests ─────────────────────────────────────────────────

    pub fn submit_request(
        &mut self,
        employee_id: &str,
        request_type: RequestType,
        day: Day,
    ) -> PlanResult<ShiftRequest> {
        let request = self.requests.submit(&self.roster, employee_id, request_type, day)?;
        self.record(SessionEvent::RequestSubmitted {
            request_id: request.id.clone(),
            employee_id: request.employee_id.clone(),
            request_type,
            day,
        });
        Ok(request)
    }

    /// Decide a request, record the decision, then notify the employee.
    /// The event log therefore shows the decision before any delivery.
    pub fn review_request(&mut self, request_id: &str, approve: bool) -> PlanResult<ReviewOutcome> {
        let decision = self.requests.decide(
            request_id,
            approve,
            &mut self.schedule,
            &self.roster,
            self.config.cost_model,
        )?;

        self.record(SessionEvent::RequestReviewed {
            request_id: decision.request.id.clone(),
            status: decision.request.status,
        });
        if decision.schedule_changed {
            let total_labor_cost = self.schedule.as_ref().map_or(0.0, Schedule::total_labor_cost);
            self.record(SessionEvent::ShiftsReconciled {
                request_id: decision.request.id.clone(),
                removed: decision.removed.iter().map(|s| s.id.clone()).collect(),
                total_labor_cost,
            });
        }

        let outcome = RequestDesk::notify(decision, self.notifier.as_mut());
        if let Delivery::Failed(reason) = &outcome.notification {
            self.record(SessionEvent::NotificationFailed {
                employee_id: Some(outcome.request.employee_id.clone()),
                reason: reason.clone(),
            });
        }
        Ok(outcome)
    }

    // ── Publishing ───────────────────────────────────────────────

    /// Publish the current schedule, then broadcast it. Nothing is
    /// broadcast unless publishing succeeded.
    pub fn publish(&mut self) -> PlanResult<PublishOutcome> {
        let schedule = self.current_schedule()?.clone();

        if let Err(e) = self.publisher.publish(&schedule) {
            log::error!("session {}: publish failed: {e}", self.session_id);
            self.record(SessionEvent::PublishFailed { reason: e.to_string() });
            return Ok(PublishOutcome::Failed(e.to_string()));
        }
        self.record(SessionEvent::SchedulePublished {
            shifts: schedule.len(),
            total_labor_cost: schedule.total_labor_cost(),
        });

        match self.notifier.broadcast(&schedule) {
            Ok(()) => Ok(PublishOutcome::Published),
            Err(e) => {
                log::warn!("session {}: broadcast failed: {e}", self.session_id);
                self.record(SessionEvent::NotificationFailed {
                    employee_id: None,
                    reason: e.to_string(),
                });
                Ok(PublishOutcome::PublishedWithoutBroadcast(e.to_string()))
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────

    pub fn apply(&mut self, command: ManagerCommand) -> PlanResult<CommandReply> {
        match command {
            ManagerCommand::Generate => {
                let generation = self.generate()?;
                Ok(CommandReply::Generated {
                    shifts: generation.schedule.len(),
                    gaps: generation.gaps.len(),
                    total_labor_cost: generation.schedule.total_labor_cost(),
                })
            }
            ManagerCommand::MoveShift { shift_id, new_day, new_employee_id } => {
                let moved = self.move_shift(&shift_id, new_day, &new_employee_id)?;
                Ok(CommandReply::Moved {
                    total_labor_cost: moved.schedule.total_labor_cost(),
                    shift: moved.shift,
                    employee_resolved: moved.employee_resolved,
                })
            }
            ManagerCommand::SubmitRequest { employee_id, request_type, day } => {
                let request = self.submit_request(&employee_id, request_type, day)?;
                Ok(CommandReply::Submitted { request })
            }
            ManagerCommand::ReviewRequest { request_id, approve } => {
                let outcome = self.review_request(&request_id, approve)?;
                Ok(CommandReply::Reviewed {
                    removed: outcome.removed.len(),
                    request: outcome.request,
                    notification: outcome.notification,
                })
            }
            ManagerCommand::Publish => Ok(CommandReply::Published { outcome: self.publish()? }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn forecast(&self) -> &[ForecastEntry] {
        &self.forecast
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    pub fn gaps(&self) -> &[CoverageGap] {
        &self.gaps
    }

    pub fn requests(&self) -> &RequestDesk {
        &self.requests
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Shifts of one employee in the current schedule, for their own view.
    pub fn shifts_for_employee(&self, employee_id: &str) -> Vec<&Shift> {
        self.schedule
            .iter()
            .flat_map(|s| s.shifts())
            .filter(|s| s.employee_id == employee_id)
            .collect()
    }

    pub fn events(&self) -> PlanResult<Vec<EventLogEntry>> {
        self.store.events_for_session(&self.session_id)
    }

    pub fn event_count(&self, event_type: &str) -> PlanResult<i64> {
        self.store.event_count_of_type(&self.session_id, event_type)
    }

    fn current_schedule(&self) -> PlanResult<&Schedule> {
        self.schedule
            .as_ref()
            .ok_or_else(|| PlanError::not_found("schedule", "current"))
    }

    /// Append to the event log. The log is an audit trail: a failed
    /// write is logged and never fails the operation that caused it.
    fn record(&mut self, event: SessionEvent) {
        self.seq += 1;
        let entry = serde_json::to_string(&event).map(|payload| EventLogEntry {
            id:         None,
            session_id: self.session_id.clone(),
            seq:        self.seq,
            event_type: event.type_name().to_string(),
            payload,
        });
        let result = match entry {
            Ok(entry) => self.store.append_event(&entry),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            log::error!(
                "session {}: could not record {} event: {e}",
                self.session_id,
                event.type_name()
            );
        }
    }
}
