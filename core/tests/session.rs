//! Session tests: publishing, commands, the event log, data sources and
//! configuration.

use chrono::Weekday;
use shiftplan_core::{
    command::{CommandReply, ManagerCommand},
    config::PlannerConfig,
    error::{PlanError, PlanResult},
    event::SessionEvent,
    notification::Notifier,
    publish::{PublishOutcome, Publisher},
    request_desk::{RequestStatus, RequestType},
    roster::RosterDefaults,
    schedule::{CostModel, Schedule},
    session::PlanningSession,
    source::{FallbackSource, JsonFileSource, MockSource, RosterSource},
    store::SessionStore,
};
use std::cell::Cell;
use std::rc::Rc;

fn data_dir() -> String {
    format!("{}/../data", env!("CARGO_MANIFEST_DIR"))
}

fn build(seed: u64) -> PlanningSession {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut session = PlanningSession::build_test(format!("session-{seed}")).unwrap();
    session.load_from(&MockSource::new(seed)).unwrap();
    session
}

struct RejectingPublisher;

impl Publisher for RejectingPublisher {
    fn publish(&mut self, _schedule: &Schedule) -> PlanResult<()> {
        Err(PlanError::upstream("publisher", "503 Service Unavailable"))
    }
}

/// Counts broadcasts; status notifications are ignored.
struct CountingNotifier {
    broadcasts: Rc<Cell<u32>>,
    fail: bool,
}

impl Notifier for CountingNotifier {
    fn broadcast(&mut self, _schedule: &Schedule) -> PlanResult<()> {
        self.broadcasts.set(self.broadcasts.get() + 1);
        if self.fail {
            return Err(PlanError::upstream("notifier", "timeout"));
        }
        Ok(())
    }

    fn notify_request_status(&mut self, _: &str, _: RequestType, _: RequestStatus) -> PlanResult<()> {
        Ok(())
    }
}

// ── Publishing ───────────────────────────────────────────────────────

/// A successful publish stores a version and queues one broadcast per
/// scheduled employee.
#[test]
fn publish_stores_version_then_broadcasts() {
    let mut session = build(11);
    let schedule = session.generate().unwrap().schedule;

    let outcome = session.publish().unwrap();

    assert_eq!(outcome, PublishOutcome::Published);
    let store = session.store();
    assert_eq!(store.published_count(&session.session_id).unwrap(), 1);
    let (version, json) = store.latest_published_schedule(&session.session_id).unwrap().unwrap();
    assert_eq!(version, 1);
    let stored: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(stored, serde_json::to_value(&schedule).unwrap());
    assert_eq!(stored["totalLaborCost"], schedule.total_labor_cost());

    let broadcasts = store
        .outbox(&session.session_id)
        .unwrap()
        .into_iter()
        .filter(|m| m.channel == "broadcast")
        .count();
    assert_eq!(broadcasts, schedule.minutes_by_employee().len());
}

/// Publishing twice gives two versions.
#[test]
fn republish_bumps_version() {
    let mut session = build(12);
    session.generate().unwrap();
    session.publish().unwrap();
    session.publish().unwrap();
    let (version, _) = session
        .store()
        .latest_published_schedule(&session.session_id)
        .unwrap()
        .unwrap();
    assert_eq!(version, 2);
}

/// When the publisher fails, nothing is broadcast.
#[test]
fn failed_publish_never_broadcasts() {
    let broadcasts = Rc::new(Cell::new(0));
    let mut session = build(13)
        .with_publisher(Box::new(RejectingPublisher))
        .with_notifier(Box::new(CountingNotifier { broadcasts: Rc::clone(&broadcasts), fail: false }));
    session.generate().unwrap();

    let outcome = session.publish().unwrap();

    assert!(matches!(outcome, PublishOutcome::Failed(_)));
    assert!(!outcome.is_published());
    assert_eq!(broadcasts.get(), 0);
    assert_eq!(session.event_count("publish_failed").unwrap(), 1);
    assert_eq!(session.event_count("schedule_published").unwrap(), 0);
}

/// A broadcast failure after a good publish is reported, not raised.
#[test]
fn broadcast_failure_keeps_publication() {
    let broadcasts = Rc::new(Cell::new(0));
    let mut session = build(14)
        .with_notifier(Box::new(CountingNotifier { broadcasts: Rc::clone(&broadcasts), fail: true }));
    session.generate().unwrap();

    let outcome = session.publish().unwrap();

    assert!(matches!(outcome, PublishOutcome::PublishedWithoutBroadcast(_)));
    assert!(outcome.is_published());
    assert_eq!(broadcasts.get(), 1);
    assert_eq!(session.store().published_count(&session.session_id).unwrap(), 1);
}

#[test]
fn publish_without_schedule_is_not_found() {
    let mut session = build(15);
    assert!(matches!(session.publish(), Err(PlanError::NotFound { .. })));
}

// ── Commands and events ──────────────────────────────────────────────

/// Commands arrive as tagged JSON and drive the same operations.
#[test]
fn json_commands_drive_the_session() {
    let mut session = build(21);

    let generate: ManagerCommand = serde_json::from_str(r#"{"cmd":"generate"}"#).unwrap();
    let CommandReply::Generated { shifts, .. } = session.apply(generate).unwrap() else {
        panic!("expected Generated reply");
    };
    assert!(shifts > 0);

    let first = session.schedule().unwrap().shifts()[0].clone();
    let mv: ManagerCommand = serde_json::from_str(&format!(
        r#"{{"cmd":"move_shift","shift_id":"{}","new_day":"Sun","new_employee_id":"{}"}}"#,
        first.id, first.employee_id
    ))
    .unwrap();
    let CommandReply::Moved { shift, employee_resolved, .. } = session.apply(mv).unwrap() else {
        panic!("expected Moved reply");
    };
    assert!(employee_resolved);
    assert_eq!(shift.day, Weekday::Sun);

    let reply = session
        .apply(ManagerCommand::SubmitRequest {
            employee_id: first.employee_id.clone(),
            request_type: RequestType::Off,
            day: Weekday::Sun,
        })
        .unwrap();
    let CommandReply::Submitted { request } = reply else { panic!("expected Submitted reply") };

    let reply = session
        .apply(ManagerCommand::ReviewRequest { request_id: request.id, approve: true })
        .unwrap();
    let CommandReply::Reviewed { removed, .. } = reply else { panic!("expected Reviewed reply") };
    assert!(removed >= 1);
    assert!(session.schedule().unwrap().shift(&first.id).is_none());

    let reply = session.apply(ManagerCommand::Publish).unwrap();
    assert_eq!(reply, CommandReply::Published { outcome: PublishOutcome::Published });
}

/// Every state change lands in the event log, in order.
#[test]
fn event_log_records_state_changes_in_order() {
    let mut session = build(22);
    session.generate().unwrap();
    let first = session.schedule().unwrap().shifts()[0].id.clone();
    session.move_shift(&first, Weekday::Sat, "nobody").unwrap();

    let events = session.events().unwrap();
    let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(kinds[0], "session_opened");
    assert_eq!(kinds[1], "roster_loaded");
    assert_eq!(kinds[2], "schedule_generated");
    assert_eq!(kinds[kinds.len() - 2], "move_fell_back");
    assert_eq!(kinds[kinds.len() - 1], "shift_moved");
    assert!(events.windows(2).all(|w| w[0].seq < w[1].seq));

    let gaps = session.event_count("coverage_gap_found").unwrap();
    assert_eq!(gaps as usize, session.gaps().len());

    let last: SessionEvent = serde_json::from_str(&events[events.len() - 1].payload).unwrap();
    assert!(matches!(last, SessionEvent::ShiftMoved { day: Weekday::Sat, .. }));
}

/// Two sessions on the same seed produce identical schedules and logs.
#[test]
fn same_seed_same_session() {
    let run = || {
        let mut session = PlanningSession::build_test("det".into()).unwrap();
        session.load_from(&MockSource::new(99)).unwrap();
        let schedule = session.generate().unwrap().schedule;
        let payloads: Vec<String> = session.events().unwrap().into_iter().map(|e| e.payload).collect();
        (schedule, payloads)
    };
    assert_eq!(run(), run());
}

/// Invalid input is rejected and the previous roster stays loaded.
#[test]
fn invalid_load_keeps_previous_state() {
    let mut session = build(23);
    let before = session.roster().len();
    let mut employees = session.roster().employees().to_vec();
    employees.push(employees[0].clone());

    assert!(session.load(employees, Vec::new()).is_err());
    assert_eq!(session.roster().len(), before);
    assert!(!session.forecast().is_empty());
}

/// An employee's own view only lists their shifts.
#[test]
fn shifts_for_employee_filters_by_id() {
    let mut session = build(24);
    session.generate().unwrap();
    let id = session.schedule().unwrap().shifts()[0].employee_id.clone();
    let mine = session.shifts_for_employee(&id);
    assert!(!mine.is_empty());
    assert!(mine.iter().all(|s| s.employee_id == id));
}

// ── Sources and config ───────────────────────────────────────────────

/// The bundled data directory parses, including labor-hour demand.
#[test]
fn json_source_reads_bundled_data() {
    let source = JsonFileSource::new(data_dir(), RosterDefaults::default());
    let employees = source.employees().unwrap();
    let forecast = source.forecast().unwrap();
    assert_eq!(employees.len(), 8);
    assert_eq!(forecast.len(), 42);
    assert!(forecast.iter().all(|f| f.required_staff > 0));
}

/// A missing primary falls back to demo data.
#[test]
fn fallback_source_uses_mock_when_primary_fails() {
    let source = FallbackSource::new(
        Box::new(JsonFileSource::new("/nonexistent/shiftplan", RosterDefaults::default())),
        Box::new(MockSource::new(5)),
    );
    let employees = source.employees().unwrap();
    assert_eq!(employees, MockSource::new(5).employees().unwrap());
    assert!(!source.forecast().unwrap().is_empty());
}

/// A missing file surfaces as an upstream failure.
#[test]
fn json_source_error_is_upstream() {
    let source = JsonFileSource::new("/nonexistent/shiftplan", RosterDefaults::default());
    assert!(matches!(source.employees(), Err(PlanError::Upstream { collaborator: "roster", .. })));
}

/// Demo data is a pure function of the seed.
#[test]
fn mock_source_is_seeded() {
    let a = MockSource::new(3).with_headcount(12);
    let b = MockSource::new(3).with_headcount(12);
    assert_eq!(a.employees().unwrap(), b.employees().unwrap());
    assert_eq!(a.forecast().unwrap(), b.forecast().unwrap());
    assert_eq!(a.employees().unwrap().len(), 12);
    assert_ne!(
        MockSource::new(3).employees().unwrap(),
        MockSource::new(4).employees().unwrap()
    );
}

/// The shipped planner.json matches the built-in defaults.
#[test]
fn bundled_config_loads() {
    let config = PlannerConfig::load(&data_dir()).unwrap();
    assert_eq!(config, PlannerConfig::default());
}

/// Missing fields default; out-of-range values are rejected.
#[test]
fn config_defaults_and_validation() {
    let partial: PlannerConfig = serde_json::from_str(r#"{"cost_model":"exact_minutes"}"#).unwrap();
    assert_eq!(partial.cost_model, CostModel::ExactMinutes);
    assert_eq!(partial.slot_minutes, 60);

    let bad = PlannerConfig { slot_minutes: 0, ..PlannerConfig::default() };
    assert!(bad.validate().is_err());
    assert!(PlanningSession::build("bad".into(), bad, SessionStore::in_memory().unwrap()).is_err());
}
