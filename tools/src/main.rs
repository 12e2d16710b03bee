//! shift-runner: headless planner for one planning week.
//!
//! Usage:
//!   shift-runner --data-dir ./data --seed 42
//!   shift-runner --db plan.db --ipc-mode

use anyhow::Result;
use shiftplan_core::{
    command::ManagerCommand,
    config::PlannerConfig,
    engine::CoverageGap,
    request_desk::ShiftRequest,
    schedule::Schedule,
    session::PlanningSession,
    source::{FallbackSource, JsonFileSource, MockSource},
    store::SessionStore,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcMessage {
    GetState,
    Command { command: ManagerCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    session_id: &'a str,
    employees: usize,
    schedule: Option<&'a Schedule>,
    gaps: &'a [CoverageGap],
    requests: &'a [ShiftRequest],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");

    let config = PlannerConfig::load(data_dir).unwrap_or_else(|e| {
        log::warn!("{e}; using default planner config");
        PlannerConfig::default()
    });

    if !ipc_mode {
        println!("shift-runner");
        println!("  seed:      {seed}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let store = if db == ":memory:" {
        SessionStore::in_memory()?
    } else {
        SessionStore::open(db)?
    };
    let session_id = format!("plan-{seed}-{}", unix_secs());
    let source = FallbackSource::new(
        Box::new(JsonFileSource::new(data_dir, config.roster_defaults())),
        Box::new(MockSource::new(seed)),
    );

    let mut session = PlanningSession::build(session_id, config, store)?;
    session.load_from(&source)?;

    if ipc_mode {
        run_ipc_loop(&mut session)?;
    } else {
        session.generate()?;
        print_summary(&session);
    }
    Ok(())
}

fn run_ipc_loop(session: &mut PlanningSession) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let message: IpcMessage = match serde_json::from_str(&line) {
            Ok(m) => m,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };

        match message {
            IpcMessage::Quit => break,
            IpcMessage::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&ui_state(session))?)?;
            }
            IpcMessage::Command { command } => {
                let reply = match session.apply(command) {
                    Ok(reply) => serde_json::to_value(reply)?,
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                };
                let state = serde_json::to_value(ui_state(session))?;
                writeln!(stdout, "{}", serde_json::json!({ "result": reply, "state": state }))?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn ui_state(session: &PlanningSession) -> UiState<'_> {
    UiState {
        session_id: &session.session_id,
        employees: session.roster().len(),
        schedule: session.schedule(),
        gaps: session.gaps(),
        requests: session.requests().all(),
    }
}

fn print_summary(session: &PlanningSession) {
    let Some(schedule) = session.schedule() else {
        println!("(no schedule generated)");
        return;
    };

    println!("=== SCHEDULE ===");
    for shift in schedule.shifts() {
        println!(
            "  {} {} {}-{}  {:<20} {}",
            shift.id,
            shift.day,
            shift.start.format("%H:%M"),
            shift.end.format("%H:%M"),
            shift.employee_name,
            shift.role,
        );
    }
    println!();
    println!("=== HOURS ===");
    for (employee_id, minutes) in schedule.minutes_by_employee() {
        let cap = session
            .roster()
            .get(&employee_id)
            .map_or(0.0, |e| e.max_hours_per_week);
        println!("  {employee_id:<8} {:>5.1}h / {cap:.0}h", f64::from(minutes) / 60.0);
    }
    println!();
    println!("=== SUMMARY ===");
    println!("  employees:        {}", session.roster().len());
    println!("  shifts:           {}", schedule.len());
    println!("  total labor cost: ${:.2}", schedule.total_labor_cost());
    println!("  coverage gaps:    {}", session.gaps().len());
    for gap in session.gaps() {
        println!(
            "    {} {} {:<8} short {} of {}",
            gap.day,
            gap.window,
            gap.role,
            gap.shortfall(),
            gap.required,
        );
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn unix_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
