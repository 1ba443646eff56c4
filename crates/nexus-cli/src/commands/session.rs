use chrono::Local;
use clap::Subcommand;
use nexus_core::{
    Config, Database, HttpActuator, SessionEngine, StartRequest, ViolationKind,
};
use serde_json::json;

use super::forward_events;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a new session
    Start {
        /// Seconds before the lock engages
        #[arg(long, default_value = "0")]
        pre_wait_sec: u64,
        /// Seconds of decision hold after the pre-wait
        #[arg(long, default_value = "0")]
        decision_hold_sec: u64,
        /// Seconds of punishment delay before the main phase
        #[arg(long, default_value = "0")]
        punishment_delay_sec: u64,
        /// Lower bound for the randomly drawn main duration
        #[arg(long, default_value = "1800")]
        main_min_sec: u64,
        /// Upper bound for the randomly drawn main duration
        #[arg(long, default_value = "7200")]
        main_max_sec: u64,
    },
    /// Poll the session: advances phases and fires due side effects
    Status,
    /// Abort the running session (refused in strict/hardcore mode)
    Abort,
    /// Report a violation ("head" or "video")
    Violation {
        kind: ViolationKind,
    },
    /// Discard the stored session and go idle
    Reset,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let session = db.load_session(&config)?;
    let actuator = HttpActuator::from_config(&config.device)?;
    let mut engine = SessionEngine::new(session, actuator);
    let now = Local::now();

    let output = match action {
        SessionAction::Start {
            pre_wait_sec,
            decision_hold_sec,
            punishment_delay_sec,
            main_min_sec,
            main_max_sec,
        } => {
            let req = StartRequest {
                pre_wait_sec,
                decision_hold_sec,
                punishment_delay_sec,
                main_min_sec,
                main_max_sec,
            };
            serde_json::to_value(engine.start(&req, &config, &now)?)?
        }
        SessionAction::Status => serde_json::to_value(engine.evaluate(&config, &now))?,
        SessionAction::Abort => serde_json::to_value(engine.abort(&config, &now)?)?,
        SessionAction::Violation { kind } => {
            serde_json::to_value(engine.report_violation(kind, &config, &now))?
        }
        SessionAction::Reset => {
            engine.reset(&config);
            json!({ "status": "reset" })
        }
    };

    db.save_session(engine.session())?;
    forward_events(&config, &engine.drain_events());
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
