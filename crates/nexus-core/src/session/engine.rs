//! Session phase engine.
//!
//! Like a wall-clock timer, the engine has no threads and no scheduled
//! callbacks. Every poll calls [`SessionEngine::evaluate`] with the current
//! time; the phase is re-derived from the elapsed seconds and any one-shot
//! side effects that became due are applied right there.
//!
//! ```text
//! Idle -> (PreWait | DecisionHold | PunishmentDelay | Main) -> ... -> Main
//!      -> [Lockout] -> Finished
//! any active phase --abort--> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(session, actuator);
//! engine.start(&StartRequest::default(), &config, &Utc::now())?;
//! // On every poll:
//! let status = engine.evaluate(&config, &Utc::now());
//! for event in engine.drain_events() { /* forward */ }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::phases::{seconds_until_hour, Phase, Position, LOCKOUT_HOUR};
use super::punishment::{
    amplify_hardcore, decide, video_interruption, PunishmentAction, ViolationKind,
};
use super::state::{Session, SessionStatus};
use super::thresholds::{thresholds_for, ThresholdSet};
use crate::device::Actuator;
use crate::error::SessionError;
use crate::events::Event;
use crate::storage::{Config, VideoStartMode};

/// Parameters for [`SessionEngine::start`]. Durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub pre_wait_sec: u64,
    pub decision_hold_sec: u64,
    pub punishment_delay_sec: u64,
    pub main_min_sec: u64,
    pub main_max_sec: u64,
}

impl Default for StartRequest {
    fn default() -> Self {
        Self {
            pre_wait_sec: 0,
            decision_hold_sec: 0,
            punishment_delay_sec: 0,
            main_min_sec: 30 * 60,
            main_max_sec: 120 * 60,
        }
    }
}

/// What a poll at a given instant should do, before anything is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Inactive,
    Timed {
        phase: Phase,
        remaining_sec: u64,
        lock_due: bool,
        video_due: bool,
    },
    Lockout {
        remaining_sec: u64,
        lock_due: bool,
    },
    Finish,
}

/// Pure half of [`SessionEngine::evaluate`].
pub fn plan<Tz: TimeZone>(session: &Session, config: &Config, now: &DateTime<Tz>) -> Plan {
    if !session.active {
        return Plan::Inactive;
    }
    let elapsed = session.elapsed_sec(now);
    let lock_due = !session.lock_fired && elapsed >= session.pre_wait_sec;

    let position = session.durations().locate(elapsed);
    match position {
        Position::Timed {
            phase,
            phase_elapsed,
            ..
        } => Plan::Timed {
            phase,
            remaining_sec: position.remaining_sec(),
            lock_due,
            video_due: video_due(session, config, phase, phase_elapsed),
        },
        Position::Elapsed => {
            if config.session.lock_to_7am {
                let overrun = elapsed - session.durations().total();
                let remaining = lockout_remaining(now, overrun);
                if remaining > 0 {
                    return Plan::Lockout {
                        remaining_sec: remaining as u64,
                        lock_due,
                    };
                }
            }
            Plan::Finish
        }
    }
}

/// Seconds of lockout left at `now`, given the timed phases ran out
/// `overrun` seconds ago. The target hour is fixed at that end instant, so
/// the hold releases once it is reached instead of rolling over daily.
fn lockout_remaining<Tz: TimeZone>(now: &DateTime<Tz>, overrun: u64) -> i64 {
    let overrun = i64::try_from(overrun).unwrap_or(i64::MAX);
    let ended = now.clone() - Duration::seconds(overrun);
    seconds_until_hour(&ended, LOCKOUT_HOUR) - overrun
}

fn video_due(session: &Session, config: &Config, phase: Phase, phase_elapsed: u64) -> bool {
    if !config.video.enabled || session.video_started {
        return false;
    }
    match session.video_start_mode {
        VideoStartMode::Immediate => true,
        VideoStartMode::MainPhase => phase == Phase::Main,
        VideoStartMode::Delayed => {
            phase == Phase::Main && phase_elapsed >= session.video_start_after_sec
        }
    }
}

/// Result of a violation submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationReceipt {
    pub kind: ViolationKind,
    pub action: PunishmentAction,
    /// Phase the added time was routed by.
    pub phase: Phase,
    pub added_sec: u64,
    pub head_violation_count: u32,
    pub total_added_sec: u64,
    pub punishment_delay_sec: u64,
    pub main_duration_sec: u64,
    pub head_thresholds: Option<ThresholdSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViolationOutcome {
    Applied(ViolationReceipt),
    /// No session is running; nothing changed.
    NoActiveSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AbortOutcome {
    Aborted { unlocked: bool },
    NoActiveSession,
}

/// Owns the session, the actuator handle and the random source.
///
/// The caller serializes access; nothing here is internally locked.
pub struct SessionEngine<A: Actuator> {
    session: Session,
    actuator: A,
    rng: Mcg128Xsl64,
    events: Vec<Event>,
}

impl<A: Actuator> SessionEngine<A> {
    pub fn new(session: Session, actuator: A) -> Self {
        Self::with_rng(session, actuator, Mcg128Xsl64::from_entropy())
    }

    /// Reproducible draws, for tests and simulations.
    pub fn with_seed(session: Session, actuator: A, seed: u64) -> Self {
        Self::with_rng(session, actuator, Mcg128Xsl64::seed_from_u64(seed))
    }

    fn with_rng(session: Session, actuator: A, rng: Mcg128Xsl64) -> Self {
        Self {
            session,
            actuator,
            rng,
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Status at `now` without applying anything. The pending pulse is
    /// reported but not consumed, and video start is never reported.
    pub fn peek<Tz: TimeZone>(&self, config: &Config, now: &DateTime<Tz>) -> SessionStatus {
        let (phase, remaining) = match plan(&self.session, config, now) {
            Plan::Timed {
                phase,
                remaining_sec,
                ..
            } => (phase, remaining_sec),
            Plan::Lockout { remaining_sec, .. } => (Phase::Lockout, remaining_sec),
            Plan::Inactive | Plan::Finish => (self.session.phase, 0),
        };
        self.status(
            phase,
            remaining,
            false,
            self.session.coyote_pulse_pending,
            config,
        )
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start<Tz: TimeZone>(
        &mut self,
        req: &StartRequest,
        config: &Config,
        now: &DateTime<Tz>,
    ) -> Result<SessionStatus, SessionError> {
        if self.session.active {
            return Err(SessionError::AlreadyActive);
        }
        let at = now.with_timezone(&Utc);
        let main_max = req.main_max_sec.max(req.main_min_sec);
        let main_duration_sec = self.rng.gen_range(req.main_min_sec..=main_max);

        let mut session = Session::idle(config);
        let session_id = Uuid::new_v4();
        session.active = true;
        session.session_id = Some(session_id);
        session.created_at = Some(at);
        session.start_time = Some(at);
        session.pre_wait_sec = req.pre_wait_sec;
        session.decision_hold_sec = req.decision_hold_sec;
        session.punishment_delay_sec = req.punishment_delay_sec;
        session.main_duration_sec = main_duration_sec;
        session.phase = session.durations().initial_phase();
        session.head_thresholds = thresholds_for(&config.head, 0, &mut self.rng);
        session.mistress_message = "Session started. Your control ends here.".into();
        session.last_event = "session_started".into();
        self.session = session;

        info!(
            %session_id,
            phase = %self.session.phase,
            main_duration_sec,
            "session started"
        );
        self.events.push(Event::SessionStarted {
            session_id,
            phase: self.session.phase,
            main_duration_sec,
            at,
        });
        Ok(self.peek(config, now))
    }

    /// Poll. The only place time-driven transitions and side effects happen.
    pub fn evaluate<Tz: TimeZone>(&mut self, config: &Config, now: &DateTime<Tz>) -> SessionStatus {
        let at = now.with_timezone(&Utc);
        match plan(&self.session, config, now) {
            Plan::Inactive => self.peek(config, now),
            Plan::Finish => self.finish(config, at),
            Plan::Lockout {
                remaining_sec,
                lock_due,
            } => {
                if self.session.phase != Phase::Lockout {
                    self.enter(Phase::Lockout, at);
                    self.session.mistress_message =
                        format!("Lockout until {LOCKOUT_HOUR:02}:00.");
                    self.session.last_event = "lockout".into();
                    info!(remaining_sec, "holding session until lockout hour");
                    self.events.push(Event::LockoutHeld { remaining_sec, at });
                }
                if lock_due {
                    self.fire_lock(at);
                }
                let pulse = std::mem::take(&mut self.session.coyote_pulse_pending);
                self.status(Phase::Lockout, remaining_sec, false, pulse, config)
            }
            Plan::Timed {
                phase,
                remaining_sec,
                lock_due,
                video_due,
            } => {
                if self.session.phase != phase {
                    self.enter(phase, at);
                }
                if lock_due {
                    self.fire_lock(at);
                }
                if video_due {
                    self.session.video_started = true;
                    let mode = self.session.video_start_mode;
                    info!(?mode, "video start due");
                    self.events.push(Event::VideoStartDue { mode, at });
                }
                let pulse = std::mem::take(&mut self.session.coyote_pulse_pending);
                self.status(phase, remaining_sec, video_due, pulse, config)
            }
        }
    }

    /// Roll the punishment for `kind` and apply it.
    pub fn report_violation<Tz: TimeZone>(
        &mut self,
        kind: ViolationKind,
        config: &Config,
        now: &DateTime<Tz>,
    ) -> ViolationOutcome {
        if !self.session.active {
            return ViolationOutcome::NoActiveSession;
        }
        let hardcore = config.session.hardcore_mode;
        let action = match kind {
            ViolationKind::HeadLapse => {
                let mut action = decide(&mut self.rng);
                if hardcore {
                    amplify_hardcore(&mut action, &mut self.rng);
                }
                action
            }
            ViolationKind::VideoInterruption => video_interruption(hardcore, &mut self.rng),
        };
        self.apply_violation(kind, action, config, now)
    }

    /// Merge an already-decided response into the session.
    pub fn apply_violation<Tz: TimeZone>(
        &mut self,
        kind: ViolationKind,
        action: PunishmentAction,
        config: &Config,
        now: &DateTime<Tz>,
    ) -> ViolationOutcome {
        if !self.session.active {
            return ViolationOutcome::NoActiveSession;
        }
        let at = now.with_timezone(&Utc);
        let session = &mut self.session;

        session.head_violation_count = session.head_violation_count.saturating_add(1);
        let count = session.head_violation_count;
        session.head_thresholds = thresholds_for(&config.head, count, &mut self.rng);
        debug!(count, thresholds = ?session.head_thresholds, "thresholds regenerated");

        // Past the timed phases (lockout) the time extends main.
        let phase = session
            .durations()
            .locate(session.elapsed_sec(now))
            .phase()
            .unwrap_or(Phase::Main);
        let added_sec = u64::from(action.add_time_min) * 60;
        if phase.is_delay() {
            session.punishment_delay_sec = session.punishment_delay_sec.saturating_add(added_sec);
        } else {
            session.main_duration_sec = session.main_duration_sec.saturating_add(added_sec);
        }
        session.total_added_sec = session.total_added_sec.saturating_add(added_sec);

        if action.coyote_pulse {
            session.coyote_pulse_pending = true;
        }
        session.mistress_message = action.message.clone();
        session.last_event = match kind {
            ViolationKind::HeadLapse if action.switch_video => "head_video_switch",
            ViolationKind::HeadLapse => "head_violation",
            ViolationKind::VideoInterruption => "video_violation",
        }
        .into();

        info!(
            kind = kind.as_str(),
            count,
            added_sec,
            %phase,
            pulse = action.coyote_pulse,
            "violation applied"
        );
        self.events.push(Event::ViolationApplied {
            kind,
            violation_count: count,
            added_sec,
            pulse: action.coyote_pulse,
            at,
        });

        let session = &self.session;
        ViolationOutcome::Applied(ViolationReceipt {
            kind,
            action,
            phase,
            added_sec,
            head_violation_count: session.head_violation_count,
            total_added_sec: session.total_added_sec,
            punishment_delay_sec: session.punishment_delay_sec,
            main_duration_sec: session.main_duration_sec,
            head_thresholds: session.head_thresholds,
        })
    }

    /// Unlock and return to idle, unless strict or hardcore mode forbids it.
    pub fn abort<Tz: TimeZone>(
        &mut self,
        config: &Config,
        now: &DateTime<Tz>,
    ) -> Result<AbortOutcome, SessionError> {
        if !self.session.active {
            return Ok(AbortOutcome::NoActiveSession);
        }
        if config.abort_disabled() {
            return Err(SessionError::AbortDisabled);
        }
        let unlocked = self.release("abort");
        self.session = Session::idle(config);
        self.session.mistress_message = "Session aborted.".into();
        self.session.last_event = "aborted".into();

        info!(unlocked, "session aborted");
        self.events.push(Event::SessionAborted {
            unlocked,
            at: now.with_timezone(&Utc),
        });
        Ok(AbortOutcome::Aborted { unlocked })
    }

    /// Discard whatever is stored and go idle. The device is left as is.
    pub fn reset(&mut self, config: &Config) {
        if self.session.active {
            warn!(phase = %self.session.phase, "resetting an active session");
        }
        self.session = Session::idle(config);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter(&mut self, to: Phase, at: DateTime<Utc>) {
        let from = self.session.phase;
        self.session.phase = to;
        debug!(%from, %to, "phase changed");
        self.events.push(Event::PhaseChanged { from, to, at });
    }

    fn fire_lock(&mut self, at: DateTime<Utc>) {
        match self.actuator.lock() {
            Ok(()) => {
                self.session.lock_fired = true;
                self.session.last_event = "locked_after_prewait".into();
                info!("device locked");
                self.events.push(Event::Locked { at });
            }
            Err(e) => {
                warn!(error = %e, "lock failed, retrying on next poll");
                self.events.push(Event::LockFailed {
                    reason: e.to_string(),
                    at,
                });
            }
        }
    }

    fn release(&self, context: &str) -> bool {
        match self.actuator.unlock() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, context, "unlock failed");
                false
            }
        }
    }

    fn finish(&mut self, config: &Config, at: DateTime<Utc>) -> SessionStatus {
        let unlocked = self.release("finish");
        self.enter(Phase::Finished, at);
        self.session.active = false;
        self.session.mistress_message = "Session complete. You may release yourself.".into();
        self.session.last_event = "finished_unlocked".into();

        info!(
            total_added_sec = self.session.total_added_sec,
            violations = self.session.head_violation_count,
            unlocked,
            "session finished"
        );
        self.events.push(Event::SessionFinished {
            total_added_sec: self.session.total_added_sec,
            violation_count: self.session.head_violation_count,
            unlocked,
            at,
        });
        let pulse = std::mem::take(&mut self.session.coyote_pulse_pending);
        self.status(Phase::Finished, 0, false, pulse, config)
    }

    fn status(
        &self,
        phase: Phase,
        remaining_sec: u64,
        video_should_start: bool,
        coyote_pulse_pending: bool,
        config: &Config,
    ) -> SessionStatus {
        let s = &self.session;
        SessionStatus {
            active: s.active,
            phase,
            remaining_sec,
            pre_wait_sec: s.pre_wait_sec,
            decision_hold_sec: s.decision_hold_sec,
            punishment_delay_sec: s.punishment_delay_sec,
            main_duration_sec: s.main_duration_sec,
            total_added_sec: s.total_added_sec,
            mistress_message: s.mistress_message.clone(),
            head_violation_count: s.head_violation_count,
            head_thresholds: s.head_thresholds,
            coyote_pulse_pending,
            video_should_start,
            video_display_mode: config.video.display_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActuatorError;
    use crate::session::punishment::{decide_for_tier, PunishmentTier};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
        lock_down: AtomicBool,
    }

    impl Recorder {
        fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
        }
    }

    impl Actuator for Recorder {
        fn lock(&self) -> Result<(), ActuatorError> {
            self.calls.lock().unwrap().push("lock");
            if self.lock_down.load(Ordering::SeqCst) {
                return Err(ActuatorError::NotConfigured);
            }
            Ok(())
        }

        fn unlock(&self) -> Result<(), ActuatorError> {
            self.calls.lock().unwrap().push("unlock");
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn req(pre: u64, dec: u64, pun: u64, main: u64) -> StartRequest {
        StartRequest {
            pre_wait_sec: pre,
            decision_hold_sec: dec,
            punishment_delay_sec: pun,
            main_min_sec: main,
            main_max_sec: main,
        }
    }

    fn engine() -> SessionEngine<Recorder> {
        SessionEngine::with_seed(Session::default(), Recorder::default(), 42)
    }

    #[test]
    fn zero_prewait_goes_straight_to_main_and_finishes() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 60), &config, &t0()).unwrap();
        assert_eq!(e.session().phase, Phase::Main);

        let status = e.evaluate(&config, &at(0));
        assert_eq!(status.phase, Phase::Main);
        assert_eq!(status.remaining_sec, 60);
        assert!(e.session().lock_fired);

        let status = e.evaluate(&config, &at(61));
        assert_eq!(status.phase, Phase::Finished);
        assert!(!status.active);
        assert_eq!(e.actuator().count("unlock"), 1);
        assert_eq!(e.session().last_event, "finished_unlocked");
    }

    #[test]
    fn lock_waits_for_prewait() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(10, 0, 0, 50), &config, &t0()).unwrap();

        let status = e.evaluate(&config, &at(5));
        assert_eq!(status.phase, Phase::PreWait);
        assert_eq!(status.remaining_sec, 5);
        assert!(!e.session().lock_fired);
        assert_eq!(e.actuator().count("lock"), 0);

        let status = e.evaluate(&config, &at(10));
        assert_eq!(status.phase, Phase::Main);
        assert!(e.session().lock_fired);
        assert_eq!(e.actuator().count("lock"), 1);
    }

    #[test]
    fn lock_fires_once_across_polls() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        for s in 0..50 {
            e.evaluate(&config, &at(s));
        }
        assert_eq!(e.actuator().count("lock"), 1);
    }

    #[test]
    fn failed_lock_is_retried() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        e.actuator().lock_down.store(true, Ordering::SeqCst);

        e.evaluate(&config, &at(1));
        assert!(!e.session().lock_fired);
        assert!(e
            .drain_events()
            .iter()
            .any(|ev| matches!(ev, Event::LockFailed { .. })));

        e.actuator().lock_down.store(false, Ordering::SeqCst);
        e.evaluate(&config, &at(2));
        assert!(e.session().lock_fired);
        assert_eq!(e.actuator().count("lock"), 2);
    }

    #[test]
    fn start_while_active_is_rejected() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 60), &config, &t0()).unwrap();
        let before = e.session().clone();
        assert_eq!(
            e.start(&req(5, 5, 5, 5), &config, &at(1)),
            Err(SessionError::AlreadyActive)
        );
        assert_eq!(e.session(), &before);
    }

    #[test]
    fn inverted_main_range_uses_minimum() {
        let config = Config::default();
        let mut e = engine();
        let request = StartRequest {
            main_min_sec: 300,
            main_max_sec: 100,
            ..req(0, 0, 0, 0)
        };
        e.start(&request, &config, &t0()).unwrap();
        assert_eq!(e.session().main_duration_sec, 300);
    }

    #[test]
    fn start_generates_initial_thresholds() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 60), &config, &t0()).unwrap();
        assert!(e.session().head_thresholds.is_some());
        assert_eq!(e.session().head_violation_count, 0);
    }

    #[test]
    fn extra_time_in_main_extends_main() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        e.evaluate(&config, &at(30));

        let mut rng = Mcg128Xsl64::seed_from_u64(7);
        let action = decide_for_tier(PunishmentTier::ExtraTime, &mut rng);
        let minutes = u64::from(action.add_time_min);
        let outcome = e.apply_violation(ViolationKind::HeadLapse, action, &config, &at(31));

        let ViolationOutcome::Applied(receipt) = outcome else {
            panic!("violation was not applied");
        };
        assert_eq!(receipt.phase, Phase::Main);
        assert_eq!(e.session().main_duration_sec, 600 + minutes * 60);
        assert_eq!(e.session().total_added_sec, minutes * 60);
        assert_eq!(e.session().punishment_delay_sec, 0);
        assert_eq!(e.session().head_violation_count, 1);
        assert_eq!(e.session().last_event, "head_violation");
    }

    #[test]
    fn extra_time_in_delay_extends_punishment_delay() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 120, 600), &config, &t0()).unwrap();
        let action = PunishmentAction {
            add_time_min: 10,
            ..PunishmentAction::default()
        };
        e.apply_violation(ViolationKind::HeadLapse, action, &config, &at(20));
        assert_eq!(e.session().punishment_delay_sec, 120 + 600);
        assert_eq!(e.session().main_duration_sec, 600);
        assert_eq!(e.session().total_added_sec, 600);
    }

    #[test]
    fn violation_without_session_is_a_no_op() {
        let config = Config::default();
        let mut e = engine();
        let outcome = e.report_violation(ViolationKind::HeadLapse, &config, &t0());
        assert_eq!(outcome, ViolationOutcome::NoActiveSession);
        assert_eq!(e.session(), &Session::default());
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn pulse_is_delivered_once() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        let action = PunishmentAction {
            coyote_pulse: true,
            ..PunishmentAction::default()
        };
        e.apply_violation(ViolationKind::HeadLapse, action, &config, &at(5));

        assert!(e.evaluate(&config, &at(6)).coyote_pulse_pending);
        assert!(!e.evaluate(&config, &at(7)).coyote_pulse_pending);
    }

    #[test]
    fn video_interruption_always_pulses_and_adds_time() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        let outcome = e.report_violation(ViolationKind::VideoInterruption, &config, &at(5));
        let ViolationOutcome::Applied(receipt) = outcome else {
            panic!("violation was not applied");
        };
        assert!((300..=1800).contains(&receipt.added_sec));
        assert!(e.session().coyote_pulse_pending);
        assert_eq!(e.session().last_event, "video_violation");
    }

    #[test]
    fn hardcore_head_violation_always_pulses() {
        let mut config = Config::default();
        config.session.hardcore_mode = true;
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        for s in 1..30 {
            e.report_violation(ViolationKind::HeadLapse, &config, &at(s));
            assert!(e.session().coyote_pulse_pending);
        }
        assert_eq!(e.session().head_violation_count, 29);
    }

    #[test]
    fn main_phase_video_latches_once() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(10, 0, 0, 600), &config, &t0()).unwrap();
        assert!(!e.evaluate(&config, &at(5)).video_should_start);
        assert!(e.evaluate(&config, &at(10)).video_should_start);
        assert!(!e.evaluate(&config, &at(11)).video_should_start);
        assert!(e.session().video_started);
    }

    #[test]
    fn delayed_video_waits_inside_main() {
        let mut config = Config::default();
        config.video.start_mode = VideoStartMode::Delayed;
        config.video.start_after_min = 1;
        let mut e = engine();
        e.start(&req(10, 0, 0, 600), &config, &t0()).unwrap();
        assert!(!e.evaluate(&config, &at(69)).video_should_start);
        assert!(e.evaluate(&config, &at(70)).video_should_start);
        assert!(!e.evaluate(&config, &at(71)).video_should_start);
    }

    #[test]
    fn immediate_video_fires_in_prewait() {
        let mut config = Config::default();
        config.video.start_mode = VideoStartMode::Immediate;
        let mut e = engine();
        e.start(&req(30, 0, 0, 600), &config, &t0()).unwrap();
        let status = e.evaluate(&config, &at(0));
        assert_eq!(status.phase, Phase::PreWait);
        assert!(status.video_should_start);
    }

    #[test]
    fn video_mode_is_frozen_at_start() {
        let mut config = Config::default();
        let mut e = engine();
        e.start(&req(10, 0, 0, 600), &config, &t0()).unwrap();
        config.video.start_mode = VideoStartMode::Immediate;
        assert!(!e.evaluate(&config, &at(1)).video_should_start);
    }

    #[test]
    fn disabled_video_never_starts() {
        let mut config = Config::default();
        config.video.enabled = false;
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        assert!(!e.evaluate(&config, &at(1)).video_should_start);
    }

    #[test]
    fn hardcore_abort_is_rejected() {
        let mut config = Config::default();
        config.session.hardcore_mode = true;
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        let before = e.session().clone();

        assert_eq!(e.abort(&config, &at(5)), Err(SessionError::AbortDisabled));
        assert_eq!(e.session(), &before);
        assert_eq!(e.actuator().count("unlock"), 0);
    }

    #[test]
    fn abort_unlocks_and_goes_idle() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        assert_eq!(
            e.abort(&config, &at(5)),
            Ok(AbortOutcome::Aborted { unlocked: true })
        );
        assert!(!e.session().active);
        assert_eq!(e.session().phase, Phase::Idle);
        assert_eq!(e.actuator().count("unlock"), 1);
    }

    #[test]
    fn abort_when_idle_is_a_no_op() {
        let mut config = Config::default();
        config.session.strict_mode = true;
        let mut e = engine();
        assert_eq!(e.abort(&config, &t0()), Ok(AbortOutcome::NoActiveSession));
    }

    #[test]
    fn lockout_holds_until_seven() {
        let mut config = Config::default();
        config.session.lock_to_7am = true;
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap();
        let mut e = engine();
        e.start(&req(0, 0, 0, 60), &config, &start).unwrap();

        let status = e.evaluate(&config, &(start + Duration::seconds(61)));
        assert_eq!(status.phase, Phase::Lockout);
        assert!(status.active);
        assert_eq!(status.remaining_sec, 9 * 3600 - 61);
        assert_eq!(e.actuator().count("unlock"), 0);

        let seven = Utc.with_ymd_and_hms(2026, 1, 2, 7, 0, 0).unwrap();
        let status = e.evaluate(&config, &seven);
        assert_eq!(status.phase, Phase::Finished);
        assert_eq!(e.actuator().count("unlock"), 1);
    }

    #[test]
    fn violation_in_lockout_resumes_main() {
        let mut config = Config::default();
        config.session.lock_to_7am = true;
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap();
        let mut e = engine();
        e.start(&req(0, 0, 0, 60), &config, &start).unwrap();
        let status = e.evaluate(&config, &(start + Duration::seconds(61)));
        assert_eq!(status.phase, Phase::Lockout);

        let action = PunishmentAction {
            add_time_min: 10,
            ..PunishmentAction::default()
        };
        let outcome = e.apply_violation(
            ViolationKind::HeadLapse,
            action,
            &config,
            &(start + Duration::seconds(62)),
        );
        let ViolationOutcome::Applied(receipt) = outcome else {
            panic!("violation was not applied");
        };
        assert_eq!(receipt.phase, Phase::Main);
        assert_eq!(receipt.main_duration_sec, 660);

        let status = e.evaluate(&config, &(start + Duration::seconds(63)));
        assert_eq!(status.phase, Phase::Main);
        assert_eq!(status.remaining_sec, 597);
        assert_eq!(e.actuator().count("unlock"), 0);
    }

    #[test]
    fn failed_lock_is_retried_in_lockout() {
        let mut config = Config::default();
        config.session.lock_to_7am = true;
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 22, 0, 0).unwrap();
        let mut e = engine();
        e.actuator().lock_down.store(true, Ordering::SeqCst);
        e.start(&req(0, 0, 0, 60), &config, &start).unwrap();

        let status = e.evaluate(&config, &(start + Duration::seconds(61)));
        assert_eq!(status.phase, Phase::Lockout);
        assert!(!e.session().lock_fired);

        e.actuator().lock_down.store(false, Ordering::SeqCst);
        let status = e.evaluate(&config, &(start + Duration::seconds(62)));
        assert_eq!(status.phase, Phase::Lockout);
        assert!(e.session().lock_fired);
        assert_eq!(e.actuator().count("lock"), 2);
    }

    #[test]
    fn reset_returns_to_idle() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(0, 0, 0, 600), &config, &t0()).unwrap();
        e.evaluate(&config, &at(1));
        e.reset(&config);

        assert!(!e.session().active);
        assert_eq!(e.session().phase, Phase::Idle);
        assert_eq!(e.actuator().count("unlock"), 0);
        let status = e.evaluate(&config, &at(2));
        assert!(!status.active);
        assert!(e.start(&req(0, 0, 0, 60), &config, &at(3)).is_ok());
    }

    #[test]
    fn phase_changes_are_reported() {
        let config = Config::default();
        let mut e = engine();
        e.start(&req(10, 10, 10, 60), &config, &t0()).unwrap();
        e.drain_events();
        e.evaluate(&config, &at(35));
        let events = e.drain_events();
        assert!(events.contains(&Event::PhaseChanged {
            from: Phase::PreWait,
            to: Phase::Main,
            at: at(35),
        }));
    }

    #[test]
    fn idle_status_has_no_side_effects() {
        let config = Config::default();
        let mut e = engine();
        let status = e.evaluate(&config, &t0());
        assert!(!status.active);
        assert_eq!(status.phase, Phase::Idle);
        assert!(e.actuator().calls.lock().unwrap().is_empty());
        assert!(e.drain_events().is_empty());
    }
}
