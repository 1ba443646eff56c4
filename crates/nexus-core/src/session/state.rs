//! The session aggregate and its observable status.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phases::{Phase, PhaseDurations};
use super::thresholds::ThresholdSet;
use crate::storage::{Config, VideoDisplayMode, VideoStartMode};

/// The one session this process drives.
///
/// Only the engine mutates it. The JSON form is the persisted snapshot, so
/// field names are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub active: bool,
    pub phase: Phase,
    pub session_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    /// Anchor for all elapsed-time arithmetic.
    pub start_time: Option<DateTime<Utc>>,
    pub pre_wait_sec: u64,
    pub decision_hold_sec: u64,
    pub punishment_delay_sec: u64,
    pub main_duration_sec: u64,
    /// Seconds added by violations, across all phases.
    pub total_added_sec: u64,
    pub head_violation_count: u32,
    pub head_thresholds: Option<ThresholdSet>,
    pub lock_fired: bool,
    pub video_started: bool,
    /// Frozen at start so later config edits do not move the goalposts.
    pub video_start_mode: VideoStartMode,
    pub video_start_after_sec: u64,
    /// Set by a violation, cleared by the next status poll.
    pub coyote_pulse_pending: bool,
    pub mistress_message: String,
    pub last_event: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::idle(&Config::default())
    }
}

impl Session {
    /// A fresh idle session with video rules copied from `config`.
    pub fn idle(config: &Config) -> Self {
        Self {
            active: false,
            phase: Phase::Idle,
            session_id: None,
            created_at: None,
            start_time: None,
            pre_wait_sec: 0,
            decision_hold_sec: 0,
            punishment_delay_sec: 0,
            main_duration_sec: 0,
            total_added_sec: 0,
            head_violation_count: 0,
            head_thresholds: None,
            lock_fired: false,
            video_started: false,
            video_start_mode: config.video.start_mode,
            video_start_after_sec: config.video.start_after_min.saturating_mul(60),
            coyote_pulse_pending: false,
            mistress_message: String::new(),
            last_event: String::new(),
        }
    }

    pub fn durations(&self) -> PhaseDurations {
        PhaseDurations {
            pre_wait_sec: self.pre_wait_sec,
            decision_hold_sec: self.decision_hold_sec,
            punishment_delay_sec: self.punishment_delay_sec,
            main_duration_sec: self.main_duration_sec,
        }
    }

    /// Whole seconds since `start_time`, zero if unset or in the future.
    pub fn elapsed_sec<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u64 {
        match self.start_time {
            Some(start) => (now.with_timezone(&Utc) - start).num_seconds().max(0) as u64,
            None => 0,
        }
    }
}

/// Everything the polling front end sees. Rebuilt on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub active: bool,
    pub phase: Phase,
    pub remaining_sec: u64,
    pub pre_wait_sec: u64,
    pub decision_hold_sec: u64,
    pub punishment_delay_sec: u64,
    pub main_duration_sec: u64,
    pub total_added_sec: u64,
    pub mistress_message: String,
    pub head_violation_count: u32,
    pub head_thresholds: Option<ThresholdSet>,
    pub coyote_pulse_pending: bool,
    pub video_should_start: bool,
    pub video_display_mode: VideoDisplayMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_freezes_video_rules_from_config() {
        let mut config = Config::default();
        config.video.start_mode = VideoStartMode::Delayed;
        config.video.start_after_min = 12;
        let session = Session::idle(&config);
        assert_eq!(session.video_start_mode, VideoStartMode::Delayed);
        assert_eq!(session.video_start_after_sec, 720);
        assert!(!session.active);
    }

    #[test]
    fn elapsed_ignores_clock_going_backwards() {
        let mut session = Session::default();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        session.start_time = Some(start);
        assert_eq!(session.elapsed_sec(&(start + chrono::Duration::seconds(42))), 42);
        assert_eq!(session.elapsed_sec(&(start - chrono::Duration::seconds(5))), 0);
    }

    #[test]
    fn old_snapshot_without_new_fields_still_loads() {
        let json = r#"{"active": true, "phase": "main", "main_duration_sec": 600}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.active);
        assert_eq!(session.phase, Phase::Main);
        assert_eq!(session.main_duration_sec, 600);
        assert!(!session.lock_fired);
    }
}
