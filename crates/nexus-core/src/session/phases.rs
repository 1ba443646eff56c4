//! Phase arithmetic.
//!
//! Phases are never stored as timers. They are re-derived on every poll from
//! the seconds elapsed since the session anchor: the four timed durations are
//! laid end to end and the phase is whichever cumulative interval contains
//! `elapsed`.
//!
//! ```text
//! 0        pre       pre+dec      pre+dec+pun        total
//! |--pre_wait--|--decision_hold--|--punishment_delay--|--main--|-> elapsed
//! ```
//!
//! Zero-length phases have empty intervals and are skipped.

use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Wall-clock hour the lockout releases at.
pub const LOCKOUT_HOUR: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    PreWait,
    DecisionHold,
    PunishmentDelay,
    Main,
    Lockout,
    Finished,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::PreWait => "pre_wait",
            Phase::DecisionHold => "decision_hold",
            Phase::PunishmentDelay => "punishment_delay",
            Phase::Main => "main",
            Phase::Lockout => "lockout",
            Phase::Finished => "finished",
        }
    }

    /// Phases whose added time lands in `punishment_delay_sec`.
    pub fn is_delay(self) -> bool {
        matches!(
            self,
            Phase::PreWait | Phase::DecisionHold | Phase::PunishmentDelay
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four timed durations, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub pre_wait_sec: u64,
    pub decision_hold_sec: u64,
    pub punishment_delay_sec: u64,
    pub main_duration_sec: u64,
}

/// Where `elapsed` falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Timed {
        phase: Phase,
        phase_elapsed: u64,
        phase_total: u64,
    },
    /// Every timed phase has run out.
    Elapsed,
}

impl Position {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Position::Timed { phase, .. } => Some(*phase),
            Position::Elapsed => None,
        }
    }

    /// Seconds left in the current phase, floored at zero.
    pub fn remaining_sec(&self) -> u64 {
        match self {
            Position::Timed {
                phase_elapsed,
                phase_total,
                ..
            } => phase_total.saturating_sub(*phase_elapsed),
            Position::Elapsed => 0,
        }
    }
}

impl PhaseDurations {
    fn ordered(&self) -> [(Phase, u64); 4] {
        [
            (Phase::PreWait, self.pre_wait_sec),
            (Phase::DecisionHold, self.decision_hold_sec),
            (Phase::PunishmentDelay, self.punishment_delay_sec),
            (Phase::Main, self.main_duration_sec),
        ]
    }

    pub fn total(&self) -> u64 {
        self.ordered()
            .iter()
            .fold(0u64, |acc, (_, d)| acc.saturating_add(*d))
    }

    /// First phase with a non-zero duration; `Main` if all are zero.
    pub fn initial_phase(&self) -> Phase {
        self.ordered()
            .iter()
            .find(|(_, d)| *d > 0)
            .map(|(p, _)| *p)
            .unwrap_or(Phase::Main)
    }

    /// Locate `elapsed` within the cumulative intervals.
    pub fn locate(&self, elapsed: u64) -> Position {
        let mut start = 0u64;
        for (phase, duration) in self.ordered() {
            let end = start.saturating_add(duration);
            if elapsed < end {
                return Position::Timed {
                    phase,
                    phase_elapsed: elapsed - start,
                    phase_total: duration,
                };
            }
            start = end;
        }
        Position::Elapsed
    }
}

/// Whole seconds from `now` until the next `hour:00:00` local to `now`'s
/// timezone: later today if that time has not passed yet, else tomorrow.
///
/// Computed on naive local time, so a DST shift inside the window is not
/// corrected for.
pub fn seconds_until_hour<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> i64 {
    let local = now.naive_local();
    let at = NaiveTime::from_hms_opt(hour % 24, 0, 0).unwrap_or_default();
    let mut target = local.date().and_time(at);
    if local >= target {
        target += Duration::days(1);
    }
    (target - local).num_seconds()
}
