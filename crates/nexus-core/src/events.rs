use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{Phase, ViolationKind};
use crate::storage::VideoStartMode;

/// Every session state change produces an Event.
/// The front end polls for them; the bridge can forward them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        phase: Phase,
        main_duration_sec: u64,
        at: DateTime<Utc>,
    },
    /// Timed phase boundary crossed.
    PhaseChanged {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },
    Locked {
        at: DateTime<Utc>,
    },
    /// Lock command failed; it is retried on the next poll.
    LockFailed {
        reason: String,
        at: DateTime<Utc>,
    },
    VideoStartDue {
        mode: VideoStartMode,
        at: DateTime<Utc>,
    },
    /// Timed phases ran out and the session is held until the lockout hour.
    LockoutHeld {
        remaining_sec: u64,
        at: DateTime<Utc>,
    },
    SessionFinished {
        total_added_sec: u64,
        violation_count: u32,
        unlocked: bool,
        at: DateTime<Utc>,
    },
    ViolationApplied {
        kind: ViolationKind,
        violation_count: u32,
        added_sec: u64,
        pulse: bool,
        at: DateTime<Utc>,
    },
    SessionAborted {
        unlocked: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short tag used by the bridge payload.
    pub fn name(&self) -> &'static str {
        match self {
            Event::SessionStarted { .. } => "SESSION_STARTED",
            Event::PhaseChanged { .. } => "PHASE_CHANGED",
            Event::Locked { .. } => "LOCKED",
            Event::LockFailed { .. } => "LOCK_FAILED",
            Event::VideoStartDue { .. } => "VIDEO_START",
            Event::LockoutHeld { .. } => "LOCKOUT",
            Event::SessionFinished { .. } => "FINISHED",
            Event::ViolationApplied { .. } => "VIOLATION",
            Event::SessionAborted { .. } => "ABORTED",
        }
    }
}
