mod engine;
mod phases;
mod punishment;
mod state;
mod thresholds;

pub use engine::{
    plan, AbortOutcome, Plan, SessionEngine, StartRequest, ViolationOutcome, ViolationReceipt,
};
pub use phases::{seconds_until_hour, Phase, PhaseDurations, Position, LOCKOUT_HOUR};
pub use punishment::{
    amplify_hardcore, decide, decide_for_tier, video_interruption, PunishmentAction,
    PunishmentTier, ViolationKind,
};
pub use state::{Session, SessionStatus};
pub use thresholds::{
    generate, midpoint_thresholds, randomized_thresholds, thresholds_for, Bound, ThresholdBounds,
    ThresholdSet, AWAY_DEG_STEP, DEBOUNCE_MS_STEP, DOWN_DEG_STEP, STILL_SEC_STEP,
};
