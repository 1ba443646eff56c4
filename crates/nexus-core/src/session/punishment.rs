//! Punishment policy for violation events.
//!
//! One uniform roll over `[0, 1)` picks a tier. Most tiers are mild; the top
//! two compound several penalties at once.
//!
//! | roll        | tier        | effect                                        |
//! |-------------|-------------|-----------------------------------------------|
//! | `[0, .25)`  | `Warning`   | message only                                  |
//! | `[.25, .55)`| `ExtraTime` | +5..=30 min                                   |
//! | `[.55, .75)`| `Pulse`     | pulse                                         |
//! | `[.75, .90)`| `Narrow`    | pulse, forced focus, video switch             |
//! | `[.90, 1)`  | `Full`      | +10..=30 min, pulse, forced focus, video switch |
//!
//! The policy knows nothing about hardcore mode. Callers amplify with
//! [`amplify_hardcore`].

use rand::Rng;
use serde::{Deserialize, Serialize};

/// What triggered the violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Head tracking reported looking down, away, or holding too still.
    HeadLapse,
    /// The user closed or refused the session video.
    VideoInterruption,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::HeadLapse => "head_lapse",
            ViolationKind::VideoInterruption => "video_interruption",
        }
    }
}

impl std::str::FromStr for ViolationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "head" | "head_lapse" => Ok(ViolationKind::HeadLapse),
            "video" | "video_interruption" => Ok(ViolationKind::VideoInterruption),
            other => Err(format!("unknown violation kind: {other}")),
        }
    }
}

/// Response bundle for one violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunishmentAction {
    pub add_time_min: u32,
    pub coyote_pulse: bool,
    /// Narrow the display down to the hood view.
    pub force_hood: bool,
    pub switch_video: bool,
    pub message: String,
}

/// Severity tier selected by the roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentTier {
    Warning,
    ExtraTime,
    Pulse,
    Narrow,
    Full,
}

impl PunishmentTier {
    pub fn from_roll(roll: f64) -> Self {
        if roll < 0.25 {
            PunishmentTier::Warning
        } else if roll < 0.55 {
            PunishmentTier::ExtraTime
        } else if roll < 0.75 {
            PunishmentTier::Pulse
        } else if roll < 0.90 {
            PunishmentTier::Narrow
        } else {
            PunishmentTier::Full
        }
    }
}

/// Roll once and build the response.
pub fn decide<R: Rng + ?Sized>(rng: &mut R) -> PunishmentAction {
    let roll: f64 = rng.gen();
    decide_for_tier(PunishmentTier::from_roll(roll), rng)
}

/// Build the response for an already-chosen tier. Minute amounts are still
/// drawn from `rng`.
pub fn decide_for_tier<R: Rng + ?Sized>(tier: PunishmentTier, rng: &mut R) -> PunishmentAction {
    match tier {
        PunishmentTier::Warning => PunishmentAction {
            message: "You looked away. Keep your attention where it belongs.".into(),
            ..PunishmentAction::default()
        },
        PunishmentTier::ExtraTime => {
            let extra = rng.gen_range(5..=30);
            PunishmentAction {
                add_time_min: extra,
                message: format!("You lost focus. +{extra} minutes added."),
                ..PunishmentAction::default()
            }
        }
        PunishmentTier::Pulse => PunishmentAction {
            coyote_pulse: true,
            message: "That lapse did not go unnoticed.".into(),
            ..PunishmentAction::default()
        },
        PunishmentTier::Narrow => PunishmentAction {
            coyote_pulse: true,
            force_hood: true,
            switch_video: true,
            message: "If you drift, I narrow your world down for you.".into(),
            ..PunishmentAction::default()
        },
        PunishmentTier::Full => {
            let extra = rng.gen_range(10..=30);
            PunishmentAction {
                add_time_min: extra,
                coyote_pulse: true,
                force_hood: true,
                switch_video: true,
                message: format!(
                    "You keep testing limits. +{extra} minutes and refocused attention."
                ),
            }
        }
    }
}

/// Hardcore mode: always pulse, and pile another 5..=20 minutes onto any
/// response that was already adding time.
pub fn amplify_hardcore<R: Rng + ?Sized>(action: &mut PunishmentAction, rng: &mut R) {
    if action.add_time_min > 0 {
        action.add_time_min += rng.gen_range(5..=20);
    }
    action.coyote_pulse = true;
}

/// Fixed response to closing or refusing the session video.
pub fn video_interruption<R: Rng + ?Sized>(hardcore: bool, rng: &mut R) -> PunishmentAction {
    let mut extra = rng.gen_range(5..=30);
    if hardcore {
        extra += rng.gen_range(10..=30);
    }
    PunishmentAction {
        add_time_min: extra,
        coyote_pulse: true,
        force_hood: false,
        switch_video: false,
        message: format!("You tried to escape the focus. +{extra} minutes."),
    }
}
