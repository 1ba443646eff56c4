//! Head-tracking threshold generation.
//!
//! Two strategies share one contract:
//!
//! - **Midpoint**: each quantity sits at the floor midpoint of its bound.
//!   Deterministic, used when mistress control is off.
//! - **Randomized**: each quantity is drawn uniformly from its bound, then
//!   tightened per recorded violation and floored at the bound minimum.
//!
//! Inverted bounds (`max < min`) are healed to `max = min` before either
//! strategy runs.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::storage::HeadConfig;

/// Degrees of head pitch tolerance removed per violation.
pub const DOWN_DEG_STEP: u32 = 2;
/// Degrees of head yaw tolerance removed per violation.
pub const AWAY_DEG_STEP: u32 = 3;
/// Seconds of stillness tolerance removed per violation.
pub const STILL_SEC_STEP: u32 = 1;
/// Milliseconds of debounce removed per violation.
pub const DEBOUNCE_MS_STEP: u32 = 250;

/// Inclusive `(min, max)` range for one measured quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub min: u32,
    pub max: u32,
}

impl Bound {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Collapse an inverted bound onto its minimum.
    pub fn healed(self) -> Self {
        Self {
            min: self.min,
            max: self.max.max(self.min),
        }
    }

    pub fn midpoint(self) -> u32 {
        let b = self.healed();
        ((u64::from(b.min) + u64::from(b.max)) / 2) as u32
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        let b = self.healed();
        rng.gen_range(b.min..=b.max)
    }

    fn tighten(self, value: u32, violations: u32, step: u32) -> u32 {
        value
            .saturating_sub(violations.saturating_mul(step))
            .max(self.min)
    }
}

/// User-configured bounds for all four quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdBounds {
    pub down_deg: Bound,
    pub away_deg: Bound,
    pub still_sec: Bound,
    pub debounce_ms: Bound,
}

/// Concrete detection thresholds handed to the tracking front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub down_deg: u32,
    pub away_deg: u32,
    pub still_sec: u32,
    pub debounce_ms: u32,
}

/// Deterministic strategy.
pub fn midpoint_thresholds(bounds: &ThresholdBounds) -> ThresholdSet {
    ThresholdSet {
        down_deg: bounds.down_deg.midpoint(),
        away_deg: bounds.away_deg.midpoint(),
        still_sec: bounds.still_sec.midpoint(),
        debounce_ms: bounds.debounce_ms.midpoint(),
    }
}

/// Randomized strategy, stricter with every recorded violation.
pub fn randomized_thresholds<R: Rng + ?Sized>(
    bounds: &ThresholdBounds,
    violation_count: u32,
    rng: &mut R,
) -> ThresholdSet {
    let down = bounds.down_deg.sample(rng);
    let away = bounds.away_deg.sample(rng);
    let still = bounds.still_sec.sample(rng);
    let debounce = bounds.debounce_ms.sample(rng);

    ThresholdSet {
        down_deg: bounds.down_deg.tighten(down, violation_count, DOWN_DEG_STEP),
        away_deg: bounds.away_deg.tighten(away, violation_count, AWAY_DEG_STEP),
        still_sec: bounds.still_sec.tighten(still, violation_count, STILL_SEC_STEP),
        debounce_ms: bounds
            .debounce_ms
            .tighten(debounce, violation_count, DEBOUNCE_MS_STEP),
    }
}

/// Pick a strategy by the mistress-control dial.
pub fn generate<R: Rng + ?Sized>(
    bounds: &ThresholdBounds,
    mistress_control: bool,
    violation_count: u32,
    rng: &mut R,
) -> ThresholdSet {
    if mistress_control {
        randomized_thresholds(bounds, violation_count, rng)
    } else {
        midpoint_thresholds(bounds)
    }
}

/// Thresholds for the current head configuration, or `None` when head
/// tracking is switched off and violation detection is meaningless.
pub fn thresholds_for<R: Rng + ?Sized>(
    head: &HeadConfig,
    violation_count: u32,
    rng: &mut R,
) -> Option<ThresholdSet> {
    if !head.tracking_enabled {
        return None;
    }
    Some(generate(
        &head.bounds(),
        head.mistress_control,
        violation_count,
        rng,
    ))
}
