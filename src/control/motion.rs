//! Motion classification from calibrated angular-rate deviations.
//!
//! Two-level state machine: an instantaneous per-axis threshold check plus
//! a decay timer that keeps the system "recently active" after the
//! instantaneous check clears.  The decay hold stops audio-driven colour
//! from flickering in the moment a gyro event ends.
//!
//! ```text
//!        any axis > activate            timer reaches 0
//!  Idle ────────────────────▶ Active      Decaying ──────▶ Idle
//!   ▲                           │            ▲  │
//!   └───────────(hold N cycles)─┴────────────┘  └──▶ Active (re-arm)
//! ```
//!
//! Static tilt is classified separately: the Z acceleration axis scaled to
//! 0 – 255 gates the power-indicator LED.

use crate::config::{RevisionProfile, SystemConfig};

/// Classifier state for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MotionState {
    /// No recent motion; audio may own the RGB LED.
    Idle = 0,
    /// The instantaneous check fired this cycle.
    Active = 1,
    /// Activity stopped but the decay timer is still holding.
    Decaying = 2,
}

/// Per-cycle classifier output.
#[derive(Debug, Clone, Copy)]
pub struct MotionAssessment {
    pub state: MotionState,
    /// Scaled absolute deviation per axis (roll, pitch, yaw), 0 – 255.
    pub levels: [u8; 3],
    /// All three axes at or below the quiet threshold.
    pub quiet: bool,
}

/// Hysteresis classifier.  `decay_left` persists across cycles; everything
/// else is recomputed each call.
pub struct MotionClassifier {
    state: MotionState,
    decay_left: u8,
}

impl MotionClassifier {
    pub fn new() -> Self {
        Self {
            state: MotionState::Idle,
            decay_left: 0,
        }
    }

    /// Classify one cycle of raw gyro readings (deg/s, uncorrected).
    ///
    /// Re-arms the decay timer to its maximum on every active cycle; on
    /// quiet cycles the timer is consumed first, so the hold lasts exactly
    /// `motion_decay_cycles` iterations after the last active one.
    pub fn assess(
        &mut self,
        gyro_dps: [f32; 3],
        profile: &RevisionProfile,
        cfg: &SystemConfig,
    ) -> MotionAssessment {
        let levels = scaled_deviations(gyro_dps, profile);

        let active_now = levels.iter().any(|&l| l > cfg.motion_activate_level);
        let quiet = levels.iter().all(|&l| l <= cfg.motion_quiet_level);

        if active_now {
            self.state = MotionState::Active;
            self.decay_left = cfg.motion_decay_cycles;
        } else if self.decay_left > 0 {
            self.decay_left -= 1;
            self.state = MotionState::Decaying;
        } else {
            self.state = MotionState::Idle;
        }

        MotionAssessment {
            state: self.state,
            levels,
            quiet,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Cycles of hold remaining (zero outside Active/Decaying).
    pub fn decay_left(&self) -> u8 {
        self.decay_left
    }
}

/// `|raw - offset| / divisor` per axis, clamped to 0 – 255.
fn scaled_deviations(gyro_dps: [f32; 3], profile: &RevisionProfile) -> [u8; 3] {
    let mut levels = [0u8; 3];
    for (i, level) in levels.iter_mut().enumerate() {
        let dev = (gyro_dps[i] - profile.gyro_offsets_dps[i]).abs();
        *level = (dev / profile.gyro_divisor).min(255.0) as u8;
    }
    levels
}

// ---------------------------------------------------------------------------
// Static tilt
// ---------------------------------------------------------------------------

/// Z acceleration (g) scaled to 0 – 255, truncating.  Negative values
/// clamp to zero.
pub fn tilt_level(az_g: f32) -> u8 {
    (az_g * 255.0).clamp(0.0, 255.0) as u8
}

/// The power indicator is lit while the scaled tilt is below the
/// threshold (the pin itself is active-low on the board).
pub fn power_indicator_on(az_g: f32, threshold: u8) -> bool {
    tilt_level(az_g) < threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardRevision;

    fn cfg() -> SystemConfig {
        SystemConfig::default()
    }

    fn profile() -> &'static RevisionProfile {
        BoardRevision::Rev2.profile()
    }

    /// A gyro triple sitting exactly on the calibration offsets.
    fn quiet_gyro() -> [f32; 3] {
        profile().gyro_offsets_dps
    }

    /// A triple with one axis well past the activation threshold.
    fn loud_gyro() -> [f32; 3] {
        let mut g = quiet_gyro();
        g[0] += 100.0 * profile().gyro_divisor;
        g
    }

    #[test]
    fn offsets_classify_as_quiet_idle() {
        let mut c = MotionClassifier::new();
        let a = c.assess(quiet_gyro(), profile(), &cfg());
        assert_eq!(a.state, MotionState::Idle);
        assert!(a.quiet);
        assert_eq!(a.levels, [0, 0, 0]);
    }

    #[test]
    fn threshold_crossing_activates() {
        let mut c = MotionClassifier::new();
        let a = c.assess(loud_gyro(), profile(), &cfg());
        assert_eq!(a.state, MotionState::Active);
        assert_eq!(a.levels[0], 100);
        assert!(!a.quiet);
    }

    #[test]
    fn decay_holds_exactly_configured_cycles() {
        let mut c = MotionClassifier::new();
        let conf = cfg();
        c.assess(loud_gyro(), profile(), &conf);

        for i in 0..conf.motion_decay_cycles {
            let a = c.assess(quiet_gyro(), profile(), &conf);
            assert_eq!(a.state, MotionState::Decaying, "cycle {i} must hold");
        }
        let a = c.assess(quiet_gyro(), profile(), &conf);
        assert_eq!(a.state, MotionState::Idle);
    }

    #[test]
    fn reactivation_during_decay_rearms_timer() {
        let mut c = MotionClassifier::new();
        let conf = cfg();
        c.assess(loud_gyro(), profile(), &conf);
        c.assess(quiet_gyro(), profile(), &conf);
        assert_eq!(c.state(), MotionState::Decaying);

        c.assess(loud_gyro(), profile(), &conf);
        assert_eq!(c.state(), MotionState::Active);
        assert_eq!(c.decay_left(), conf.motion_decay_cycles);
    }

    #[test]
    fn level_saturates_at_255() {
        let mut g = quiet_gyro();
        g[2] += 10_000.0 * profile().gyro_divisor;
        let levels = scaled_deviations(g, profile());
        assert_eq!(levels[2], 255);
    }

    #[test]
    fn tilt_scenarios_from_acceptance() {
        // 0.9 g → 229 ≥ 180 → indicator off; 0.5 g → 127 < 180 → on.
        assert_eq!(tilt_level(0.9), 229);
        assert!(!power_indicator_on(0.9, 180));
        assert_eq!(tilt_level(0.5), 127);
        assert!(power_indicator_on(0.5, 180));
    }

    #[test]
    fn tilt_clamps_out_of_range() {
        assert_eq!(tilt_level(-0.4), 0);
        assert_eq!(tilt_level(1.6), 255);
    }
}
