//! LED arbitration — decides which input owns each LED channel this cycle.
//!
//! The RGB LED is the one contended output.  Strict priority:
//!
//! 1. **Active motion** — colour is the scaled deviation triple.
//! 2. **Fresh audio peak** — only when the classifier is fully idle (no
//!    decay hold) *and* every axis is inside the quiet dead zone *and* a
//!    frame was consumed this cycle.  Colour comes from the band table.
//! 3. **Neither** — no write; the LED keeps its previous colour.
//!
//! The builtin LED is driven continuously from proximity
//! (`230 - proximity`, clamped) and pulsed to full brightness once per
//! heartbeat period, but only when every input channel is provably idle.
//! The power LED tracks the static tilt check and nothing else.

use super::audio::{self, AudioBand};
use super::motion::{MotionAssessment, MotionState, power_indicator_on};
use super::Rgb;
use crate::config::SystemConfig;

/// Baseline for the proximity → builtin-LED brightness map.
const PROXIMITY_BRIGHTNESS_BASE: u8 = 230;

/// Per-cycle LED outputs.  `rgb == None` means "do not write" — the
/// hardware keeps whatever colour it last showed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedPlan {
    pub rgb: Option<Rgb>,
    /// Continuous builtin-LED brightness from the proximity map.
    pub builtin_brightness: u8,
    /// Momentary full-brightness override of the builtin LED.
    pub heartbeat_pulse: bool,
    pub power_on: bool,
}

/// Inputs the arbiter needs for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct ArbiterInputs<'a> {
    pub motion: &'a MotionAssessment,
    /// Peak of the frame consumed this cycle, if one was published.
    pub fresh_peak: Option<u16>,
    /// Peak carried over for idle checks when no frame arrived.
    pub last_peak: u16,
    pub proximity: u8,
    pub az_g: f32,
    pub bands: &'a [AudioBand],
}

/// Owns the heartbeat cycle counter; everything else is stateless.
pub struct LedArbiter {
    heartbeat_cycles: u32,
}

impl LedArbiter {
    pub fn new() -> Self {
        Self { heartbeat_cycles: 0 }
    }

    pub fn tick(&mut self, inputs: &ArbiterInputs<'_>, cfg: &SystemConfig) -> LedPlan {
        let rgb = select_rgb(inputs);

        let builtin_brightness = proximity_brightness(inputs.proximity);

        // The counter runs every cycle and wraps at the revision period;
        // the pulse fires at the wrap point only if the whole system is
        // idle at that instant.
        self.heartbeat_cycles += 1;
        let mut heartbeat_pulse = false;
        if self.heartbeat_cycles >= cfg.profile().heartbeat_period_cycles {
            self.heartbeat_cycles = 0;
            heartbeat_pulse = system_idle(inputs, cfg);
        }

        LedPlan {
            rgb,
            builtin_brightness,
            heartbeat_pulse,
            power_on: power_indicator_on(inputs.az_g, cfg.tilt_power_threshold),
        }
    }
}

/// Priority selection for the shared RGB LED.
fn select_rgb(inputs: &ArbiterInputs<'_>) -> Option<Rgb> {
    match inputs.motion.state {
        MotionState::Active => {
            let [r, p, y] = inputs.motion.levels;
            Some((r, p, y))
        }
        MotionState::Idle if inputs.motion.quiet => inputs
            .fresh_peak
            .map(|peak| audio::color_for_peak(inputs.bands, peak)),
        // Decaying, or idle but outside the dead zone: hold.
        _ => None,
    }
}

/// `clamp(230 - proximity, 0, 255)` — monotonically decreasing.
pub fn proximity_brightness(proximity: u8) -> u8 {
    PROXIMITY_BRIGHTNESS_BASE.saturating_sub(proximity)
}

/// Idle across every input channel: near proximity, quiet gyro on all
/// axes, last peak under the quietest band, and no decay hold.
fn system_idle(inputs: &ArbiterInputs<'_>, cfg: &SystemConfig) -> bool {
    inputs.proximity > cfg.heartbeat_proximity_min
        && inputs.motion.quiet
        && inputs.motion.state == MotionState::Idle
        && inputs.last_peak < audio::floor_threshold(inputs.bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::audio::{RED, REV2_AUDIO_BANDS};

    fn idle_motion() -> MotionAssessment {
        MotionAssessment {
            state: MotionState::Idle,
            levels: [0, 0, 0],
            quiet: true,
        }
    }

    fn inputs<'a>(motion: &'a MotionAssessment) -> ArbiterInputs<'a> {
        ArbiterInputs {
            motion,
            fresh_peak: None,
            last_peak: 0,
            proximity: 0,
            az_g: 0.5,
            bands: REV2_AUDIO_BANDS,
        }
    }

    #[test]
    fn active_motion_owns_the_led() {
        let motion = MotionAssessment {
            state: MotionState::Active,
            levels: [120, 30, 5],
            quiet: false,
        };
        let mut i = inputs(&motion);
        i.fresh_peak = Some(650); // loses to motion
        assert_eq!(select_rgb(&i), Some((120, 30, 5)));
    }

    #[test]
    fn quiet_idle_with_fresh_peak_selects_audio() {
        let motion = idle_motion();
        let mut i = inputs(&motion);
        i.fresh_peak = Some(650);
        assert_eq!(select_rgb(&i), Some(RED));
    }

    #[test]
    fn decaying_holds_previous_colour() {
        let motion = MotionAssessment {
            state: MotionState::Decaying,
            levels: [0, 0, 0],
            quiet: true,
        };
        let mut i = inputs(&motion);
        i.fresh_peak = Some(650);
        assert_eq!(select_rgb(&i), None);
    }

    #[test]
    fn stale_peak_never_drives_colour() {
        let motion = idle_motion();
        let mut i = inputs(&motion);
        i.last_peak = 650;
        assert_eq!(select_rgb(&i), None);
    }

    #[test]
    fn idle_outside_dead_zone_holds() {
        // Deviations between quiet and activation thresholds: no owner.
        let motion = MotionAssessment {
            state: MotionState::Idle,
            levels: [5, 0, 0],
            quiet: false,
        };
        let mut i = inputs(&motion);
        i.fresh_peak = Some(650);
        assert_eq!(select_rgb(&i), None);
    }

    #[test]
    fn brightness_map_endpoints() {
        assert_eq!(proximity_brightness(0), 230);
        assert_eq!(proximity_brightness(230), 0);
        assert_eq!(proximity_brightness(255), 0);
    }

    #[test]
    fn heartbeat_fires_at_period_when_idle() {
        let cfg = SystemConfig::default();
        let period = cfg.profile().heartbeat_period_cycles;
        let motion = idle_motion();
        let mut i = inputs(&motion);
        i.proximity = 200;

        let mut arbiter = LedArbiter::new();
        for cycle in 1..period {
            let plan = arbiter.tick(&i, &cfg);
            assert!(!plan.heartbeat_pulse, "cycle {cycle} is before the period");
        }
        let plan = arbiter.tick(&i, &cfg);
        assert!(plan.heartbeat_pulse);
    }

    #[test]
    fn heartbeat_suppressed_by_any_violated_condition() {
        let cfg = SystemConfig::default();
        let period = cfg.profile().heartbeat_period_cycles;
        let floor = audio::floor_threshold(REV2_AUDIO_BANDS);

        let near_motion = idle_motion();
        let decaying = MotionAssessment {
            state: MotionState::Decaying,
            levels: [0, 0, 0],
            quiet: true,
        };
        let unquiet = MotionAssessment {
            state: MotionState::Idle,
            levels: [3, 0, 0],
            quiet: false,
        };

        let mut far = inputs(&near_motion);
        far.proximity = 10; // below the proximity gate

        let mut loud = inputs(&near_motion);
        loud.proximity = 200;
        loud.last_peak = floor; // at the floor is not below it

        let mut held = inputs(&decaying);
        held.proximity = 200;

        let mut shaky = inputs(&unquiet);
        shaky.proximity = 200;

        for i in [far, loud, held, shaky] {
            let mut arbiter = LedArbiter::new();
            for _ in 0..period * 3 {
                assert!(!arbiter.tick(&i, &cfg).heartbeat_pulse);
            }
        }
    }

    #[test]
    fn power_indicator_follows_tilt() {
        let cfg = SystemConfig::default();
        let motion = idle_motion();
        let mut arbiter = LedArbiter::new();

        let mut i = inputs(&motion);
        i.az_g = 0.5;
        assert!(arbiter.tick(&i, &cfg).power_on);
        i.az_g = 0.9;
        assert!(!arbiter.tick(&i, &cfg).power_on);
    }
}
