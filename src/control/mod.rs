//! Control core — pure logic between sensor snapshots and LED commands.
//!
//! [`ControlLoop`] is the explicit loop-state struct threaded through every
//! iteration: the decay timer, heartbeat counter, and carried-over peak all
//! live here rather than in module statics, so the whole pipeline runs on
//! the host under `cargo test`.

pub mod arbitration;
pub mod audio;
pub mod motion;

use arbitration::{ArbiterInputs, LedArbiter, LedPlan};
use motion::MotionClassifier;

use crate::config::SystemConfig;
use crate::sensors::SensorSnapshot;

/// Colour as (R, G, B) tuple, each 0 – 255.
pub type Rgb = (u8, u8, u8);

/// All per-iteration control state.
pub struct ControlLoop {
    motion: MotionClassifier,
    arbiter: LedArbiter,
    /// Peak of the most recently consumed frame; carried across cycles
    /// with no delivery for telemetry and the heartbeat idle check.
    last_peak: u16,
}

impl ControlLoop {
    pub fn new() -> Self {
        Self {
            motion: MotionClassifier::new(),
            arbiter: LedArbiter::new(),
            last_peak: 0,
        }
    }

    /// Run one control iteration.
    ///
    /// `audio_frame` is the frame consumed this cycle, if the capture side
    /// published one since the last call.  The colour-selection branch only
    /// runs on a fresh frame; a stale peak feeds telemetry alone.
    pub fn tick(
        &mut self,
        snapshot: &SensorSnapshot,
        audio_frame: Option<&[i16]>,
        cfg: &SystemConfig,
    ) -> LedPlan {
        let profile = cfg.profile();

        let assessment = self.motion.assess(snapshot.gyro_dps, profile, cfg);

        let fresh_peak = audio_frame.map(audio::peak_amplitude);
        if let Some(peak) = fresh_peak {
            self.last_peak = peak;
        }

        let inputs = ArbiterInputs {
            motion: &assessment,
            fresh_peak,
            last_peak: self.last_peak,
            proximity: snapshot.proximity,
            az_g: snapshot.accel_g[2],
            bands: profile.audio_bands,
        };
        self.arbiter.tick(&inputs, cfg)
    }

    /// The telemetry value for peak amplitude (fresh or carried over).
    pub fn last_peak(&self) -> u16 {
        self.last_peak
    }
}
