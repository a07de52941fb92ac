//! System configuration parameters
//!
//! All tunable parameters for the LumiSense firmware, plus the two board
//! revision profiles.  The revision is a runtime value: a single build
//! targets either board, and picking a [`BoardRevision`] selects the
//! matching constant [`RevisionProfile`] (calibration offsets, scaling
//! divisor, audio frame length, heartbeat period, colour bands).

use serde::{Deserialize, Serialize};

use crate::control::audio::{AudioBand, REV1_AUDIO_BANDS, REV2_AUDIO_BANDS};

// ---------------------------------------------------------------------------
// Board revisions
// ---------------------------------------------------------------------------

/// Hardware revision of the LumiSense board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardRevision {
    /// First production run — coarse gyro scaling, 256-sample audio frames.
    Rev1,
    /// Second run — finer gyro scaling, 1024-sample audio frames.
    Rev2,
}

impl BoardRevision {
    /// The constant tuning profile for this revision.
    pub const fn profile(self) -> &'static RevisionProfile {
        match self {
            Self::Rev1 => &REV1_PROFILE,
            Self::Rev2 => &REV2_PROFILE,
        }
    }
}

/// Per-revision tuning constants, fixed at the factory.
pub struct RevisionProfile {
    /// Gyroscope zero-rate offsets (roll, pitch, yaw) in deg/s, measured
    /// per revision on a rate table.
    pub gyro_offsets_dps: [f32; 3],
    /// Divisor mapping absolute gyro deviation (deg/s) to an LED level.
    pub gyro_divisor: f32,
    /// Samples per published audio frame.
    pub audio_frame_len: usize,
    /// Idle cycles between heartbeat pulses.
    pub heartbeat_period_cycles: u32,
    /// Peak-amplitude colour bands, thresholds strictly descending.
    pub audio_bands: &'static [AudioBand],
}

pub const REV1_PROFILE: RevisionProfile = RevisionProfile {
    gyro_offsets_dps: [-1.25, 0.75, -0.50],
    gyro_divisor: 2.0,
    audio_frame_len: 256,
    heartbeat_period_cycles: 8,
    audio_bands: REV1_AUDIO_BANDS,
};

pub const REV2_PROFILE: RevisionProfile = RevisionProfile {
    gyro_offsets_dps: [-0.50, 1.25, 0.25],
    gyro_divisor: 8.0,
    audio_frame_len: 1024,
    heartbeat_period_cycles: 15,
    audio_bands: REV2_AUDIO_BANDS,
};

// ---------------------------------------------------------------------------
// Telemetry mode
// ---------------------------------------------------------------------------

/// What the telemetry emitter writes each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryMode {
    /// Nothing is sent.
    Off,
    /// Space-separated values only.
    Plain,
    /// Each value prefixed with its field name.
    Labelled,
}

// ---------------------------------------------------------------------------
// System configuration
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Board ---
    /// Which hardware revision this unit is.
    pub revision: BoardRevision,

    // --- Telemetry ---
    /// Telemetry output mode.
    pub telemetry: TelemetryMode,

    // --- Motion thresholds (scaled LED-level units, 0 – 255) ---
    /// Any axis above this level counts as active motion.
    pub motion_activate_level: u8,
    /// All axes at or below this level count as quiet.  Must be strictly
    /// below the activation level — the gap is the arbitration dead zone.
    pub motion_quiet_level: u8,
    /// Idle cycles the motion colour is held after activity stops.
    pub motion_decay_cycles: u8,

    // --- Tilt ---
    /// Scaled Z-axis tilt (0 – 255) at or above which the power indicator
    /// turns off.
    pub tilt_power_threshold: u8,

    // --- Heartbeat ---
    /// Minimum proximity reading for the heartbeat pulse to fire.
    pub heartbeat_proximity_min: u8,

    // --- Timing ---
    /// Control loop interval (milliseconds).
    pub loop_interval_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            revision: BoardRevision::Rev2,
            telemetry: TelemetryMode::Plain,

            motion_activate_level: 8,
            motion_quiet_level: 2,
            motion_decay_cycles: 16,

            tilt_power_threshold: 180,

            heartbeat_proximity_min: 120,

            loop_interval_ms: 25, // ~40 Hz
        }
    }
}

impl SystemConfig {
    /// The revision profile selected by this configuration.
    pub fn profile(&self) -> &'static RevisionProfile {
        self.revision.profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.motion_activate_level > 0);
        assert!(c.motion_decay_cycles > 0);
        assert!(c.loop_interval_ms > 0);
        assert!(c.tilt_power_threshold > 0);
    }

    #[test]
    fn quiet_below_activate_invariant() {
        let c = SystemConfig::default();
        assert!(
            c.motion_quiet_level < c.motion_activate_level,
            "quiet level must be strictly below activation to form a dead zone"
        );
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.revision, c2.revision);
        assert_eq!(c.telemetry, c2.telemetry);
        assert_eq!(c.motion_decay_cycles, c2.motion_decay_cycles);
        assert_eq!(c.loop_interval_ms, c2.loop_interval_ms);
    }

    #[test]
    fn profiles_have_descending_band_thresholds() {
        for profile in [&REV1_PROFILE, &REV2_PROFILE] {
            let bands = profile.audio_bands;
            assert!(!bands.is_empty());
            for pair in bands.windows(2) {
                assert!(
                    pair[0].threshold > pair[1].threshold,
                    "bands must be strictly descending for first-match-wins lookup"
                );
            }
        }
    }

    #[test]
    fn profiles_differ_where_expected() {
        assert!(REV1_PROFILE.gyro_divisor < REV2_PROFILE.gyro_divisor);
        assert!(REV1_PROFILE.audio_frame_len < REV2_PROFILE.audio_frame_len);
        assert_ne!(
            REV1_PROFILE.heartbeat_period_cycles,
            REV2_PROFILE.heartbeat_period_cycles
        );
    }

    #[test]
    fn frame_lengths_fit_the_sample_store() {
        use crate::sensors::microphone::FRAME_CAP;
        assert!(REV1_PROFILE.audio_frame_len <= FRAME_CAP);
        assert!(REV2_PROFILE.audio_frame_len <= FRAME_CAP);
    }
}
