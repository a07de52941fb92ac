//! Integration tests: SensorSnapshot → ControlLoop → LED plan.
//!
//! Drives the full control pipeline on scripted snapshots, the way the
//! device's main loop does, and checks the arbitration contract end to
//! end: motion priority, decay hold, audio colour, heartbeat gating, and
//! the retain-previous-colour semantics against the RGB driver cache.

use lumisense::config::{BoardRevision, SystemConfig, TelemetryMode};
use lumisense::control::arbitration::LedPlan;
use lumisense::control::audio::{BLACK, RED};
use lumisense::control::ControlLoop;
use lumisense::drivers::rgb_led::RgbLed;
use lumisense::error::{Error, SensorError};
use lumisense::sensors::imu::{self, Imu};
use lumisense::sensors::SensorSnapshot;

fn config() -> SystemConfig {
    SystemConfig::default() // Rev2: divisor 8, decay 16, heartbeat 15
}

/// A snapshot with one gyro axis driven well past the activation level.
fn shaken(cfg: &SystemConfig, level: f32) -> SensorSnapshot {
    let mut s = SensorSnapshot::resting(cfg);
    s.gyro_dps[0] += level * cfg.profile().gyro_divisor;
    s
}

fn apply(rgb: &mut RgbLed, plan: &LedPlan) {
    if let Some(color) = plan.rgb {
        rgb.set_color(color);
    }
}

#[test]
fn resting_board_produces_no_rgb_write_and_power_on() {
    let cfg = config();
    let mut ctl = ControlLoop::new();
    let snapshot = SensorSnapshot::resting(&cfg);

    let plan = ctl.tick(&snapshot, None, &cfg);
    assert_eq!(plan.rgb, None, "nothing owns the LED on a quiet board");
    assert!(plan.power_on, "az = 0.5 g is below the tilt threshold");
    assert_eq!(plan.builtin_brightness, 230);
}

#[test]
fn audio_frame_on_quiet_board_colours_the_led() {
    let cfg = config();
    let mut ctl = ControlLoop::new();
    let snapshot = SensorSnapshot::resting(&cfg);

    let frame = [650i16, -100, 320];
    let plan = ctl.tick(&snapshot, Some(&frame), &cfg);
    assert_eq!(plan.rgb, Some(RED));
    assert_eq!(ctl.last_peak(), 650);
}

#[test]
fn silent_frame_writes_black() {
    let cfg = config();
    let mut ctl = ControlLoop::new();
    let snapshot = SensorSnapshot::resting(&cfg);

    let plan = ctl.tick(&snapshot, Some(&[0i16; 64]), &cfg);
    assert_eq!(plan.rgb, Some(BLACK));
}

#[test]
fn motion_overrides_audio_then_decays_for_exactly_sixteen_cycles() {
    let cfg = config();
    let mut ctl = ControlLoop::new();
    let mut rgb = RgbLed::new();

    // Gyro event: motion owns the LED even with a loud frame pending.
    let plan = ctl.tick(&shaken(&cfg, 120.0), Some(&[700i16]), &cfg);
    assert_eq!(plan.rgb, Some((120, 0, 0)));
    apply(&mut rgb, &plan);

    // Quiet cycles with loud frames: the decay hold keeps the motion
    // colour on the hardware for exactly the configured cycle count.
    let resting = SensorSnapshot::resting(&cfg);
    for cycle in 0..cfg.motion_decay_cycles {
        let plan = ctl.tick(&resting, Some(&[700i16]), &cfg);
        assert_eq!(plan.rgb, None, "cycle {cycle} must hold");
        apply(&mut rgb, &plan);
        assert_eq!(rgb.current_color(), (120, 0, 0));
    }

    // First cycle after the hold: audio wins again.
    let plan = ctl.tick(&resting, Some(&[700i16]), &cfg);
    assert_eq!(plan.rgb, Some(RED));
    apply(&mut rgb, &plan);
    assert_eq!(rgb.current_color(), RED);
}

#[test]
fn deviations_inside_dead_zone_retain_previous_colour() {
    let cfg = config();
    let mut ctl = ControlLoop::new();

    // Between the quiet level (2) and activation level (8): no owner.
    let plan = ctl.tick(&shaken(&cfg, 5.0), Some(&[700i16]), &cfg);
    assert_eq!(plan.rgb, None);
}

#[test]
fn heartbeat_pulses_at_the_revision_period_when_provably_idle() {
    let cfg = config();
    let period = cfg.profile().heartbeat_period_cycles;
    let mut ctl = ControlLoop::new();
    let mut snapshot = SensorSnapshot::resting(&cfg);
    snapshot.proximity = 200;

    let mut pulses = Vec::new();
    for cycle in 1..=period * 2 {
        let plan = ctl.tick(&snapshot, None, &cfg);
        if plan.heartbeat_pulse {
            pulses.push(cycle);
        }
        // The continuous proximity map keeps running underneath.
        assert_eq!(plan.builtin_brightness, 30);
    }
    assert_eq!(pulses, vec![period, period * 2]);
}

#[test]
fn heartbeat_suppressed_while_any_channel_is_busy() {
    let cfg = config();
    let period = cfg.profile().heartbeat_period_cycles;

    // Far proximity: counter wraps but no pulse ever fires.
    {
        let mut ctl = ControlLoop::new();
        let snapshot = SensorSnapshot::resting(&cfg);
        for _ in 0..period * 3 {
            assert!(!ctl.tick(&snapshot, None, &cfg).heartbeat_pulse);
        }
    }

    // A loud frame raises the carried-over peak above the band floor and
    // keeps suppressing the pulse on later silent cycles.
    {
        let mut ctl = ControlLoop::new();
        let mut snapshot = SensorSnapshot::resting(&cfg);
        snapshot.proximity = 200;
        let _ = ctl.tick(&snapshot, Some(&[700i16]), &cfg);
        for _ in 0..period * 3 {
            assert!(!ctl.tick(&snapshot, None, &cfg).heartbeat_pulse);
        }
    }

    // A decay hold from a motion event blocks the pulse until it expires.
    {
        let mut ctl = ControlLoop::new();
        let mut quiet = SensorSnapshot::resting(&cfg);
        quiet.proximity = 200;
        let _ = ctl.tick(&shaken(&cfg, 50.0), None, &cfg);
        for _ in 0..u32::from(cfg.motion_decay_cycles) {
            assert!(!ctl.tick(&quiet, None, &cfg).heartbeat_pulse);
        }
    }
}

#[test]
fn power_indicator_tracks_tilt_scenarios() {
    let cfg = config();
    let mut ctl = ControlLoop::new();
    let mut snapshot = SensorSnapshot::resting(&cfg);

    snapshot.accel_g[2] = 0.9; // scaled 229 ≥ 180
    assert!(!ctl.tick(&snapshot, None, &cfg).power_on);

    snapshot.accel_g[2] = 0.5; // scaled 127 < 180
    assert!(ctl.tick(&snapshot, None, &cfg).power_on);
}

#[test]
fn rev1_profile_scales_more_coarsely() {
    let mut cfg = config();
    cfg.revision = BoardRevision::Rev1;
    let mut ctl = ControlLoop::new();

    // The same deviation in deg/s maps to a 4× higher level on Rev1
    // (divisor 2 instead of 8).
    let mut s = SensorSnapshot::resting(&cfg);
    s.gyro_dps[1] += 80.0;
    let plan = ctl.tick(&s, None, &cfg);
    assert_eq!(plan.rgb, Some((0, 40, 0)));
}

#[test]
fn failed_imu_probe_is_a_fatal_init_error() {
    imu::sim_set_probe_fails(true);
    let result = Imu::probe();
    imu::sim_set_probe_fails(false);

    let err = result.err().expect("probe must fail");
    assert_eq!(Error::from(err), Error::Sensor(SensorError::NotResponding));
}

#[test]
fn default_config_matches_deployment_expectations() {
    let cfg = config();
    assert_eq!(cfg.revision, BoardRevision::Rev2);
    assert_eq!(cfg.telemetry, TelemetryMode::Plain);
    assert_eq!(cfg.profile().heartbeat_period_cycles, 15);
}
