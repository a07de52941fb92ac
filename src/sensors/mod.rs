//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every wired sensor driver and produces a
//! [`SensorSnapshot`] each iteration for the control core and the
//! telemetry emitter.  The microphone is not part of the hub: its capture
//! side runs asynchronously and hands frames over through
//! [`microphone::take_frame`].

pub mod environment;
pub mod imu;
pub mod light;
pub mod microphone;

use log::warn;

use environment::EnvSensors;
use imu::Imu;
use light::LightSensor;

use crate::config::SystemConfig;

/// A point-in-time snapshot of every polled sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorSnapshot {
    /// Acceleration (X, Y, Z) in g.
    pub accel_g: [f32; 3],
    /// Angular rate (roll, pitch, yaw) in deg/s, uncorrected.
    pub gyro_dps: [f32; 3],
    /// Magnetic field (X, Y, Z) in gauss.
    pub mag_gauss: [f32; 3],

    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// Absolute pressure in kPa.
    pub pressure_kpa: f32,

    /// 0 (far) – 255 (touching); zero while the light sensor is absent.
    pub proximity: u8,
    /// Raw colour channel counts (R, G, B).
    pub color: [u16; 3],
    /// False when the optional light sensor failed its probe.
    pub light_available: bool,
}

impl SensorSnapshot {
    /// A board at rest: gyro exactly on its calibration offsets, flat on
    /// a desk (az ≈ 0.5 g on this enclosure), quiet room.  Test scenarios
    /// start from here and perturb single channels.
    pub fn resting(cfg: &SystemConfig) -> Self {
        Self {
            accel_g: [0.0, 0.0, 0.5],
            gyro_dps: cfg.profile().gyro_offsets_dps,
            mag_gauss: [0.21, -0.05, 0.43],
            temperature_c: 24.8,
            humidity_pct: 41.0,
            pressure_kpa: 100.9,
            proximity: 0,
            color: [48, 52, 40],
            light_available: true,
        }
    }
}

/// Aggregates the wired sensors and produces a unified snapshot.
pub struct SensorHub {
    imu: Imu,
    env: EnvSensors,
    /// `None` when the optional sensor failed its probe at boot.
    light: Option<LightSensor>,
}

impl SensorHub {
    /// Construct a new hub.  Pass in pre-probed drivers (probed in main,
    /// where required-sensor failures halt the boot).  A missing light
    /// sensor is logged once here and tolerated for the rest of the run.
    pub fn new(imu: Imu, env: EnvSensors, light: Option<LightSensor>) -> Self {
        if light.is_none() {
            warn!("light/proximity sensor unavailable — readings stay at zero");
        }
        Self { imu, env, light }
    }

    /// Read every wired sensor, blocking on each until data is ready.
    pub fn read_all(&mut self) -> SensorSnapshot {
        let motion = self.imu.read();
        let env = self.env.read();
        let light = self.light.as_mut().map(light::LightSensor::read);

        SensorSnapshot {
            accel_g: motion.accel_g,
            gyro_dps: motion.gyro_dps,
            mag_gauss: motion.mag_gauss,
            temperature_c: env.temperature_c,
            humidity_pct: env.humidity_pct,
            pressure_kpa: env.pressure_kpa,
            proximity: light.map_or(0, |l| l.proximity),
            color: light.map_or([0; 3], |l| l.color),
            light_available: self.light.is_some(),
        }
    }
}
