//! LumiSense Firmware — Main Entry Point
//!
//! One synchronous control loop, sensors in, LEDs and telemetry out:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SensorHub (I²C, blocking)      microphone (PDM, async)      │
//! │       │                              │                       │
//! │       ▼                              ▼                       │
//! │  SensorSnapshot ──────────▶ ControlLoop (pure logic)         │
//! │                     motion classifier · LED arbiter          │
//! │       │                              │                       │
//! │       ▼                              ▼                       │
//! │  telemetry line              RgbLed · IndicatorLeds          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Required sensors (IMU, environmental pair, microphone) halt the boot
//! permanently when absent; the light/proximity sensor is optional.
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod error;
mod pins;

pub mod control;
mod drivers;
mod sensors;
mod telemetry;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
#[cfg(target_os = "espidf")]
use embedded_hal::delay::DelayNs;
use log::{error, info};

use config::SystemConfig;
use control::ControlLoop;
use drivers::indicator::IndicatorLeds;
use drivers::rgb_led::RgbLed;
use sensors::environment::EnvSensors;
use sensors::imu::Imu;
use sensors::light::LightSensor;
use sensors::microphone;
use sensors::SensorHub;
use telemetry::SerialSink;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  LumiSense v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    info!(
        "Board {:?}, telemetry {:?}, loop {} ms",
        config.revision, config.telemetry, config.loop_interval_ms
    );

    // ── 3. Peripheral bring-up ────────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        error!("HAL init failed: {} — halting", e);
        halt();
    }

    // ── 4. Sensor probes ──────────────────────────────────────
    // IMU, environmental pair, and microphone are required; a missing one
    // halts the boot permanently.  The light sensor is optional.
    let imu = match Imu::probe() {
        Ok(imu) => {
            info!("IMU: LSM9DS1 online");
            imu
        }
        Err(e) => {
            error!("IMU probe failed: {} — halting", e);
            halt();
        }
    };

    let env = match EnvSensors::probe() {
        Ok(env) => {
            info!("Environment: HTS221 + LPS22HB online");
            env
        }
        Err(e) => {
            error!("Environmental sensor probe failed: {} — halting", e);
            halt();
        }
    };

    let light = match LightSensor::probe() {
        Ok(light) => {
            info!("Light: APDS9960 online");
            Some(light)
        }
        Err(e) => {
            // Non-fatal: the hub runs without proximity/colour readings.
            log::warn!("Light sensor probe failed: {}", e);
            None
        }
    };

    if let Err(e) = microphone::start_capture(config.profile().audio_frame_len) {
        error!("Microphone start failed: {} — halting", e);
        halt();
    }

    let mut hub = SensorHub::new(imu, env, light);
    let mut control = ControlLoop::new();
    let mut rgb = RgbLed::new();
    let mut indicators = IndicatorLeds::new();
    let mut sink = SerialSink::new();
    let mut audio_frame = [0i16; microphone::FRAME_CAP];

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        // Sequential blocking reads; a stalled sensor stalls the loop.
        let snapshot = hub.read_all();

        // Take the frame published since the last iteration, if any.
        let frame = microphone::take_frame(&mut audio_frame);

        let plan = control.tick(
            &snapshot,
            frame.map(|len| &audio_frame[..len]),
            &config,
        );

        // Apply the plan.  `rgb: None` leaves the LED on its last colour.
        if let Some(color) = plan.rgb {
            rgb.set_color(color);
        }
        if plan.heartbeat_pulse {
            indicators.set_builtin(255);
        } else {
            indicators.set_builtin(plan.builtin_brightness);
        }
        indicators.set_power(plan.power_on);

        telemetry::emit(&mut sink, &config, &snapshot, control.last_peak());

        pace(config.loop_interval_ms);
    }
}

/// Permanent halt after a fatal boot error: the diagnostic line has been
/// logged, nothing else may run.
fn halt() -> ! {
    #[allow(clippy::empty_loop)]
    loop {}
}

/// Fixed end-of-iteration delay — the only throttling in the system.
#[cfg(target_os = "espidf")]
fn pace(interval_ms: u32) {
    esp_idf_hal::delay::FreeRtos.delay_ms(interval_ms);
}

#[cfg(not(target_os = "espidf"))]
fn pace(interval_ms: u32) {
    std::thread::sleep(std::time::Duration::from_millis(u64::from(interval_ms)));
}
