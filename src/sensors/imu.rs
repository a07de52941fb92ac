#![cfg_attr(not(target_os = "espidf"), allow(dead_code))] // register map is device-only

//! LSM9DS1 9-axis IMU driver (accelerometer + gyroscope + magnetometer).
//!
//! Two dies behind two I²C addresses: accel/gyro at 0x6B, magnetometer at
//! 0x1E.  The probe verifies both WHO_AM_I registers and configures
//! continuous output; reads spin-wait on the data-ready status bits and
//! burst-read six output bytes per sensor.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: register access through the hw_init I²C helpers.
//! On host/test: reads engineering-unit values from simulation atomics.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;

// ── Addresses and registers ───────────────────────────────────

const ADDR_AG: u8 = 0x6B;
const ADDR_MAG: u8 = 0x1E;

const REG_WHO_AM_I: u8 = 0x0F;
const CHIP_ID_AG: u8 = 0x68;
const CHIP_ID_MAG: u8 = 0x3D;

/// 119 Hz ODR, 2000 dps full scale.
const REG_CTRL_REG1_G: u8 = 0x10;
const CTRL_REG1_G_119HZ_2000DPS: u8 = 0x78;
/// 119 Hz ODR, ±4 g full scale.
const REG_CTRL_REG6_XL: u8 = 0x20;
const CTRL_REG6_XL_119HZ_4G: u8 = 0x70;

const REG_STATUS_AG: u8 = 0x17;
const STATUS_XLDA: u8 = 0x01;
const STATUS_GDA: u8 = 0x02;

const REG_OUT_X_L_G: u8 = 0x18;
const REG_OUT_X_L_XL: u8 = 0x28;

/// Temperature compensation on, ultra-high-performance XY, 20 Hz.
const REG_CTRL_REG1_M: u8 = 0x20;
const CTRL_REG1_M_UHP_20HZ: u8 = 0xB4;
/// Continuous-conversion mode.
const REG_CTRL_REG3_M: u8 = 0x22;
const CTRL_REG3_M_CONTINUOUS: u8 = 0x00;

const REG_STATUS_M: u8 = 0x27;
const STATUS_M_ZYXDA: u8 = 0x08;
const REG_OUT_X_L_M: u8 = 0x28;

// ── Scale factors ─────────────────────────────────────────────

/// ±4 g over the signed 16-bit range.
const ACCEL_G_PER_LSB: f32 = 4.0 / 32_768.0;
/// ±2000 dps over the signed 16-bit range.
const GYRO_DPS_PER_LSB: f32 = 2_000.0 / 32_768.0;
/// Telemetry magnetometer scale: 100 counts per gauss.
const MAG_LSB_PER_GAUSS: f32 = 100.0;

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_ACCEL_G: [AtomicU32; 3] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];
#[cfg(not(target_os = "espidf"))]
static SIM_GYRO_DPS: [AtomicU32; 3] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];
#[cfg(not(target_os = "espidf"))]
static SIM_MAG_GAUSS: [AtomicU32; 3] = [
    AtomicU32::new(0),
    AtomicU32::new(0),
    AtomicU32::new(0),
];

#[cfg(not(target_os = "espidf"))]
fn sim_store(cells: &[AtomicU32; 3], values: [f32; 3]) {
    for (cell, v) in cells.iter().zip(values) {
        cell.store(v.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(not(target_os = "espidf"))]
fn sim_load(cells: &[AtomicU32; 3]) -> [f32; 3] {
    let mut out = [0.0f32; 3];
    for (slot, cell) in out.iter_mut().zip(cells) {
        *slot = f32::from_bits(cell.load(Ordering::Relaxed));
    }
    out
}

/// Host-side switch for boot-failure scenarios.
#[cfg(not(target_os = "espidf"))]
static SIM_PROBE_FAILS: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_probe_fails(fails: bool) {
    SIM_PROBE_FAILS.store(fails, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_accel_g(values: [f32; 3]) {
    sim_store(&SIM_ACCEL_G, values);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gyro_dps(values: [f32; 3]) {
    sim_store(&SIM_GYRO_DPS, values);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_mag_gauss(values: [f32; 3]) {
    sim_store(&SIM_MAG_GAUSS, values);
}

// ── Driver ────────────────────────────────────────────────────

/// One full 9-axis reading in engineering units.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImuReading {
    pub accel_g: [f32; 3],
    /// Raw (uncorrected) angular rate; calibration offsets are applied by
    /// the consumers.
    pub gyro_dps: [f32; 3],
    pub mag_gauss: [f32; 3],
}

pub struct Imu {
    _private: (),
}

impl Imu {
    /// Verify both dies and configure continuous output.
    #[cfg(target_os = "espidf")]
    pub fn probe() -> Result<Self, SensorError> {
        if hw_init::i2c_read_reg(ADDR_AG, REG_WHO_AM_I)? != CHIP_ID_AG {
            return Err(SensorError::BadChipId);
        }
        if hw_init::i2c_read_reg(ADDR_MAG, REG_WHO_AM_I)? != CHIP_ID_MAG {
            return Err(SensorError::BadChipId);
        }

        hw_init::i2c_write_reg(ADDR_AG, REG_CTRL_REG1_G, CTRL_REG1_G_119HZ_2000DPS)?;
        hw_init::i2c_write_reg(ADDR_AG, REG_CTRL_REG6_XL, CTRL_REG6_XL_119HZ_4G)?;
        hw_init::i2c_write_reg(ADDR_MAG, REG_CTRL_REG1_M, CTRL_REG1_M_UHP_20HZ)?;
        hw_init::i2c_write_reg(ADDR_MAG, REG_CTRL_REG3_M, CTRL_REG3_M_CONTINUOUS)?;

        Ok(Self { _private: () })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn probe() -> Result<Self, SensorError> {
        if SIM_PROBE_FAILS.load(Ordering::Relaxed) {
            return Err(SensorError::NotResponding);
        }
        Ok(Self { _private: () })
    }

    /// Blocking read of all nine axes.  Spin-waits on each data-ready bit
    /// with no timeout — a stalled die hangs the control loop by design.
    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> ImuReading {
        wait_for_status(ADDR_AG, REG_STATUS_AG, STATUS_XLDA);
        let accel = read_axes(ADDR_AG, REG_OUT_X_L_XL);

        wait_for_status(ADDR_AG, REG_STATUS_AG, STATUS_GDA);
        let gyro = read_axes(ADDR_AG, REG_OUT_X_L_G);

        wait_for_status(ADDR_MAG, REG_STATUS_M, STATUS_M_ZYXDA);
        let mag = read_axes(ADDR_MAG, REG_OUT_X_L_M);

        ImuReading {
            accel_g: scale(accel, ACCEL_G_PER_LSB),
            gyro_dps: scale(gyro, GYRO_DPS_PER_LSB),
            mag_gauss: scale(mag, 1.0 / MAG_LSB_PER_GAUSS),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> ImuReading {
        ImuReading {
            accel_g: sim_load(&SIM_ACCEL_G),
            gyro_dps: sim_load(&SIM_GYRO_DPS),
            mag_gauss: sim_load(&SIM_MAG_GAUSS),
        }
    }
}

#[cfg(target_os = "espidf")]
fn wait_for_status(addr: u8, status_reg: u8, mask: u8) {
    loop {
        match hw_init::i2c_read_reg(addr, status_reg) {
            Ok(status) if status & mask != 0 => return,
            _ => esp_idf_hal::delay::FreeRtos::delay_ms(1),
        }
    }
}

#[cfg(target_os = "espidf")]
fn read_axes(addr: u8, start_reg: u8) -> [i16; 3] {
    let mut raw = [0u8; 6];
    // A failed burst read leaves zeros — the next iteration re-reads.
    let _ = hw_init::i2c_read_regs(addr, start_reg, &mut raw);
    [
        i16::from_le_bytes([raw[0], raw[1]]),
        i16::from_le_bytes([raw[2], raw[3]]),
        i16::from_le_bytes([raw[4], raw[5]]),
    ]
}

#[cfg(target_os = "espidf")]
fn scale(raw: [i16; 3], factor: f32) -> [f32; 3] {
    [
        raw[0] as f32 * factor,
        raw[1] as f32 * factor,
        raw[2] as f32 * factor,
    ]
}
