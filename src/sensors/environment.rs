#![cfg_attr(not(target_os = "espidf"), allow(dead_code))] // register map is device-only

//! Environmental sensors: HTS221 (temperature/humidity) + LPS22HB (pressure).
//!
//! The HTS221 ships with factory calibration points in registers
//! 0x30 – 0x3F; readings are linear interpolations between them.  The
//! LPS22HB runs in one-shot mode: each read triggers a conversion and
//! spin-waits on the pressure-ready status bit.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: register access through the hw_init I²C helpers, with the
//! real factory calibration read once at probe time.
//! On host/test: typical-value calibration and simulation atomics.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;

// ── HTS221 (0x5F) ─────────────────────────────────────────────

const ADDR_HTS: u8 = 0x5F;
const HTS_CHIP_ID: u8 = 0xBC;

const REG_WHO_AM_I: u8 = 0x0F;
/// PD = 1 (active), ODR = 1 Hz.
const REG_HTS_CTRL1: u8 = 0x20;
const HTS_CTRL1_ACTIVE_1HZ: u8 = 0x81;
const REG_HTS_STATUS: u8 = 0x27;
const HTS_STATUS_TDA: u8 = 0x01;
const HTS_STATUS_HDA: u8 = 0x02;
/// HTS221 wants the sub-address MSB set for multi-byte auto-increment.
const HTS_AUTO_INC: u8 = 0x80;
const REG_HTS_HUMIDITY_OUT_L: u8 = 0x28;
const REG_HTS_TEMP_OUT_L: u8 = 0x2A;
const REG_HTS_CALIB_START: u8 = 0x30;

// ── LPS22HB (0x5C) ────────────────────────────────────────────

const ADDR_LPS: u8 = 0x5C;
const LPS_CHIP_ID: u8 = 0xB1;

const REG_LPS_CTRL2: u8 = 0x11;
const LPS_CTRL2_ONE_SHOT: u8 = 0x01;
const REG_LPS_STATUS: u8 = 0x27;
const LPS_STATUS_PDA: u8 = 0x01;
const REG_LPS_PRESS_OUT_XL: u8 = 0x28;

/// 24-bit pressure counts per hPa.
const LPS_LSB_PER_HPA: f32 = 4_096.0;

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_TEMPERATURE_C: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_HUMIDITY_PCT: AtomicU32 = AtomicU32::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_PRESSURE_KPA: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_environment(temperature_c: f32, humidity_pct: f32, pressure_kpa: f32) {
    SIM_TEMPERATURE_C.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_HUMIDITY_PCT.store(humidity_pct.to_bits(), Ordering::Relaxed);
    SIM_PRESSURE_KPA.store(pressure_kpa.to_bits(), Ordering::Relaxed);
}

// ── Calibration ───────────────────────────────────────────────

/// HTS221 factory calibration points.
#[derive(Debug, Clone, Copy)]
struct HtsCalibration {
    t0_deg_c: f32,
    t1_deg_c: f32,
    t0_out: i16,
    t1_out: i16,
    h0_rh: f32,
    h1_rh: f32,
    h0_out: i16,
    h1_out: i16,
}

impl Default for HtsCalibration {
    /// Typical datasheet values — used on the host target.
    fn default() -> Self {
        Self {
            t0_deg_c: 20.0,
            t1_deg_c: 45.0,
            t0_out: 0,
            t1_out: 12_800,
            h0_rh: 30.0,
            h1_rh: 70.0,
            h0_out: 0,
            h1_out: 16_000,
        }
    }
}

/// Linear interpolation through two calibration points.  Degenerate
/// calibration (x0 == x1) yields the first point rather than dividing
/// by zero.
fn interpolate(x: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    if (x1 - x0).abs() < f32::EPSILON {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

// ── Driver ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// Absolute pressure in kPa (telemetry converts to mmHg).
    pub pressure_kpa: f32,
}

pub struct EnvSensors {
    cal: HtsCalibration,
}

impl EnvSensors {
    /// Verify both chips, power up the HTS221, and read its factory
    /// calibration block.
    #[cfg(target_os = "espidf")]
    pub fn probe() -> Result<Self, SensorError> {
        if hw_init::i2c_read_reg(ADDR_HTS, REG_WHO_AM_I)? != HTS_CHIP_ID {
            return Err(SensorError::BadChipId);
        }
        if hw_init::i2c_read_reg(ADDR_LPS, REG_WHO_AM_I)? != LPS_CHIP_ID {
            return Err(SensorError::BadChipId);
        }

        hw_init::i2c_write_reg(ADDR_HTS, REG_HTS_CTRL1, HTS_CTRL1_ACTIVE_1HZ)?;

        let mut raw = [0u8; 16];
        hw_init::i2c_read_regs(ADDR_HTS, REG_HTS_CALIB_START | HTS_AUTO_INC, &mut raw)?;
        Ok(Self {
            cal: parse_calibration(&raw),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn probe() -> Result<Self, SensorError> {
        Ok(Self {
            cal: HtsCalibration::default(),
        })
    }

    /// Blocking read: spin-waits on each ready bit with no timeout.
    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> EnvReading {
        wait_for_status(ADDR_HTS, REG_HTS_STATUS, HTS_STATUS_TDA | HTS_STATUS_HDA);
        let t_raw = read_i16(ADDR_HTS, REG_HTS_TEMP_OUT_L | HTS_AUTO_INC);
        let h_raw = read_i16(ADDR_HTS, REG_HTS_HUMIDITY_OUT_L | HTS_AUTO_INC);

        // One-shot conversion, then wait for the result.
        let _ = hw_init::i2c_write_reg(ADDR_LPS, REG_LPS_CTRL2, LPS_CTRL2_ONE_SHOT);
        wait_for_status(ADDR_LPS, REG_LPS_STATUS, LPS_STATUS_PDA);
        let p_raw = read_u24(ADDR_LPS, REG_LPS_PRESS_OUT_XL);

        let c = &self.cal;
        EnvReading {
            temperature_c: interpolate(
                t_raw as f32,
                c.t0_out as f32,
                c.t0_deg_c,
                c.t1_out as f32,
                c.t1_deg_c,
            ),
            humidity_pct: interpolate(
                h_raw as f32,
                c.h0_out as f32,
                c.h0_rh,
                c.h1_out as f32,
                c.h1_rh,
            ),
            pressure_kpa: p_raw as f32 / LPS_LSB_PER_HPA / 10.0,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> EnvReading {
        EnvReading {
            temperature_c: f32::from_bits(SIM_TEMPERATURE_C.load(Ordering::Relaxed)),
            humidity_pct: f32::from_bits(SIM_HUMIDITY_PCT.load(Ordering::Relaxed)),
            pressure_kpa: f32::from_bits(SIM_PRESSURE_KPA.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(target_os = "espidf")]
fn parse_calibration(raw: &[u8; 16]) -> HtsCalibration {
    // T0/T1 are 10-bit values split across 0x32/0x33 and the low nibble
    // of 0x35, stored as °C × 8; H0/H1 are % × 2.
    let t0 = (u16::from(raw[2]) | (u16::from(raw[5] & 0x03) << 8)) as f32 / 8.0;
    let t1 = (u16::from(raw[3]) | (u16::from(raw[5] & 0x0C) << 6)) as f32 / 8.0;
    HtsCalibration {
        t0_deg_c: t0,
        t1_deg_c: t1,
        t0_out: i16::from_le_bytes([raw[12], raw[13]]),
        t1_out: i16::from_le_bytes([raw[14], raw[15]]),
        h0_rh: f32::from(raw[0]) / 2.0,
        h1_rh: f32::from(raw[1]) / 2.0,
        h0_out: i16::from_le_bytes([raw[6], raw[7]]),
        h1_out: i16::from_le_bytes([raw[10], raw[11]]),
    }
}

#[cfg(target_os = "espidf")]
fn wait_for_status(addr: u8, status_reg: u8, mask: u8) {
    loop {
        match hw_init::i2c_read_reg(addr, status_reg) {
            Ok(status) if status & mask == mask => return,
            _ => esp_idf_hal::delay::FreeRtos::delay_ms(1),
        }
    }
}

#[cfg(target_os = "espidf")]
fn read_i16(addr: u8, start_reg: u8) -> i16 {
    let mut raw = [0u8; 2];
    let _ = hw_init::i2c_read_regs(addr, start_reg, &mut raw);
    i16::from_le_bytes(raw)
}

#[cfg(target_os = "espidf")]
fn read_u24(addr: u8, start_reg: u8) -> u32 {
    let mut raw = [0u8; 3];
    let _ = hw_init::i2c_read_regs(addr, start_reg, &mut raw);
    u32::from(raw[0]) | (u32::from(raw[1]) << 8) | (u32::from(raw[2]) << 16)
}
