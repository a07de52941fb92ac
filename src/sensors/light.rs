#![cfg_attr(not(target_os = "espidf"), allow(dead_code))] // register map is device-only

//! APDS9960 proximity / colour sensor driver.
//!
//! The one optional sensor on the board: a failed probe is logged and the
//! hub runs without it (its snapshot fields stay at zero).  Colour reads
//! spin-wait on AVALID, proximity on PVALID.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: register access through the hw_init I²C helpers.
//! On host/test: reads from simulation atomics.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU8, AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;

const ADDR: u8 = 0x39;

const REG_ID: u8 = 0x92;
const CHIP_ID: u8 = 0xAB;

/// Power on + ALS enable + proximity enable.
const REG_ENABLE: u8 = 0x80;
const ENABLE_PON_AEN_PEN: u8 = 0x07;

const REG_STATUS: u8 = 0x93;
const STATUS_AVALID: u8 = 0x01;
const STATUS_PVALID: u8 = 0x02;

/// Clear/R/G/B data, two bytes each, auto-incrementing.
const REG_CDATAL: u8 = 0x94;
const REG_PDATA: u8 = 0x9C;

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_PROXIMITY: AtomicU8 = AtomicU8::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_COLOR: [AtomicU16; 3] = [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)];

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_proximity(proximity: u8) {
    SIM_PROXIMITY.store(proximity, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_color(rgb: [u16; 3]) {
    for (cell, v) in SIM_COLOR.iter().zip(rgb) {
        cell.store(v, Ordering::Relaxed);
    }
}

// ── Driver ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct LightReading {
    /// 0 (far) – 255 (touching).
    pub proximity: u8,
    /// Raw colour channel counts (telemetry divides by 16).
    pub color: [u16; 3],
}

pub struct LightSensor {
    _private: (),
}

impl LightSensor {
    #[cfg(target_os = "espidf")]
    pub fn probe() -> Result<Self, SensorError> {
        if hw_init::i2c_read_reg(ADDR, REG_ID)? != CHIP_ID {
            return Err(SensorError::BadChipId);
        }
        hw_init::i2c_write_reg(ADDR, REG_ENABLE, ENABLE_PON_AEN_PEN)?;
        Ok(Self { _private: () })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn probe() -> Result<Self, SensorError> {
        Ok(Self { _private: () })
    }

    /// Blocking read of proximity and colour channels.
    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> LightReading {
        wait_for_status(STATUS_PVALID);
        let proximity = hw_init::i2c_read_reg(ADDR, REG_PDATA).unwrap_or(0);

        wait_for_status(STATUS_AVALID);
        let mut raw = [0u8; 8];
        let _ = hw_init::i2c_read_regs(ADDR, REG_CDATAL, &mut raw);
        // Skip the clear channel; telemetry only reports R/G/B.
        let color = [
            u16::from_le_bytes([raw[2], raw[3]]),
            u16::from_le_bytes([raw[4], raw[5]]),
            u16::from_le_bytes([raw[6], raw[7]]),
        ];

        LightReading { proximity, color }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> LightReading {
        let mut color = [0u16; 3];
        for (slot, cell) in color.iter_mut().zip(&SIM_COLOR) {
            *slot = cell.load(Ordering::Relaxed);
        }
        LightReading {
            proximity: SIM_PROXIMITY.load(Ordering::Relaxed),
            color,
        }
    }
}

#[cfg(target_os = "espidf")]
fn wait_for_status(mask: u8) {
    loop {
        match hw_init::i2c_read_reg(ADDR, REG_STATUS) {
            Ok(status) if status & mask != 0 => return,
            _ => esp_idf_hal::delay::FreeRtos::delay_ms(1),
        }
    }
}
