//! Unified error types for the LumiSense firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot sequence's error handling uniform.  All variants are `Copy` so they
//! can be cheaply returned from probe paths without allocation.
//!
//! Errors only exist at startup: once the control loop is running, sensor
//! reads are blocking spin-waits with no failure path.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor failed its probe or returned bad identification data.
    Sensor(SensorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I²C transaction failed (bus error or NACK).
    I2cFailed,
    /// WHO_AM_I / chip-ID register did not match the expected part.
    BadChipId,
    /// Sensor did not acknowledge its address at all.
    NotResponding,
    /// PDM / I2S audio capture could not be started.
    AudioCaptureFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2cFailed => write!(f, "I2C transaction failed"),
            Self::BadChipId => write!(f, "unexpected chip ID"),
            Self::NotResponding => write!(f, "no response on bus"),
            Self::AudioCaptureFailed => write!(f, "audio capture start failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
