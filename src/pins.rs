//! GPIO / peripheral pin assignments for the LumiSense main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! Assignments are shared between board revisions Rev1 and Rev2; the
//! revisions differ in sensor placement and tuning, not in routing.

// ---------------------------------------------------------------------------
// I²C bus (LSM9DS1, HTS221, LPS22HB, APDS9960)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
/// I²C master clock (all four sensors are 400 kHz capable).
pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// PDM microphone (MP34DT05)
// ---------------------------------------------------------------------------

pub const PDM_CLK_GPIO: i32 = 5;
pub const PDM_DATA_GPIO: i32 = 6;
/// PDM RX sample rate after decimation.
pub const PDM_SAMPLE_RATE_HZ: u32 = 16_000;

// ---------------------------------------------------------------------------
// RGB LED (common-anode — duty is inverted at the driver)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 11;
pub const LED_G_GPIO: i32 = 12;
pub const LED_B_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Indicator LEDs
// ---------------------------------------------------------------------------

/// Builtin single-colour LED — PWM dimmed (proximity map + heartbeat pulse).
pub const LED_BUILTIN_GPIO: i32 = 7;
/// Power indicator LED — plain on/off output, driven active-low.
pub const LED_POWER_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// UART debug
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC frequency for the RGB and builtin LEDs (1 kHz).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
