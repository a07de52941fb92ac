//! Indicator LED drivers: the PWM-dimmed builtin LED and the on/off
//! power LED.
//!
//! The builtin LED shows the continuous proximity brightness map and is
//! momentarily driven to full brightness by the heartbeat pulse.  The
//! power LED is a plain GPIO, wired active-low.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: LEDC channel 3 + a GPIO via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct IndicatorLeds {
    builtin: u8,
    power_on: bool,
}

impl IndicatorLeds {
    pub fn new() -> Self {
        Self {
            builtin: 0,
            power_on: false,
        }
    }

    /// Set the builtin LED brightness (0 = dark, 255 = full).
    pub fn set_builtin(&mut self, brightness: u8) {
        hw_init::ledc_set(hw_init::LEDC_CH_LED_BUILTIN, brightness);
        self.builtin = brightness;
    }

    /// Set the power indicator.  The pin is active-low.
    pub fn set_power(&mut self, on: bool) {
        hw_init::gpio_write(pins::LED_POWER_GPIO, !on);
        self.power_on = on;
    }

    pub fn builtin_brightness(&self) -> u8 {
        self.builtin
    }

    pub fn power_on(&self) -> bool {
        self.power_on
    }
}
