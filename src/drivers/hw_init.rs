//! One-shot hardware peripheral initialization.
//!
//! Configures the I²C master, GPIO directions, LEDC PWM channels, and the
//! I2S PDM RX channel using raw ESP-IDF sys calls. Called once from
//! `main()` before the control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::error::SensorError;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    I2cInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed,
    PdmInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed => write!(f, "LEDC timer/channel config failed"),
            Self::PdmInitFailed(rc) => write!(f, "I2S PDM RX init failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_i2c()?;
        init_gpio_outputs()?;
        init_ledc();
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── I²C master ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const I2C_PORT: i32 = 0;
#[cfg(target_os = "espidf")]
const I2C_TIMEOUT_TICKS: u32 = 100;

#[cfg(target_os = "espidf")]
unsafe fn init_i2c() -> Result<(), HwInitError> {
    let conf = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: pins::I2C_SDA_GPIO,
        scl_io_num: pins::I2C_SCL_GPIO,
        sda_pullup_en: true,
        scl_pullup_en: true,
        __bindgen_anon_1: i2c_config_t__bindgen_ty_1 {
            master: i2c_config_t__bindgen_ty_1__bindgen_ty_1 {
                clk_speed: pins::I2C_FREQ_HZ,
            },
        },
        ..Default::default()
    };
    let ret = unsafe { i2c_param_config(I2C_PORT, &conf) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::I2cInitFailed(ret));
    }
    let ret = unsafe { i2c_driver_install(I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::I2cInitFailed(ret));
    }
    info!("hw_init: I2C master up on port {}", I2C_PORT);
    Ok(())
}

/// Write one register on an I²C device.
#[cfg(target_os = "espidf")]
pub fn i2c_write_reg(addr: u8, reg: u8, value: u8) -> Result<(), SensorError> {
    let buf = [reg, value];
    // SAFETY: driver installed in init_i2c(); main-context only.
    let ret = unsafe {
        i2c_master_write_to_device(I2C_PORT, addr, buf.as_ptr(), buf.len(), I2C_TIMEOUT_TICKS)
    };
    if ret == ESP_OK as i32 {
        Ok(())
    } else {
        Err(SensorError::I2cFailed)
    }
}

/// Read one register.
#[cfg(target_os = "espidf")]
pub fn i2c_read_reg(addr: u8, reg: u8) -> Result<u8, SensorError> {
    let mut out = [0u8; 1];
    i2c_read_regs(addr, reg, &mut out)?;
    Ok(out[0])
}

/// Burst-read consecutive registers starting at `reg`.
#[cfg(target_os = "espidf")]
pub fn i2c_read_regs(addr: u8, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
    // SAFETY: driver installed in init_i2c(); main-context only.
    let ret = unsafe {
        i2c_master_write_read_device(
            I2C_PORT,
            addr,
            &reg,
            1,
            buf.as_mut_ptr(),
            buf.len(),
            I2C_TIMEOUT_TICKS,
        )
    };
    if ret == ESP_OK as i32 {
        Ok(())
    } else {
        Err(SensorError::I2cFailed)
    }
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    // The power indicator is the only plain on/off output; every other
    // LED runs on a LEDC channel.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::LED_POWER_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    // Active-low pin: park it high (LED off) until the first arbitration.
    unsafe { gpio_set_level(pins::LED_POWER_GPIO, 1) };

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    unsafe {
        gpio_set_level(pin, if high { 1 } else { 0 });
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() {
    // Timer 0: all LEDs (1 kHz, 8-bit).
    // SAFETY: Called from single main-task context via init_peripherals().
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    unsafe {
        ledc_timer_config(&timer0);
    }

    // Channels 0-2: RGB LED; channel 3: builtin LED.
    let led_gpios = [
        pins::LED_R_GPIO,
        pins::LED_G_GPIO,
        pins::LED_B_GPIO,
        pins::LED_BUILTIN_GPIO,
    ];
    for (i, &gpio) in led_gpios.iter().enumerate() {
        unsafe {
            ledc_channel_config(&ledc_channel_config_t {
                speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
                channel: ledc_channel_t_LEDC_CHANNEL_0 + i as u32,
                timer_sel: ledc_timer_t_LEDC_TIMER_0,
                gpio_num: gpio,
                duty: 0,
                hpoint: 0,
                ..Default::default()
            });
        }
    }

    info!("hw_init: LEDC configured (rgb=CH0-2, builtin=CH3)");
}

pub const LEDC_CH_LED_R: u32 = 0;
pub const LEDC_CH_LED_G: u32 = 1;
pub const LEDC_CH_LED_B: u32 = 2;
pub const LEDC_CH_LED_BUILTIN: u32 = 3;

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) {
    // SAFETY: LEDC channels were configured in init_ledc(); duty register
    // writes are race-free since only main loop calls this function.
    unsafe {
        esp_idf_svc::sys::ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, duty as u32);
        esp_idf_svc::sys::ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) {}

// ── I2S PDM RX (microphone) ───────────────────────────────────

#[cfg(target_os = "espidf")]
static mut PDM_RX_HANDLE: i2s_chan_handle_t = core::ptr::null_mut();

/// Bring up the PDM RX channel.  Called from microphone::start_capture,
/// once, before the capture task spawns.
#[cfg(target_os = "espidf")]
pub fn init_pdm_rx() -> Result<(), HwInitError> {
    let chan_cfg = i2s_chan_config_t {
        id: i2s_port_t_I2S_NUM_0,
        role: i2s_role_t_I2S_ROLE_MASTER,
        dma_desc_num: 4,
        dma_frame_num: 256,
        ..Default::default()
    };
    // SAFETY: PDM_RX_HANDLE is written once here, before the capture task
    // exists; afterwards it is only read by pdm_read().
    let ret = unsafe { i2s_new_channel(&chan_cfg, core::ptr::null_mut(), &raw mut PDM_RX_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::PdmInitFailed(ret));
    }

    let pdm_cfg = i2s_pdm_rx_config_t {
        clk_cfg: i2s_pdm_rx_clk_config_t {
            sample_rate_hz: pins::PDM_SAMPLE_RATE_HZ,
            clk_src: soc_periph_i2s_clk_src_t_I2S_CLK_SRC_DEFAULT,
            mclk_multiple: i2s_mclk_multiple_t_I2S_MCLK_MULTIPLE_256,
            ..Default::default()
        },
        slot_cfg: i2s_pdm_rx_slot_config_t {
            data_bit_width: i2s_data_bit_width_t_I2S_DATA_BIT_WIDTH_16BIT,
            slot_bit_width: i2s_slot_bit_width_t_I2S_SLOT_BIT_WIDTH_16BIT,
            slot_mode: i2s_slot_mode_t_I2S_SLOT_MODE_MONO,
            slot_mask: i2s_pdm_slot_mask_t_I2S_PDM_SLOT_LEFT,
            ..Default::default()
        },
        gpio_cfg: i2s_pdm_rx_gpio_config_t {
            clk: pins::PDM_CLK_GPIO,
            din: pins::PDM_DATA_GPIO,
            ..Default::default()
        },
    };
    // SAFETY: handle was just created; init + enable run before any reader.
    let ret = unsafe { i2s_channel_init_pdm_rx_mode(PDM_RX_HANDLE, &pdm_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::PdmInitFailed(ret));
    }
    let ret = unsafe { i2s_channel_enable(PDM_RX_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::PdmInitFailed(ret));
    }

    info!(
        "hw_init: PDM RX up ({} Hz, clk=GPIO{}, din=GPIO{})",
        pins::PDM_SAMPLE_RATE_HZ,
        pins::PDM_CLK_GPIO,
        pins::PDM_DATA_GPIO
    );
    Ok(())
}

/// Blocking read of decimated 16-bit samples into `frame`.  Returns the
/// number of samples actually delivered.
#[cfg(target_os = "espidf")]
pub fn pdm_read(frame: &mut [i16]) -> usize {
    let mut bytes_read: usize = 0;
    // SAFETY: PDM_RX_HANDLE was initialised by init_pdm_rx() before the
    // capture task (the only caller) was spawned.
    let ret = unsafe {
        i2s_channel_read(
            PDM_RX_HANDLE,
            frame.as_mut_ptr().cast(),
            core::mem::size_of_val(frame),
            &mut bytes_read,
            u32::MAX,
        )
    };
    if ret == ESP_OK as i32 {
        bytes_read / core::mem::size_of::<i16>()
    } else {
        0
    }
}
