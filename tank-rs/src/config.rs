//! Tank configuration.
//!
//! [`TankConfig`] collects everything needed to bring up the bridge and the
//! peripherals behind it. `Default` gives the wiring of the reference
//! build: motor driver at 0x40, LED driver at 0x44 (A2 strapped), battery
//! ADC at 0x48, I2C at 400 kHz through the bus sequencer.

use pca9685::DEFAULT_ADDRESS;

use crate::adc::DEFAULT_ADDRESS as ADC_DEFAULT_ADDRESS;

/// Bridge and peripheral settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TankConfig {
    /// HID path of the FT260. `None` opens the first attached one.
    pub usb_device: Option<String>,

    /// I2C bus clock in kHz (60-3400).
    pub i2c_freq_khz: u16,

    /// Call the bridge in-line from each driver instead of going through
    /// the sequencer. Only safe with a single caller at a time.
    pub no_i2c_sequencer: bool,

    /// Run without any USB/I2C hardware.
    pub dummy: bool,

    pub motors: MotorConfig,
    pub leds: LedConfig,
    pub battery: BatteryConfig,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            usb_device: None,
            i2c_freq_khz: 400,
            no_i2c_sequencer: false,
            dummy: false,
            motors: MotorConfig::default(),
            leds: LedConfig::default(),
            battery: BatteryConfig::default(),
        }
    }
}

/// Main motors on a PCA9685.
///
/// Starting at `first_output`, the four outputs are wired as: left
/// direction, left speed, right direction, right speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorConfig {
    pub address: u8,
    pub first_output: u8,
    pub invert_left_dir: bool,
    pub invert_right_dir: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            first_output: 0,
            invert_left_dir: false,
            invert_right_dir: false,
        }
    }
}

/// LED strip on a second PCA9685.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedConfig {
    pub address: u8,
    pub first_output: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS + 4,
            first_output: 0,
        }
    }
}

/// Battery voltage measured by an ADS1115.
///
/// `min` and `max` are raw conversion values of an empty and a full
/// battery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryConfig {
    pub address: u8,
    pub min: i16,
    pub max: i16,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            address: ADC_DEFAULT_ADDRESS,
            min: 0,
            max: i16::MAX,
        }
    }
}
