//! Battery voltage through a TI ADS1115 16-bit ADC.

use embedded_hal_async::i2c::I2c;

use crate::config::BatteryConfig;
use crate::error::TankError;

// ---------------------------------------------------------------------------
// ADS1115 register map
// ---------------------------------------------------------------------------

/// Address with ADDR tied to GND. 0x49-0x4B for VDD, SDA, SCL.
pub const DEFAULT_ADDRESS: u8 = 0x48;

pub const REG_CONVERSION: u8 = 0x00;
pub const REG_CONFIG: u8 = 0x01;
pub const REG_LO_THRESH: u8 = 0x02;
pub const REG_HI_THRESH: u8 = 0x03;

/// Start a single conversion (write) / no conversion running (read).
pub const CONFIG_OS: u16 = 1 << 15;

/// Input multiplexer: differential pairs, then single ended against GND.
pub const CONFIG_MUX_01: u16 = 0 << 12;
pub const CONFIG_MUX_03: u16 = 1 << 12;
pub const CONFIG_MUX_13: u16 = 2 << 12;
pub const CONFIG_MUX_23: u16 = 3 << 12;
pub const CONFIG_MUX_0G: u16 = 4 << 12;
pub const CONFIG_MUX_1G: u16 = 5 << 12;
pub const CONFIG_MUX_2G: u16 = 6 << 12;
pub const CONFIG_MUX_3G: u16 = 7 << 12;

/// Full scale range of the programmable gain amplifier.
pub const CONFIG_PGA_6V: u16 = 0 << 9;
pub const CONFIG_PGA_4V: u16 = 1 << 9;
pub const CONFIG_PGA_2V: u16 = 2 << 9;
pub const CONFIG_PGA_1V: u16 = 3 << 9;
pub const CONFIG_PGA_05V: u16 = 4 << 9;
pub const CONFIG_PGA_02V: u16 = 5 << 9;

/// Single-shot mode. Cleared means continuous conversion.
pub const CONFIG_MODE_SINGLE: u16 = 1 << 8;

/// Data rate in samples per second.
pub const CONFIG_DR_8: u16 = 0 << 5;
pub const CONFIG_DR_16: u16 = 1 << 5;
pub const CONFIG_DR_32: u16 = 2 << 5;
pub const CONFIG_DR_64: u16 = 3 << 5;
pub const CONFIG_DR_128: u16 = 4 << 5;
pub const CONFIG_DR_250: u16 = 5 << 5;
pub const CONFIG_DR_475: u16 = 6 << 5;
pub const CONFIG_DR_860: u16 = 7 << 5;

pub const CONFIG_COMP_WINDOW: u16 = 1 << 4;
pub const CONFIG_COMP_ACTIVE_HIGH: u16 = 1 << 3;
pub const CONFIG_COMP_LATCHING: u16 = 1 << 2;

/// Comparator queue: assert after 1, 2 or 4 conversions, or disabled.
pub const CONFIG_COMP_QUE_1: u16 = 0;
pub const CONFIG_COMP_QUE_2: u16 = 1;
pub const CONFIG_COMP_QUE_4: u16 = 2;
pub const CONFIG_COMP_QUE_OFF: u16 = 3;

/// AIN0 against AIN3 in the 6.144 V range, 32 SPS, continuous.
pub const BATTERY_CONFIG: u16 = CONFIG_MUX_03 | CONFIG_DR_32 | CONFIG_PGA_6V | CONFIG_COMP_QUE_1;

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

/// Battery level from raw ADS1115 conversions.
pub struct Battery<I2C> {
    i2c: I2C,
    config: BatteryConfig,
}

impl<I2C> Battery<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, config: BatteryConfig) -> Self {
        Self { i2c, config }
    }

    /// Start continuous conversions and point the register pointer at the
    /// conversion register, so later reads need no register write.
    pub async fn init(&mut self) -> Result<(), TankError<I2C::Error>> {
        #[cfg(feature = "log")]
        log::info!("Initializing ADC at {:#04x}...", self.config.address);
        let [hi, lo] = BATTERY_CONFIG.to_be_bytes();
        self.i2c
            .write(self.config.address, &[REG_CONFIG, hi, lo])
            .await
            .map_err(TankError::I2c)?;
        self.i2c
            .write(self.config.address, &[REG_CONVERSION])
            .await
            .map_err(TankError::I2c)
    }

    /// Latest raw conversion result.
    pub async fn voltage(&mut self) -> Result<i16, TankError<I2C::Error>> {
        let mut raw = [0u8; 2];
        self.i2c
            .read(self.config.address, &mut raw)
            .await
            .map_err(TankError::I2c)?;
        Ok(i16::from_be_bytes(raw))
    }

    /// Charge level in 0..=1 for a raw conversion value.
    pub fn percentage(&self, voltage: i16) -> f64 {
        let BatteryConfig { min, max, .. } = self.config;
        if voltage <= min {
            return 0.0;
        }
        if voltage >= max {
            return 1.0;
        }
        f64::from(i32::from(voltage) - i32::from(min)) / f64::from(i32::from(max) - i32::from(min))
    }

    pub async fn battery_percentage(&mut self) -> Result<f64, TankError<I2C::Error>> {
        let voltage = self.voltage().await?;
        Ok(self.percentage(voltage))
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;

    use super::*;
    use crate::testing::RecordingBus;

    fn battery(min: i16, max: i16) -> Battery<RecordingBus> {
        Battery::new(
            RecordingBus::default(),
            BatteryConfig {
                address: DEFAULT_ADDRESS,
                min,
                max,
            },
        )
    }

    #[test]
    fn battery_config_bits() {
        assert_eq!(BATTERY_CONFIG, 0x1040);
        assert_eq!(BATTERY_CONFIG & CONFIG_MODE_SINGLE, 0);
    }

    #[test]
    fn init_selects_the_conversion_register() {
        let mut b = battery(0, 100);
        block_on(b.init()).unwrap();
        assert_eq!(
            b.release().writes,
            vec![(0x48, vec![REG_CONFIG, 0x10, 0x40]), (0x48, vec![REG_CONVERSION])]
        );
    }

    #[test]
    fn voltage_is_big_endian_and_signed() {
        let mut b = battery(0, 100);
        b.i2c.reads.push_back(vec![0x12, 0x34]);
        b.i2c.reads.push_back(vec![0xFF, 0xFE]);
        assert_eq!(block_on(b.voltage()).unwrap(), 0x1234);
        assert_eq!(block_on(b.voltage()).unwrap(), -2);
    }

    #[test]
    fn percentage_is_clamped() {
        let b = battery(1000, 3000);
        assert_eq!(b.percentage(500), 0.0);
        assert_eq!(b.percentage(1000), 0.0);
        assert_eq!(b.percentage(2000), 0.5);
        assert_eq!(b.percentage(3000), 1.0);
        assert_eq!(b.percentage(i16::MAX), 1.0);
    }

    #[test]
    fn percentage_from_the_bus() {
        let mut b = battery(0, 200);
        b.i2c.reads.push_back(vec![0x00, 50]);
        assert_eq!(block_on(b.battery_percentage()).unwrap(), 0.25);
    }
}
