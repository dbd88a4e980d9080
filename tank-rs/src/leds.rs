//! LED strip on a PCA9685.

use embedded_hal_async::i2c::I2c;
use pca9685::Pca9685;

use crate::config::LedConfig;
use crate::error::TankError;

pub const NUM_LEDS: usize = 15;

pub struct Leds<I2C> {
    pwm: Pca9685<I2C>,
    address: u8,
}

impl<I2C> Leds<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, config: LedConfig) -> Result<Self, TankError<I2C::Error>> {
        let pwm = Pca9685::with_first_output(i2c, config.address, config.first_output)?;
        Ok(Self {
            pwm,
            address: config.address,
        })
    }

    /// Wake the driver and switch every LED off.
    pub async fn init(&mut self) -> Result<(), TankError<I2C::Error>> {
        #[cfg(feature = "log")]
        log::info!("Initializing LED PWM driver at {:#04x}...", self.address);
        self.pwm.init().await?;
        self.disable_all().await
    }

    /// Set the brightness (0..=1) of the first `values.len()` LEDs. The
    /// remaining LEDs keep their current brightness.
    pub async fn set(&mut self, values: &[f64]) -> Result<(), TankError<I2C::Error>> {
        let values = &values[..values.len().min(NUM_LEDS)];
        let _sent = self.pwm.set_leading_outputs(values).await?;
        #[cfg(feature = "log")]
        log::debug!("Setting LEDs to {:?} ({} bytes sent)", values, _sent);
        Ok(())
    }

    pub async fn disable_all(&mut self) -> Result<(), TankError<I2C::Error>> {
        self.pwm.set_outputs(&[0.0; NUM_LEDS]).await?;
        Ok(())
    }

    /// Last written brightness of every LED.
    pub fn state(&self) -> Option<&[f64]> {
        self.pwm.current_state()
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.pwm.release()
    }
}
