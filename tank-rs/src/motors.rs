//! Main motors, driven by direction and speed PWM outputs.

use embedded_hal_async::i2c::I2c;
use pca9685::Pca9685;

use crate::config::MotorConfig;
use crate::error::TankError;

/// Motor values are percentages of full speed, negative for backward.
pub const MOTOR_RANGE: core::ops::RangeInclusive<f64> = -100.0..=100.0;

/// Two motors on four consecutive PCA9685 outputs.
pub struct Motors<I2C> {
    pwm: Pca9685<I2C>,
    config: MotorConfig,
}

fn check_range<E>(motor: &'static str, value: f64) -> Result<(), TankError<E>> {
    if MOTOR_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(TankError::MotorOutOfRange { motor, value })
    }
}

#[cfg(feature = "log")]
fn direction_text(forward: bool) -> &'static str {
    if forward {
        "forward"
    } else {
        "backward"
    }
}

/// Split a motor value into its direction flag and its speed duty cycle.
fn split(value: f64, invert: bool) -> (bool, f64) {
    ((value > 0.0) != invert, value.abs() / 100.0)
}

impl<I2C> Motors<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, config: MotorConfig) -> Result<Self, TankError<I2C::Error>> {
        let pwm = Pca9685::with_first_output(i2c, config.address, config.first_output)?;
        Ok(Self { pwm, config })
    }

    pub async fn init(&mut self) -> Result<(), TankError<I2C::Error>> {
        #[cfg(feature = "log")]
        log::info!("Initializing motor PWM driver at {:#04x}...", self.config.address);
        self.pwm.init().await?;
        Ok(())
    }

    /// Set both motors, values in -100..=100.
    ///
    /// Returns the number of bytes sent to the PWM driver, 0 if the motors
    /// already run at these values.
    ///
    /// # Errors
    /// [`TankError::MotorOutOfRange`] before anything is sent, or the bus
    /// error of the write.
    pub async fn set(&mut self, left: f64, right: f64) -> Result<usize, TankError<I2C::Error>> {
        check_range("left", left)?;
        check_range("right", right)?;

        let (left_dir, left_speed) = split(left, self.config.invert_left_dir);
        let (right_dir, right_speed) = split(right, self.config.invert_right_dir);
        let state = [
            f64::from(u8::from(left_dir)),
            left_speed,
            f64::from(u8::from(right_dir)),
            right_speed,
        ];

        let sent = self.pwm.set_outputs(&state).await?;

        #[cfg(feature = "log")]
        log::info!(
            "Setting motors to {:.2}% ({}) and {:.2}% ({}) (sending {} bytes to the PWM driver)",
            left_speed * 100.0,
            direction_text(left_dir),
            right_speed * 100.0,
            direction_text(right_dir),
            sent
        );

        Ok(sent)
    }

    /// Like [`set`](Self::set), but rewrites all four outputs.
    pub async fn force_set(&mut self, left: f64, right: f64) -> Result<usize, TankError<I2C::Error>> {
        self.pwm.disable_optimization();
        self.set(left, right).await
    }

    pub async fn stop(&mut self) -> Result<usize, TankError<I2C::Error>> {
        self.set(0.0, 0.0).await
    }

    /// Last written duty cycles: left direction, left speed, right
    /// direction, right speed.
    pub fn state(&self) -> Option<&[f64]> {
        self.pwm.current_state()
    }

    pub fn release(self) -> I2C {
        self.pwm.release()
    }
}
