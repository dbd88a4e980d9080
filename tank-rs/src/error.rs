//! Error type of the tank peripherals.

use pca9685::{InvalidDuty, Pca9685Error};
use thiserror::Error;

/// Errors of the motor, LED and battery drivers, generic over the I2C
/// bus error `E`.
#[derive(Debug, Error)]
pub enum TankError<E> {
    /// The bus (sequenced, direct or dummy) rejected a transfer.
    #[error("I2C error: {0:?}")]
    I2c(E),

    #[error("illegal {motor} motor value {value} (must be -100..100)")]
    MotorOutOfRange { motor: &'static str, value: f64 },

    #[error("{0}")]
    InvalidDuty(InvalidDuty),

    #[error("{count} PWM outputs starting at output {first} exceed the 16 available")]
    TooManyOutputs { first: u8, count: usize },

    #[error("invalid PWM output {0} (must be 0-15)")]
    InvalidOutput(u8),
}

impl<E> From<Pca9685Error<E>> for TankError<E> {
    fn from(error: Pca9685Error<E>) -> Self {
        match error {
            Pca9685Error::I2c(e) => TankError::I2c(e),
            Pca9685Error::InvalidDuty(e) => TankError::InvalidDuty(e),
            Pca9685Error::TooManyOutputs { first, count } => {
                TankError::TooManyOutputs { first, count }
            }
            Pca9685Error::InvalidOutput(n) => TankError::InvalidOutput(n),
        }
    }
}
