//! Error types for the PCA9685 driver.

use core::fmt;

/// Duty cycle or delay outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidDuty {
    pub delay: f64,
    pub on_time: f64,
}

impl fmt::Display for InvalidDuty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid PWM timing: delay={} on_time={} (both must be in 0..=1)",
            self.delay, self.on_time
        )
    }
}

/// Errors that can occur when driving the PWM controller.
#[derive(Debug)]
pub enum Pca9685Error<E> {
    /// Underlying I2C bus error.
    I2c(E),

    /// Requested duty cycle could not be encoded.
    InvalidDuty(InvalidDuty),

    /// More values than outputs after the first one.
    TooManyOutputs { first: u8, count: usize },

    /// Output index out of range (must be 0-15).
    InvalidOutput(u8),
}

impl<E> From<E> for Pca9685Error<E> {
    fn from(error: E) -> Self {
        Pca9685Error::I2c(error)
    }
}

impl<E: fmt::Debug> fmt::Display for Pca9685Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pca9685Error::I2c(e) => write!(f, "I2C error: {:?}", e),
            Pca9685Error::InvalidDuty(e) => write!(f, "{}", e),
            Pca9685Error::TooManyOutputs { first, count } => {
                write!(f, "{} outputs starting at output {} exceed the 16 available", count, first)
            }
            Pca9685Error::InvalidOutput(n) => write!(f, "Invalid output {} (must be 0-15)", n),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for Pca9685Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Pca9685Error::I2c(e) => defmt::write!(f, "I2C error: {}", e),
            Pca9685Error::InvalidDuty(_) => defmt::write!(f, "Invalid PWM timing"),
            Pca9685Error::TooManyOutputs { first, count } => {
                defmt::write!(f, "{} outputs from output {} exceed 16", count, first)
            }
            Pca9685Error::InvalidOutput(n) => defmt::write!(f, "Invalid output {}", n),
        }
    }
}
