//! Async driver for the NXP PCA9685 16-channel, 12-bit PWM controller.
//!
//! The crate is split into three layers:
//!
//! - **[`values`]**: pure timing encoder from duty cycles to ON/OFF counter
//!   bytes, plus the prescaler for a PWM frequency.
//! - **[`PwmOutput`]**: remembers the last written state of a block of
//!   outputs and computes the smallest write that reaches a new state.
//! - **[`Pca9685`]**: the device driver on top of any `embedded-hal-async`
//!   I2C bus.
//!
//! # Quick start
//!
//! ```ignore
//! use pca9685::{Pca9685, DEFAULT_ADDRESS};
//!
//! let mut pwm = Pca9685::new(i2c, DEFAULT_ADDRESS);
//! pwm.init().await?;
//!
//! // Outputs 0-3 at 0%, 50%, 100%, 25%. Only changed outputs are rewritten
//! // on later calls.
//! pwm.set_outputs(&[0.0, 0.5, 1.0, 0.25]).await?;
//! ```
//!
//! # Features
//!
//! - **`defmt`**: [`defmt::Format`] implementations on error types for
//!   embedded logging.

#![cfg_attr(not(test), no_std)]

pub mod driver;
pub mod error;
pub mod output;
pub mod registers;
pub mod values;

pub use driver::{Pca9685, MODE1_DEFAULT};
pub use error::{InvalidDuty, Pca9685Error};
pub use output::{PwmOutput, PwmState, PwmUpdate, MAX_UPDATE_LEN};
pub use registers::{led, CHANNEL_COUNT, DEFAULT_ADDRESS, LED0};
pub use values::{full, full_off, full_on, prescaler, prescaler_external_clock, values, PwmValues};
