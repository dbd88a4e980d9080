//! Peripherals of an FT260 controlled tank robot.
//!
//! Two PCA9685 PWM drivers (main motors and LEDs) and an ADS1115 battery
//! ADC hang off the I2C bus of an FT260 USB bridge. The drivers here are
//! generic over the async [`I2c`](embedded_hal_async::i2c::I2c) trait, so
//! the same [`Tank`] runs on any of the buses in [`bus`]:
//!
//! ```ignore
//! static QUEUE: StaticCell<RequestQueue> = StaticCell::new();
//!
//! let api = ft260::hidapi::HidApi::new()?;
//! let config = TankConfig::default();
//! let bridge = open_bridge(&api, &config)?;
//!
//! let queue = QUEUE.init(RequestQueue::new());
//! spawner.spawn(sequencer_task(bridge, queue))?;
//!
//! let mut tank = Tank::new(&config, || SequencedBus::new(queue))?;
//! tank.init().await?;
//! tank.motors.set(50.0, 50.0).await?;
//! ```
//!
//! # Crate Features
//!
//! - **`log`** *(default)*: device and bus events through the `log` facade.

pub mod adc;
pub mod bus;
pub mod config;
pub mod error;
pub mod leds;
pub mod motors;
pub mod setup;

#[cfg(test)]
mod testing;

pub use adc::Battery;
pub use bus::{run_i2c_sequencer, DirectBus, DummyBus, RequestQueue, SequencedBus, SharedBridge};
pub use config::{BatteryConfig, LedConfig, MotorConfig, TankConfig};
pub use error::TankError;
pub use leds::{Leds, NUM_LEDS};
pub use motors::Motors;
pub use setup::{open_bridge, prepare_bridge, Tank};
