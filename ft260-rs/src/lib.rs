//! Async I2C master driver for the FTDI FT260 USB-HID to I2C bridge.
//!
//! This crate provides [`Ft260`], an I2C engine that speaks the FT260 HID
//! report protocol over any [`HidTransport`]. It implements the
//! `embedded-hal-async` [`I2c`](embedded_hal_async::i2c::I2c) trait, so
//! device drivers written against that trait run unchanged on a host.
//!
//! # Quick Start
//!
//! ```ignore
//! use ft260::{Ft260, HidapiTransport, I2cBus};
//!
//! let api = hidapi::HidApi::new()?;
//! let transport = HidapiTransport::open(&api, None)?;
//! let mut ft = Ft260::new(transport, embassy_time::Delay);
//!
//! ft.validate_chip_code()?;
//! ft.configure(400)?;
//! ft.validate(400)?;
//!
//! let found = ft.i2c_scan().await?;
//! let config = ft.get(0x48, 0x01, 2).await?;
//! ```
//!
//! # Layers
//!
//! - [`transport`]: byte-level HID access ([`HidapiTransport`])
//! - [`report`]: report framing and checks
//! - [`i2c`]: chunking, status polling and error classification
//! - [`system`] / [`gpio`]: chip settings
//!
//! # Crate Features
//!
//! - **`log`** *(default)*: diagnostics through the [`log`] facade.
//! - **`mock`**: the recording [`transport::mock::MockTransport`] for tests
//!   of code built on top of this crate.
//!
//! [`log`]: https://docs.rs/log

pub mod error;
pub mod gpio;
pub mod i2c;
pub mod registers;
pub mod report;
pub mod system;
pub mod transport;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use error::{ConfigError, Ft260Error, I2cError, ProtocolError, TransportError};
pub use gpio::GpioReport;
pub use i2c::{
    is_absent_device, BusStatus, Ft260, I2cBus, I2cCondition, PollConfig, DEFAULT_READ_TIMEOUT_MS,
    SCAN_RANGE,
};
pub use system::{Clock, SystemSetting, SystemStatus};
pub use transport::{HidTransport, HidapiTransport};

/// Re-exported so binaries can open devices without naming the crate.
pub use hidapi;
