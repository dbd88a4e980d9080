//! Error types for the FT260 driver.
//!
//! Failures fall into four groups:
//!
//! - [`TransportError`]: the HID layer failed (open, short transfer, timeout).
//! - [`ProtocolError`]: a report could not be framed or parsed.
//! - [`I2cError`]: the chip reported a bus failure or never became idle.
//! - [`ConfigError`]: the chip settings do not match what the driver expects.
//!
//! All of them surface unchanged to the immediate caller; nothing in this
//! crate retries.

use std::fmt;

use embassy_time::Duration;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use thiserror::Error;

use crate::i2c::BusStatus;

/// Any failure of an FT260 operation.
#[derive(Debug, Error)]
pub enum Ft260Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    I2c(#[from] I2cError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// HID-level failures. Always fatal to the current call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("no USB HID device found with vendor id {vendor_id:04x} and product id {product_id:04x}")]
    NotFound { vendor_id: u16, product_id: u16 },

    #[error("invalid USB HID device path {0:?}")]
    InvalidPath(String),

    #[error("short write of report {report_id:#04x}: {written} of {expected} bytes")]
    ShortWrite {
        report_id: u8,
        written: usize,
        expected: usize,
    },

    #[error("short read of report {report_id:#04x}: {received} of {expected} bytes")]
    ShortRead {
        report_id: u8,
        received: usize,
        expected: usize,
    },

    #[error("no report {report_id:#04x} received within {timeout_ms} ms")]
    Timeout { report_id: u8, timeout_ms: i32 },

    #[error("HID device disconnected")]
    Disconnected,
}

/// Framing failures: the bytes on the wire do not match the report layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected report id {received:#04x} (expected {expected:#04x})")]
    UnexpectedReportId { expected: u8, received: u8 },

    #[error("malformed report {report_id:#04x}: {reason}")]
    Malformed {
        report_id: u8,
        reason: &'static str,
    },

    #[error("expected 0 or 1 for byte {index} of report {report_id:#04x}, got {value:#04x}")]
    InvalidBool { report_id: u8, index: usize, value: u8 },

    #[error("invalid 7-bit I2C address {0:#04x}")]
    InvalidAddress(u8),

    #[error("payload of {len} bytes exceeds the maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("I2C clock of {0} kHz is outside 60..=3400")]
    InvalidClock(u16),
}

/// Chip settings that differ from the configuration the driver applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unexpected chip code {found:#010x} (expected {expected:#010x})")]
    ChipCode { found: u32, expected: u32 },

    #[error("unexpected chip mode {found:#04x} (expected {expected:#04x})")]
    ChipMode { found: u8, expected: u8 },

    #[error("unexpected clock setting {found:#04x} (expected {expected:#04x})")]
    Clock { found: u8, expected: u8 },

    #[error("unexpected {pin} function {found:#04x} (expected {expected:#04x})")]
    GpioFunction {
        pin: &'static str,
        found: u8,
        expected: u8,
    },

    #[error("wake-up interrupt is enabled")]
    WakeupInterruptEnabled,

    #[error("device is suspended")]
    Suspended,

    #[error("device is powered off")]
    PoweredOff,

    #[error("I2C is not enabled on the device")]
    I2cDisabled,

    #[error("unexpected I2C bus speed {found} kHz (expected {expected} kHz)")]
    BusSpeed { found: u16, expected: u16 },
}

/// Terminal outcome of a failed I2C transaction.
///
/// Carries the last bus status read from the chip, the time spent on the
/// operation and a description of what was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cError {
    /// The status poll budget ran out before the bus reached its expected state.
    pub timed_out: bool,
    /// Last status read from the chip.
    pub bus_status: BusStatus,
    /// Time since the first report of the transaction was sent.
    pub elapsed: Duration,
    /// Condition, direction, byte count and address of the attempted operation.
    pub description: String,
}

impl I2cError {
    /// Map the bus status onto the portable `embedded-hal` classification.
    ///
    /// Arbitration loss and a busy bus outrank any NACK bits reported with
    /// them.
    pub fn kind(&self) -> ErrorKind {
        if self.timed_out {
            ErrorKind::Other
        } else if self.bus_status.arbitration_lost() {
            ErrorKind::ArbitrationLoss
        } else if self.bus_status.bus_busy() {
            ErrorKind::Other
        } else if self.bus_status.no_slave_ack() {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        } else if self.bus_status.no_data_ack() {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
        } else if self.bus_status.error() {
            ErrorKind::Bus
        } else {
            ErrorKind::Other
        }
    }
}

impl fmt::Display for I2cError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timed_out {
            write!(
                f,
                "I2C {} timed out after {} µs (bus status {})",
                self.description,
                self.elapsed.as_micros(),
                self.bus_status
            )
        } else {
            write!(
                f,
                "I2C {} failed after {} µs (bus status {})",
                self.description,
                self.elapsed.as_micros(),
                self.bus_status
            )
        }
    }
}

impl std::error::Error for I2cError {}

impl embedded_hal::i2c::Error for Ft260Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Ft260Error::I2c(e) => e.kind(),
            _ => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(status: u8) -> I2cError {
        I2cError {
            timed_out: false,
            bus_status: BusStatus::from_bits(status),
            elapsed: Duration::from_micros(120),
            description: "Start read of 1 bytes from 0x10".into(),
        }
    }

    #[test]
    fn nack_kinds() {
        assert_eq!(failed(0x26).kind(), ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        assert_eq!(failed(0x2A).kind(), ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        assert_eq!(failed(0x22).kind(), ErrorKind::Bus);
    }

    #[test]
    fn arbitration_loss_and_busy_bus_outrank_nack() {
        assert_eq!(failed(0x16).kind(), ErrorKind::ArbitrationLoss);
        assert_eq!(failed(0x46).kind(), ErrorKind::Other);
        assert_eq!(failed(0x56).kind(), ErrorKind::ArbitrationLoss);
    }

    #[test]
    fn timeout_is_other() {
        let mut e = failed(0x26);
        e.timed_out = true;
        assert_eq!(e.kind(), ErrorKind::Other);
    }
}
