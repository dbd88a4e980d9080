//! I2C bus status bits and master condition codes.

use core::fmt;

use crate::registers::{
    I2C_STATUS_ARBITRATION_LOST, I2C_STATUS_BUS_BUSY, I2C_STATUS_CONTROLLER_BUSY,
    I2C_STATUS_CONTROLLER_IDLE, I2C_STATUS_ERROR, I2C_STATUS_NO_DATA_ACK, I2C_STATUS_NO_SLAVE_ACK,
};

const ERROR_BITS: u8 =
    I2C_STATUS_ERROR | I2C_STATUS_NO_SLAVE_ACK | I2C_STATUS_NO_DATA_ACK | I2C_STATUS_ARBITRATION_LOST;

const NAMES: [(u8, &str); 7] = [
    (I2C_STATUS_CONTROLLER_BUSY, "ControllerBusy"),
    (I2C_STATUS_ERROR, "Error"),
    (I2C_STATUS_NO_SLAVE_ACK, "NoSlaveAck"),
    (I2C_STATUS_NO_DATA_ACK, "NoDataAck"),
    (I2C_STATUS_ARBITRATION_LOST, "ArbitrationLost"),
    (I2C_STATUS_CONTROLLER_IDLE, "ControllerIdle"),
    (I2C_STATUS_BUS_BUSY, "BusBusy"),
];

/// Bus status bitmask reported by the I2C status report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStatus(u8);

impl BusStatus {
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn controller_busy(self) -> bool {
        self.0 & I2C_STATUS_CONTROLLER_BUSY != 0
    }

    pub const fn error(self) -> bool {
        self.0 & I2C_STATUS_ERROR != 0
    }

    pub const fn no_slave_ack(self) -> bool {
        self.0 & I2C_STATUS_NO_SLAVE_ACK != 0
    }

    pub const fn no_data_ack(self) -> bool {
        self.0 & I2C_STATUS_NO_DATA_ACK != 0
    }

    pub const fn arbitration_lost(self) -> bool {
        self.0 & I2C_STATUS_ARBITRATION_LOST != 0
    }

    pub const fn controller_idle(self) -> bool {
        self.0 & I2C_STATUS_CONTROLLER_IDLE != 0
    }

    pub const fn bus_busy(self) -> bool {
        self.0 & I2C_STATUS_BUS_BUSY != 0
    }

    /// Any of Error, NoSlaveAck, NoDataAck or ArbitrationLost.
    pub const fn has_error(self) -> bool {
        self.0 & ERROR_BITS != 0
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x} [", self.0)?;
        let mut first = true;
        for (bit, name) in NAMES {
            if self.0 & bit != 0 {
                if !first {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str("]")
    }
}

/// Master control bits sent with every I2C report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum I2cCondition {
    None = 0x00,
    Start = 0x02,
    RepeatedStart = 0x03,
    Stop = 0x04,
    StartStop = 0x06,
    RepeatedStartStop = 0x07,
}

impl I2cCondition {
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// The same condition with START replaced by a repeated START.
    pub const fn with_repeated_start(self) -> Self {
        match self {
            I2cCondition::Start => I2cCondition::RepeatedStart,
            I2cCondition::StartStop => I2cCondition::RepeatedStartStop,
            other => other,
        }
    }

    /// Condition for a single-report operation.
    pub const fn framing(repeated_start: bool, stop: bool) -> Self {
        match (repeated_start, stop) {
            (false, false) => I2cCondition::Start,
            (false, true) => I2cCondition::StartStop,
            (true, false) => I2cCondition::RepeatedStart,
            (true, true) => I2cCondition::RepeatedStartStop,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            I2cCondition::None => "Nothing",
            I2cCondition::Start => "Start",
            I2cCondition::RepeatedStart => "Repeated Start",
            I2cCondition::Stop => "Stop",
            I2cCondition::StartStop => "Start + Stop",
            I2cCondition::RepeatedStartStop => "Repeated Start + Stop",
        }
    }
}

impl fmt::Display for I2cCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_codes_match_the_wire_format() {
        assert_eq!(I2cCondition::None.bits(), 0x0);
        assert_eq!(I2cCondition::Start.bits(), 0x2);
        assert_eq!(I2cCondition::RepeatedStart.bits(), 0x3);
        assert_eq!(I2cCondition::Stop.bits(), 0x4);
        assert_eq!(I2cCondition::StartStop.bits(), 0x6);
    }

    #[test]
    fn repeated_start_only_replaces_start() {
        assert_eq!(I2cCondition::Start.with_repeated_start(), I2cCondition::RepeatedStart);
        assert_eq!(I2cCondition::StartStop.with_repeated_start(), I2cCondition::RepeatedStartStop);
        assert_eq!(I2cCondition::Stop.with_repeated_start(), I2cCondition::Stop);
        assert_eq!(I2cCondition::None.with_repeated_start(), I2cCondition::None);
    }

    #[test]
    fn status_bits_in_order() {
        let status = BusStatus::from_bits(0b0100_0001);
        assert!(status.controller_busy());
        assert!(status.bus_busy());
        assert!(!status.has_error());

        let nack = BusStatus::from_bits(0x06);
        assert!(nack.error());
        assert!(nack.no_slave_ack());
        assert!(nack.has_error());
    }

    #[test]
    fn display_lists_set_bits() {
        assert_eq!(BusStatus::from_bits(0x26).to_string(), "0x26 [Error, NoSlaveAck, ControllerIdle]");
        assert_eq!(BusStatus::from_bits(0).to_string(), "0x00 []");
    }
}
