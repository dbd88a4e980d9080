//! I2C reports exchanged with the FT260.

use heapless::Vec as HVec;

use crate::error::ProtocolError;
use crate::i2c::{BusStatus, I2cCondition};
use crate::registers::{
    I2C_MAX_PAYLOAD, MAX_REPORT_LEN, REPORT_ID_I2C_DATA, REPORT_ID_I2C_READ_REQUEST,
    REPORT_ID_I2C_STATUS,
};
use crate::report::{InputReport, OutputReport, ReportChannel, ReportShape};

fn check_address(address: u8) -> Result<(), ProtocolError> {
    if address & 0x80 != 0 {
        return Err(ProtocolError::InvalidAddress(address));
    }
    Ok(())
}

/// Smallest data report able to carry `len` payload bytes.
///
/// Report `0xD0 + n` holds up to `4 * (n + 1)` bytes, so the ID is
/// `0xD0 + (len - 1) / 4`. Rounding `len / 4` instead would ask for 0xDF
/// for a full 60 byte chunk, which the chip does not accept.
pub const fn data_report_id(len: usize) -> u8 {
    if len == 0 {
        REPORT_ID_I2C_DATA
    } else {
        REPORT_ID_I2C_DATA + ((len - 1) / 4) as u8
    }
}

// ---------------------------------------------------------------------------
// Bus status (feature in)
// ---------------------------------------------------------------------------

/// Controller status and configured clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cStatus {
    pub bus_status: BusStatus,
    /// Bus clock in kHz.
    pub bus_speed: u16,
}

impl InputReport for I2cStatus {
    const CHANNEL: ReportChannel = ReportChannel::Feature;
    const REPORT_ID: u8 = REPORT_ID_I2C_STATUS;
    // status, speed LSB, speed MSB, reserved
    const SHAPE: ReportShape = ReportShape::Fixed(4);

    fn unmarshal(payload: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self {
            bus_status: BusStatus::from_bits(payload[0]),
            bus_speed: u16::from_le_bytes([payload[1], payload[2]]),
        })
    }
}

// ---------------------------------------------------------------------------
// Read request (data out)
// ---------------------------------------------------------------------------

/// Ask the controller to read `len` bytes from `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cReadRequest {
    pub address: u8,
    pub condition: I2cCondition,
    pub len: u16,
}

impl OutputReport for I2cReadRequest {
    const CHANNEL: ReportChannel = ReportChannel::Data;

    fn report_id(&self) -> u8 {
        REPORT_ID_I2C_READ_REQUEST
    }

    fn payload_len(&self) -> usize {
        4
    }

    fn marshal(&self, payload: &mut [u8]) -> Result<(), ProtocolError> {
        check_address(self.address)?;
        payload[0] = self.address;
        payload[1] = self.condition.bits();
        payload[2..4].copy_from_slice(&self.len.to_le_bytes());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Write data (data out)
// ---------------------------------------------------------------------------

/// One chunk of an I2C write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cWrite<'a> {
    pub address: u8,
    pub condition: I2cCondition,
    pub payload: &'a [u8],
}

impl OutputReport for I2cWrite<'_> {
    const CHANNEL: ReportChannel = ReportChannel::Data;

    fn report_id(&self) -> u8 {
        data_report_id(self.payload.len())
    }

    fn payload_len(&self) -> usize {
        3 + self.payload.len()
    }

    fn marshal(&self, payload: &mut [u8]) -> Result<(), ProtocolError> {
        if self.payload.len() > I2C_MAX_PAYLOAD {
            return Err(ProtocolError::PayloadTooLarge {
                len: self.payload.len(),
                max: I2C_MAX_PAYLOAD,
            });
        }
        check_address(self.address)?;
        payload[0] = self.address;
        payload[1] = self.condition.bits();
        payload[2] = self.payload.len() as u8;
        payload[3..].copy_from_slice(self.payload);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Read data (data in)
// ---------------------------------------------------------------------------

/// Bytes delivered in answer to an [`I2cReadRequest`].
///
/// The report ID varies with the payload size, the first payload byte holds
/// the number of valid data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cInput {
    pub data: HVec<u8, I2C_MAX_PAYLOAD>,
}

impl InputReport for I2cInput {
    const CHANNEL: ReportChannel = ReportChannel::Data;
    const REPORT_ID: u8 = REPORT_ID_I2C_DATA;
    const SHAPE: ReportShape = ReportShape::VariableReportId(MAX_REPORT_LEN - 1);

    fn unmarshal(payload: &[u8]) -> Result<Self, ProtocolError> {
        let (&len, rest) = payload.split_first().ok_or(ProtocolError::Malformed {
            report_id: REPORT_ID_I2C_DATA,
            reason: "empty I2C input report",
        })?;
        let len = len as usize;
        if len > I2C_MAX_PAYLOAD {
            return Err(ProtocolError::Malformed {
                report_id: REPORT_ID_I2C_DATA,
                reason: "I2C input length exceeds 60 bytes",
            });
        }
        if rest.len() < len {
            return Err(ProtocolError::Malformed {
                report_id: REPORT_ID_I2C_DATA,
                reason: "I2C input shorter than its declared length",
            });
        }
        let mut data = HVec::new();
        // Cannot fail: len <= I2C_MAX_PAYLOAD was checked above.
        let _ = data.extend_from_slice(&rest[..len]);
        Ok(Self { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_report_ids_cover_d0_to_de() {
        assert_eq!(data_report_id(1), 0xD0);
        assert_eq!(data_report_id(4), 0xD0);
        assert_eq!(data_report_id(5), 0xD1);
        assert_eq!(data_report_id(59), 0xDE);
        assert_eq!(data_report_id(60), 0xDE);
    }

    #[test]
    fn write_layout() {
        let report = I2cWrite {
            address: 0x40,
            condition: I2cCondition::StartStop,
            payload: &[0x00, 0x21],
        };
        let mut payload = [0u8; 5];
        report.marshal(&mut payload).unwrap();
        assert_eq!(report.report_id(), 0xD0);
        assert_eq!(payload, [0x40, 0x06, 0x02, 0x00, 0x21]);
    }

    #[test]
    fn write_rejects_eight_bit_address() {
        let report = I2cWrite {
            address: 0x80,
            condition: I2cCondition::Start,
            payload: &[1],
        };
        let mut payload = [0u8; 4];
        assert_eq!(report.marshal(&mut payload), Err(ProtocolError::InvalidAddress(0x80)));
    }

    #[test]
    fn write_rejects_oversized_payload() {
        let data = [0u8; 61];
        let report = I2cWrite {
            address: 0x40,
            condition: I2cCondition::Start,
            payload: &data,
        };
        let mut payload = [0u8; 64];
        assert_eq!(
            report.marshal(&mut payload),
            Err(ProtocolError::PayloadTooLarge { len: 61, max: 60 })
        );
    }

    #[test]
    fn read_request_layout() {
        let report = I2cReadRequest {
            address: 0x48,
            condition: I2cCondition::RepeatedStartStop,
            len: 0x0102,
        };
        let mut payload = [0u8; 4];
        report.marshal(&mut payload).unwrap();
        assert_eq!(payload, [0x48, 0x07, 0x02, 0x01]);
    }

    #[test]
    fn input_honours_length_byte() {
        let input = I2cInput::unmarshal(&[2, 0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(input.data.as_slice(), &[0xAA, 0xBB]);
    }

    #[test]
    fn input_shorter_than_declared_is_malformed() {
        assert!(matches!(
            I2cInput::unmarshal(&[4, 0xAA]),
            Err(ProtocolError::Malformed { .. })
        ));
        assert!(matches!(I2cInput::unmarshal(&[]), Err(ProtocolError::Malformed { .. })));
    }

    #[test]
    fn status_layout() {
        let status = I2cStatus::unmarshal(&[0x20, 0x90, 0x01, 0x00]).unwrap();
        assert!(status.bus_status.controller_idle());
        assert_eq!(status.bus_speed, 400);
    }
}
