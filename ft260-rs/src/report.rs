//! HID report codec.
//!
//! Every exchange with the FT260 is one HID report: a report ID followed by
//! a payload. Reports come in three shapes:
//!
//! | Shape                | Length           | First byte checked |
//! |----------------------|------------------|--------------------|
//! | `Fixed`              | exactly declared | yes                |
//! | `VariableSize`       | up to declared   | yes                |
//! | `VariableReportId`   | up to declared   | no                 |
//!
//! The codec only frames and checks reports. Retries belong to callers.

use crate::error::{Ft260Error, ProtocolError, TransportError};
use crate::registers::MAX_REPORT_LEN;
use crate::transport::HidTransport;

/// HID transfer channel of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportChannel {
    /// Feature reports: configuration and status.
    Feature,
    /// Interrupt reports: I2C payload data.
    Data,
}

/// Length rules of an input report. Lengths exclude the report ID byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportShape {
    Fixed(usize),
    VariableSize(usize),
    VariableReportId(usize),
}

impl ReportShape {
    /// Number of payload bytes to request from the transport.
    pub const fn max_len(self) -> usize {
        match self {
            ReportShape::Fixed(len)
            | ReportShape::VariableSize(len)
            | ReportShape::VariableReportId(len) => len,
        }
    }
}

/// A report sent to the chip.
pub trait OutputReport {
    /// Channel the report is sent on.
    const CHANNEL: ReportChannel;

    /// Report ID, written as the first byte.
    fn report_id(&self) -> u8;

    /// Payload length, excluding the report ID.
    fn payload_len(&self) -> usize;

    /// Fill `payload` (exactly `payload_len()` bytes, zeroed).
    fn marshal(&self, payload: &mut [u8]) -> Result<(), ProtocolError>;
}

/// A report received from the chip.
pub trait InputReport: Sized {
    /// Channel the report is read from.
    const CHANNEL: ReportChannel;

    /// Expected report ID. Only checked unless the shape is `VariableReportId`.
    const REPORT_ID: u8;

    /// Length rules of the report.
    const SHAPE: ReportShape;

    /// Decode the payload (report ID already stripped).
    fn unmarshal(payload: &[u8]) -> Result<Self, ProtocolError>;
}

/// Encode `report` and send it over its channel.
///
/// # Errors
/// * [`ProtocolError::PayloadTooLarge`] if the report does not fit one HID report
/// * [`TransportError::ShortWrite`] if the transport accepted fewer bytes
pub fn write_report<T, R>(transport: &mut T, report: &R) -> Result<(), Ft260Error>
where
    T: HidTransport + ?Sized,
    R: OutputReport,
{
    let total = 1 + report.payload_len();
    if total > MAX_REPORT_LEN {
        return Err(ProtocolError::PayloadTooLarge {
            len: report.payload_len(),
            max: MAX_REPORT_LEN - 1,
        }
        .into());
    }

    let mut buf = [0u8; MAX_REPORT_LEN];
    buf[0] = report.report_id();
    report.marshal(&mut buf[1..total])?;

    let written = transport.write(&buf[..total], R::CHANNEL)?;
    if written < total {
        return Err(TransportError::ShortWrite {
            report_id: buf[0],
            written,
            expected: total,
        }
        .into());
    }
    Ok(())
}

/// Read one report of type `R`, waiting at most `timeout_ms`.
///
/// # Errors
/// * [`TransportError::Timeout`] if nothing arrived in time
/// * [`ProtocolError::UnexpectedReportId`] on an ID mismatch (skipped for
///   `VariableReportId` reports)
/// * [`TransportError::ShortRead`] if a `Fixed` report has the wrong length
/// * any decode error of `R`
pub fn read_report<T, R>(transport: &mut T, timeout_ms: i32) -> Result<R, Ft260Error>
where
    T: HidTransport + ?Sized,
    R: InputReport,
{
    let total = (1 + R::SHAPE.max_len()).min(MAX_REPORT_LEN);
    let mut buf = [0u8; MAX_REPORT_LEN];
    buf[0] = R::REPORT_ID;

    let received = transport.read(&mut buf[..total], R::CHANNEL, timeout_ms)?;
    if received == 0 {
        return Err(TransportError::Timeout {
            report_id: R::REPORT_ID,
            timeout_ms,
        }
        .into());
    }

    if !matches!(R::SHAPE, ReportShape::VariableReportId(_)) && buf[0] != R::REPORT_ID {
        return Err(ProtocolError::UnexpectedReportId {
            expected: R::REPORT_ID,
            received: buf[0],
        }
        .into());
    }

    if matches!(R::SHAPE, ReportShape::Fixed(_)) && received != total {
        return Err(TransportError::ShortRead {
            report_id: R::REPORT_ID,
            received,
            expected: total,
        }
        .into());
    }

    Ok(R::unmarshal(&buf[1..received.min(total)])?)
}

/// Decode a byte that must be exactly 0 or 1.
pub(crate) fn read_bool(report_id: u8, payload: &[u8], index: usize) -> Result<bool, ProtocolError> {
    match payload[index] {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(ProtocolError::InvalidBool {
            report_id,
            index,
            value,
        }),
    }
}
