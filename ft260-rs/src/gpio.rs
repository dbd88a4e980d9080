//! GPIO values and directions.

use embedded_hal_async::delay::DelayNs;

use crate::error::{Ft260Error, ProtocolError};
use crate::i2c::Ft260;
use crate::registers::REPORT_ID_GPIO;
use crate::report::{read_report, write_report, InputReport, OutputReport, ReportChannel, ReportShape};
use crate::transport::HidTransport;

/// State of all GPIO pins. A set direction bit means output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpioReport {
    /// GPIO 0-5.
    pub value: u8,
    pub direction: u8,
    /// GPIO A-H.
    pub value_ex: u8,
    pub direction_ex: u8,
}

impl InputReport for GpioReport {
    const CHANNEL: ReportChannel = ReportChannel::Feature;
    const REPORT_ID: u8 = REPORT_ID_GPIO;
    const SHAPE: ReportShape = ReportShape::Fixed(4);

    fn unmarshal(payload: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self {
            value: payload[0],
            direction: payload[1],
            value_ex: payload[2],
            direction_ex: payload[3],
        })
    }
}

impl OutputReport for GpioReport {
    const CHANNEL: ReportChannel = ReportChannel::Feature;

    fn report_id(&self) -> u8 {
        REPORT_ID_GPIO
    }

    fn payload_len(&self) -> usize {
        4
    }

    fn marshal(&self, payload: &mut [u8]) -> Result<(), ProtocolError> {
        payload.copy_from_slice(&[self.value, self.direction, self.value_ex, self.direction_ex]);
        Ok(())
    }
}

impl<T, D> Ft260<T, D>
where
    T: HidTransport,
    D: DelayNs,
{
    pub fn gpio(&mut self) -> Result<GpioReport, Ft260Error> {
        read_report(&mut self.transport, self.read_timeout_ms)
    }

    pub fn set_gpio(&mut self, gpio: GpioReport) -> Result<(), Ft260Error> {
        write_report(&mut self.transport, &gpio)
    }
}
