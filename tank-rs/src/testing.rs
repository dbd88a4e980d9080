//! Test doubles shared by the driver tests.

use std::collections::VecDeque;

use embedded_hal::i2c::ErrorKind;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

/// Bus that records every write and answers reads from a script.
#[derive(Default)]
pub struct RecordingBus {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub reads: VecDeque<Vec<u8>>,
    pub fail_next: bool,
}

impl RecordingBus {
    /// Written bytes, without addresses.
    pub fn data(&self) -> Vec<Vec<u8>> {
        self.writes.iter().map(|(_, data)| data.clone()).collect()
    }
}

impl ErrorType for RecordingBus {
    type Error = ErrorKind;
}

impl I2c for RecordingBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if std::mem::take(&mut self.fail_next) {
            return Err(ErrorKind::Bus);
        }
        for op in operations {
            match op {
                Operation::Write(data) => self.writes.push((address, data.to_vec())),
                Operation::Read(buf) => {
                    let data = self.reads.pop_front().ok_or(ErrorKind::Other)?;
                    buf.copy_from_slice(&data);
                }
            }
        }
        Ok(())
    }
}
