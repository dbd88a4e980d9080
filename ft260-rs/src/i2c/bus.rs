//! Register access and bus scanning on top of any async I2C bus.

use core::ops::RangeInclusive;

use embedded_hal::i2c::{Error, ErrorKind};
use embedded_hal_async::i2c::I2c;

use crate::registers::{SCAN_FIRST_ADDRESS, SCAN_LAST_ADDRESS};

/// Addresses probed by a full bus scan.
pub const SCAN_RANGE: RangeInclusive<u8> = SCAN_FIRST_ADDRESS..=SCAN_LAST_ADDRESS;

/// Register reads and bus scans for every async I2C bus: the FT260 itself,
/// the sequenced bus handle, shared direct access and the dummy bus.
#[allow(async_fn_in_trait)]
pub trait I2cBus: I2c {
    /// Read `len` bytes starting at `register`: a one byte register write
    /// followed by a repeated-start read.
    async fn get(&mut self, address: u8, register: u8, len: usize) -> Result<Vec<u8>, Self::Error> {
        let mut data = vec![0; len];
        self.write_read(address, &[register], &mut data).await?;
        Ok(data)
    }

    /// Probe every address in `addresses` with a one byte read.
    ///
    /// An address that answers with a NACK or a plain bus error is absent.
    /// Any other failure (timeout, arbitration loss, transport) aborts the
    /// scan and is returned.
    async fn scan(&mut self, addresses: RangeInclusive<u8>) -> Result<Vec<u8>, Self::Error> {
        let mut found = Vec::new();
        let mut probe = [0u8; 1];
        for address in addresses {
            match self.read(address, &mut probe).await {
                Ok(()) => found.push(address),
                Err(e) if is_absent_device(&e) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }
}

impl<B: I2c> I2cBus for B {}

/// Whether a failed probe means "nothing at this address".
pub fn is_absent_device<E: Error>(error: &E) -> bool {
    matches!(error.kind(), ErrorKind::NoAcknowledge(_) | ErrorKind::Bus)
}
