//! Offline stand-in for the bridge.

use core::convert::Infallible;

use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

/// Bus without hardware behind it.
///
/// Every operation succeeds. Writes are logged, reads return zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyBus;

impl ErrorType for DummyBus {
    type Error = Infallible;
}

impl I2c for DummyBus {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(_data) => {
                    #[cfg(feature = "log")]
                    log::info!("Dummy I2C write to {:#04x}: {:02x?}", _address, _data);
                }
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use ft260::I2cBus;

    use super::*;

    #[test]
    fn reads_return_zeros() {
        let mut buf = [0xAA; 3];
        block_on(DummyBus.read(0x48, &mut buf)).unwrap();
        assert_eq!(buf, [0; 3]);
        assert_eq!(block_on(DummyBus.get(0x48, 0x00, 2)).unwrap(), vec![0, 0]);
    }

    #[test]
    fn scan_finds_every_address() {
        let found = block_on(DummyBus.scan(0x40..=0x44)).unwrap();
        assert_eq!(found, vec![0x40, 0x41, 0x42, 0x43, 0x44]);
    }
}
