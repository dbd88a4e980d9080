//! The three ways drivers reach the I2C bus.
//!
//! - **Sequenced** ([`SequencedBus`]): requests go through the queue of a
//!   single worker task that owns the bridge. Safe for any number of
//!   concurrent callers.
//! - **Direct** ([`DirectBus`]): drivers call the bridge in-line through
//!   a mutex-guarded [`I2cDevice`]. Lower latency; the embedding
//!   application is responsible for single-caller use.
//! - **Dummy** ([`DummyBus`]): no hardware at all.

mod dummy;
mod sequencer;

use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Delay;
use ft260::Ft260;

pub use dummy::DummyBus;
pub use sequencer::{
    run_i2c_sequencer, Completion, I2cOperation, I2cRequest, I2cResult, RequestQueue,
    SequencedBus, TransactionStep, REQUEST_QUEUE_LEN,
};

/// Bridge shared between drivers in direct mode.
pub type SharedBridge<T, D = Delay> = Mutex<CriticalSectionRawMutex, Ft260<T, D>>;

/// One driver's handle on a [`SharedBridge`].
pub type DirectBus<'a, T, D = Delay> = I2cDevice<'a, CriticalSectionRawMutex, Ft260<T, D>>;

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embedded_hal_async::delay::DelayNs;
    use embedded_hal_async::i2c::I2c;
    use ft260::transport::mock::MockTransport;
    use ft260::I2cBus;

    use super::*;

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn direct_handles_share_one_bridge() {
        let mock = MockTransport::new();
        mock.echo_reads();
        let bridge: SharedBridge<MockTransport, NoDelay> = Mutex::new(Ft260::new(mock.clone(), NoDelay));

        let mut motors: DirectBus<'_, MockTransport, NoDelay> = I2cDevice::new(&bridge);
        let mut battery: DirectBus<'_, MockTransport, NoDelay> = I2cDevice::new(&bridge);

        block_on(motors.write(0x40, &[0x00, 0x21])).unwrap();
        assert_eq!(block_on(battery.get(0x48, 0x00, 2)).unwrap(), vec![0x48, 0x48]);
        assert_eq!(mock.data_writes().len(), 3);
    }

    #[test]
    fn direct_errors_classify_absent_devices() {
        let mock = MockTransport::new();
        mock.set_i2c_status(0x26, 400);
        let bridge: SharedBridge<MockTransport, NoDelay> = Mutex::new(Ft260::new(mock, NoDelay));
        let mut bus: DirectBus<'_, MockTransport, NoDelay> = I2cDevice::new(&bridge);

        let found = block_on(bus.scan(0x40..=0x42)).unwrap();
        assert!(found.is_empty());
    }
}
