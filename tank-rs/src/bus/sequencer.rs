//! Bus sequencer: one worker owns the bridge, every other task talks to it
//! through a request queue.
//!
//! Callers hold a [`SequencedBus`], a cheap copyable handle implementing
//! the async [`I2c`] trait. Each call becomes one [`I2cRequest`] on the
//! FIFO [`RequestQueue`]; [`run_i2c_sequencer`] executes the requests one
//! after the other and hands each result back through the request's
//! completion signal. A transaction (all chunks plus the status polling)
//! therefore never overlaps with another one on the physical bus.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
use ft260::Ft260Error;

/// Capacity of the request queue. Callers wait in `send` when it is full.
pub const REQUEST_QUEUE_LEN: usize = 20;

/// Bytes read by a request (empty for pure writes).
pub type I2cResult = Result<Vec<u8>, Ft260Error>;

/// Completion of one request, signalled by the worker.
pub type Completion = Signal<CriticalSectionRawMutex, I2cResult>;

/// FIFO between the callers and the worker.
pub type RequestQueue = Channel<CriticalSectionRawMutex, I2cRequest, REQUEST_QUEUE_LEN>;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One logical bus operation, with owned buffers so it can cross the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cOperation {
    Write(Vec<u8>),
    Read(usize),
    /// Write without STOP, then read after a repeated START.
    WriteRead(Vec<u8>, usize),
    /// Steps of an `embedded-hal` transaction, run as one unit.
    Transaction(Vec<TransactionStep>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStep {
    Write(Vec<u8>),
    Read(usize),
}

/// A queued operation and the signal its caller waits on.
pub struct I2cRequest {
    pub address: u8,
    pub operation: I2cOperation,
    pub done: Arc<Completion>,
}

impl I2cRequest {
    pub fn new(address: u8, operation: I2cOperation) -> Self {
        Self {
            address,
            operation,
            done: Arc::new(Completion::new()),
        }
    }

    /// Run the operation on `bus`. Reads of a transaction are returned
    /// concatenated in step order.
    pub async fn execute<B>(&self, bus: &mut B) -> I2cResult
    where
        B: I2c<Error = Ft260Error>,
    {
        let address = self.address;
        match &self.operation {
            I2cOperation::Write(data) => {
                bus.write(address, data).await?;
                Ok(Vec::new())
            }
            I2cOperation::Read(len) => {
                let mut buf = vec![0; *len];
                bus.read(address, &mut buf).await?;
                Ok(buf)
            }
            I2cOperation::WriteRead(data, len) => {
                let mut buf = vec![0; *len];
                bus.write_read(address, data, &mut buf).await?;
                Ok(buf)
            }
            I2cOperation::Transaction(steps) => {
                let mut buffers: Vec<Vec<u8>> = steps
                    .iter()
                    .filter_map(|step| match step {
                        TransactionStep::Read(len) => Some(vec![0; *len]),
                        TransactionStep::Write(_) => None,
                    })
                    .collect();
                {
                    let mut reads = buffers.iter_mut();
                    let mut operations: Vec<Operation<'_>> = steps
                        .iter()
                        .map(|step| match step {
                            TransactionStep::Write(data) => Operation::Write(data),
                            TransactionStep::Read(_) => {
                                Operation::Read(reads.next().map(Vec::as_mut_slice).unwrap_or_default())
                            }
                        })
                        .collect();
                    bus.transaction(address, &mut operations).await?;
                }
                Ok(buffers.concat())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Execute queued requests forever, one at a time, in arrival order.
///
/// This is a regular `async fn`, so the binary wraps it in a concrete
/// `#[embassy_executor::task]`:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn sequencer_task(bridge: Ft260<HidapiTransport>, queue: &'static RequestQueue) {
///     run_i2c_sequencer(bridge, queue).await;
/// }
/// ```
///
/// The worker takes ownership of the bus; nothing else may touch the
/// bridge while it runs. A failed request is reported to its caller only,
/// the worker carries on with the next one.
pub async fn run_i2c_sequencer<B>(mut bus: B, queue: &RequestQueue)
where
    B: I2c<Error = Ft260Error>,
{
    #[cfg(feature = "log")]
    log::info!("I2C sequencer started (queue of {})", REQUEST_QUEUE_LEN);

    loop {
        let request = queue.receive().await;
        let result = request.execute(&mut bus).await;
        request.done.signal(result);
    }
}

// ---------------------------------------------------------------------------
// Caller handle
// ---------------------------------------------------------------------------

/// Handle for queueing I2C operations to the sequencer.
#[derive(Clone, Copy)]
pub struct SequencedBus<'a> {
    queue: &'a RequestQueue,
}

impl<'a> SequencedBus<'a> {
    pub fn new(queue: &'a RequestQueue) -> Self {
        Self { queue }
    }

    /// Queue `operation` and wait for the worker to finish it.
    pub async fn request(&self, address: u8, operation: I2cOperation) -> I2cResult {
        let request = I2cRequest::new(address, operation);
        let done = Arc::clone(&request.done);
        self.queue.send(request).await;
        done.wait().await
    }
}

impl ErrorType for SequencedBus<'_> {
    type Error = Ft260Error;
}

impl I2c for SequencedBus<'_> {
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        let data = self.request(address, I2cOperation::Read(read.len())).await?;
        read.copy_from_slice(&data);
        Ok(())
    }

    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.request(address, I2cOperation::Write(write.to_vec())).await?;
        Ok(())
    }

    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        let data = self
            .request(address, I2cOperation::WriteRead(write.to_vec(), read.len()))
            .await?;
        read.copy_from_slice(&data);
        Ok(())
    }

    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let steps = operations
            .iter()
            .map(|op| match op {
                Operation::Write(data) => TransactionStep::Write(data.to_vec()),
                Operation::Read(buf) => TransactionStep::Read(buf.len()),
            })
            .collect();
        let data = self.request(address, I2cOperation::Transaction(steps)).await?;

        let mut offset = 0;
        for op in operations.iter_mut() {
            if let Operation::Read(buf) = op {
                buf.copy_from_slice(&data[offset..offset + buf.len()]);
                offset += buf.len();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use embassy_futures::block_on;
    use embassy_futures::select::select;
    use embedded_hal_async::delay::DelayNs;
    use ft260::registers::{REPORT_ID_I2C_DATA, REPORT_ID_I2C_DATA_MAX, REPORT_ID_I2C_READ_REQUEST};
    use ft260::transport::mock::MockTransport;
    use ft260::{Ft260, I2cBus, PollConfig};

    use super::*;

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    type MockBridge = Ft260<MockTransport, NoDelay>;

    fn bridge(mock: &MockTransport) -> MockBridge {
        Ft260::new(mock.clone(), NoDelay).with_poll_config(PollConfig {
            interval_us: 50,
            max_polls: 20,
        })
    }

    type Stop = Signal<CriticalSectionRawMutex, ()>;

    /// Stops the worker when dropped, also while a failed assertion unwinds.
    struct StopOnDrop<'a>(&'a Stop);

    impl Drop for StopOnDrop<'_> {
        fn drop(&mut self) {
            self.0.signal(());
        }
    }

    /// Run the worker on its own thread while `callers` runs, then stop it.
    fn with_worker<F: FnOnce(&RequestQueue) + Send>(mock: &MockTransport, callers: F) {
        let queue = RequestQueue::new();
        let stop = Stop::new();
        let bus = bridge(mock);
        thread::scope(|s| {
            let worker = s.spawn(|| block_on(select(run_i2c_sequencer(bus, &queue), stop.wait())));
            let guard = StopOnDrop(&stop);
            callers(&queue);
            drop(guard);
            worker.join().expect("worker thread panicked");
        });
    }

    const START: u8 = 0x02;
    const NONE: u8 = 0x00;
    const STOP: u8 = 0x04;

    fn is_write_report(report: &[u8]) -> bool {
        (REPORT_ID_I2C_DATA..=REPORT_ID_I2C_DATA_MAX).contains(&report[0])
    }

    // ── Requests ─────────────────────────────────────────────────────

    #[test]
    fn request_results_reach_the_caller() {
        let mock = MockTransport::new();
        mock.echo_reads();
        with_worker(&mock, |queue| {
            let mut bus = SequencedBus::new(queue);
            block_on(bus.write(0x40, &[0x00, 0x21])).unwrap();

            let mut buf = [0u8; 2];
            block_on(bus.read(0x48, &mut buf)).unwrap();
            assert_eq!(buf, [0x48, 0x48]);

            assert_eq!(block_on(bus.get(0x49, 0x01, 3)).unwrap(), vec![0x49; 3]);
        });

        let writes = mock.data_writes();
        assert_eq!(writes[0], vec![0xD0, 0x40, 0x06, 2, 0x00, 0x21]);
        assert_eq!(writes[1], vec![REPORT_ID_I2C_READ_REQUEST, 0x48, 0x06, 2, 0]);
        // register pointer without STOP, then a repeated-start read
        assert_eq!(writes[2], vec![0xD0, 0x49, 0x02, 1, 0x01]);
        assert_eq!(writes[3], vec![REPORT_ID_I2C_READ_REQUEST, 0x49, 0x07, 3, 0]);
    }

    #[test]
    fn transaction_reads_are_split_back() {
        let mock = MockTransport::new();
        mock.echo_reads();
        with_worker(&mock, |queue| {
            let mut bus = SequencedBus::new(queue);
            let (mut a, mut b) = ([0u8; 1], [0u8; 2]);
            block_on(bus.transaction(
                0x20,
                &mut [
                    Operation::Write(&[0x12]),
                    Operation::Read(&mut a),
                    Operation::Read(&mut b),
                ],
            ))
            .unwrap();
            assert_eq!((a, b), ([0x20], [0x20, 0x20]));
        });
    }

    #[test]
    fn errors_are_returned_to_the_caller_only() {
        let mock = MockTransport::new();
        // NACK on the first transfer, idle afterwards
        mock.push_i2c_status(0x26);
        with_worker(&mock, |queue| {
            let mut bus = SequencedBus::new(queue);
            let error = block_on(bus.write(0x33, &[1])).unwrap_err();
            assert!(ft260::is_absent_device(&error));
            block_on(bus.write(0x40, &[1])).unwrap();
        });
    }

    #[test]
    fn transport_failure_is_reported() {
        let mock = MockTransport::new();
        mock.disconnect();
        with_worker(&mock, |queue| {
            let mut bus = SequencedBus::new(queue);
            assert!(matches!(
                block_on(bus.write(0x40, &[1])),
                Err(Ft260Error::Transport(_))
            ));
        });
    }

    #[test]
    #[should_panic(expected = "caller failed")]
    fn failing_caller_stops_the_worker() {
        let mock = MockTransport::new();
        with_worker(&mock, |queue| {
            let mut bus = SequencedBus::new(queue);
            block_on(bus.write(0x40, &[1])).unwrap();
            panic!("caller failed");
        });
    }

    // ── Concurrency ──────────────────────────────────────────────────

    #[test]
    fn concurrent_callers_never_interleave_transactions() {
        const CALLERS: u8 = 4;
        const ROUNDS: usize = 5;

        let mock = MockTransport::new();
        mock.echo_reads();
        with_worker(&mock, |queue| {
            thread::scope(|s| {
                for caller in 0..CALLERS {
                    let address = 0x40 + caller;
                    s.spawn(move || {
                        let mut bus = SequencedBus::new(queue);
                        for _ in 0..ROUNDS {
                            // three chunks: 60 + 60 + 10 bytes
                            block_on(bus.write(address, &[address; 130])).unwrap();
                            let mut buf = [0u8; 3];
                            block_on(bus.read(address, &mut buf)).unwrap();
                            assert_eq!(buf, [address; 3], "caller {:#04x} got a foreign result", address);
                        }
                    });
                }
            });
        });

        let writes = mock.data_writes();
        assert_eq!(writes.len(), CALLERS as usize * ROUNDS * 4);

        let mut index = 0;
        while index < writes.len() {
            let report = &writes[index];
            if is_write_report(report) {
                // a write transaction: Start, None, Stop, all to one address
                let address = report[1];
                let conditions: Vec<u8> = writes[index..index + 3].iter().map(|w| w[2]).collect();
                let addresses: Vec<u8> = writes[index..index + 3].iter().map(|w| w[1]).collect();
                assert_eq!(conditions, vec![START, NONE, STOP], "interleaved chunks at {}", index);
                assert_eq!(addresses, vec![address; 3], "interleaved chunks at {}", index);
                index += 3;
            } else {
                assert_eq!(report[0], REPORT_ID_I2C_READ_REQUEST);
                index += 1;
            }
        }
    }
}
