//! I2C transaction engine.
//!
//! [`Ft260`] turns logical I2C writes, reads and write-then-reads into
//! chunked HID reports, then polls the chip's bus status until the
//! controller reaches the expected terminal state or reports an error.
//!
//! # Transaction lifecycle
//!
//! 1. Send each chunk (or the read request) as one report.
//! 2. Poll the I2C status report, sleeping `PollConfig::interval_us`
//!    between polls, for at most `PollConfig::max_polls` polls.
//! 3. Finish with one of three terminal states:
//!    - **done**: controller idle (or bus busy, when the transaction
//!      deliberately ended without STOP)
//!    - **error**: an error bit is set; returned on the first poll that
//!      shows it
//!    - **timed out**: the poll budget ran out
//!
//! Nothing is retried here. Callers decide whether to try again.

mod bus;
mod chunk;
mod reports;
mod status;

pub use bus::{is_absent_device, I2cBus, SCAN_RANGE};
pub use chunk::{split_transaction, TransactionChunk};
pub use reports::{data_report_id, I2cInput, I2cReadRequest, I2cStatus, I2cWrite};
pub use status::{BusStatus, I2cCondition};

use embassy_time::Instant;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

use crate::error::{Ft260Error, I2cError, ProtocolError, TransportError};
use crate::registers::REPORT_ID_I2C_DATA;
use crate::report::{read_report, write_report};
use crate::transport::HidTransport;

/// Bounds of the status-poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between two status reads, in microseconds.
    pub interval_us: u32,
    /// Status reads before the transaction counts as timed out.
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_us: 50,
            max_polls: 5000,
        }
    }
}

/// Default wait for an I2C input report, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 500;

#[derive(Debug, Clone, Copy)]
enum Direction {
    Read,
    Write,
}

fn describe(condition: I2cCondition, direction: Direction, len: usize, address: u8) -> String {
    match direction {
        Direction::Write => format!("{} write of {} bytes to {:#04x}", condition, len, address),
        Direction::Read => format!("{} read of {} bytes from {:#04x}", condition, len, address),
    }
}

/// FT260 I2C master.
///
/// Owns the HID transport exclusively. Share it between tasks through the
/// bus sequencer, or through a mutex in direct mode.
pub struct Ft260<T, D = embassy_time::Delay> {
    pub(crate) transport: T,
    delay: D,
    poll: PollConfig,
    pub(crate) read_timeout_ms: i32,
}

impl<T, D> Ft260<T, D>
where
    T: HidTransport,
    D: DelayNs,
{
    /// Create an engine over an opened transport.
    ///
    /// # Arguments
    /// * `transport` - opened FT260 (takes ownership for exclusive access)
    /// * `delay` - sleep used between status polls
    pub fn new(transport: T, delay: D) -> Self {
        Self {
            transport,
            delay,
            poll: PollConfig::default(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_read_timeout(mut self, timeout_ms: i32) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Give the transport back, closing nothing.
    pub fn into_transport(self) -> T {
        self.transport
    }

    // -----------------------------------------------------------------------
    // Logical operations
    // -----------------------------------------------------------------------

    /// Write `data` to `address`, ending with STOP.
    pub async fn i2c_write(&mut self, address: u8, data: &[u8]) -> Result<(), Ft260Error> {
        self.write_chunks(address, data, false, true).await
    }

    /// Fill `buf` from `address`, ending with STOP.
    pub async fn i2c_read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Ft260Error> {
        self.read_into(address, buf, false, true).await
    }

    /// Write `out` without STOP, then read `buf` after a repeated START.
    ///
    /// The write phase waits for the bus to stay busy rather than for the
    /// controller to go idle, since the bus is still owned until the read
    /// releases it.
    pub async fn i2c_write_read(
        &mut self,
        address: u8,
        out: &[u8],
        buf: &mut [u8],
    ) -> Result<(), Ft260Error> {
        if buf.is_empty() {
            return self.write_chunks(address, out, false, true).await;
        }
        if out.is_empty() {
            return self.read_into(address, buf, false, true).await;
        }
        self.write_chunks(address, out, false, false).await?;
        self.read_into(address, buf, true, true).await
    }

    /// Scan the non-reserved address range for devices.
    pub async fn i2c_scan(&mut self) -> Result<Vec<u8>, Ft260Error> {
        self.scan(SCAN_RANGE).await
    }

    /// Read the I2C status report once.
    pub fn i2c_status(&mut self) -> Result<I2cStatus, Ft260Error> {
        read_report(&mut self.transport, self.read_timeout_ms)
    }

    /// Poll the bus status until the controller is done.
    ///
    /// Succeeds on `ControllerIdle`, or on `BusBusy` when
    /// `expect_bus_busy` is set. Fails on the first status with an error
    /// bit, or with `timed_out` once the poll budget is used up.
    pub async fn i2c_wait(&mut self, expect_bus_busy: bool) -> Result<BusStatus, Ft260Error> {
        self.wait_for(expect_bus_busy, Instant::now(), || String::from("status wait"))
            .await
    }

    // -----------------------------------------------------------------------
    // Report sequences
    // -----------------------------------------------------------------------

    async fn write_chunks(
        &mut self,
        address: u8,
        data: &[u8],
        repeated_start: bool,
        stop: bool,
    ) -> Result<(), Ft260Error> {
        let chunks = split_transaction(stop, data);
        let Some(first) = chunks.first() else {
            return Ok(());
        };
        let first_condition = if repeated_start {
            first.condition.with_repeated_start()
        } else {
            first.condition
        };

        let started = Instant::now();
        for (index, chunk) in chunks.iter().enumerate() {
            let condition = if index == 0 { first_condition } else { chunk.condition };
            write_report(
                &mut self.transport,
                &I2cWrite {
                    address,
                    condition,
                    payload: chunk.payload,
                },
            )?;
        }

        self.wait_for(!stop, started, || {
            describe(first_condition, Direction::Write, data.len(), address)
        })
        .await?;
        Ok(())
    }

    async fn read_into(
        &mut self,
        address: u8,
        buf: &mut [u8],
        repeated_start: bool,
        stop: bool,
    ) -> Result<(), Ft260Error> {
        if buf.is_empty() {
            return Ok(());
        }
        let len = u16::try_from(buf.len()).map_err(|_| ProtocolError::PayloadTooLarge {
            len: buf.len(),
            max: u16::MAX as usize,
        })?;
        let condition = I2cCondition::framing(repeated_start, stop);
        let total = buf.len();
        let description = || describe(condition, Direction::Read, total, address);

        let started = Instant::now();
        write_report(
            &mut self.transport,
            &I2cReadRequest {
                address,
                condition,
                len,
            },
        )?;

        let mut filled = 0;
        while filled < total {
            // A NACKed address produces no input reports, only error bits.
            let status = self.i2c_status()?.bus_status;
            if status.has_error() {
                return Err(bus_error(false, status, started, description()));
            }

            let input = match read_report::<_, I2cInput>(&mut self.transport, self.read_timeout_ms) {
                Ok(input) => input,
                Err(Ft260Error::Transport(TransportError::Timeout { report_id, timeout_ms })) => {
                    // Prefer the bus failure over the missing report if there is one.
                    self.wait_for(!stop, started, description).await?;
                    return Err(TransportError::Timeout { report_id, timeout_ms }.into());
                }
                Err(e) => return Err(e),
            };
            if input.data.is_empty() {
                return Err(ProtocolError::Malformed {
                    report_id: REPORT_ID_I2C_DATA,
                    reason: "I2C input report without data",
                }
                .into());
            }
            let take = input.data.len().min(total - filled);
            buf[filled..filled + take].copy_from_slice(&input.data[..take]);
            filled += take;
        }

        self.wait_for(!stop, started, description).await?;
        Ok(())
    }

    async fn wait_for(
        &mut self,
        expect_bus_busy: bool,
        started: Instant,
        description: impl Fn() -> String,
    ) -> Result<BusStatus, Ft260Error> {
        let mut status = BusStatus::default();
        for _ in 0..self.poll.max_polls {
            status = self.i2c_status()?.bus_status;

            if status.has_error() {
                let error = bus_error(false, status, started, description());
                #[cfg(feature = "log")]
                log::debug!("{}", error);
                return Err(error);
            }

            if !status.controller_busy() {
                let done = if expect_bus_busy {
                    status.bus_busy()
                } else {
                    status.controller_idle() && !status.bus_busy()
                };
                if done {
                    return Ok(status);
                }
            }

            self.delay.delay_us(self.poll.interval_us).await;
        }

        let error = bus_error(true, status, started, description());
        #[cfg(feature = "log")]
        log::debug!("{}", error);
        Err(error)
    }

    /// Run one group of same-direction operations of a transaction.
    async fn run_group(
        &mut self,
        address: u8,
        group: &mut [Operation<'_>],
        repeated_start: bool,
        stop: bool,
    ) -> Result<(), Ft260Error> {
        match group {
            [Operation::Write(data)] => self.write_chunks(address, data, repeated_start, stop).await,
            [Operation::Read(buf)] => self.read_into(address, buf, repeated_start, stop).await,
            [Operation::Write(_), ..] => {
                let mut joined = Vec::new();
                for op in group.iter() {
                    if let Operation::Write(data) = op {
                        joined.extend_from_slice(data);
                    }
                }
                self.write_chunks(address, &joined, repeated_start, stop).await
            }
            [Operation::Read(_), ..] => {
                let total = group
                    .iter()
                    .map(|op| match op {
                        Operation::Read(buf) => buf.len(),
                        Operation::Write(_) => 0,
                    })
                    .sum();
                let mut joined = vec![0u8; total];
                self.read_into(address, &mut joined, repeated_start, stop).await?;
                let mut offset = 0;
                for op in group.iter_mut() {
                    if let Operation::Read(buf) = op {
                        buf.copy_from_slice(&joined[offset..offset + buf.len()]);
                        offset += buf.len();
                    }
                }
                Ok(())
            }
            [] => Ok(()),
        }
    }
}

fn bus_error(timed_out: bool, bus_status: BusStatus, started: Instant, description: String) -> Ft260Error {
    I2cError {
        timed_out,
        bus_status,
        elapsed: started.elapsed(),
        description,
    }
    .into()
}

fn same_direction(a: &Operation<'_>, b: &Operation<'_>) -> bool {
    matches!(
        (a, b),
        (Operation::Write(_), Operation::Write(_)) | (Operation::Read(_), Operation::Read(_))
    )
}

// ---------------------------------------------------------------------------
// embedded-hal-async
// ---------------------------------------------------------------------------

impl<T, D> ErrorType for Ft260<T, D> {
    type Error = Ft260Error;
}

impl<T, D> I2c for Ft260<T, D>
where
    T: HidTransport,
    D: DelayNs,
{
    async fn read(&mut self, address: u8, read: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c_read(address, read).await
    }

    async fn write(&mut self, address: u8, write: &[u8]) -> Result<(), Self::Error> {
        self.i2c_write(address, write).await
    }

    async fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c_write_read(address, write, read).await
    }

    /// Adjacent operations of the same direction are merged into one bus
    /// operation; a direction change issues a repeated START; only the last
    /// group ends with STOP.
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut start = 0;
        while start < operations.len() {
            let mut end = start + 1;
            while end < operations.len() && same_direction(&operations[start], &operations[end]) {
                end += 1;
            }
            let stop = end == operations.len();
            self.run_group(address, &mut operations[start..end], start > 0, stop)
                .await?;
            start = end;
        }
        Ok(())
    }
}
