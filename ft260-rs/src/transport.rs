//! Raw HID transport underneath the report codec.
//!
//! [`HidTransport`] is the only seam between the driver and the operating
//! system. [`HidapiTransport`] implements it with `hidapi`; tests use the
//! scriptable transport in [`mock`].

use std::ffi::CString;

use hidapi::{DeviceInfo, HidApi, HidDevice};

use crate::error::TransportError;
use crate::registers::{FT260_PRODUCT_ID, FTDI_VENDOR_ID};
use crate::report::ReportChannel;

/// Byte-level access to one opened HID device.
pub trait HidTransport {
    /// Send `data` (report ID first). Returns the number of bytes accepted.
    fn write(&mut self, data: &[u8], channel: ReportChannel) -> Result<usize, TransportError>;

    /// Receive one report into `buf`. For feature reports `buf[0]` holds the
    /// requested report ID on entry. Returns the number of bytes received,
    /// `0` if nothing arrived within `timeout_ms`.
    fn read(
        &mut self,
        buf: &mut [u8],
        channel: ReportChannel,
        timeout_ms: i32,
    ) -> Result<usize, TransportError>;
}

impl<T: HidTransport + ?Sized> HidTransport for &mut T {
    fn write(&mut self, data: &[u8], channel: ReportChannel) -> Result<usize, TransportError> {
        T::write(self, data, channel)
    }

    fn read(
        &mut self,
        buf: &mut [u8],
        channel: ReportChannel,
        timeout_ms: i32,
    ) -> Result<usize, TransportError> {
        T::read(self, buf, channel, timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// hidapi backend
// ---------------------------------------------------------------------------

/// FT260 opened through `hidapi`. The device is closed on drop.
pub struct HidapiTransport {
    device: HidDevice,
}

impl HidapiTransport {
    /// List attached devices matching `vendor_id`/`product_id`.
    pub fn enumerate(api: &HidApi, vendor_id: u16, product_id: u16) -> Vec<DeviceInfo> {
        api.device_list()
            .filter(|info| info.vendor_id() == vendor_id && info.product_id() == product_id)
            .cloned()
            .collect()
    }

    /// Open the FT260 at `path`, or the first attached FT260 if `path` is `None`.
    ///
    /// # Errors
    /// * [`TransportError::NotFound`] if no FT260 is attached
    /// * [`TransportError::InvalidPath`] if `path` contains a NUL byte
    /// * [`TransportError::Hid`] if the OS refuses to open the device
    pub fn open(api: &HidApi, path: Option<&str>) -> Result<Self, TransportError> {
        let device = match path {
            Some(path) => {
                let c_path =
                    CString::new(path).map_err(|_| TransportError::InvalidPath(path.to_owned()))?;
                #[cfg(feature = "log")]
                log::info!("Opening USB HID device {}", path);
                api.open_path(&c_path)?
            }
            None => {
                let devices = Self::enumerate(api, FTDI_VENDOR_ID, FT260_PRODUCT_ID);
                let info = devices.first().ok_or(TransportError::NotFound {
                    vendor_id: FTDI_VENDOR_ID,
                    product_id: FT260_PRODUCT_ID,
                })?;
                if devices.len() > 1 {
                    #[cfg(feature = "log")]
                    log::warn!(
                        "{} devices connected with vendor id {:04x} and product id {:04x}, using the first",
                        devices.len(),
                        FTDI_VENDOR_ID,
                        FT260_PRODUCT_ID
                    );
                }
                #[cfg(feature = "log")]
                log::info!(
                    "Opening USB HID device {:?} (interface {}): {} ({:04x}) from {} ({:04x}), release {:04x}",
                    info.path(),
                    info.interface_number(),
                    info.product_string().unwrap_or("?"),
                    info.product_id(),
                    info.manufacturer_string().unwrap_or("?"),
                    info.vendor_id(),
                    info.release_number()
                );
                info.open_device(api)?
            }
        };
        Ok(Self { device })
    }

    /// Wrap an already opened device.
    pub fn from_device(device: HidDevice) -> Self {
        Self { device }
    }
}

impl HidTransport for HidapiTransport {
    fn write(&mut self, data: &[u8], channel: ReportChannel) -> Result<usize, TransportError> {
        match channel {
            ReportChannel::Feature => {
                self.device.send_feature_report(data)?;
                Ok(data.len())
            }
            ReportChannel::Data => Ok(self.device.write(data)?),
        }
    }

    fn read(
        &mut self,
        buf: &mut [u8],
        channel: ReportChannel,
        timeout_ms: i32,
    ) -> Result<usize, TransportError> {
        match channel {
            ReportChannel::Feature => Ok(self.device.get_feature_report(buf)?),
            ReportChannel::Data => Ok(self.device.read_timeout(buf, timeout_ms)?),
        }
    }
}

// ---------------------------------------------------------------------------
// Scriptable transport for tests
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    //! In-memory [`HidTransport`] that records writes and replays scripted
    //! input reports.
    //!
    //! Clones share state, so a test can hand one clone to the driver and
    //! inspect the other afterwards.

    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex, MutexGuard};

    use super::HidTransport;
    use crate::error::TransportError;
    use crate::i2c::I2cCondition;
    use crate::registers::{
        I2C_MAX_PAYLOAD, I2C_STATUS_BUS_BUSY, I2C_STATUS_CONTROLLER_IDLE, REPORT_ID_I2C_DATA,
        REPORT_ID_I2C_DATA_MAX, REPORT_ID_I2C_READ_REQUEST, REPORT_ID_I2C_STATUS,
    };
    use crate::report::ReportChannel;

    /// One report handed to [`HidTransport::write`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedWrite {
        pub channel: ReportChannel,
        pub data: Vec<u8>,
    }

    #[derive(Default)]
    struct State {
        writes: Vec<RecordedWrite>,
        feature_queue: HashMap<u8, VecDeque<Vec<u8>>>,
        feature_default: HashMap<u8, Vec<u8>>,
        data_queue: VecDeque<Vec<u8>>,
        feature_reads: HashMap<u8, usize>,
        write_limit: Option<usize>,
        echo_reads: bool,
        bus_held: bool,
        disconnected: bool,
    }

    /// Recording HID transport.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        state: Arc<Mutex<State>>,
    }

    impl MockTransport {
        /// New transport whose I2C status report always reads "controller idle"
        /// at 400 kHz unless scripted otherwise.
        pub fn new() -> Self {
            let mock = Self::default();
            mock.set_i2c_status(I2C_STATUS_CONTROLLER_IDLE, 400);
            mock
        }

        fn state(&self) -> MutexGuard<'_, State> {
            match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }

        /// Queue a feature report returned once for `report_id`.
        pub fn push_feature(&self, report_id: u8, payload: &[u8]) {
            let mut report = vec![report_id];
            report.extend_from_slice(payload);
            self.state()
                .feature_queue
                .entry(report_id)
                .or_default()
                .push_back(report);
        }

        /// Queue a raw `reply`, report ID byte included, answering one read
        /// of the feature report `report_id`.
        pub fn push_feature_reply(&self, report_id: u8, reply: &[u8]) {
            self.state()
                .feature_queue
                .entry(report_id)
                .or_default()
                .push_back(reply.to_vec());
        }

        /// Feature report returned for `report_id` whenever its queue is empty.
        pub fn set_feature_default(&self, report_id: u8, payload: &[u8]) {
            let mut report = vec![report_id];
            report.extend_from_slice(payload);
            self.state().feature_default.insert(report_id, report);
        }

        /// Queue one I2C status report.
        pub fn push_i2c_status(&self, bus_status: u8) {
            self.push_feature(REPORT_ID_I2C_STATUS, &[bus_status, 0x90, 0x01, 0]);
        }

        /// I2C status returned once the scripted statuses are used up.
        pub fn set_i2c_status(&self, bus_status: u8, speed_khz: u16) {
            let [lo, hi] = speed_khz.to_le_bytes();
            self.set_feature_default(REPORT_ID_I2C_STATUS, &[bus_status, lo, hi, 0]);
        }

        /// Queue a data (interrupt in) report.
        pub fn push_data(&self, report_id: u8, payload: &[u8]) {
            let mut report = vec![report_id];
            report.extend_from_slice(payload);
            self.state().data_queue.push_back(report);
        }

        /// Behave like a slave that answers everything: every I2C read
        /// request gets input reports whose bytes all equal the requested
        /// slave address, and the status report shows `BusBusy` while a
        /// write without STOP holds the bus.
        pub fn echo_reads(&self) {
            self.state().echo_reads = true;
        }

        /// Accept at most `len` bytes per write.
        pub fn limit_write_len(&self, len: usize) {
            self.state().write_limit = Some(len);
        }

        /// Fail every following call with [`TransportError::Disconnected`].
        pub fn disconnect(&self) {
            self.state().disconnected = true;
        }

        /// All writes so far, in order.
        pub fn writes(&self) -> Vec<RecordedWrite> {
            self.state().writes.clone()
        }

        /// Data-channel writes so far, in order.
        pub fn data_writes(&self) -> Vec<Vec<u8>> {
            self.state()
                .writes
                .iter()
                .filter(|w| w.channel == ReportChannel::Data)
                .map(|w| w.data.clone())
                .collect()
        }

        /// How often the feature report `report_id` was read.
        pub fn feature_reads(&self, report_id: u8) -> usize {
            self.state().feature_reads.get(&report_id).copied().unwrap_or(0)
        }

        /// Number of scripted data reports not yet read.
        pub fn pending_data(&self) -> usize {
            self.state().data_queue.len()
        }
    }

    impl HidTransport for MockTransport {
        fn write(&mut self, data: &[u8], channel: ReportChannel) -> Result<usize, TransportError> {
            let mut state = self.state();
            if state.disconnected {
                return Err(TransportError::Disconnected);
            }
            state.writes.push(RecordedWrite {
                channel,
                data: data.to_vec(),
            });

            if state.echo_reads && channel == ReportChannel::Data && data.len() > 2 {
                let id = data[0];
                if id == REPORT_ID_I2C_READ_REQUEST || (REPORT_ID_I2C_DATA..=REPORT_ID_I2C_DATA_MAX).contains(&id) {
                    state.bus_held = data[2] & I2cCondition::Stop.bits() == 0;
                }
            }

            if state.echo_reads && channel == ReportChannel::Data && data.first() == Some(&REPORT_ID_I2C_READ_REQUEST) {
                let address = data[1];
                let mut remaining = u16::from_le_bytes([data[3], data[4]]) as usize;
                while remaining > 0 {
                    let len = remaining.min(I2C_MAX_PAYLOAD);
                    let mut report = vec![REPORT_ID_I2C_DATA + ((len - 1) / 4) as u8, len as u8];
                    report.extend(std::iter::repeat(address).take(len));
                    state.data_queue.push_back(report);
                    remaining -= len;
                }
            }

            Ok(state.write_limit.map_or(data.len(), |limit| limit.min(data.len())))
        }

        fn read(
            &mut self,
            buf: &mut [u8],
            channel: ReportChannel,
            _timeout_ms: i32,
        ) -> Result<usize, TransportError> {
            let mut state = self.state();
            if state.disconnected {
                return Err(TransportError::Disconnected);
            }
            let report = match channel {
                ReportChannel::Feature => {
                    let id = buf[0];
                    *state.feature_reads.entry(id).or_default() += 1;
                    let queued = state.feature_queue.get_mut(&id).and_then(VecDeque::pop_front);
                    let held = state.bus_held && id == REPORT_ID_I2C_STATUS;
                    queued.or_else(|| {
                        let mut report = state.feature_default.get(&id).cloned()?;
                        if held {
                            report[1] = I2C_STATUS_BUS_BUSY;
                        }
                        Some(report)
                    })
                }
                ReportChannel::Data => state.data_queue.pop_front(),
            };
            Ok(match report {
                Some(report) => {
                    let len = report.len().min(buf.len());
                    buf[..len].copy_from_slice(&report[..len]);
                    len
                }
                None => 0,
            })
        }
    }
}
