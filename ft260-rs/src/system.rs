//! Chip identification, system settings and configuration checks.
//!
//! The bridge is brought into a known state by [`Ft260::configure`] and
//! checked with [`Ft260::validate`] before any I2C traffic.

use embedded_hal_async::delay::DelayNs;

use crate::error::{ConfigError, Ft260Error, ProtocolError};
use crate::i2c::{Ft260, I2cStatus};
use crate::registers::{
    CHIP_MODE_I2C, FT260_CHIP_CODE, I2C_CLOCK_KHZ_MAX, I2C_CLOCK_KHZ_MIN, REPORT_ID_CHIP_CODE,
    REPORT_ID_SYSTEM_SETTING, SET_CLOCK, SET_ENABLE_WAKEUP_INT, SET_GPIO_2, SET_GPIO_A, SET_GPIO_G,
    SET_I2C_CLOCK, SET_I2C_RESET, SET_INTERRUPT, SET_SUSPEND_OUT_ACTIVE_LOW,
};
use crate::report::{read_bool, read_report, write_report, InputReport, OutputReport, ReportChannel, ReportShape};
use crate::transport::HidTransport;

// ---------------------------------------------------------------------------
// Setting values
// ---------------------------------------------------------------------------

/// System clock of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Clock {
    Mhz12 = 0,
    Mhz24 = 1,
    Mhz48 = 2,
}

/// Function of the GPIO 2 pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Gpio2Function {
    Normal = 0,
    SuspendOut = 1,
    ActiveLow = 2,
    TxLed = 4,
}

/// Function of the GPIO A pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GpioAFunction {
    Normal = 0,
    TxActive = 3,
    TxLed = 4,
}

/// Function of the GPIO G pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GpioGFunction {
    Normal = 0,
    ActiveLow = 2,
    RxLed = 5,
    BcdDetect = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterruptTrigger {
    RisingEdge = 0,
    LevelHigh = 1,
    FallingEdge = 2,
    LevelLow = 3,
}

/// Minimum pulse length of a level triggered interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterruptDuration {
    Ms1 = 1,
    Ms5 = 2,
    Ms30 = 3,
}

// ---------------------------------------------------------------------------
// Chip code (feature in)
// ---------------------------------------------------------------------------

/// Chip identification report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipCode {
    pub chip_code: u32,
}

impl InputReport for ChipCode {
    const CHANNEL: ReportChannel = ReportChannel::Feature;
    const REPORT_ID: u8 = REPORT_ID_CHIP_CODE;
    // chip code (LE u32) followed by 8 reserved bytes
    const SHAPE: ReportShape = ReportShape::Fixed(12);

    fn unmarshal(payload: &[u8]) -> Result<Self, ProtocolError> {
        Ok(Self {
            chip_code: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
        })
    }
}

// ---------------------------------------------------------------------------
// System status (feature in)
// ---------------------------------------------------------------------------

/// Current system settings of the chip.
///
/// Pin functions and the clock are kept raw, the chip may report values
/// outside the known enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStatus {
    /// Bit 0: DCNF0, bit 1: DCNF1.
    pub chip_mode: u8,
    pub clock: u8,
    pub suspended: bool,
    /// Device ready.
    pub power_status: bool,
    pub i2c_enable: bool,
    pub uart_mode: u8,
    pub hid_over_i2c_enable: bool,
    pub gpio2_function: u8,
    pub gpio_a_function: u8,
    pub gpio_g_function: u8,
    pub suspend_out_active_low: bool,
    /// When disabled the interrupt pin acts as GPIO 3.
    pub enable_wakeup_int: bool,
    pub interrupt_condition: u8,
    /// Clock drops to 30 kHz after 5 s idle.
    pub enable_power_saving: bool,
}

impl SystemStatus {
    pub fn interrupt_trigger(&self) -> u8 {
        self.interrupt_condition & 0x03
    }

    pub fn interrupt_duration(&self) -> u8 {
        (self.interrupt_condition >> 2) & 0x03
    }
}

impl InputReport for SystemStatus {
    const CHANNEL: ReportChannel = ReportChannel::Feature;
    const REPORT_ID: u8 = REPORT_ID_SYSTEM_SETTING;
    // 19 meaningful bytes, but the chip rejects requests shorter than 25
    const SHAPE: ReportShape = ReportShape::Fixed(24);

    fn unmarshal(payload: &[u8]) -> Result<Self, ProtocolError> {
        let flag = |index| read_bool(REPORT_ID_SYSTEM_SETTING, payload, index);
        Ok(Self {
            chip_mode: payload[0],
            clock: payload[1],
            suspended: flag(2)?,
            power_status: flag(3)?,
            i2c_enable: flag(4)?,
            uart_mode: payload[5],
            hid_over_i2c_enable: flag(6)?,
            gpio2_function: payload[7],
            gpio_a_function: payload[8],
            gpio_g_function: payload[9],
            suspend_out_active_low: flag(10)?,
            enable_wakeup_int: flag(11)?,
            interrupt_condition: payload[12],
            enable_power_saving: flag(13)?,
        })
    }
}

// ---------------------------------------------------------------------------
// System setting (feature out)
// ---------------------------------------------------------------------------

/// One system setting request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSetting {
    Clock(Clock),
    EnableWakeupInt(bool),
    Gpio2(Gpio2Function),
    GpioA(GpioAFunction),
    GpioG(GpioGFunction),
    Interrupt {
        trigger: InterruptTrigger,
        duration: InterruptDuration,
    },
    SuspendOutActiveLow(bool),
    /// Reset the I2C controller, e.g. after the bus was disturbed.
    I2cReset,
    /// I2C clock in kHz (60..=3400).
    I2cClock(u16),
}

impl SystemSetting {
    pub const fn request(&self) -> u8 {
        match self {
            SystemSetting::Clock(_) => SET_CLOCK,
            SystemSetting::EnableWakeupInt(_) => SET_ENABLE_WAKEUP_INT,
            SystemSetting::Gpio2(_) => SET_GPIO_2,
            SystemSetting::GpioA(_) => SET_GPIO_A,
            SystemSetting::GpioG(_) => SET_GPIO_G,
            SystemSetting::Interrupt { .. } => SET_INTERRUPT,
            SystemSetting::SuspendOutActiveLow(_) => SET_SUSPEND_OUT_ACTIVE_LOW,
            SystemSetting::I2cReset => SET_I2C_RESET,
            SystemSetting::I2cClock(_) => SET_I2C_CLOCK,
        }
    }
}

impl OutputReport for SystemSetting {
    const CHANNEL: ReportChannel = ReportChannel::Feature;

    fn report_id(&self) -> u8 {
        REPORT_ID_SYSTEM_SETTING
    }

    fn payload_len(&self) -> usize {
        match self {
            SystemSetting::I2cReset => 1,
            SystemSetting::Interrupt { .. } | SystemSetting::I2cClock(_) => 3,
            _ => 2,
        }
    }

    fn marshal(&self, payload: &mut [u8]) -> Result<(), ProtocolError> {
        payload[0] = self.request();
        match *self {
            SystemSetting::I2cReset => {}
            SystemSetting::Clock(clock) => payload[1] = clock as u8,
            SystemSetting::Gpio2(function) => payload[1] = function as u8,
            SystemSetting::GpioA(function) => payload[1] = function as u8,
            SystemSetting::GpioG(function) => payload[1] = function as u8,
            SystemSetting::EnableWakeupInt(on) | SystemSetting::SuspendOutActiveLow(on) => {
                payload[1] = on as u8
            }
            SystemSetting::Interrupt { trigger, duration } => {
                payload[1] = trigger as u8;
                payload[2] = duration as u8;
            }
            SystemSetting::I2cClock(khz) => {
                if !(I2C_CLOCK_KHZ_MIN..=I2C_CLOCK_KHZ_MAX).contains(&khz) {
                    return Err(ProtocolError::InvalidClock(khz));
                }
                payload[1..3].copy_from_slice(&khz.to_le_bytes());
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver operations
// ---------------------------------------------------------------------------

impl<T, D> Ft260<T, D>
where
    T: HidTransport,
    D: DelayNs,
{
    pub fn chip_code(&mut self) -> Result<u32, Ft260Error> {
        let report: ChipCode = read_report(&mut self.transport, self.read_timeout_ms)?;
        Ok(report.chip_code)
    }

    pub fn system_status(&mut self) -> Result<SystemStatus, Ft260Error> {
        read_report(&mut self.transport, self.read_timeout_ms)
    }

    pub fn set_system_setting(&mut self, setting: SystemSetting) -> Result<(), Ft260Error> {
        write_report(&mut self.transport, &setting)
    }

    /// Fail unless the attached chip is an FT260.
    pub fn validate_chip_code(&mut self) -> Result<(), Ft260Error> {
        let found = self.chip_code()?;
        if found != FT260_CHIP_CODE {
            return Err(ConfigError::ChipCode {
                found,
                expected: FT260_CHIP_CODE,
            }
            .into());
        }
        Ok(())
    }

    /// Put the chip into the state expected by the I2C engine.
    ///
    /// # Arguments
    /// * `freq_khz` - I2C clock in kHz (60..=3400)
    ///
    /// # Errors
    /// Stops at the first rejected setting. [`ProtocolError::InvalidClock`]
    /// is returned for an out of range `freq_khz`, after the clock and
    /// reset requests went out.
    pub fn configure(&mut self, freq_khz: u16) -> Result<(), Ft260Error> {
        let settings = [
            SystemSetting::Clock(Clock::Mhz48),
            SystemSetting::I2cReset,
            SystemSetting::I2cClock(freq_khz),
            SystemSetting::Gpio2(Gpio2Function::Normal),
            SystemSetting::GpioA(GpioAFunction::Normal),
            SystemSetting::GpioG(GpioGFunction::Normal),
            SystemSetting::EnableWakeupInt(false),
        ];
        for setting in settings {
            #[cfg(feature = "log")]
            log::debug!("FT260 setting {:#04x}: {:?}", setting.request(), setting);
            self.set_system_setting(setting)?;
        }
        #[cfg(feature = "log")]
        log::info!("FT260 configured for I2C at {} kHz", freq_khz);
        Ok(())
    }

    /// Check that the chip reports the configuration applied by
    /// [`configure`](Self::configure).
    ///
    /// # Errors
    /// One [`ConfigError`] variant per mismatching field, checked in the
    /// order chip code, chip mode, clock, pin functions, wake-up
    /// interrupt, suspend, power, I2C enable, bus speed.
    pub fn validate(&mut self, freq_khz: u16) -> Result<(), Ft260Error> {
        self.validate_chip_code()?;
        check_system_status(&self.system_status()?)?;

        let i2c: I2cStatus = self.i2c_status()?;
        if i2c.bus_speed != freq_khz {
            return Err(ConfigError::BusSpeed {
                found: i2c.bus_speed,
                expected: freq_khz,
            }
            .into());
        }
        Ok(())
    }
}

fn check_system_status(status: &SystemStatus) -> Result<(), ConfigError> {
    if status.chip_mode != CHIP_MODE_I2C {
        return Err(ConfigError::ChipMode {
            found: status.chip_mode,
            expected: CHIP_MODE_I2C,
        });
    }
    if status.clock != Clock::Mhz48 as u8 {
        return Err(ConfigError::Clock {
            found: status.clock,
            expected: Clock::Mhz48 as u8,
        });
    }
    let pins = [
        ("GPIO 2", status.gpio2_function, Gpio2Function::Normal as u8),
        ("GPIO A", status.gpio_a_function, GpioAFunction::Normal as u8),
        ("GPIO G", status.gpio_g_function, GpioGFunction::Normal as u8),
    ];
    for (pin, found, expected) in pins {
        if found != expected {
            return Err(ConfigError::GpioFunction { pin, found, expected });
        }
    }
    if status.enable_wakeup_int {
        return Err(ConfigError::WakeupInterruptEnabled);
    }
    if status.suspended {
        return Err(ConfigError::Suspended);
    }
    if !status.power_status {
        return Err(ConfigError::PoweredOff);
    }
    if !status.i2c_enable {
        return Err(ConfigError::I2cDisabled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportChannel;
    use crate::transport::mock::MockTransport;

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    /// System status of a configured chip in I2C mode.
    fn good_status() -> [u8; 24] {
        let mut payload = [0u8; 24];
        payload[0] = CHIP_MODE_I2C;
        payload[1] = Clock::Mhz48 as u8;
        payload[3] = 1; // powered
        payload[4] = 1; // I2C enabled
        payload
    }

    fn configured_chip() -> MockTransport {
        let mock = MockTransport::new();
        mock.set_feature_default(REPORT_ID_CHIP_CODE, &[0x00, 0x02, 0x60, 0x02, 0, 0, 0, 0, 0, 0, 0, 0]);
        mock.set_feature_default(REPORT_ID_SYSTEM_SETTING, &good_status());
        mock
    }

    // ── Reports ──────────────────────────────────────────────────────

    #[test]
    fn chip_code_is_little_endian() {
        let code = ChipCode::unmarshal(&[0x00, 0x02, 0x60, 0x02, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(code.chip_code, FT260_CHIP_CODE);
    }

    #[test]
    fn system_status_fields() {
        let mut payload = good_status();
        payload[12] = 0b0000_1110;
        payload[13] = 1;
        let status = SystemStatus::unmarshal(&payload).unwrap();
        assert!(status.power_status);
        assert!(status.i2c_enable);
        assert!(!status.suspended);
        assert!(status.enable_power_saving);
        assert_eq!(status.interrupt_trigger(), 2);
        assert_eq!(status.interrupt_duration(), 3);
    }

    #[test]
    fn system_status_rejects_non_boolean_flag() {
        let mut payload = good_status();
        payload[2] = 7;
        assert_eq!(
            SystemStatus::unmarshal(&payload),
            Err(ProtocolError::InvalidBool {
                report_id: REPORT_ID_SYSTEM_SETTING,
                index: 2,
                value: 7
            })
        );
    }

    #[test]
    fn setting_payloads() {
        let encode = |setting: SystemSetting| {
            let mut payload = vec![0u8; setting.payload_len()];
            setting.marshal(&mut payload).map(|_| payload)
        };
        assert_eq!(encode(SystemSetting::I2cReset), Ok(vec![0x20]));
        assert_eq!(encode(SystemSetting::Clock(Clock::Mhz48)), Ok(vec![0x01, 0x02]));
        assert_eq!(encode(SystemSetting::EnableWakeupInt(true)), Ok(vec![0x05, 0x01]));
        assert_eq!(encode(SystemSetting::I2cClock(400)), Ok(vec![0x22, 0x90, 0x01]));
        assert_eq!(
            encode(SystemSetting::Interrupt {
                trigger: InterruptTrigger::LevelLow,
                duration: InterruptDuration::Ms5
            }),
            Ok(vec![0x0A, 0x03, 0x02])
        );
        assert_eq!(encode(SystemSetting::I2cClock(3401)), Err(ProtocolError::InvalidClock(3401)));
        assert_eq!(encode(SystemSetting::I2cClock(59)), Err(ProtocolError::InvalidClock(59)));
    }

    // ── Configure / validate ─────────────────────────────────────────

    #[test]
    fn configure_sends_settings_in_order() {
        let mock = MockTransport::new();
        let mut ft = Ft260::new(mock.clone(), NoDelay);
        ft.configure(400).unwrap();

        let sent: Vec<Vec<u8>> = mock
            .writes()
            .into_iter()
            .inspect(|w| assert_eq!(w.channel, ReportChannel::Feature))
            .map(|w| w.data)
            .collect();
        assert_eq!(
            sent,
            vec![
                vec![0xA1, 0x01, 0x02],
                vec![0xA1, 0x20],
                vec![0xA1, 0x22, 0x90, 0x01],
                vec![0xA1, 0x06, 0x00],
                vec![0xA1, 0x08, 0x00],
                vec![0xA1, 0x09, 0x00],
                vec![0xA1, 0x05, 0x00],
            ]
        );
    }

    #[test]
    fn validate_accepts_configured_chip() {
        let mock = configured_chip();
        let mut ft = Ft260::new(mock, NoDelay);
        ft.validate(400).unwrap();
    }

    #[test]
    fn validate_reports_bus_speed_mismatch() {
        let mock = configured_chip();
        mock.set_i2c_status(0x20, 100);
        let mut ft = Ft260::new(mock, NoDelay);
        assert!(matches!(
            ft.validate(400),
            Err(Ft260Error::Config(ConfigError::BusSpeed { found: 100, expected: 400 }))
        ));
    }

    #[test]
    fn validate_reports_wrong_chip() {
        let mock = configured_chip();
        mock.set_feature_default(REPORT_ID_CHIP_CODE, &[0x00, 0x02, 0x60, 0x03, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut ft = Ft260::new(mock, NoDelay);
        assert!(matches!(
            ft.validate(400),
            Err(Ft260Error::Config(ConfigError::ChipCode { found: 0x0360_0200, .. }))
        ));
    }

    #[test]
    fn status_checks_in_order() {
        let status = SystemStatus::unmarshal(&good_status()).unwrap();
        assert_eq!(check_system_status(&status), Ok(()));

        let with = |f: fn(&mut SystemStatus)| {
            let mut s = status;
            f(&mut s);
            check_system_status(&s)
        };
        assert_eq!(
            with(|s| s.chip_mode = 0x02),
            Err(ConfigError::ChipMode { found: 0x02, expected: 0x01 })
        );
        assert_eq!(with(|s| s.clock = 0), Err(ConfigError::Clock { found: 0, expected: 2 }));
        assert_eq!(
            with(|s| s.gpio_a_function = 4),
            Err(ConfigError::GpioFunction { pin: "GPIO A", found: 4, expected: 0 })
        );
        assert_eq!(with(|s| s.enable_wakeup_int = true), Err(ConfigError::WakeupInterruptEnabled));
        assert_eq!(with(|s| s.suspended = true), Err(ConfigError::Suspended));
        assert_eq!(with(|s| s.power_status = false), Err(ConfigError::PoweredOff));
        assert_eq!(with(|s| s.i2c_enable = false), Err(ConfigError::I2cDisabled));
    }
}
