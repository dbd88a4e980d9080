//! FT260 report identifiers, setting requests and bit definitions.
//!
//! The FT260 exposes every function through HID reports. Configuration and
//! status travel over the *feature* channel, I2C payloads over the
//! *data* (interrupt) channel. The first byte of every report is its ID.

// ---------------------------------------------------------------------------
// USB identification
// ---------------------------------------------------------------------------

/// FTDI USB vendor ID.
pub const FTDI_VENDOR_ID: u16 = 0x0403;

/// FT260 USB product ID.
pub const FT260_PRODUCT_ID: u16 = 0x6030;

/// Value of the chip code field reported by a genuine FT260.
pub const FT260_CHIP_CODE: u32 = 0x0260_0200;

// ---------------------------------------------------------------------------
// Report IDs
// ---------------------------------------------------------------------------

/// Chip code query (feature in).
pub const REPORT_ID_CHIP_CODE: u8 = 0xA0;

/// System setting query and update (feature in/out).
pub const REPORT_ID_SYSTEM_SETTING: u8 = 0xA1;

/// GPIO values and directions (feature in/out).
pub const REPORT_ID_GPIO: u8 = 0xB0;

/// I2C bus status (feature in).
pub const REPORT_ID_I2C_STATUS: u8 = 0xC0;

/// I2C read request (data out).
pub const REPORT_ID_I2C_READ_REQUEST: u8 = 0xC2;

/// First I2C payload report (data in/out). The ID encodes the payload size:
/// `0xD0 + (payload_len - 1) / 4`.
pub const REPORT_ID_I2C_DATA: u8 = 0xD0;

/// Last I2C payload report.
pub const REPORT_ID_I2C_DATA_MAX: u8 = 0xDE;

/// Largest I2C payload carried by a single report: `(1 + 0xDE - 0xD0) * 4`.
pub const I2C_MAX_PAYLOAD: usize = (1 + (REPORT_ID_I2C_DATA_MAX - REPORT_ID_I2C_DATA) as usize) * 4;

/// Largest report the chip exchanges, including the report ID.
pub const MAX_REPORT_LEN: usize = 64;

// ---------------------------------------------------------------------------
// System setting requests (first payload byte of a 0xA1 feature out)
// ---------------------------------------------------------------------------

pub const SET_CLOCK: u8 = 0x01;
pub const SET_ENABLE_WAKEUP_INT: u8 = 0x05;
pub const SET_GPIO_2: u8 = 0x06;
pub const SET_GPIO_A: u8 = 0x08;
pub const SET_GPIO_G: u8 = 0x09;
pub const SET_INTERRUPT: u8 = 0x0A;
pub const SET_SUSPEND_OUT_ACTIVE_LOW: u8 = 0x0B;

/// Reset the I2C controller. Carries no payload.
pub const SET_I2C_RESET: u8 = 0x20;

/// I2C clock in kHz, little endian, 60..=3400.
pub const SET_I2C_CLOCK: u8 = 0x22;

/// Valid range of the I2C clock setting in kHz.
pub const I2C_CLOCK_KHZ_MIN: u16 = 60;
pub const I2C_CLOCK_KHZ_MAX: u16 = 3400;

// ---------------------------------------------------------------------------
// Status report values
// ---------------------------------------------------------------------------

/// Chip mode reported when DCNF0 is pulled high and DCNF1 low
/// (I2C enabled, UART disabled).
pub const CHIP_MODE_I2C: u8 = 0x01;

// ---------------------------------------------------------------------------
// I2C bus status bits (report 0xC0, first byte)
// ---------------------------------------------------------------------------

pub const I2C_STATUS_CONTROLLER_BUSY: u8 = 1 << 0;
pub const I2C_STATUS_ERROR: u8 = 1 << 1;
pub const I2C_STATUS_NO_SLAVE_ACK: u8 = 1 << 2;
pub const I2C_STATUS_NO_DATA_ACK: u8 = 1 << 3;
pub const I2C_STATUS_ARBITRATION_LOST: u8 = 1 << 4;
pub const I2C_STATUS_CONTROLLER_IDLE: u8 = 1 << 5;
pub const I2C_STATUS_BUS_BUSY: u8 = 1 << 6;

// ---------------------------------------------------------------------------
// I2C addressing
// ---------------------------------------------------------------------------

/// First address probed by a bus scan (0x00..=0x07 are reserved).
pub const SCAN_FIRST_ADDRESS: u8 = 0x08;

/// Last address probed by a bus scan (0x78..=0x7F are reserved).
pub const SCAN_LAST_ADDRESS: u8 = 0x77;
