//! PCA9685 register map and bit definitions.
//!
//! Each of the 16 outputs owns four consecutive registers starting at
//! `LED0_ON_L + 4 * n`: ON low, ON high, OFF low, OFF high. With
//! [`MODE1_AI`] set, one write can cover several outputs.

// ---------------------------------------------------------------------------
// Control registers
// ---------------------------------------------------------------------------

pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;

/// Sub-addresses are stored in the 7 MSBs (left-shifted once).
pub const SUBADR1: u8 = 0x02;
pub const SUBADR2: u8 = 0x03;
pub const SUBADR3: u8 = 0x04;
pub const ALLCALLADR: u8 = 0x05;

// ---------------------------------------------------------------------------
// Output registers
// ---------------------------------------------------------------------------

/// First register of output 0.
pub const LED0_ON_L: u8 = 0x06;

/// Number of PWM outputs.
pub const CHANNEL_COUNT: usize = 16;

/// Registers per output.
pub const BYTES_PER_OUTPUT: usize = 4;

/// First register of output `n` (0..=15).
pub const fn led(n: u8) -> u8 {
    LED0_ON_L + n * BYTES_PER_OUTPUT as u8
}

pub const LED0: u8 = led(0);

/// Writes to these four registers apply to all outputs at once.
pub const ALL_LED_ON_L: u8 = 0xFA;

/// Only writable while [`MODE1_SLEEP`] is set. Default [`DEFAULT_PRESCALE`].
pub const PRE_SCALE: u8 = 0xFE;
pub const TEST_MODE: u8 = 0xFF;

// ---------------------------------------------------------------------------
// MODE1 bits (reset value: ALLCALL | SLEEP)
// ---------------------------------------------------------------------------

/// Respond to the ALLCALL address.
pub const MODE1_ALLCALL: u8 = 1 << 0;
pub const MODE1_SUB3: u8 = 1 << 1;
pub const MODE1_SUB2: u8 = 1 << 2;
pub const MODE1_SUB1: u8 = 1 << 3;
/// Oscillator off, low power mode.
pub const MODE1_SLEEP: u8 = 1 << 4;
/// Register auto increment.
pub const MODE1_AI: u8 = 1 << 5;
/// Clock from the EXTCLK pin. Set SLEEP first, then SLEEP | EXTCLK.
/// Cleared only by a power cycle or software reset.
pub const MODE1_EXTCLK: u8 = 1 << 6;
/// Write 1 to resume PWM after SLEEP.
pub const MODE1_RESTART: u8 = 1 << 7;

// ---------------------------------------------------------------------------
// MODE2 bits (reset value: OUTDRV)
// ---------------------------------------------------------------------------

/// Output state while OE is high (only with OUTNE1 clear).
pub const MODE2_OUTNE0: u8 = 1 << 0;
/// High impedance while OE is high.
pub const MODE2_OUTNE1: u8 = 1 << 1;
/// Totem pole outputs instead of open drain.
pub const MODE2_OUTDRV: u8 = 1 << 2;
/// Outputs change on ACK instead of STOP.
pub const MODE2_OCH: u8 = 1 << 3;
pub const MODE2_INVRT: u8 = 1 << 4;

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Address with all hardware address pins low.
pub const DEFAULT_ADDRESS: u8 = 0x40;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Steps of one PWM cycle.
pub const TIMER_RESOLUTION: u32 = 4096;

/// Bit 4 of LEDn_ON_H.
pub const FULL_ON_BIT: u8 = 0x10;
/// Bit 4 of LEDn_OFF_H. Wins over [`FULL_ON_BIT`].
pub const FULL_OFF_BIT: u8 = 0x10;

pub const INTERNAL_OSCILLATOR_HZ: f64 = 25_000_000.0;

/// Lowest PWM frequency with the internal oscillator (prescale 0xFF).
pub const FREQ_MIN: f64 = 23.841_857_91;
/// Highest PWM frequency with the internal oscillator (prescale 0x03).
pub const FREQ_MAX: f64 = 1525.878_906_25;

/// Smallest prescale value accepted by the hardware.
pub const PRESCALE_MIN: u8 = 0x03;
/// Reset value of PRE_SCALE, about 200 Hz with the internal oscillator.
pub const DEFAULT_PRESCALE: u8 = 0x1E;
