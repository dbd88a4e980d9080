//! PWM timing encoder.
//!
//! Converts duty cycles into the ON/OFF counter values of one output. The
//! four returned bytes are in register order (ON_L, ON_H, OFF_L, OFF_H) and
//! can be written directly to an `LEDn_ON_L` or `ALL_LED_ON_L` register.

use crate::error::InvalidDuty;
use crate::registers::{
    FULL_OFF_BIT, FULL_ON_BIT, INTERNAL_OSCILLATOR_HZ, TIMER_RESOLUTION,
};

/// Register bytes of one output.
pub type PwmValues = [u8; 4];

/// `floor(x + 0.5)` without `libm`.
fn round(x: f64) -> i32 {
    let shifted = x + 0.5;
    let truncated = shifted as i32;
    if truncated as f64 > shifted {
        truncated - 1
    } else {
        truncated
    }
}

/// Encode an output that switches on after `delay` and stays on for
/// `on_time`, both fractions of one PWM cycle.
///
/// # Errors
/// [`InvalidDuty`] if either value is outside `[0, 1]` (or NaN).
///
/// # Example
/// ```
/// let bytes = pca9685::values(0.1, 0.2).unwrap();
/// assert_eq!(bytes, [0x99, 0x01, 0xCC, 0x04]);
/// ```
pub fn values(delay: f64, on_time: f64) -> Result<PwmValues, InvalidDuty> {
    let valid = |v: f64| (0.0..=1.0).contains(&v);
    if !valid(delay) || !valid(on_time) {
        return Err(InvalidDuty { delay, on_time });
    }

    let resolution = TIMER_RESOLUTION as f64;
    let mut delay_count = round(delay * resolution - 1.0).max(0);
    // on_count is added to delay_count, which already carries the -1
    let mut on_count = round(on_time * resolution);
    if delay == 0.0 {
        delay_count = 0;
        if on_count > 0 {
            on_count -= 1;
        }
    }
    if on_time == 0.0 {
        on_count = 0;
    }

    let on = delay_count;
    let mut off = on + on_count;
    if off >= TIMER_RESOLUTION as i32 {
        // The pulse started late and ends in the next cycle.
        off -= TIMER_RESOLUTION as i32;
    }
    let [on_l, on_h, ..] = (on as u32).to_le_bytes();
    let [off_l, off_h, ..] = (off as u32).to_le_bytes();
    Ok([on_l, on_h, off_l, off_h])
}

/// Output permanently on.
pub const fn full_on() -> PwmValues {
    [0, FULL_ON_BIT, 0, 0]
}

/// Output permanently off.
pub const fn full_off() -> PwmValues {
    [0, 0, 0, FULL_OFF_BIT]
}

pub const fn full(on: bool) -> PwmValues {
    if on {
        full_on()
    } else {
        full_off()
    }
}

/// PRE_SCALE value for `frequency_hz` with an external clock of
/// `oscillator_hz`.
pub fn prescaler_external_clock(oscillator_hz: f64, frequency_hz: f64) -> u8 {
    let counts = oscillator_hz / (TIMER_RESOLUTION as f64 * frequency_hz);
    (round(counts) as u8).wrapping_sub(1)
}

/// PRE_SCALE value for `frequency_hz` with the internal 25 MHz oscillator.
pub fn prescaler(frequency_hz: f64) -> u8 {
    prescaler_external_clock(INTERNAL_OSCILLATOR_HZ, frequency_hz)
}
