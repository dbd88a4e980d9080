//! Diff-based update of a block of consecutive PWM outputs.

use heapless::Vec;

use crate::error::InvalidDuty;
use crate::registers::{BYTES_PER_OUTPUT, CHANNEL_COUNT};
use crate::values::values;

/// Register address plus the bytes of every output in one update.
pub const MAX_UPDATE_LEN: usize = 1 + CHANNEL_COUNT * BYTES_PER_OUTPUT;

/// Duty cycles of a block of outputs.
pub type PwmState = Vec<f64, CHANNEL_COUNT>;

/// One I2C write: first register address, then 4 bytes per output.
pub type PwmUpdate = Vec<u8, MAX_UPDATE_LEN>;

/// Last state written to a block of outputs.
///
/// The first update, an update with a different number of outputs, and the
/// update after [`disable_optimization`](Self::disable_optimization) write
/// every output. Later updates only cover the outputs between the first and
/// the last changed one.
#[derive(Debug, Clone, Default)]
pub struct PwmOutput {
    current: Option<PwmState>,
    optimize: bool,
}

impl PwmOutput {
    pub const fn new() -> Self {
        Self {
            current: None,
            optimize: false,
        }
    }

    /// State of the last update, `None` before the first one.
    pub fn current_state(&self) -> Option<&[f64]> {
        self.current.as_deref()
    }

    /// Write every output on the next update.
    pub fn disable_optimization(&mut self) {
        self.optimize = false;
    }

    /// Complete a partial state with the current values of the missing
    /// trailing outputs, or cut values beyond the current block.
    ///
    /// Returns `new_state` unchanged before the first update.
    pub fn fill_current_state(&self, new_state: &[f64]) -> PwmState {
        let new_state = &new_state[..new_state.len().min(CHANNEL_COUNT)];
        match &self.current {
            Some(current) if new_state.len() < current.len() => new_state
                .iter()
                .chain(&current[new_state.len()..])
                .copied()
                .collect(),
            Some(current) => new_state[..current.len()].iter().copied().collect(),
            None => new_state.iter().copied().collect(),
        }
    }

    /// Compute the write that brings the outputs from the current state to
    /// `new_state`.
    ///
    /// # Arguments
    /// * `first_register` - `LEDn_ON_L` register of the first output in the block
    /// * `new_state` - duty cycle per output, at most 16 values are used
    ///
    /// # Returns
    /// `None` if nothing changed. Otherwise the bytes to write in one
    /// auto-increment transfer. The new state is recorded either way.
    ///
    /// # Errors
    /// [`InvalidDuty`] if a changed value is outside `[0, 1]`. The recorded
    /// state is left untouched.
    pub fn update(
        &mut self,
        first_register: u8,
        new_state: &[f64],
    ) -> Result<Option<PwmUpdate>, InvalidDuty> {
        let new_state = &new_state[..new_state.len().min(CHANNEL_COUNT)];
        let count = new_state.len();

        let (mut from, mut to) = (0, count);
        match &self.current {
            Some(current) if current.len() == count && self.optimize => {
                while from < count && current[from] == new_state[from] {
                    from += 1;
                }
                while to > from && current[to - 1] == new_state[to - 1] {
                    to -= 1;
                }
            }
            _ => {}
        }

        let mut bytes = PwmUpdate::new();
        if from < to {
            let register = first_register.wrapping_add((from * BYTES_PER_OUTPUT) as u8);
            // Capacity covers the register byte plus 16 outputs.
            let _ = bytes.push(register);
            for &duty in &new_state[from..to] {
                let _ = bytes.extend_from_slice(&values(0.0, duty)?);
            }
        }

        self.current = Some(new_state.iter().copied().collect());
        self.optimize = true;
        Ok(if bytes.is_empty() { None } else { Some(bytes) })
    }
}
