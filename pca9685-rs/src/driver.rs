//! Async PCA9685 driver.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::error::Pca9685Error;
use crate::output::PwmOutput;
use crate::registers::{
    led, ALL_LED_ON_L, CHANNEL_COUNT, MODE1, MODE1_AI, MODE1_ALLCALL, MODE1_RESTART,
    MODE1_SLEEP, PRE_SCALE,
};
use crate::values::{full_off, prescaler};

/// MODE1 value written by [`Pca9685::init`].
pub const MODE1_DEFAULT: u8 = MODE1_ALLCALL | MODE1_AI;

/// Oscillator start-up time after clearing SLEEP.
const OSCILLATOR_STARTUP_US: u32 = 500;

/// PCA9685 driving a block of consecutive outputs.
///
/// Outputs are addressed relative to `first_output`, so one chip can be
/// split between several owners (e.g. motors on outputs 0-3).
pub struct Pca9685<I2C> {
    i2c: I2C,
    address: u8,
    first_output: u8,
    output: PwmOutput,
}

impl<I2C> Pca9685<I2C>
where
    I2C: I2c,
{
    /// Create a driver for the block starting at output 0.
    ///
    /// # Arguments
    /// * `i2c` - I2C bus (takes ownership; pass a shared-bus device to share it)
    /// * `address` - 7-bit device address (typically 0x40)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            first_output: 0,
            output: PwmOutput::new(),
        }
    }

    /// Create a driver for the block starting at `first_output` (0-15).
    pub fn with_first_output(
        i2c: I2C,
        address: u8,
        first_output: u8,
    ) -> Result<Self, Pca9685Error<I2C::Error>> {
        if first_output as usize >= CHANNEL_COUNT {
            return Err(Pca9685Error::InvalidOutput(first_output));
        }
        Ok(Self {
            i2c,
            address,
            first_output,
            output: PwmOutput::new(),
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Last written duty cycles, `None` before the first write.
    pub fn current_state(&self) -> Option<&[f64]> {
        self.output.current_state()
    }

    /// Rewrite every output of the block on the next update.
    pub fn disable_optimization(&mut self) {
        self.output.disable_optimization();
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Wake the chip with register auto increment and ALLCALL enabled.
    pub async fn init(&mut self) -> Result<(), Pca9685Error<I2C::Error>> {
        self.i2c.write(self.address, &[MODE1, MODE1_DEFAULT]).await?;
        Ok(())
    }

    /// Set the PWM frequency of all outputs.
    ///
    /// The prescaler is only writable while the oscillator sleeps:
    /// 1. Enter SLEEP
    /// 2. Write PRE_SCALE
    /// 3. Leave SLEEP and wait for the oscillator
    /// 4. Set RESTART to resume the previous duty cycles
    pub async fn set_frequency<D: DelayNs>(
        &mut self,
        frequency_hz: f64,
        delay: &mut D,
    ) -> Result<(), Pca9685Error<I2C::Error>> {
        let prescale = prescaler(frequency_hz);
        self.i2c
            .write(self.address, &[MODE1, MODE1_DEFAULT | MODE1_SLEEP])
            .await?;
        self.i2c.write(self.address, &[PRE_SCALE, prescale]).await?;
        self.i2c.write(self.address, &[MODE1, MODE1_DEFAULT]).await?;
        delay.delay_us(OSCILLATOR_STARTUP_US).await;
        self.i2c
            .write(self.address, &[MODE1, MODE1_DEFAULT | MODE1_RESTART])
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------------

    /// Write duty cycles (0..=1) to the block, skipping unchanged outputs.
    ///
    /// Returns the number of bytes sent, 0 if nothing changed. After a
    /// failed write the next call rewrites the whole block.
    pub async fn set_outputs(&mut self, duties: &[f64]) -> Result<usize, Pca9685Error<I2C::Error>> {
        let available = CHANNEL_COUNT - self.first_output as usize;
        if duties.len() > available {
            return Err(Pca9685Error::TooManyOutputs {
                first: self.first_output,
                count: duties.len(),
            });
        }

        let first_register = led(self.first_output);
        let Some(update) = self
            .output
            .update(first_register, duties)
            .map_err(Pca9685Error::InvalidDuty)?
        else {
            return Ok(0);
        };

        if let Err(e) = self.i2c.write(self.address, &update).await {
            // The recorded state was never applied.
            self.output.disable_optimization();
            return Err(e.into());
        }
        Ok(update.len())
    }

    /// Like [`set_outputs`](Self::set_outputs), but writes every output.
    pub async fn force_outputs(&mut self, duties: &[f64]) -> Result<usize, Pca9685Error<I2C::Error>> {
        self.disable_optimization();
        self.set_outputs(duties).await
    }

    /// Complete `duties` with the current values of the trailing outputs,
    /// then write them.
    pub async fn set_leading_outputs(
        &mut self,
        duties: &[f64],
    ) -> Result<usize, Pca9685Error<I2C::Error>> {
        let filled = self.output.fill_current_state(duties);
        self.set_outputs(&filled).await
    }

    /// Switch every output of the chip fully off.
    pub async fn all_off(&mut self) -> Result<(), Pca9685Error<I2C::Error>> {
        let [on_l, on_h, off_l, off_h] = full_off();
        self.i2c
            .write(self.address, &[ALL_LED_ON_L, on_l, on_h, off_l, off_h])
            .await?;
        self.output.disable_optimization();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, Operation};

    use super::*;
    use crate::registers::{led, LED0};
    use crate::values::values;

    /// Records writes; fails the next write when `fail_next` is set.
    #[derive(Default)]
    struct RecordingI2c {
        writes: Vec<(u8, Vec<u8>)>,
        fail_next: bool,
    }

    impl ErrorType for RecordingI2c {
        type Error = ErrorKind;
    }

    impl I2c for RecordingI2c {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if core::mem::take(&mut self.fail_next) {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                if let Operation::Write(data) = op {
                    self.writes.push((address, data.to_vec()));
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn init_enables_auto_increment() {
        let mut pwm = Pca9685::new(RecordingI2c::default(), 0x44);
        block_on(pwm.init()).unwrap();
        assert_eq!(pwm.release().writes, vec![(0x44, vec![0x00, 0x21])]);
    }

    #[test]
    fn frequency_sequence() {
        let mut pwm = Pca9685::new(RecordingI2c::default(), 0x40);
        block_on(pwm.set_frequency(200.0, &mut NoDelay)).unwrap();
        let writes: Vec<Vec<u8>> = pwm.release().writes.into_iter().map(|(_, w)| w).collect();
        assert_eq!(
            writes,
            vec![vec![0x00, 0x31], vec![0xFE, 0x1E], vec![0x00, 0x21], vec![0x00, 0xA1]]
        );
    }

    #[test]
    fn outputs_are_written_from_the_block_start() {
        let mut pwm = Pca9685::with_first_output(RecordingI2c::default(), 0x40, 2).unwrap();
        let sent = block_on(pwm.set_outputs(&[0.5, 1.0])).unwrap();
        assert_eq!(sent, 9);
        assert_eq!(block_on(pwm.set_outputs(&[0.5, 1.0])).unwrap(), 0);

        let writes = pwm.release().writes;
        assert_eq!(writes.len(), 1);
        let (_, data) = &writes[0];
        assert_eq!(data[0], led(2));
        assert_eq!(&data[1..5], &values(0.0, 0.5).unwrap());
    }

    #[test]
    fn failed_write_forces_full_rewrite() {
        let mut pwm = Pca9685::new(RecordingI2c::default(), 0x40);
        block_on(pwm.set_outputs(&[0.1, 0.2, 0.3])).unwrap();

        pwm.i2c.fail_next = true;
        assert!(matches!(
            block_on(pwm.set_outputs(&[0.1, 0.9, 0.3])),
            Err(Pca9685Error::I2c(ErrorKind::Other))
        ));

        // Same target again: the failed state must be written, and in full.
        assert_eq!(block_on(pwm.set_outputs(&[0.1, 0.9, 0.3])).unwrap(), 13);
        assert_eq!(pwm.release().writes[1].1[0], LED0);
    }

    #[test]
    fn too_many_outputs() {
        let mut pwm = Pca9685::with_first_output(RecordingI2c::default(), 0x40, 15).unwrap();
        assert!(matches!(
            block_on(pwm.set_outputs(&[0.1, 0.2])),
            Err(Pca9685Error::TooManyOutputs { first: 15, count: 2 })
        ));
        assert!(matches!(
            Pca9685::with_first_output(RecordingI2c::default(), 0x40, 16),
            Err(Pca9685Error::InvalidOutput(16))
        ));
    }

    #[test]
    fn invalid_duty_is_reported() {
        let mut pwm = Pca9685::new(RecordingI2c::default(), 0x40);
        assert!(matches!(
            block_on(pwm.set_outputs(&[2.0])),
            Err(Pca9685Error::InvalidDuty(_))
        ));
        assert!(pwm.release().writes.is_empty());
    }

    #[test]
    fn leading_outputs_keep_the_rest() {
        let mut pwm = Pca9685::new(RecordingI2c::default(), 0x40);
        block_on(pwm.set_outputs(&[0.1, 0.2, 0.3])).unwrap();
        block_on(pwm.set_leading_outputs(&[0.5])).unwrap();
        assert_eq!(pwm.current_state(), Some(&[0.5, 0.2, 0.3][..]));
    }

    #[test]
    fn all_off_uses_the_broadcast_register() {
        let mut pwm = Pca9685::new(RecordingI2c::default(), 0x40);
        block_on(pwm.all_off()).unwrap();
        assert_eq!(pwm.release().writes, vec![(0x40, vec![0xFA, 0, 0, 0, 0x10])]);
    }
}
