//! Bring-up and shutdown of the bridge and the tank peripherals.

use embassy_time::Delay;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use ft260::hidapi::HidApi;
use ft260::{Ft260, Ft260Error, HidTransport, HidapiTransport};

use crate::adc::Battery;
use crate::config::TankConfig;
use crate::error::TankError;
use crate::leds::Leds;
use crate::motors::Motors;

/// Check that `bridge` is an FT260, configure it for I2C at `freq_khz`
/// and verify that the configuration took effect.
pub fn prepare_bridge<T, D>(bridge: &mut Ft260<T, D>, freq_khz: u16) -> Result<(), Ft260Error>
where
    T: HidTransport,
    D: DelayNs,
{
    bridge.validate_chip_code()?;
    bridge.configure(freq_khz)?;
    bridge.validate(freq_khz)?;
    #[cfg(feature = "log")]
    log::info!("Successfully opened and configured FT260 device");
    Ok(())
}

/// Open the FT260 named by `config.usb_device` (or the first one) and
/// prepare it with [`prepare_bridge`].
pub fn open_bridge(api: &HidApi, config: &TankConfig) -> Result<Ft260<HidapiTransport>, Ft260Error> {
    let transport = HidapiTransport::open(api, config.usb_device.as_deref())?;
    let mut bridge = Ft260::new(transport, Delay);
    prepare_bridge(&mut bridge, config.i2c_freq_khz)?;
    Ok(bridge)
}

/// All peripherals of the tank, each with its own bus handle.
pub struct Tank<I2C> {
    pub motors: Motors<I2C>,
    pub leds: Leds<I2C>,
    pub battery: Battery<I2C>,
}

impl<I2C> Tank<I2C>
where
    I2C: I2c,
{
    /// Create the drivers, calling `bus` once per driver for its handle.
    pub fn new(config: &TankConfig, mut bus: impl FnMut() -> I2C) -> Result<Self, TankError<I2C::Error>> {
        Ok(Self {
            motors: Motors::new(bus(), config.motors)?,
            leds: Leds::new(bus(), config.leds)?,
            battery: Battery::new(bus(), config.battery),
        })
    }

    /// Initialise motors, LEDs and the battery ADC, in this order.
    pub async fn init(&mut self) -> Result<(), TankError<I2C::Error>> {
        self.motors.init().await?;
        self.leds.init().await?;
        self.battery.init().await?;
        #[cfg(feature = "log")]
        log::info!("Successfully initialized I2C peripherals");
        Ok(())
    }

    /// Stop the motors and switch the LEDs off.
    ///
    /// Both steps are attempted; the first failure is returned.
    pub async fn cleanup(&mut self) -> Result<(), TankError<I2C::Error>> {
        let motors = self.motors.stop().await.map(|_| ());
        let leds = self.leds.disable_all().await;
        motors.and(leds)
    }
}
