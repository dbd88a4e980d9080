//! tank-i2c
//!
//! Opens the FT260, configures and validates it, then runs one command
//! against the tank peripherals:
//!
//! - `none`: stop after the bridge is configured
//! - `scan`: list the addresses that answer on the bus
//! - `motors`: set the main motors to `--m1`/`--m2`
//! - `leds`: set the leading LEDs to the `--led` values
//! - `battery`: read the battery level `--samples` times
//!
//! Device commands run next to a battery telemetry loop, both going
//! through the same bus (the sequencer by default).

use std::error::Error;

use clap::{Parser, ValueEnum};
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use embedded_hal_async::i2c::I2c;
use ft260::hidapi::HidApi;
use ft260::{Ft260, HidapiTransport, I2cBus, SCAN_RANGE};
use static_cell::StaticCell;

use tank::{
    open_bridge, run_i2c_sequencer, Battery, DummyBus, Leds, Motors, RequestQueue, SequencedBus,
    SharedBridge, Tank, TankConfig, TankError,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Command {
    #[value(name = "none")]
    Nothing,
    Scan,
    Motors,
    Leds,
    Battery,
}

/// Drive the I2C peripherals of the tank through an FT260 bridge.
#[derive(Debug, Parser)]
#[command(name = "tank-i2c", version)]
struct Cli {
    /// USB HID path of the FT260 (default: first attached FT260)
    #[arg(long)]
    dev: Option<String>,

    /// I2C bus frequency in kHz (60 - 3400)
    #[arg(long, default_value_t = 400)]
    freq: u16,

    /// Call the bridge directly instead of through the I2C sequencer task
    #[arg(long)]
    no_i2c_sequencer: bool,

    /// Run without USB/I2C hardware, only log what would be written
    #[arg(long)]
    dummy: bool,

    /// Command to execute
    #[arg(short = 'c', long, value_enum, default_value_t = Command::Scan)]
    command: Command,

    /// Speed of the left motor (-100..100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    m1: f64,

    /// Speed of the right motor (-100..100)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    m2: f64,

    /// Brightness (0..1) of the next LED, repeat for more LEDs
    #[arg(long = "led", value_name = "DUTY")]
    leds: Vec<f64>,

    /// Battery readings taken while the command runs
    #[arg(long, default_value_t = 1)]
    samples: u32,

    /// Pause between battery readings in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Stop the motors and switch the LEDs off before exiting
    #[arg(long)]
    cleanup: bool,
}

impl Cli {
    fn tank_config(&self) -> TankConfig {
        TankConfig {
            usb_device: self.dev.clone(),
            i2c_freq_khz: self.freq,
            no_i2c_sequencer: self.no_i2c_sequencer,
            dummy: self.dummy,
            ..TankConfig::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Request queue between the drivers and the sequencer task.
static QUEUE: StaticCell<RequestQueue> = StaticCell::new();

/// Bridge shared by the drivers in direct mode.
static BRIDGE: StaticCell<SharedBridge<HidapiTransport>> = StaticCell::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `run_i2c_sequencer` so it
/// can be spawned as a concrete Embassy task.
#[embassy_executor::task]
async fn sequencer_task(bridge: Ft260<HidapiTransport>, queue: &'static RequestQueue) {
    run_i2c_sequencer(bridge, queue).await;
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn execute<I2C>(
    cli: &Cli,
    motors: &mut Motors<I2C>,
    leds: &mut Leds<I2C>,
) -> Result<(), TankError<I2C::Error>>
where
    I2C: I2c,
{
    match cli.command {
        Command::Motors => {
            motors.set(cli.m1, cli.m2).await?;
        }
        Command::Leds => {
            leds.set(&cli.leds).await?;
            log::info!("LEDs set to {:?}", leds.state().unwrap_or_default());
        }
        Command::Nothing | Command::Scan | Command::Battery => {}
    }
    Ok(())
}

/// Log the battery level `samples` times. A failed reading is logged and
/// skipped.
async fn telemetry<I2C>(battery: &mut Battery<I2C>, samples: u32, interval: Duration)
where
    I2C: I2c,
{
    for sample in 0..samples {
        if sample > 0 {
            Timer::after(interval).await;
        }
        match battery.voltage().await {
            Ok(raw) => log::info!(
                "Battery at {:.1}% (raw conversion {})",
                battery.percentage(raw) * 100.0,
                raw
            ),
            Err(e) => log::warn!("Battery reading failed: {}", e),
        }
    }
}

async fn run<I2C>(mut tank: Tank<I2C>, mut bus: I2C, cli: &Cli) -> Result<(), Box<dyn Error>>
where
    I2C: I2c,
    I2C::Error: 'static,
{
    match cli.command {
        Command::Nothing => return Ok(()),
        Command::Scan => {
            let found = bus.scan(SCAN_RANGE).await.map_err(TankError::I2c)?;
            log::info!("Scanned slaves: {:02x?}", found);
            return Ok(());
        }
        Command::Motors | Command::Leds | Command::Battery => {}
    }

    tank.init().await?;

    let Tank {
        motors,
        leds,
        battery,
    } = &mut tank;
    let interval = Duration::from_millis(cli.interval_ms);
    let (result, ()) = join(
        execute(cli, motors, leds),
        telemetry(battery, cli.samples, interval),
    )
    .await;
    result?;

    if cli.cleanup {
        tank.cleanup().await?;
    }
    Ok(())
}

/// Open the bridge and run the command on the bus selected by `cli`.
async fn start(spawner: Spawner, cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.tank_config();

    if config.dummy {
        log::info!("Dummy tank: skipping initialization of USB/I2C peripherals");
        let tank = Tank::new(&config, || DummyBus)?;
        return run(tank, DummyBus, cli).await;
    }

    let api = HidApi::new()?;
    let bridge = open_bridge(&api, &config)?;

    if config.no_i2c_sequencer {
        let shared: &'static SharedBridge<HidapiTransport> = BRIDGE.init(Mutex::new(bridge));
        let bus = || I2cDevice::new(shared);
        let tank = Tank::new(&config, bus)?;
        run(tank, bus(), cli).await
    } else {
        let queue: &'static RequestQueue = QUEUE.init(RequestQueue::new());
        spawner
            .spawn(sequencer_task(bridge, queue))
            .map_err(|e| format!("spawning the I2C sequencer failed: {:?}", e))?;
        let bus = || SequencedBus::new(queue);
        let tank = Tank::new(&config, bus)?;
        run(tank, bus(), cli).await
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    // The executor never returns, so the exit code is set here.
    let code = match start(spawner, &cli).await {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e);
            1
        }
    };
    std::process::exit(code);
}
