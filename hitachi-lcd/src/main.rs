mod config;
mod stream;

use crate::config::Config;
use dotenv::dotenv;
use hitachi_lcd_gpio::delay::ThreadDelay;
use hitachi_lcd_gpio::gpiod::GpiodDriver;
use hitachi_lcd_gpio::lcd::hd44780::driver::{GpioHD44780Driver, HD44780Driver};
use hitachi_lcd_gpio::lcd::hd44780::{GpioLineSet, LcdDevice, WriteSession};
use log::{debug, error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io;
use std::path::Path;
use std::{process, thread};
use sysinfo::System;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!("hitachi-lcd v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Host {} kernel ver {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let config = Config::load()?;
    let pins = config.lcd_pins();
    info!(
        "LCD @ {} E: {}, RW: {}, RS: {}, Data: {:?}",
        config.chip, pins.e, pins.rw, pins.rs, pins.data
    );

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::open(&config.chip)?;
    debug!("{:?} initialized.", gpio);

    debug!("Initializing LCD driver...");
    let lines = GpioLineSet::acquire(&gpio, &pins)?;
    let driver = GpioHD44780Driver::new(lines, ThreadDelay);
    let session = WriteSession::open(driver, config.display_options())?;
    info!("Display initialized, {} characters per screen.", session.max_chars() + 1);
    let device = LcdDevice::new(session);

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let signals_handle = signals.handle();

    thread::scope(|s| {
        let device = &device;
        s.spawn(move || {
            // Ends without a signal once the handle is closed.
            if let Some(signal) = signals.forever().next() {
                info!("Caught signal {}, shutting down...", signal);
                // Takes the device lock, so a write in progress finishes first.
                match device.shutdown() {
                    Ok(()) => info!("Display shut down."),
                    Err(err) => error!("Display teardown failed: {}", err),
                }
                process::exit(128 + signal);
            }
        });

        let result = feed(device, config.input.as_deref());
        signals_handle.close();
        result
    })?;

    device.shutdown()?;
    info!("Display shut down.");

    Ok(())
}

/// Streams the configured input into the display; stdin when no path is set.
fn feed<D: HD44780Driver>(device: &LcdDevice<D>, input: Option<&Path>) -> eyre::Result<()> {
    match input {
        Some(path) => stream::serve_path(device, path),
        None => {
            let written = stream::pump(device, io::stdin().lock())?;
            debug!("{} bytes from stdin", written);
            Ok(())
        }
    }
}
