use hitachi_lcd_gpio::lcd::hd44780::LcdDevice;
use hitachi_lcd_gpio::lcd::hd44780::driver::HD44780Driver;
use log::{debug, info};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

/// Copies `input` to the display until EOF, honouring short writes from the device.
///
/// Returns the number of bytes written.
pub fn pump<D: HD44780Driver>(device: &LcdDevice<D>, mut input: impl Read) -> eyre::Result<u64> {
    let mut buf = [0u8; 256];
    let mut total = 0u64;
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };

        let mut rest = &buf[..n];
        while !rest.is_empty() {
            let taken = device.write(rest)?;
            rest = &rest[taken..];
        }
        total += n as u64;
    }
}

/// Feeds the display from `path`.
///
/// A FIFO is reopened every time its writer goes away, so it behaves like a device node and this
/// never returns on success. A regular file is read once.
pub fn serve_path<D: HD44780Driver>(device: &LcdDevice<D>, path: &Path) -> eyre::Result<()> {
    let is_fifo = path.metadata()?.file_type().is_fifo();
    info!("Reading from {} (fifo: {})", path.display(), is_fifo);

    loop {
        // Opening a FIFO blocks until a writer shows up.
        let file = File::open(path)?;
        let written = pump(device, file)?;
        debug!("{} bytes from {}", written, path.display());

        if !is_fifo {
            return Ok(());
        }
    }
}
