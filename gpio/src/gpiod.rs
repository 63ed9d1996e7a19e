//! GpiodDriver implementation for claiming output lines through the Linux GPIO character device.
use crate::{GpioDriver, GpioError, GpioOutput, GpioResult};
use bitvec::order::Lsb0;
use bitvec::vec::BitVec;
use log::trace;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

/// Which pins of a chip are handed out.
struct UsedPins(BitVec<AtomicU8, Lsb0>);

impl UsedPins {
    fn new(count: usize) -> Self {
        UsedPins(BitVec::repeat(false, count))
    }

    /// Marks `index` as used. Returns false if it already was.
    ///
    /// The check and the mark are one atomic operation on the backing byte.
    fn claim(&self, index: usize) -> bool {
        let mask = 1u8 << (index % 8);
        let byte = &self.0.as_raw_slice()[index / 8];
        byte.fetch_or(mask, Ordering::AcqRel) & mask == 0
    }

    fn release(&self, index: usize) {
        self.0.set_aliased(index, false);
    }
}

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines of a single chip.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: UsedPins,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        Self {
            chip,
            used_pins: UsedPins::new(n),
        }
    }

    /// Opens the chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path)?;
        Ok(Self::new(chip))
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_output(&self, index: usize) -> GpioResult<Box<dyn GpioOutput + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if !self.used_pins.claim(index) {
            return Err(GpioError::AlreadyInUse(index));
        }

        let options = gpiod::Options::output([index as u32]).consumer(env!("CARGO_PKG_NAME"));
        let line = self
            .chip
            .request_lines(options)
            .and_then(|line| line.set_values([false]).map(|()| line));
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                self.used_pins.release(index);
                return Err(err.into());
            }
        };

        trace!("Claimed {:?}[{}] as output", self, index);

        Ok(Box::new(GpiodOutput {
            driver: self,
            pin_index: index,
            line,
        }))
    }
}

struct GpiodOutput<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
    line: gpiod::Lines<gpiod::Output>,
}

impl Debug for GpiodOutput<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][output]", self.driver, self.pin_index)
    }
}

impl GpioOutput for GpiodOutput<'_> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.line.set_values([value])?;
        Ok(())
    }
}

impl Drop for GpiodOutput<'_> {
    fn drop(&mut self) {
        // Leave the line low; the request itself is released when `line` is dropped.
        _ = self.line.set_values([false]);
        self.driver.used_pins.release(self.pin_index);
        trace!("Released {:?}[{}]", self.driver, self.pin_index);
    }
}
