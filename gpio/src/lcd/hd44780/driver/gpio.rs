use crate::delay::Delay;
use crate::lcd::hd44780::driver::{HD44780Driver, RegisterSelect, STROBE_SETTLE};
use crate::lcd::hd44780::{LcdError, LcdLine, LcdResult, LineSet};
use log::trace;
use std::time::Duration;

/// HD44780 driver bit-banging the 4-bit bus over a [LineSet].
///
/// RW is held low for the whole lifetime of the driver, so the busy flag is never read and every
/// step is paced with fixed waits from `D`.
#[derive(Debug)]
pub struct GpioHD44780Driver<L: LineSet, D: Delay> {
    lines: L,
    delay: D,
}

impl<L: LineSet, D: Delay> GpioHD44780Driver<L, D> {
    pub fn new(lines: L, delay: D) -> Self {
        GpioHD44780Driver { lines, delay }
    }

    fn set(&mut self, line: LcdLine, high: bool) -> LcdResult<()> {
        self.lines
            .set_line(line, high)
            .map_err(|source| LcdError::HardwareFault { line, source })
    }
}

impl<L: LineSet, D: Delay> HD44780Driver for GpioHD44780Driver<L, D> {
    fn pulse_strobe(&mut self) -> LcdResult<()> {
        self.set(LcdLine::E, true)?;
        self.delay.wait(STROBE_SETTLE);
        self.set(LcdLine::E, false)
    }

    fn reset_lines(&mut self) -> LcdResult<()> {
        for line in LcdLine::DATA {
            self.set(line, false)?;
        }
        self.set(LcdLine::Rs, false)?;
        self.set(LcdLine::Rw, false)
    }

    fn send_nibble(&mut self, nibble: u8, register: RegisterSelect) -> LcdResult<()> {
        if nibble > 0b1111 {
            return Err(LcdError::InvalidNibble(nibble));
        }
        trace!("Writing nibble: {:04b}, RS: {}", nibble, register.is_data());

        self.set(LcdLine::Rs, register.is_data())?;
        for (i, line) in LcdLine::DATA.into_iter().enumerate() {
            self.set(line, nibble & (1 << i) != 0)?;
        }
        self.pulse_strobe()
    }

    fn delay(&mut self, duration: Duration) {
        self.delay.wait(duration);
    }
}
