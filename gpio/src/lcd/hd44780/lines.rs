use crate::lcd::hd44780::{LcdError, LcdResult};
use crate::{GpioDriver, GpioOutput, GpioResult};
use log::debug;
use std::fmt::{Debug, Display, Formatter};

/// One of the seven signal lines of the 4-bit HD44780 bus.
///
/// Discriminants follow [LcdLine::ALL].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LcdLine {
    /// Data line of weight 1 within a nibble.
    D4,
    /// Data line of weight 2 within a nibble.
    D5,
    /// Data line of weight 4 within a nibble.
    D6,
    /// Data line of weight 8 within a nibble.
    D7,
    /// Register select: 0 selects the instruction register, 1 the data register.
    Rs,
    /// Read/write: held at 0 (write).
    Rw,
    /// Enable strobe. The controller latches the bus on its falling edge.
    E,
}

impl LcdLine {
    /// Data lines, LSb first.
    pub const DATA: [LcdLine; 4] = [LcdLine::D4, LcdLine::D5, LcdLine::D6, LcdLine::D7];

    /// All lines, in acquisition order.
    pub const ALL: [LcdLine; 7] = [
        LcdLine::D4,
        LcdLine::D5,
        LcdLine::D6,
        LcdLine::D7,
        LcdLine::Rs,
        LcdLine::Rw,
        LcdLine::E,
    ];
}

impl Display for LcdLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LcdLine::D4 => "D4",
            LcdLine::D5 => "D5",
            LcdLine::D6 => "D6",
            LcdLine::D7 => "D7",
            LcdLine::Rs => "RS",
            LcdLine::Rw => "RW",
            LcdLine::E => "E",
        };
        f.write_str(name)
    }
}

/// The capability the bus protocol needs: drive a named line high or low.
pub trait LineSet: Debug {
    fn set_line(&mut self, line: LcdLine, high: bool) -> GpioResult<()>;
}

/// Physical pin numbers of the seven lines, as understood by the [GpioDriver] in use.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LcdPins {
    /// D4, D5, D6, D7.
    pub data: [usize; 4],
    pub rs: usize,
    pub rw: usize,
    pub e: usize,
}

impl LcdPins {
    pub fn pin(&self, line: LcdLine) -> usize {
        match line {
            LcdLine::D4 => self.data[0],
            LcdLine::D5 => self.data[1],
            LcdLine::D6 => self.data[2],
            LcdLine::D7 => self.data[3],
            LcdLine::Rs => self.rs,
            LcdLine::Rw => self.rw,
            LcdLine::E => self.e,
        }
    }
}

impl Default for LcdPins {
    /// BCM numbering of the reference wiring.
    fn default() -> Self {
        LcdPins {
            data: [5, 6, 12, 13],
            rs: 16,
            rw: 26,
            e: 25,
        }
    }
}

/// [LineSet] made of seven outputs claimed from a [GpioDriver].
///
/// The outputs are owned for as long as the line set lives and released when it is dropped.
pub struct GpioLineSet<'a> {
    /// Indexed by `LcdLine as usize`.
    outputs: Vec<Box<dyn GpioOutput + 'a>>,
}

impl<'a> GpioLineSet<'a> {
    /// Claims all seven lines in [LcdLine::ALL] order: D4..D7 first, then RS, RW and E.
    ///
    /// Fails with [LcdError::HardwareFault] naming the first line that could not be claimed.
    /// Lines claimed before the failure are released on the way out.
    pub fn acquire(driver: &'a dyn GpioDriver, pins: &LcdPins) -> LcdResult<Self> {
        let claim = |line: LcdLine| {
            let pin = pins.pin(line);
            debug!("Claiming {} on pin {}", line, pin);
            driver
                .get_output(pin)
                .map_err(|source| LcdError::HardwareFault { line, source })
        };

        // Stops at the first failure; whatever was claimed so far is dropped with the Vec.
        let outputs = LcdLine::ALL
            .into_iter()
            .map(claim)
            .collect::<LcdResult<Vec<_>>>()?;

        Ok(GpioLineSet { outputs })
    }
}

impl Debug for GpioLineSet<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("GpioLineSet(")?;
        for (line, output) in LcdLine::ALL.iter().zip(&self.outputs) {
            write!(f, "{}: {:?}, ", line, output)?;
        }
        f.write_str(")")
    }
}

impl LineSet for GpioLineSet<'_> {
    fn set_line(&mut self, line: LcdLine, high: bool) -> GpioResult<()> {
        self.outputs[line as usize].write(high)
    }
}
