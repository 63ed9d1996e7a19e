mod gpio;

use crate::lcd::hd44780::{LcdError, LcdResult};
pub use gpio::*;
use std::fmt::Debug;
use std::time::Duration;

/// How long E is held high for the controller to latch the bus.
pub const STROBE_SETTLE: Duration = Duration::from_micros(40);

/// How long the controller needs to execute a clear display instruction.
pub const CLEAR_LATENCY: Duration = Duration::from_millis(100);

/// Which register a nibble is addressed to, as selected by the RS line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegisterSelect {
    /// RS = 0.
    Instruction,
    /// RS = 1, character data.
    Data,
}

impl RegisterSelect {
    pub fn is_data(self) -> bool {
        self == RegisterSelect::Data
    }
}

/// Write-only HD44780 protocol over a 4-bit bus.
///
/// Implementations provide the low-level primitives; the instructions are built on top of them.
pub trait HD44780Driver: Debug {
    /// Runs the 4-bit function set sequence.
    ///
    /// Sends the `0b0010` nibble twice, then the second half of the function set with D7 carrying
    /// the line count. Must run exactly once after the controller powers up, before any
    /// instruction.
    fn initialize_4bit(&mut self, two_lines: bool) -> LcdResult<()> {
        self.reset_lines()?;
        self.send_nibble(0b0010, RegisterSelect::Instruction)?;
        self.pulse_strobe()?;
        let lines = if two_lines { 0b1000 } else { 0 };
        self.send_nibble(0b0010 | lines, RegisterSelect::Instruction)
    }

    /// Sends an instruction whose 8-bit opcode has a zero high nibble.
    ///
    /// The zeroed bus is strobed first as the high nibble, then `opcode` as the low nibble.
    /// Wider instructions (function set, DDRAM/CGRAM addressing) cannot go through here.
    fn write_instruction(&mut self, opcode: u8) -> LcdResult<()> {
        if opcode > 0b1111 {
            return Err(LcdError::InvalidNibble(opcode));
        }
        self.reset_lines()?;
        self.pulse_strobe()?;
        self.send_nibble(opcode, RegisterSelect::Instruction)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display(&mut self, display_on: bool, cursor_on: bool, blink_on: bool) -> LcdResult<()> {
        let mut opcode = 0b1000;
        if display_on {
            opcode |= 0b0100;
        }
        if cursor_on {
            opcode |= 0b0010;
        }
        if blink_on {
            opcode |= 0b0001;
        }
        self.write_instruction(opcode)
    }

    /// Clears the display and sets the cursor to the home position.
    ///
    /// Returns as soon as the instruction is on the bus; the caller waits [CLEAR_LATENCY] before
    /// sending anything else.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.write_instruction(0b0001)
    }

    /// Moves the cursor right after each character, without shifting the display.
    fn entry_mode_set(&mut self) -> LcdResult<()> {
        self.write_instruction(0b0110)
    }

    /// Writes a character code at the cursor, high nibble first.
    fn write_character(&mut self, byte: u8) -> LcdResult<()> {
        self.reset_lines()?;
        self.send_nibble(byte >> 4, RegisterSelect::Data)?;
        self.send_nibble(byte & 0x0F, RegisterSelect::Data)
    }

    // Low-level primitives
    // The instructions above are composed from these.

    /// Raises E, holds it for [STROBE_SETTLE] and lowers it again.
    fn pulse_strobe(&mut self) -> LcdResult<()>;

    /// Drives D4..D7, RS and RW low.
    fn reset_lines(&mut self) -> LcdResult<()>;

    /// Puts `nibble` on D4..D7 (bit 0 on D4) and `register` on RS, then pulses E.
    fn send_nibble(&mut self, nibble: u8, register: RegisterSelect) -> LcdResult<()>;

    /// Blocks for `duration` using the driver's time source.
    fn delay(&mut self, duration: Duration);
}
