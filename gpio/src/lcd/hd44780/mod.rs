//! HD44780 LCD module.
//!
//! Drives an HD44780-class character LCD over a write-only 4-bit bus made of seven GPIO lines
//! (D4..D7, RS, RW and E). The controller is never read back, so timing is done with fixed waits.
//!
//! The pieces, from the wire up:
//! - [LineSet]: the seven lines, each settable to 0 or 1.
//! - [driver::HD44780Driver]: the bus protocol (nibbles, strobes, instructions, characters).
//! - [WriteSession]: bring-up/teardown and the cursor with its clear-on-overflow policy.
//! - [LcdDevice]: the write-only entry point with a 32-byte staging buffer and a lock.

pub mod driver;
mod device;
mod lines;
mod session;
#[cfg(test)]
mod testing;

use crate::GpioError;
pub use device::*;
pub use lines::*;
pub use session::*;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    /// A line could not be acquired or driven.
    #[error("hardware fault on line {line}: {source}")]
    HardwareFault {
        line: LcdLine,
        #[source]
        source: GpioError,
    },
    /// More bytes were offered than fit in the staging buffer; the excess was dropped.
    #[error("buffer overrun: {offered} bytes offered, only {capacity} staged")]
    BufferOverrun { offered: usize, capacity: usize },
    #[error("value {0:#b} does not fit in a nibble")]
    InvalidNibble(u8),
    /// The display was shut down; nothing more reaches the bus.
    #[error("display is shut down")]
    Closed,
}

pub type LcdResult<T> = Result<T, LcdError>;
