//! Timed waits used by the bus protocol.
//!
//! The HD44780 is driven blind (the R/W line is held low, so the busy flag is never polled),
//! which means every step of the protocol is paced by fixed waits. They go through [Delay] so
//! the protocol can be exercised without real time passing.
use std::fmt::Debug;
use std::thread::sleep;
use std::time::Duration;

pub trait Delay: Debug {
    /// Blocks for at least `duration`.
    fn wait(&mut self, duration: Duration);
}

/// [Delay] backed by [std::thread::sleep].
///
/// The OS may oversleep, never undersleep, which is the direction the controller tolerates.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn wait(&mut self, duration: Duration) {
        sleep(duration);
    }
}
