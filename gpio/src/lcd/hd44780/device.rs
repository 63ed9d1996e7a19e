use crate::lcd::hd44780::driver::HD44780Driver;
use crate::lcd::hd44780::{LcdError, LcdResult, WriteSession};
use log::warn;
use std::sync::{Mutex, PoisonError};

/// Most bytes a single [LcdDevice::write] call will take.
pub const STAGING_CAPACITY: usize = 32;

/// Write-only entry point to a display.
///
/// Every call stages at most [STAGING_CAPACITY] bytes and streams them to the [WriteSession]
/// while holding the device lock, so concurrent writers never interleave on the bus.
#[derive(Debug)]
pub struct LcdDevice<D: HD44780Driver> {
    inner: Mutex<DeviceState<D>>,
}

#[derive(Debug)]
struct DeviceState<D: HD44780Driver> {
    session: WriteSession<D>,
    staging: [u8; STAGING_CAPACITY],
}

impl<D: HD44780Driver> LcdDevice<D> {
    pub fn new(session: WriteSession<D>) -> Self {
        LcdDevice {
            inner: Mutex::new(DeviceState {
                session,
                staging: [0; STAGING_CAPACITY],
            }),
        }
    }

    /// Writes up to [STAGING_CAPACITY] bytes of `bytes` to the display.
    ///
    /// Returns how many bytes were taken. Bytes past the staging capacity are dropped, like a
    /// short write; callers that want everything on screen write the rest in further calls.
    pub fn write(&self, bytes: &[u8]) -> LcdResult<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }

        // A writer that panicked mid-sequence leaves nothing the next reset_lines won't fix.
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let DeviceState { session, staging } = &mut *state;

        let staged = bytes.len().min(STAGING_CAPACITY);
        if staged < bytes.len() {
            let overrun = LcdError::BufferOverrun {
                offered: bytes.len(),
                capacity: STAGING_CAPACITY,
            };
            warn!("{}", overrun);
        }
        staging[..staged].copy_from_slice(&bytes[..staged]);

        session.accept(&staging[..staged])
    }

    /// Current cursor position of the underlying session.
    pub fn cursor(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .session
            .cursor()
    }

    /// Tears the display down. See [WriteSession::shutdown].
    ///
    /// Waits for a write in progress to finish; writes after this fail with [LcdError::Closed].
    pub fn shutdown(&self) -> LcdResult<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .session
            .shutdown()
    }
}
