use crate::lcd::hd44780::driver::{CLEAR_LATENCY, HD44780Driver};
use crate::lcd::hd44780::{LcdError, LcdResult};
use log::{debug, trace, warn};

/// How the display is brought up, fixed for the lifetime of a [WriteSession].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayOptions {
    /// Characters placed before the display is cleared and writing restarts from the home
    /// position. The clear happens once the cursor has moved *past* this value, so
    /// `max_chars + 1` characters fit between clears.
    pub max_chars: usize,
    /// Function set line count sent during the 4-bit initialization.
    pub two_lines: bool,
    /// Run the 4-bit initialization. Turn it off when the controller was not power cycled and
    /// is still in 4-bit mode, otherwise the function set nibbles would be misread.
    pub modeset: bool,
    pub cursor: bool,
    pub blink: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            max_chars: 40,
            two_lines: false,
            modeset: true,
            cursor: true,
            blink: true,
        }
    }
}

/// An open display: the driver, the cursor position and the overflow policy.
///
/// Bringing the session up initializes the controller; dropping it (or calling
/// [WriteSession::shutdown]) turns the display off and clears it. The driver, and with it the
/// lines, is released when the session is dropped.
#[derive(Debug)]
pub struct WriteSession<D: HD44780Driver> {
    driver: D,
    cursor: usize,
    max_chars: usize,
    shut_down: bool,
}

impl<D: HD44780Driver> WriteSession<D> {
    /// Brings the controller up: 4-bit initialization (if enabled), display on, entry mode,
    /// clear.
    ///
    /// On failure the driver is dropped, releasing its lines.
    pub fn open(mut driver: D, options: DisplayOptions) -> LcdResult<Self> {
        if options.modeset {
            debug!("Switching {:?} to 4-bit mode, two lines: {}", driver, options.two_lines);
            driver.initialize_4bit(options.two_lines)?;
        }
        driver.set_display(true, options.cursor, options.blink)?;
        driver.entry_mode_set()?;
        driver.clear_display()?;
        driver.delay(CLEAR_LATENCY);
        debug!("Display up, {} characters before wraparound", options.max_chars);

        Ok(WriteSession {
            driver,
            cursor: 0,
            max_chars: options.max_chars,
            shut_down: false,
        })
    }

    /// Current position on the display, in characters since the last clear.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Places `bytes` on the display one character at a time.
    ///
    /// Line feeds are skipped without moving the cursor. Before each byte, a cursor past
    /// `max_chars` clears the display and restarts from position 0, so the byte that would not
    /// fit becomes the first one on the fresh screen.
    ///
    /// Returns the number of bytes consumed, which is always `bytes.len()`. Fails with
    /// [LcdError::Closed] once the session has been shut down.
    pub fn accept(&mut self, bytes: &[u8]) -> LcdResult<usize> {
        if self.shut_down {
            return Err(LcdError::Closed);
        }
        for &byte in bytes {
            if self.cursor > self.max_chars {
                trace!("Cursor at {}, clearing display", self.cursor);
                self.driver.clear_display()?;
                self.driver.delay(CLEAR_LATENCY);
                self.cursor = 0;
            }
            if byte == b'\n' {
                continue;
            }
            self.driver.write_character(byte)?;
            self.cursor += 1;
        }
        Ok(bytes.len())
    }

    /// Turns the display off and clears it.
    ///
    /// Runs at most once; later calls, including the one from [Drop], do nothing. The lines stay
    /// claimed until the session is dropped.
    pub fn shutdown(&mut self) -> LcdResult<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        debug!("Shutting down {:?}", self.driver);
        self.driver.set_display(false, false, false)?;
        self.driver.clear_display()
    }
}

impl<D: HD44780Driver> Drop for WriteSession<D> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!("Display teardown failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::testing::{
        Event, EventLog, RecordingDriver, RecordingLines, Transfer, latches, recording_driver,
        screen_text, transfers,
    };
    use crate::lcd::hd44780::driver::GpioHD44780Driver;
    use crate::lcd::hd44780::{LcdError, LcdLine};
    use crate::GpioError;

    fn open(max_chars: usize) -> (WriteSession<RecordingDriver>, EventLog) {
        let (driver, log) = recording_driver();
        let options = DisplayOptions {
            max_chars,
            ..DisplayOptions::default()
        };
        let session = WriteSession::open(driver, options).unwrap();
        log.clear();
        (session, log)
    }

    #[test]
    fn open_runs_the_bring_up_sequence() {
        let (driver, log) = recording_driver();
        let session = WriteSession::open(driver, DisplayOptions::default()).unwrap();
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.max_chars(), 40);

        let events = log.events();
        // 3 function set nibbles, then display on + cursor + blink, entry mode, clear.
        let after_init = events
            .iter()
            .enumerate()
            .filter(|(_, e)| **e == Event::Set(LcdLine::E, false))
            .nth(2)
            .map(|(i, _)| i + 1)
            .unwrap();
        assert_eq!(latches(&events[..after_init]).len(), 3);
        assert_eq!(
            transfers(&events[after_init..]),
            vec![
                Transfer::Instruction(0b1111),
                Transfer::Instruction(0b0110),
                Transfer::Instruction(0b0001),
            ]
        );
        assert_eq!(events.last(), Some(&Event::Wait(CLEAR_LATENCY)));
    }

    #[test]
    fn open_without_modeset_skips_the_function_set() {
        let (driver, log) = recording_driver();
        let options = DisplayOptions {
            modeset: false,
            cursor: false,
            blink: false,
            ..DisplayOptions::default()
        };
        let _session = WriteSession::open(driver, options).unwrap();

        assert_eq!(
            transfers(&log.events()),
            vec![
                Transfer::Instruction(0b1100),
                Transfer::Instruction(0b0110),
                Transfer::Instruction(0b0001),
            ]
        );
    }

    #[test]
    fn open_failure_is_reported() {
        let (lines, log) = RecordingLines::failing_on(LcdLine::E);
        let driver = GpioHD44780Driver::new(lines, log.delay());

        let err = WriteSession::open(driver, DisplayOptions::default()).unwrap_err();
        assert_eq!(
            err,
            LcdError::HardwareFault {
                line: LcdLine::E,
                source: GpioError::Io(std::io::ErrorKind::BrokenPipe),
            }
        );
    }

    #[test]
    fn accept_writes_every_byte_in_order() {
        let (mut session, log) = open(40);

        assert_eq!(session.accept(b"Hello").unwrap(), 5);

        assert_eq!(screen_text(&log.events()), "Hello");
        assert_eq!(session.cursor(), 5);
    }

    #[test]
    fn line_feeds_are_skipped() {
        let (mut session, log) = open(40);

        assert_eq!(session.accept(b"\nab\n\nc\n").unwrap(), 7);

        assert_eq!(screen_text(&log.events()), "abc");
        assert_eq!(session.cursor(), 3);
    }

    #[test]
    fn only_line_feeds_transmit_nothing() {
        let (mut session, log) = open(40);

        session.accept(b"\n\n\n").unwrap();

        assert!(log.events().is_empty());
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn capacity_is_one_more_than_max_chars() {
        // The cursor has to move past max_chars before a clear, so "ABC" fits on a 2 character
        // display and "D" starts a fresh screen.
        let (mut session, log) = open(2);

        session.accept(b"AB\nCD").unwrap();

        assert_eq!(screen_text(&log.events()), "ABC\u{c}D");
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn filling_max_chars_exactly_does_not_clear() {
        let (mut session, log) = open(3);

        session.accept(b"AB\nCD").unwrap();

        assert_eq!(screen_text(&log.events()), "ABCD");
        assert_eq!(session.cursor(), 4);

        session.accept(b"E").unwrap();
        assert_eq!(screen_text(&log.events()), "ABCD\u{c}E");
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn clear_waits_for_the_controller_before_the_next_character() {
        let (mut session, log) = open(0);

        session.accept(b"xy").unwrap();

        let events = log.events();
        let wait = events
            .iter()
            .position(|e| *e == Event::Wait(CLEAR_LATENCY))
            .unwrap();
        assert_eq!(
            transfers(&events[..wait]),
            vec![Transfer::Character(b'x'), Transfer::Instruction(0x01)]
        );
        assert_eq!(transfers(&events[wait..]), vec![Transfer::Character(b'y')]);
    }

    #[test]
    fn overflow_is_resolved_across_calls() {
        let (mut session, log) = open(1);

        session.accept(b"ab").unwrap();
        assert_eq!(session.cursor(), 2);
        assert_eq!(screen_text(&log.events()), "ab");

        session.accept(b"c").unwrap();
        assert_eq!(session.cursor(), 1);
        assert_eq!(screen_text(&log.events()), "ab\u{c}c");
    }

    #[test]
    fn long_streams_clear_once_per_screen() {
        let (mut session, log) = open(3);

        session.accept(b"0123456789").unwrap();

        assert_eq!(screen_text(&log.events()), "0123\u{c}4567\u{c}89");
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn line_feed_after_a_full_screen_still_triggers_the_clear() {
        let (mut session, log) = open(1);

        session.accept(b"ab\n").unwrap();

        assert_eq!(screen_text(&log.events()), "ab\u{c}");
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn every_byte_value_is_passed_through() {
        let (mut session, log) = open(255);
        let bytes: Vec<u8> = (0..=255u8).filter(|&b| b != b'\n').collect();

        session.accept(&bytes).unwrap();

        let written: Vec<u8> = transfers(&log.events())
            .into_iter()
            .map(|t| match t {
                Transfer::Character(c) => c,
                Transfer::Instruction(i) => panic!("unexpected instruction {i:#04x}"),
            })
            .collect();
        assert_eq!(written, bytes);
    }

    #[test]
    fn shutdown_turns_the_display_off_and_clears_it_once() {
        let (mut session, log) = open(40);

        session.shutdown().unwrap();
        session.shutdown().unwrap();
        drop(session);

        assert_eq!(
            transfers(&log.events()),
            vec![Transfer::Instruction(0b1000), Transfer::Instruction(0x01)]
        );
    }

    #[test]
    fn accept_after_shutdown_sends_nothing() {
        let (mut session, log) = open(40);
        session.shutdown().unwrap();
        log.clear();

        assert_eq!(session.accept(b"late").unwrap_err(), LcdError::Closed);
        assert_eq!(session.cursor(), 0);
        drop(session);

        assert!(log.events().is_empty());
    }

    #[test]
    fn drop_shuts_the_display_down() {
        let (session, log) = open(40);

        drop(session);

        assert_eq!(
            transfers(&log.events()),
            vec![Transfer::Instruction(0b1000), Transfer::Instruction(0x01)]
        );
    }
}
