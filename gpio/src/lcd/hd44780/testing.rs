//! Recording doubles for the line set and the time source.
use crate::delay::Delay;
use crate::lcd::hd44780::driver::GpioHD44780Driver;
use crate::lcd::hd44780::{LcdLine, LineSet};
use crate::{GpioError, GpioResult};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    Set(LcdLine, bool),
    Wait(Duration),
}

/// Shared, thread-safe log of everything that happened on the bus.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    /// Current level of every line, indexed like [LcdLine::ALL].
    pub fn state(&self) -> [bool; 7] {
        let mut state = [false; 7];
        for event in self.events() {
            if let Event::Set(line, high) = event {
                state[index(line)] = high;
            }
        }
        state
    }

    pub fn delay(&self) -> RecordingDelay {
        RecordingDelay { log: self.clone() }
    }
}

fn index(line: LcdLine) -> usize {
    line as usize
}

#[derive(Debug)]
pub struct RecordingLines {
    log: EventLog,
    fail_on: Option<LcdLine>,
}

impl RecordingLines {
    pub fn pair() -> (Self, EventLog) {
        let log = EventLog::default();
        (
            RecordingLines {
                log: log.clone(),
                fail_on: None,
            },
            log,
        )
    }

    /// Every write to `line` fails.
    pub fn failing_on(line: LcdLine) -> (Self, EventLog) {
        let (mut lines, log) = Self::pair();
        lines.fail_on = Some(line);
        (lines, log)
    }
}

impl LineSet for RecordingLines {
    fn set_line(&mut self, line: LcdLine, high: bool) -> GpioResult<()> {
        if self.fail_on == Some(line) {
            return Err(GpioError::Io(std::io::ErrorKind::BrokenPipe));
        }
        self.log.push(Event::Set(line, high));
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecordingDelay {
    log: EventLog,
}

impl Delay for RecordingDelay {
    fn wait(&mut self, duration: Duration) {
        self.log.push(Event::Wait(duration));
    }
}

pub type RecordingDriver = GpioHD44780Driver<RecordingLines, RecordingDelay>;

pub fn recording_driver() -> (RecordingDriver, EventLog) {
    let (lines, log) = RecordingLines::pair();
    let driver = GpioHD44780Driver::new(lines, log.delay());
    (driver, log)
}

/// What the controller sees on the bus when E rises.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Latch {
    pub nibble: u8,
    pub rs: bool,
    pub rw: bool,
}

pub fn latches(events: &[Event]) -> Vec<Latch> {
    let mut state = [false; 7];
    let mut latched = Vec::new();
    for &event in events {
        let Event::Set(line, high) = event else {
            continue;
        };
        if line == LcdLine::E && high && !state[index(LcdLine::E)] {
            let nibble = LcdLine::DATA
                .iter()
                .enumerate()
                .filter(|&(_, &l)| state[index(l)])
                .fold(0u8, |acc, (i, _)| acc | 1 << i);
            latched.push(Latch {
                nibble,
                rs: state[index(LcdLine::Rs)],
                rw: state[index(LcdLine::Rw)],
            });
        }
        state[index(line)] = high;
    }
    latched
}

/// A complete 8-bit transfer reassembled from two latches.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transfer {
    Instruction(u8),
    Character(u8),
}

/// Pairs up latches into transfers. Only meaningful once the 4-bit initialization is past.
pub fn transfers(events: &[Event]) -> Vec<Transfer> {
    let latched = latches(events);
    assert_eq!(latched.len() % 2, 0, "dangling nibble on the bus");
    latched
        .chunks(2)
        .map(|pair| {
            let byte = pair[0].nibble << 4 | pair[1].nibble;
            assert_eq!(pair[0].rs, pair[1].rs, "nibbles of one transfer disagree on RS");
            if pair[0].rs {
                Transfer::Character(byte)
            } else {
                Transfer::Instruction(byte)
            }
        })
        .collect()
}

/// Characters written, with `\u{c}` standing in for each clear display instruction.
pub fn screen_text(events: &[Event]) -> String {
    transfers(events)
        .into_iter()
        .filter_map(|t| match t {
            Transfer::Character(c) => Some(c as char),
            Transfer::Instruction(0x01) => Some('\u{c}'),
            Transfer::Instruction(_) => None,
        })
        .collect()
}
