//! Recording fakes shared by the unit tests. Every fake appends to one event log so the
//! tests can check the exact interleaving of pin writes, commands and delays.
extern crate std;

use std::{cell::RefCell, rc::Rc, vec::Vec};

use embedded_hal::delay::DelayNs;

use crate::{
    driver::{
        hd44780::adapter::{GpioExpander, PinDirection},
        Connection,
    },
    CharacterDisplayError,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Event {
    PullUps(u8, bool),
    Direction(u8, PinDirection),
    Outputs(u8),
    Init,
    Command(u8),
    Data(u8),
    Backlight(bool),
    DelayNs(u32),
    DelayUs(u32),
    DelayMs(u32),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Fault;

#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Only the full output register values, in write order.
    pub fn outputs(&self) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Outputs(value) => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Everything except delays.
    pub fn calls(&self) -> Vec<Event> {
        self.0
            .borrow()
            .iter()
            .filter(|event| {
                !matches!(
                    event,
                    Event::DelayNs(_) | Event::DelayUs(_) | Event::DelayMs(_)
                )
            })
            .copied()
            .collect()
    }
}

pub struct RecordingDelay {
    log: EventLog,
}

impl RecordingDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::DelayNs(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayMs(ms));
    }
}

/// GPIO expander that records every call and fails the call with index `fail_at`
/// (counted over the expander calls only).
pub struct RecordingExpander {
    log: EventLog,
    calls: usize,
    fail_at: Option<usize>,
}

impl RecordingExpander {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            calls: 0,
            fail_at: None,
        }
    }

    pub fn failing_at(log: &EventLog, call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::new(log)
        }
    }

    fn record(&mut self, event: Event) -> Result<(), Fault> {
        let index = self.calls;
        self.calls += 1;
        self.log.push(event);
        if self.fail_at == Some(index) {
            Err(Fault)
        } else {
            Ok(())
        }
    }
}

impl GpioExpander for RecordingExpander {
    type Error = Fault;

    fn set_pull_ups(&mut self, pins: u8, enabled: bool) -> Result<(), Fault> {
        self.record(Event::PullUps(pins, enabled))
    }

    fn set_direction(&mut self, pins: u8, direction: PinDirection) -> Result<(), Fault> {
        self.record(Event::Direction(pins, direction))
    }

    fn set_all_outputs(&mut self, value: u8) -> Result<(), Fault> {
        self.record(Event::Outputs(value))
    }
}

/// Connection that records the bytes handed to it instead of pulsing pins.
pub struct RecordingConnection {
    log: EventLog,
    delay: RecordingDelay,
    calls: usize,
    fail_at: Option<usize>,
}

impl RecordingConnection {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            delay: RecordingDelay::new(log),
            calls: 0,
            fail_at: None,
        }
    }

    pub fn failing_at(log: &EventLog, call: usize) -> Self {
        Self {
            fail_at: Some(call),
            ..Self::new(log)
        }
    }

    fn record(&mut self, event: Event) -> Result<(), CharacterDisplayError<Fault>> {
        let index = self.calls;
        self.calls += 1;
        self.log.push(event);
        if self.fail_at == Some(index) {
            Err(CharacterDisplayError::ExpanderError(Fault))
        } else {
            Ok(())
        }
    }
}

impl Connection for RecordingConnection {
    type Error = Fault;
    type Delay = RecordingDelay;

    fn init(&mut self) -> Result<(), CharacterDisplayError<Fault>> {
        self.record(Event::Init)
    }

    fn send_command(&mut self, command: u8) -> Result<(), CharacterDisplayError<Fault>> {
        self.record(Event::Command(command))
    }

    fn send_data(&mut self, data: u8) -> Result<(), CharacterDisplayError<Fault>> {
        self.record(Event::Data(data))
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), CharacterDisplayError<Fault>> {
        self.record(Event::Backlight(on))
    }

    fn delay(&mut self) -> &mut RecordingDelay {
        &mut self.delay
    }
}
