//! Hardware seams
//!
//! The controller only talks to hardware through two small traits:
//!
//! - [`GpioPort`] - digital inputs feeding the rotary encoders
//! - [`OutputBank`] - a group of striker outputs driven by one I/O extender
//!
//! Concrete backends live in the submodules.

pub mod midi_mirror;
pub mod simulated;

pub use midi_mirror::{MidiMirrorBank, MidiMirrorHandle};
pub use simulated::{BankWrite, SimulatedBank, SimulatedGpio};

use anyhow::Result;

/// Digital pin level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    /// Input with the internal pull-up enabled
    InputPullUp,
    Output,
}

/// Signal transition an edge callback fires on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

impl Edge {
    pub fn matches(self, from: Level, to: Level) -> bool {
        match self {
            Edge::Rising => from == Level::Low && to == Level::High,
            Edge::Falling => from == Level::High && to == Level::Low,
            Edge::Both => from != to,
        }
    }
}

/// Invoked with the pin number and its new level
pub type EdgeCallback = Box<dyn Fn(u8, Level) + Send + Sync>;

/// A GPIO controller able to read pins and report edges
pub trait GpioPort: Send + Sync {
    fn set_mode(&self, pin: u8, mode: PinMode) -> Result<()>;
    fn write(&self, pin: u8, level: Level) -> Result<()>;
    fn read(&self, pin: u8) -> Result<Level>;
    fn on_edge(&self, pin: u8, edge: Edge, callback: EdgeCallback) -> Result<()>;
}

/// One bank of striker outputs
pub trait OutputBank: Send {
    fn pin_count(&self) -> u8;

    /// Drive every listed pin to `level` in a single transfer
    fn write_pins(&mut self, pins: &[u8], level: Level) -> Result<()>;

    fn all_low(&mut self) -> Result<()>;
}
