//! In-memory hardware
//!
//! `SimulatedGpio` stands in for the encoder GPIOs and exposes bench helpers
//! to turn and press knobs. `SimulatedBank` keeps the level of each striker
//! output and broadcasts every transfer to its subscribers.

use super::{Edge, EdgeCallback, GpioPort, Level, OutputBank, PinMode};
use anyhow::{bail, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy)]
struct PinState {
    mode: PinMode,
    level: Level,
}

struct EdgeWatch {
    pin: u8,
    edge: Edge,
    callback: Arc<EdgeCallback>,
}

/// GPIO port backed by memory; edge callbacks fire synchronously
#[derive(Default)]
pub struct SimulatedGpio {
    pins: Mutex<HashMap<u8, PinState>>,
    watches: Mutex<Vec<EdgeWatch>>,
}

impl SimulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change an input level as the outside world would, firing callbacks
    pub fn drive(&self, pin: u8, level: Level) {
        let previous = {
            let mut pins = self.pins.lock().unwrap_or_else(PoisonError::into_inner);
            let state = pins.entry(pin).or_insert(PinState {
                mode: PinMode::Input,
                level: Level::Low,
            });
            std::mem::replace(&mut state.level, level)
        };

        // Callbacks run without the pin lock held so they can read back
        let callbacks: Vec<Arc<EdgeCallback>> = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|w| w.pin == pin && w.edge.matches(previous, level))
            .map(|w| w.callback.clone())
            .collect();
        for callback in callbacks {
            callback(pin, level);
        }
    }

    pub fn press(&self, pin: u8) {
        self.drive(pin, Level::High);
    }

    pub fn release(&self, pin: u8) {
        self.drive(pin, Level::Low);
    }

    /// Press then release
    pub fn click(&self, pin: u8) {
        self.press(pin);
        self.release(pin);
    }

    /// Emit quadrature detents on an encoder's two pins.
    ///
    /// Positive steps turn right, negative steps turn left. Both pins idle
    /// high; each detent pulls `pin_1` low with `pin_2` high (right) or low
    /// (left) at the falling edge.
    pub fn turn(&self, pin_1: u8, pin_2: u8, steps: i32) {
        debug!("Simulated turn on pins {}/{}: {} steps", pin_1, pin_2, steps);
        self.drive(pin_1, Level::High);
        self.drive(pin_2, Level::High);
        for _ in 0..steps.unsigned_abs() {
            self.drive(pin_2, Level::from(steps > 0));
            self.drive(pin_1, Level::Low);
            self.drive(pin_1, Level::High);
            self.drive(pin_2, Level::High);
        }
    }

    pub fn mode(&self, pin: u8) -> Option<PinMode> {
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pin)
            .map(|state| state.mode)
    }
}

impl GpioPort for SimulatedGpio {
    fn set_mode(&self, pin: u8, mode: PinMode) -> Result<()> {
        let mut pins = self.pins.lock().unwrap_or_else(PoisonError::into_inner);
        let level = match mode {
            PinMode::InputPullUp => Level::High,
            _ => Level::Low,
        };
        pins.insert(pin, PinState { mode, level });
        Ok(())
    }

    fn write(&self, pin: u8, level: Level) -> Result<()> {
        if self.mode(pin) != Some(PinMode::Output) {
            bail!("pin {} is not configured as an output", pin);
        }
        self.drive(pin, level);
        Ok(())
    }

    fn read(&self, pin: u8) -> Result<Level> {
        match self.pins.lock().unwrap_or_else(PoisonError::into_inner).get(&pin) {
            Some(state) => Ok(state.level),
            None => bail!("pin {} is not configured", pin),
        }
    }

    fn on_edge(&self, pin: u8, edge: Edge, callback: EdgeCallback) -> Result<()> {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(EdgeWatch {
                pin,
                edge,
                callback: Arc::new(callback),
            });
        Ok(())
    }
}

/// One transfer issued to a simulated bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankWrite {
    pub bank: String,
    pub pins: Vec<u8>,
    pub level: Level,
}

pub struct SimulatedBank {
    name: String,
    levels: Vec<Level>,
    subscribers: Vec<Sender<BankWrite>>,
}

impl SimulatedBank {
    pub fn new(name: impl Into<String>, pin_count: u8) -> Self {
        Self {
            name: name.into(),
            levels: vec![Level::Low; pin_count as usize],
            subscribers: Vec::new(),
        }
    }

    /// Receive a copy of every transfer issued from now on
    pub fn subscribe(&mut self) -> Receiver<BankWrite> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    fn broadcast(&mut self, pins: &[u8], level: Level) {
        let write = BankWrite {
            bank: self.name.clone(),
            pins: pins.to_vec(),
            level,
        };
        // Drop subscribers whose receiver is gone
        self.subscribers.retain(|tx| tx.send(write.clone()).is_ok());
    }
}

impl OutputBank for SimulatedBank {
    fn pin_count(&self) -> u8 {
        self.levels.len() as u8
    }

    fn write_pins(&mut self, pins: &[u8], level: Level) -> Result<()> {
        if let Some(&pin) = pins.iter().find(|&&p| p as usize >= self.levels.len()) {
            bail!("out of range pin {} on bank {}", pin, self.name);
        }
        debug!("Writing IOs on bank {}: {:?} -> {:?}", self.name, pins, level);
        for &pin in pins {
            self.levels[pin as usize] = level;
        }
        self.broadcast(pins, level);
        Ok(())
    }

    fn all_low(&mut self) -> Result<()> {
        let pins: Vec<u8> = (0..self.pin_count()).collect();
        self.write_pins(&pins, Level::Low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_edge_callbacks_fire_on_matching_transitions() {
        let gpio = SimulatedGpio::new();
        gpio.set_mode(5, PinMode::InputPullUp).unwrap();
        let falls = Arc::new(AtomicUsize::new(0));
        let counter = falls.clone();
        gpio.on_edge(
            5,
            Edge::Falling,
            Box::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        gpio.drive(5, Level::Low);
        gpio.drive(5, Level::Low);
        gpio.drive(5, Level::High);
        gpio.drive(5, Level::Low);
        assert_eq!(falls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_read_unconfigured_pin_is_error() {
        let gpio = SimulatedGpio::new();
        assert!(gpio.read(9).is_err());
        gpio.set_mode(9, PinMode::InputPullUp).unwrap();
        assert_eq!(gpio.read(9).unwrap(), Level::High);
        assert!(gpio.write(9, Level::Low).is_err());
    }

    #[test]
    fn test_bank_tracks_levels_and_broadcasts() {
        let mut bank = SimulatedBank::new("A", 8);
        let rx = bank.subscribe();
        bank.write_pins(&[1, 3], Level::High).unwrap();
        assert!(bank.levels()[1].is_high());
        assert!(bank.levels()[3].is_high());
        assert!(!bank.levels()[2].is_high());

        bank.all_low().unwrap();
        assert!(bank.levels().iter().all(|l| !l.is_high()));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.pins, vec![1, 3]);
        assert_eq!(first.level, Level::High);
        assert_eq!(rx.try_recv().unwrap().pins.len(), 8);
    }

    #[test]
    fn test_bank_rejects_out_of_range_pin() {
        let mut bank = SimulatedBank::new("B", 8);
        assert!(bank.write_pins(&[2, 8], Level::High).is_err());
        assert!(bank.levels().iter().all(|l| !l.is_high()));
    }
}
