//! Rotary knobs
//!
//! Two independent knob flavours share the [`RotaryControl`] capability:
//! [`FreeRotary`] reports the raw encoder position, [`StatesRotary`] walks a
//! fixed list of states (modes, track indexes, tempos).

use super::encoder::Encoder;
use anyhow::{bail, Result};
use log::{debug, info, warn};
use std::fmt::Debug;

pub trait RotaryControl {
    type Value;

    /// Current knob value, after applying any movement since the last call
    fn value(&mut self) -> Self::Value;

    /// True exactly once per press-then-release
    fn was_clicked(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Still,
    Right,
}

/// Knob reporting the encoder counter as is
pub struct FreeRotary {
    encoder: Encoder,
    last_position: i64,
    last_pressed: bool,
}

impl FreeRotary {
    pub fn new(encoder: Encoder) -> Self {
        info!("Setting up {} basic rotary button", encoder.name());
        Self {
            encoder,
            last_position: 0,
            last_pressed: false,
        }
    }

    pub fn name(&self) -> &str {
        self.encoder.name()
    }

    /// Signed detent count since the previous call
    pub fn take_delta(&mut self) -> i64 {
        let position = self.encoder.counter();
        let delta = position - self.last_position;
        self.last_position = position;
        delta
    }

    pub fn movement(&mut self) -> Move {
        match self.take_delta() {
            d if d > 0 => Move::Right,
            d if d < 0 => Move::Left,
            _ => Move::Still,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.encoder.is_pressed()
    }
}

impl RotaryControl for FreeRotary {
    type Value = i64;

    fn value(&mut self) -> i64 {
        self.encoder.counter()
    }

    fn was_clicked(&mut self) -> bool {
        let pressed = self.encoder.is_pressed();
        let clicked = self.last_pressed && !pressed;
        self.last_pressed = pressed;
        clicked
    }
}

/// Knob stepping through a list of states, one state per detent
pub struct StatesRotary<T> {
    rotary: FreeRotary,
    states: Vec<T>,
    wrap: bool,
    index: usize,
}

impl<T: Clone + PartialEq + Debug> StatesRotary<T> {
    /// `wrap` loops past either end; otherwise the ends clamp
    pub fn new(rotary: FreeRotary, states: Vec<T>, wrap: bool) -> Result<Self> {
        if states.is_empty() {
            bail!("{} states rotary button needs at least one state", rotary.name());
        }
        info!(
            "Setting up {} states rotary button: {} states, wrap {}",
            rotary.name(),
            states.len(),
            wrap
        );
        Ok(Self {
            rotary,
            states,
            wrap,
            index: 0,
        })
    }

    pub fn name(&self) -> &str {
        self.rotary.name()
    }

    pub fn states(&self) -> &[T] {
        &self.states
    }

    /// Jump to `state`; unknown states fall back to the first one
    pub fn set_state(&mut self, state: &T) {
        match self.states.iter().position(|s| s == state) {
            Some(index) => {
                debug!("Setting {} button state to value: {:?}", self.name(), state);
                self.index = index;
            }
            None => {
                warn!(
                    "Input state ({:?}) not in {} states list; using 1st state instead",
                    state,
                    self.name()
                );
                self.index = 0;
            }
        }
    }

    fn apply(&mut self, delta: i64) {
        let count = self.states.len() as i64;
        let target = self.index as i64 + delta;
        self.index = if self.wrap {
            target.rem_euclid(count)
        } else {
            target.clamp(0, count - 1)
        } as usize;
    }
}

impl<T: Clone + PartialEq + Debug> RotaryControl for StatesRotary<T> {
    type Value = T;

    fn value(&mut self) -> T {
        let delta = self.rotary.take_delta();
        if delta != 0 {
            self.apply(delta);
        }
        self.states[self.index].clone()
    }

    fn was_clicked(&mut self) -> bool {
        self.rotary.was_clicked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimulatedGpio;
    use crate::input::encoder::EncoderPins;
    use std::sync::Arc;

    const PINS: EncoderPins = EncoderPins {
        pin_1: 22,
        pin_2: 27,
        press: Some(18),
    };

    fn rotary(gpio: &Arc<SimulatedGpio>) -> FreeRotary {
        FreeRotary::new(Encoder::new("TEST", gpio.clone(), PINS).unwrap())
    }

    #[test]
    fn test_free_rotary_movement() {
        let gpio = Arc::new(SimulatedGpio::new());
        let mut knob = rotary(&gpio);
        assert_eq!(knob.movement(), Move::Still);
        gpio.turn(22, 27, 2);
        assert_eq!(knob.movement(), Move::Right);
        assert_eq!(knob.movement(), Move::Still);
        gpio.turn(22, 27, -1);
        assert_eq!(knob.movement(), Move::Left);
        assert_eq!(knob.value(), 1);
    }

    #[test]
    fn test_click_fires_once_on_release() {
        let gpio = Arc::new(SimulatedGpio::new());
        let mut knob = rotary(&gpio);
        gpio.press(18);
        assert!(!knob.was_clicked());
        assert!(!knob.was_clicked());
        gpio.release(18);
        assert!(knob.was_clicked());
        assert!(!knob.was_clicked());
    }

    #[test]
    fn test_states_wrap_around() {
        let gpio = Arc::new(SimulatedGpio::new());
        let mut knob = StatesRotary::new(rotary(&gpio), vec!['a', 'b', 'c', 'd'], true).unwrap();
        assert_eq!(knob.value(), 'a');
        gpio.turn(22, 27, -1);
        assert_eq!(knob.value(), 'd');
        gpio.turn(22, 27, 2);
        assert_eq!(knob.value(), 'b');
    }

    #[test]
    fn test_states_clamp() {
        let gpio = Arc::new(SimulatedGpio::new());
        let mut knob = StatesRotary::new(rotary(&gpio), vec![30, 60, 90], false).unwrap();
        gpio.turn(22, 27, -4);
        assert_eq!(knob.value(), 30);
        gpio.turn(22, 27, 7);
        assert_eq!(knob.value(), 90);
    }

    #[test]
    fn test_set_state_unknown_falls_back_to_first() {
        let gpio = Arc::new(SimulatedGpio::new());
        let mut knob = StatesRotary::new(rotary(&gpio), vec![30, 60, 90], false).unwrap();
        knob.set_state(&60);
        assert_eq!(knob.value(), 60);
        knob.set_state(&61);
        assert_eq!(knob.value(), 30);
    }

    #[test]
    fn test_empty_states_rejected() {
        let gpio = Arc::new(SimulatedGpio::new());
        assert!(StatesRotary::<u32>::new(rotary(&gpio), Vec::new(), false).is_err());
    }
}
