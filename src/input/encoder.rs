//! Quadrature rotary encoder with an optional push switch (KY-040 style)
//!
//! Pin 1 falling edges drive the counter: +1 when pin 2 differs from pin 1
//! at that instant, -1 otherwise. The press pin reads high while pressed.

use crate::hardware::{Edge, GpioPort, Level, PinMode};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderPins {
    pub pin_1: u8,
    pub pin_2: u8,
    pub press: Option<u8>,
}

pub struct Encoder {
    name: String,
    pins: EncoderPins,
    port: Arc<dyn GpioPort>,
    counter: Arc<AtomicI64>,
}

impl Encoder {
    pub fn new(name: &str, port: Arc<dyn GpioPort>, pins: EncoderPins) -> Result<Self> {
        info!(
            "Setting up {} encoder: {} / {} / {:?}",
            name, pins.pin_1, pins.pin_2, pins.press
        );

        port.set_mode(pins.pin_1, PinMode::InputPullUp)?;
        port.set_mode(pins.pin_2, PinMode::InputPullUp)?;
        if let Some(press) = pins.press {
            port.set_mode(press, PinMode::Input)?;
        }

        let counter = Arc::new(AtomicI64::new(0));
        let callback_counter = counter.clone();
        // Weak: the port owns this callback
        let callback_port: Weak<dyn GpioPort> = Arc::downgrade(&port);
        let callback_name = name.to_string();
        let pin_2 = pins.pin_2;

        port.on_edge(
            pins.pin_1,
            Edge::Falling,
            Box::new(move |_pin, pin_1_level| {
                let Some(port) = callback_port.upgrade() else {
                    return;
                };
                let pin_2_level = port.read(pin_2).unwrap_or(Level::Low);
                let step = if pin_1_level != pin_2_level { 1 } else { -1 };
                let value = callback_counter.fetch_add(step, Ordering::SeqCst) + step;
                debug!(
                    "{} encoder callback: pin_1 {:?} / pin_2 {:?} / counter {}",
                    callback_name, pin_1_level, pin_2_level, value
                );
            }),
        )
        .with_context(|| format!("cannot watch {} encoder pin {}", name, pins.pin_1))?;

        Ok(Self {
            name: name.to_string(),
            pins,
            port,
            counter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pins(&self) -> EncoderPins {
        self.pins
    }

    pub fn counter(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn reset_counter(&self) {
        debug!("{} encoder counter reset", self.name);
        self.counter.store(0, Ordering::SeqCst);
    }

    pub fn is_pressed(&self) -> bool {
        let Some(press) = self.pins.press else {
            warn!("{} encoder not setup with a press pin", self.name);
            return false;
        };
        match self.port.read(press) {
            Ok(level) => level.is_high(),
            Err(e) => {
                warn!("Cannot read {} encoder press pin: {}", self.name, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimulatedGpio;

    const PINS: EncoderPins = EncoderPins {
        pin_1: 5,
        pin_2: 6,
        press: Some(13),
    };

    #[test]
    fn test_turns_move_the_counter() {
        let gpio = Arc::new(SimulatedGpio::new());
        let encoder = Encoder::new("MODE", gpio.clone(), PINS).unwrap();
        assert_eq!(encoder.counter(), 0);

        gpio.turn(5, 6, 3);
        assert_eq!(encoder.counter(), 3);
        gpio.turn(5, 6, -5);
        assert_eq!(encoder.counter(), -2);

        encoder.reset_counter();
        assert_eq!(encoder.counter(), 0);
    }

    #[test]
    fn test_press_pin() {
        let gpio = Arc::new(SimulatedGpio::new());
        let encoder = Encoder::new("TRACK", gpio.clone(), PINS).unwrap();
        assert!(!encoder.is_pressed());
        gpio.press(13);
        assert!(encoder.is_pressed());
        gpio.release(13);
        assert!(!encoder.is_pressed());
    }

    #[test]
    fn test_no_press_pin_is_never_pressed() {
        let gpio = Arc::new(SimulatedGpio::new());
        let pins = EncoderPins { press: None, ..PINS };
        let encoder = Encoder::new("TEMPO", gpio, pins).unwrap();
        assert!(!encoder.is_pressed());
    }
}
