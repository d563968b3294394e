//! The three operator knobs: mode, track and tempo

use super::state::Mode;
use crate::hardware::GpioPort;
use crate::input::{Encoder, EncoderPins, FreeRotary, StatesRotary};
use anyhow::{Context, Result};
use std::sync::Arc;
use xylo_core::TEMPO_LIST;

pub const MODE_PINS: EncoderPins = EncoderPins {
    pin_1: 5,
    pin_2: 6,
    press: Some(13),
};

pub const TRACK_PINS: EncoderPins = EncoderPins {
    pin_1: 16,
    pin_2: 20,
    press: Some(21),
};

pub const TEMPO_PINS: EncoderPins = EncoderPins {
    pin_1: 22,
    pin_2: 27,
    press: Some(18),
};

/// Which knob a bench command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knob {
    Mode,
    Track,
    Tempo,
}

impl Knob {
    pub fn pins(self) -> EncoderPins {
        match self {
            Knob::Mode => MODE_PINS,
            Knob::Track => TRACK_PINS,
            Knob::Tempo => TEMPO_PINS,
        }
    }

    pub fn parse(name: &str) -> Option<Knob> {
        match name {
            "mode" => Some(Knob::Mode),
            "track" => Some(Knob::Track),
            "tempo" => Some(Knob::Tempo),
            _ => None,
        }
    }
}

pub struct Knobs {
    pub mode: StatesRotary<Mode>,
    pub track: StatesRotary<usize>,
    pub tempo: StatesRotary<u32>,
}

impl Knobs {
    /// Mode wraps around; track and tempo stop at their ends
    pub fn new(port: Arc<dyn GpioPort>, track_count: usize) -> Result<Self> {
        let rotary = |name: &str, pins: EncoderPins| -> Result<FreeRotary> {
            let encoder = Encoder::new(name, port.clone(), pins)
                .with_context(|| format!("cannot set up {} knob", name))?;
            Ok(FreeRotary::new(encoder))
        };

        Ok(Self {
            mode: StatesRotary::new(rotary("MODE", MODE_PINS)?, Mode::KNOB_ORDER.to_vec(), true)?,
            track: StatesRotary::new(
                rotary("TRACK", TRACK_PINS)?,
                (0..track_count).collect(),
                false,
            )?,
            tempo: StatesRotary::new(rotary("TEMPO", TEMPO_PINS)?, TEMPO_LIST.to_vec(), false)?,
        })
    }
}
