//! Operator knobs: rotary encoders and the controls built on top of them

pub mod encoder;
pub mod rotary;

pub use encoder::{Encoder, EncoderPins};
pub use rotary::{FreeRotary, Move, RotaryControl, StatesRotary};
