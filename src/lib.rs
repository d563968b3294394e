//! # Xylo
//!
//! Controller for a self-playing xylophone. MIDI files from a music directory
//! are compiled into strike/rest events (see `xylo-core`) and played through
//! two banks of striker outputs, driven by three rotary knobs and an optional
//! operator console.
//!
//! ## Modules
//!
//! - `actuator`: the xylophone itself, mapping notes to bank pins and timing strikes.
//! - `controller`: playback state machine with its input and player loops.
//! - `commands` / `repl`: the operator console.
//! - `display`: the operator panel model.
//! - `hardware` / `input`: GPIO and output bank seams, encoders and knobs.
//! - `config`, `logger`, `timing`: setup file, console logger and injectable sleeping.

pub mod actuator;
pub mod commands;
pub mod config;
pub mod controller;
pub mod display;
pub mod hardware;
pub mod input;
pub mod logger;
pub mod repl;
pub mod timing;

pub use crate::actuator::{ActuatorError, Xylophone, XylophoneConfig};
pub use crate::config::SetupConfig;
pub use crate::controller::{Controller, ControllerConfig, Mode, RunState};
