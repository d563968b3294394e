//! MIDI mirror output
//!
//! Turns striker activity into MIDI notes on an external port (a software
//! synth, a DAW...) so playback can be heard without the instrument. Each
//! bank maps its pins to consecutive notes starting at `base_note`.

use super::{Level, OutputBank};
use anyhow::{anyhow, Result};
use log::{debug, info};
use midir::{MidiOutput, MidiOutputConnection};
use std::sync::{Arc, Mutex, PoisonError};

const CHANNEL: u8 = 0;
const VELOCITY: u8 = 100;

/// Shared connection to one MIDI output port
#[derive(Clone)]
pub struct MidiMirrorHandle {
    connection: Arc<Mutex<MidiOutputConnection>>,
    port_name: String,
}

impl MidiMirrorHandle {
    /// Connect to the first output port whose name contains `port_name`
    pub fn connect(port_name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new("xylo")?;
        let ports = midi_out.ports();

        let (port, full_name) = ports
            .iter()
            .find_map(|p| {
                midi_out
                    .port_name(p)
                    .ok()
                    .filter(|name| name.contains(port_name))
                    .map(|name| (p.clone(), name))
            })
            .ok_or_else(|| anyhow!("MIDI port '{}' not found", port_name))?;

        let connection = midi_out
            .connect(&port, "xylo-out")
            .map_err(|e| anyhow!("cannot connect to MIDI port '{}': {}", full_name, e))?;
        info!("Mirroring strikes to MIDI port {}", full_name);

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            port_name: full_name,
        })
    }

    /// Names of every available MIDI output port
    pub fn list_ports() -> Result<Vec<String>> {
        let midi_out = MidiOutput::new("xylo")?;
        Ok(midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect())
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn bank(&self, base_note: u8, pin_count: u8) -> MidiMirrorBank {
        MidiMirrorBank {
            handle: self.clone(),
            base_note,
            levels: vec![Level::Low; pin_count as usize],
        }
    }

    fn send(&self, message: &[u8]) -> Result<()> {
        let mut connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        connection
            .send(message)
            .map_err(|e| anyhow!("MIDI send failed: {}", e))
    }
}

pub struct MidiMirrorBank {
    handle: MidiMirrorHandle,
    base_note: u8,
    levels: Vec<Level>,
}

impl MidiMirrorBank {
    fn note(&self, pin: u8) -> u8 {
        self.base_note.saturating_add(pin) & 0x7F
    }
}

impl OutputBank for MidiMirrorBank {
    fn pin_count(&self) -> u8 {
        self.levels.len() as u8
    }

    fn write_pins(&mut self, pins: &[u8], level: Level) -> Result<()> {
        if let Some(&pin) = pins.iter().find(|&&p| p as usize >= self.levels.len()) {
            return Err(anyhow!("out of range pin {} on MIDI mirror bank", pin));
        }
        for &pin in pins {
            let note = self.note(pin);
            match level {
                // Note On: 0x90 + channel, note, velocity
                Level::High => self.handle.send(&[0x90 | CHANNEL, note, VELOCITY])?,
                // Note Off: 0x80 + channel, note, velocity
                Level::Low => self.handle.send(&[0x80 | CHANNEL, note, 0])?,
            }
            self.levels[pin as usize] = level;
        }
        debug!("MIDI mirror wrote {:?} -> {:?}", pins, level);
        Ok(())
    }

    fn all_low(&mut self) -> Result<()> {
        let high: Vec<u8> = self
            .levels
            .iter()
            .enumerate()
            .filter(|(_, level)| level.is_high())
            .map(|(pin, _)| pin as u8)
            .collect();
        self.write_pins(&high, Level::Low)
    }
}
