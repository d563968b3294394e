//! Standard MIDI File decoding
//!
//! Merges every track of a file into one time-ordered stream, converts tick
//! deltas to seconds with the tempo map in force, and hands the stream to
//! [`fold_messages`].

use super::{fold_messages, RawKind, RawMessage};
use crate::error::CompileError;
use crate::types::tempo::{bpm_from_micros_per_beat, quantize_bpm, DEFAULT_MICROS_PER_BEAT};
use crate::types::Event;
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::Path;

/// A MIDI file reduced to what the player needs
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTrack {
    /// Quantized native tempo, never 0
    pub tempo_bpm: u32,
    /// Never empty
    pub events: Vec<Event>,
    /// Nominal duration of the file, in whole seconds
    pub length_seconds: u32,
}

/// Read and compile a MIDI file from disk
pub fn compile_file(path: &Path) -> Result<CompiledTrack, CompileError> {
    let bytes = std::fs::read(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    compile_bytes(&bytes)
}

/// Compile an in-memory MIDI byte stream
pub fn compile_bytes(bytes: &[u8]) -> Result<CompiledTrack, CompileError> {
    let smf = Smf::parse(bytes)?;

    if smf.header.format == Format::Sequential {
        return Err(CompileError::UnsupportedFormat);
    }

    let tempo_bpm = quantize_bpm(raw_file_bpm(&smf));
    if tempo_bpm == 0 {
        return Err(CompileError::NoTempo);
    }

    let folded = fold_messages(merged_messages(&smf));
    if folded.events.is_empty() {
        return Err(CompileError::NoEvents);
    }

    Ok(CompiledTrack {
        tempo_bpm,
        events: folded.events,
        length_seconds: folded.total_seconds.floor() as u32,
    })
}

/// BPM of the first non-zero `set_tempo`, scanning tracks in order; 0 if none
fn raw_file_bpm(smf: &Smf) -> u32 {
    smf.tracks
        .iter()
        .flatten()
        .find_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(tempo)) if tempo.as_int() != 0 => {
                Some(bpm_from_micros_per_beat(tempo.as_int()))
            }
            _ => None,
        })
        .unwrap_or(0)
}

/// Converts tick spans to seconds, following tempo changes
struct TickClock {
    timing: Timing,
    micros_per_beat: u32,
}

impl TickClock {
    fn new(timing: Timing) -> Self {
        Self {
            timing,
            micros_per_beat: DEFAULT_MICROS_PER_BEAT,
        }
    }

    fn set_tempo(&mut self, micros_per_beat: u32) {
        if micros_per_beat != 0 {
            self.micros_per_beat = micros_per_beat;
        }
    }

    fn seconds(&self, ticks: u64) -> f64 {
        if ticks == 0 {
            return 0.0;
        }
        let seconds_per_tick = match self.timing {
            Timing::Metrical(ticks_per_beat) => {
                let ticks_per_beat = ticks_per_beat.as_int().max(1) as f64;
                self.micros_per_beat as f64 / 1_000_000.0 / ticks_per_beat
            }
            Timing::Timecode(fps, subframes) => {
                1.0 / (fps.as_f32() as f64 * subframes.max(1) as f64)
            }
        };
        ticks as f64 * seconds_per_tick
    }
}

fn raw_kind(kind: &TrackEventKind) -> RawKind {
    match kind {
        TrackEventKind::Midi { message, .. } => match message {
            MidiMessage::NoteOn { key, vel } => RawKind::NoteOn {
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, .. } => RawKind::NoteOff { note: key.as_int() },
            _ => RawKind::Other,
        },
        TrackEventKind::Meta(_) => RawKind::Meta,
        _ => RawKind::Other,
    }
}

/// All tracks merged by absolute tick, with deltas in seconds.
///
/// Ties keep track order then in-track order. Per-track end-of-track markers
/// are replaced by a single one at the latest track end.
fn merged_messages(smf: &Smf) -> Vec<RawMessage> {
    let mut timed: Vec<(u64, TrackEventKind)> = Vec::new();
    let mut end_tick = 0u64;

    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta.as_int() as u64;
            if matches!(event.kind, TrackEventKind::Meta(MetaMessage::EndOfTrack)) {
                continue;
            }
            timed.push((tick, event.kind));
        }
        end_tick = end_tick.max(tick);
    }

    // stable: equal ticks stay in push order
    timed.sort_by_key(|(tick, _)| *tick);

    let mut clock = TickClock::new(smf.header.timing);
    let mut last_tick = 0u64;
    let mut messages = Vec::with_capacity(timed.len() + 1);

    for (tick, kind) in timed {
        let delta_seconds = clock.seconds(tick - last_tick);
        last_tick = tick;
        if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = kind {
            clock.set_tempo(tempo.as_int());
        }
        messages.push(RawMessage::new(delta_seconds, raw_kind(&kind)));
    }

    messages.push(RawMessage::new(
        clock.seconds(end_tick.saturating_sub(last_tick)),
        RawKind::Meta,
    ));

    messages
}
