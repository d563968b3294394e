//! Event compiler
//!
//! Folds a merged, time-ordered MIDI message stream into the compact event
//! list replayed by the player:
//!
//! - any message preceded by a non-zero delta opens or extends a `Rest`
//! - a sounding note-on joins the `NoteSet` directly before it, or opens one
//! - note-offs, metas and other messages only ever contribute time
//!
//! Pitches within a set are deduplicated and sorted once the fold is done.

pub mod midi_file;

use crate::types::{Event, NoteSet};

pub use midi_file::{compile_bytes, compile_file, CompiledTrack};

/// What a raw message means to the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    Meta,
    Other,
}

/// One message of the merged stream, with its delta from the previous message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMessage {
    pub delta_seconds: f64,
    pub kind: RawKind,
}

impl RawMessage {
    pub fn new(delta_seconds: f64, kind: RawKind) -> Self {
        Self {
            delta_seconds,
            kind,
        }
    }
}

/// Result of folding a message stream
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedEvents {
    pub events: Vec<Event>,
    /// Sum of every delta in the stream, in seconds
    pub total_seconds: f64,
}

/// Working representation while folding; note sets are normalized at the end
enum Pending {
    Rest(f64),
    Notes(Vec<u8>),
}

/// Fold a merged message stream into rests and note sets
pub fn fold_messages<I>(messages: I) -> FoldedEvents
where
    I: IntoIterator<Item = RawMessage>,
{
    let mut pending: Vec<Pending> = Vec::new();
    let mut total_seconds = 0.0;

    for msg in messages {
        if msg.delta_seconds > 0.0 {
            total_seconds += msg.delta_seconds;
            match pending.last_mut() {
                Some(Pending::Rest(seconds)) => *seconds += msg.delta_seconds,
                _ => pending.push(Pending::Rest(msg.delta_seconds)),
            }
        }

        if let RawKind::NoteOn { note, velocity } = msg.kind {
            if velocity == 0 {
                continue;
            }
            match pending.last_mut() {
                Some(Pending::Notes(notes)) => notes.push(note),
                _ => pending.push(Pending::Notes(vec![note])),
            }
        }
    }

    let events = pending
        .into_iter()
        .map(|p| match p {
            Pending::Rest(seconds) => Event::Rest { seconds },
            Pending::Notes(notes) => Event::Notes(NoteSet::new(notes)),
        })
        .collect();

    FoldedEvents {
        events,
        total_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(delta: f64, note: u8) -> RawMessage {
        RawMessage::new(delta, RawKind::NoteOn { note, velocity: 64 })
    }

    fn off(delta: f64, note: u8) -> RawMessage {
        RawMessage::new(delta, RawKind::NoteOff { note })
    }

    #[test]
    fn test_simultaneous_note_ons_merge_and_dedup() {
        let folded = fold_messages(vec![on(0.0, 64), on(0.0, 60), on(0.0, 64), off(0.5, 60)]);
        assert_eq!(
            folded.events,
            vec![Event::notes(vec![60, 64]), Event::rest(0.5)]
        );
        match &folded.events[0] {
            Event::Notes(set) => assert_eq!(set.pitches(), &[60, 64]),
            other => panic!("expected notes, got {:?}", other),
        }
    }

    #[test]
    fn test_adjacent_rests_merge() {
        let folded = fold_messages(vec![
            on(0.0, 60),
            off(0.25, 60),
            RawMessage::new(0.25, RawKind::Meta),
            RawMessage::new(0.5, RawKind::Other),
            on(0.0, 62),
        ]);
        assert_eq!(
            folded.events,
            vec![Event::notes(vec![60]), Event::rest(1.0), Event::notes(vec![62])]
        );
        assert_eq!(folded.total_seconds, 1.0);
    }

    #[test]
    fn test_zero_velocity_note_on_is_silent() {
        let folded = fold_messages(vec![
            on(0.0, 60),
            RawMessage::new(0.5, RawKind::NoteOn { note: 60, velocity: 0 }),
            on(0.0, 62),
        ]);
        assert_eq!(
            folded.events,
            vec![Event::notes(vec![60]), Event::rest(0.5), Event::notes(vec![62])]
        );
    }

    #[test]
    fn test_note_offs_between_simultaneous_strikes_keep_one_set() {
        // Releasing one note and striking two others at the same instant
        let folded = fold_messages(vec![on(0.0, 60), off(0.5, 60), on(0.0, 62), on(0.0, 65)]);
        assert_eq!(
            folded.events,
            vec![Event::notes(vec![60]), Event::rest(0.5), Event::notes(vec![62, 65])]
        );
    }

    #[test]
    fn test_leading_meta_time_becomes_rest() {
        let folded = fold_messages(vec![RawMessage::new(1.5, RawKind::Meta), on(0.0, 60)]);
        assert_eq!(
            folded.events,
            vec![Event::rest(1.5), Event::notes(vec![60])]
        );
    }

    #[test]
    fn test_no_adjacent_rests_ever() {
        let messages = (0..20).map(|i| {
            if i % 3 == 0 {
                on(0.0, 60 + (i % 12) as u8)
            } else {
                RawMessage::new(0.1 * i as f64, RawKind::Other)
            }
        });
        let folded = fold_messages(messages);
        assert!(folded
            .events
            .windows(2)
            .all(|w| !(w[0].is_rest() && w[1].is_rest())));
    }

    #[test]
    fn test_empty_stream() {
        let folded = fold_messages(Vec::new());
        assert!(folded.events.is_empty());
        assert_eq!(folded.total_seconds, 0.0);
    }
}
