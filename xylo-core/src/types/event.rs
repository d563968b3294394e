//! Compiled playback events
//!
//! A compiled track is a flat list of [`Event`]s alternating between silent
//! gaps and groups of simultaneous strikes. Rest durations are expressed in
//! seconds at the file's native tempo; tempo scaling happens at dispatch time.

use crate::types::note::note_name;
use std::fmt;

/// One or more pitches to strike at the same instant.
///
/// Always sorted ascending with no duplicates, whatever order the pitches
/// were collected in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteSet {
    pitches: Vec<u8>,
}

impl NoteSet {
    /// Build a note set, sorting and deduplicating the given pitches
    pub fn new(mut pitches: Vec<u8>) -> Self {
        pitches.sort_unstable();
        pitches.dedup();
        Self { pitches }
    }

    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }

    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }
}

impl From<Vec<u8>> for NoteSet {
    fn from(pitches: Vec<u8>) -> Self {
        NoteSet::new(pitches)
    }
}

impl fmt::Display for NoteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.pitches.iter().map(|&p| note_name(p)).collect();
        write!(f, "{}", names.join(" "))
    }
}

/// A single step of a compiled track
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Silent gap, in seconds at the track's native tempo
    Rest { seconds: f64 },
    /// Pitches struck together
    Notes(NoteSet),
}

impl Event {
    pub fn rest(seconds: f64) -> Self {
        Event::Rest { seconds }
    }

    pub fn notes(pitches: Vec<u8>) -> Self {
        Event::Notes(NoteSet::new(pitches))
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Event::Rest { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Rest { seconds } => write!(f, "Pause: {:.3}", seconds),
            Event::Notes(set) => write!(f, "Notes: {}", set),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_set_sorts_and_dedups() {
        let set = NoteSet::new(vec![67, 60, 64, 60, 67]);
        assert_eq!(set.pitches(), &[60, 64, 67]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(Event::notes(vec![64, 60]).to_string(), "Notes: C4 E4");
        assert_eq!(Event::rest(0.25).to_string(), "Pause: 0.250");
    }
}
