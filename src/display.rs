//! Operator display
//!
//! The controller pushes the hovered (preset) and committed settings into a
//! [`Display`] every input poll. Implementations ignore repeated values and
//! only redraw on `refresh` when something actually changed.

use crate::controller::Mode;
use log::{info, warn};
use std::path::Path;
use xylo_core::types::format_minutes_seconds;
use xylo_core::TrackCatalog;

const MAX_NAME_CHARS: usize = 13;

pub trait Display: Send {
    fn preset_mode(&mut self, mode: Mode);
    fn set_mode(&mut self, mode: Mode);
    fn preset_track(&mut self, index: usize);
    fn set_track(&mut self, index: usize);
    fn preset_play_tempo(&mut self, bpm: u32);
    fn set_play_tempo(&mut self, bpm: u32);
    /// Show the native tempo of track `index`
    fn set_track_tempo(&mut self, index: usize);
    /// Show the length of track `index`
    fn set_track_length(&mut self, index: usize);
    fn refresh(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PanelTrack {
    name: String,
    tempo_bpm: u32,
    length_seconds: u32,
}

/// Track name as shown on the panel: no extension, 13 chars at most
pub fn short_track_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    if stem.chars().count() > MAX_NAME_CHARS {
        let head: String = stem.chars().take(MAX_NAME_CHARS).collect();
        format!("{}...", head)
    } else {
        stem
    }
}

/// Text model of the two-panel screen, rendered to the log
pub struct PanelDisplay {
    tracks: Vec<PanelTrack>,
    mode: Option<Mode>,
    mode_preset: Option<Mode>,
    track: Option<usize>,
    track_preset: Option<usize>,
    tempo: Option<u32>,
    tempo_preset: Option<u32>,
    track_tempo: Option<u32>,
    track_length: Option<u32>,
    dirty: bool,
    renders: usize,
}

impl PanelDisplay {
    pub fn new(catalog: &TrackCatalog) -> Self {
        info!("Setting up display");
        let tracks = catalog
            .iter()
            .map(|t| PanelTrack {
                name: short_track_name(&t.name),
                tempo_bpm: t.tempo_bpm,
                length_seconds: t.length_seconds,
            })
            .collect();
        Self {
            tracks,
            mode: None,
            mode_preset: None,
            track: None,
            track_preset: None,
            tempo: None,
            tempo_preset: None,
            track_tempo: None,
            track_length: None,
            dirty: true,
            renders: 0,
        }
    }

    /// Number of times the panel was actually redrawn
    pub fn render_count(&self) -> usize {
        self.renders
    }

    fn track(&self, index: usize) -> Option<&PanelTrack> {
        let track = self.tracks.get(index);
        if track.is_none() {
            warn!("Display got an out of range track index: {}", index);
        }
        track
    }

    fn update<T: PartialEq + Copy>(slot: &mut Option<T>, value: T, dirty: &mut bool) -> bool {
        if *slot == Some(value) {
            return false;
        }
        *slot = Some(value);
        *dirty = true;
        true
    }

    fn mode_label(mode: Mode) -> &'static str {
        match mode {
            Mode::PlayOneTrack => "Play track",
            Mode::PlayAllTracks => "Play all",
            Mode::LoopOneTrack => "Loop track",
            Mode::Stop => "Stop",
        }
    }

    /// Current panel contents, one line per row
    pub fn render(&self) -> Vec<String> {
        let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
        let mark = |committed: bool| if committed { "*" } else { ">" };

        let mode = show(self.mode_preset.map(|m| {
            format!(
                "{}{}",
                mark(self.mode == Some(m)),
                Self::mode_label(m)
            )
        }));
        let tempo = show(self.tempo_preset.map(|t| {
            format!("{}{}", mark(self.tempo == Some(t)), t)
        }));
        let track = show(self.track_preset.and_then(|i| {
            self.tracks.get(i).map(|t| {
                format!("{}#{} {}", mark(self.track == Some(i)), i, t.name)
            })
        }));
        let track_tempo = show(self.track_tempo.map(|t| t.to_string()));
        let length = show(self.track_length.map(format_minutes_seconds));

        vec![
            format!("Mode : {}", mode),
            format!("Tempo: {}", tempo),
            format!("Track: {} ({} BPM, {})", track, track_tempo, length),
        ]
    }
}

impl Display for PanelDisplay {
    fn preset_mode(&mut self, mode: Mode) {
        if Self::update(&mut self.mode_preset, mode, &mut self.dirty) {
            info!("Display preset mode: {}", mode);
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode_preset = Some(mode);
        if Self::update(&mut self.mode, mode, &mut self.dirty) {
            info!("Display set mode: {}", mode);
        }
    }

    fn preset_track(&mut self, index: usize) {
        if self.track(index).is_some()
            && Self::update(&mut self.track_preset, index, &mut self.dirty)
        {
            info!("Display preset track: {}", index);
        }
    }

    fn set_track(&mut self, index: usize) {
        if self.track(index).is_none() {
            return;
        }
        self.track_preset = Some(index);
        if Self::update(&mut self.track, index, &mut self.dirty) {
            info!("Display set track: {}", index);
        }
    }

    fn preset_play_tempo(&mut self, bpm: u32) {
        if Self::update(&mut self.tempo_preset, bpm, &mut self.dirty) {
            info!("Display preset tempo: {}", bpm);
        }
    }

    fn set_play_tempo(&mut self, bpm: u32) {
        self.tempo_preset = Some(bpm);
        if Self::update(&mut self.tempo, bpm, &mut self.dirty) {
            info!("Display set tempo: {}", bpm);
        }
    }

    fn set_track_tempo(&mut self, index: usize) {
        if let Some(tempo) = self.track(index).map(|t| t.tempo_bpm) {
            Self::update(&mut self.track_tempo, tempo, &mut self.dirty);
        }
    }

    fn set_track_length(&mut self, index: usize) {
        if let Some(length) = self.track(index).map(|t| t.length_seconds) {
            Self::update(&mut self.track_length, length, &mut self.dirty);
        }
    }

    fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        self.renders += 1;
        for line in self.render() {
            info!("[panel] {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xylo_core::{Event, Track};

    fn display() -> PanelDisplay {
        let catalog = TrackCatalog::from_tracks(vec![
            Track::new("gymnopedie.mid", 76, 185, vec![Event::notes(vec![60])]),
            Track::new(
                "a_rather_long_track_name.mid",
                120,
                42,
                vec![Event::notes(vec![62])],
            ),
        ]);
        PanelDisplay::new(&catalog)
    }

    #[test]
    fn test_short_track_name() {
        assert_eq!(short_track_name("gymnopedie.mid"), "gymnopedie");
        assert_eq!(
            short_track_name("a_rather_long_track_name.mid"),
            "a_rather_long..."
        );
        assert_eq!(short_track_name("exactly13char.mid"), "exactly13char");
    }

    #[test]
    fn test_refresh_only_redraws_on_change() {
        let mut display = display();
        display.refresh();
        assert_eq!(display.render_count(), 1);

        display.preset_mode(Mode::Stop);
        display.set_track_tempo(0);
        display.refresh();
        assert_eq!(display.render_count(), 2);

        // same values again: nothing to redraw
        display.preset_mode(Mode::Stop);
        display.set_track_tempo(0);
        display.refresh();
        assert_eq!(display.render_count(), 2);
    }

    #[test]
    fn test_render_shows_preset_and_committed() {
        let mut display = display();
        display.set_mode(Mode::PlayAllTracks);
        display.set_play_tempo(120);
        display.preset_track(1);
        display.set_track_tempo(0);
        display.set_track_length(0);

        let lines = display.render();
        assert_eq!(lines[0], "Mode : *Play all");
        assert_eq!(lines[1], "Tempo: *120");
        assert_eq!(lines[2], "Track: >#1 a_rather_long... (76 BPM, 3:05)");

        display.preset_play_tempo(126);
        assert_eq!(display.render()[1], "Tempo: >126");
    }

    #[test]
    fn test_out_of_range_track_is_ignored() {
        let mut display = display();
        display.set_track(0);
        display.set_track(9);
        display.set_track_tempo(9);
        assert_eq!(display.render()[2], "Track: *#0 gymnopedie (- BPM, -)");
    }
}
