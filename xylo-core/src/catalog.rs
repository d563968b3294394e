//! Track catalog
//!
//! Every playable MIDI file found under the music directory, compiled once at
//! startup and immutable afterwards. Tracks are addressed by index only;
//! index order is the scan order (directory entries sorted by name, depth
//! first).

use crate::compiler::{compile_file, CompiledTrack};
use crate::error::CatalogError;
use crate::types::Event;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A compiled MIDI file
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub path: PathBuf,
    pub tempo_bpm: u32,
    pub length_seconds: u32,
    pub events: Vec<Event>,
}

impl Track {
    pub fn new(
        name: impl Into<String>,
        tempo_bpm: u32,
        length_seconds: u32,
        events: Vec<Event>,
    ) -> Self {
        Self {
            name: name.into(),
            path: PathBuf::new(),
            tempo_bpm,
            length_seconds,
            events,
        }
    }

    fn from_compiled(path: &Path, compiled: CompiledTrack) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path: path.to_path_buf(),
            tempo_bpm: compiled.tempo_bpm,
            length_seconds: compiled.length_seconds,
            events: compiled.events,
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Summary used by the display and console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackInfo<'a> {
    pub name: &'a str,
    pub tempo_bpm: u32,
    pub length_seconds: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    tracks: Vec<Track>,
}

impl TrackCatalog {
    /// Build a catalog from already compiled tracks, in the given order
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Scan a directory recursively and compile every file found.
    ///
    /// Files that fail to compile are skipped with a warning. Only an
    /// unreadable root directory is an error.
    pub fn scan(music_dir: &Path) -> Result<Self, CatalogError> {
        info!("Scanning {} directory for MIDI files", music_dir.display());

        let files = collect_files(music_dir)?;

        let mut tracks = Vec::new();
        for path in files {
            let file_name = path.display();
            match compile_file(&path) {
                Ok(compiled) => {
                    debug!("Registered file #{}: {}", tracks.len(), file_name);
                    tracks.push(Track::from_compiled(&path, compiled));
                }
                Err(e) => warn!("Dropping {}, as {}", file_name, e),
            }
        }

        info!("Found & parsed {} MIDI files", tracks.len());
        Ok(Self { tracks })
    }

    pub fn count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn info(&self, index: usize) -> Result<TrackInfo<'_>, CatalogError> {
        let track = self.tracks.get(index).ok_or(CatalogError::OutOfRange {
            index,
            count: self.tracks.len(),
        })?;
        Ok(TrackInfo {
            name: &track.name,
            tempo_bpm: track.tempo_bpm,
            length_seconds: track.length_seconds,
        })
    }

    pub fn tempo(&self, index: usize) -> Result<u32, CatalogError> {
        self.info(index).map(|info| info.tempo_bpm)
    }
}

/// Depth-first walk, entries sorted by file name at each level.
///
/// Unreadable entries below the root are skipped with a warning.
fn collect_files(music_dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(music_dir).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) if e.depth() == 0 => {
                let message = e.to_string();
                return Err(CatalogError::Scan {
                    path: music_dir.to_path_buf(),
                    source: e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other(message)),
                });
            }
            Err(e) => warn!("Skipping unreadable entry: {}", e),
        }
    }
    Ok(files)
}
