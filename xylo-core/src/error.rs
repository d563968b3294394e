//! # Error Types
//!
//! - `CompileError` - a MIDI file could not be turned into a playable track
//! - `CatalogError` - catalog construction or lookup failures
//! - `TransportError` - misuse of the single playback cursor

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed MIDI data: {0}")]
    Parse(#[from] midly::Error),

    /// SMF type 2: independent sequential tracks
    #[error("unsupported MIDI type 2 (sequential tracks)")]
    UnsupportedFormat,

    #[error("no valid tempo found")]
    NoTempo,

    #[error("no events found")]
    NoEvents,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("out of range track index: {index} (catalog holds {count} tracks)")]
    OutOfRange { index: usize, count: usize },

    #[error("cannot scan music directory {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("out of range track index: {0}")]
    OutOfRange(usize),

    #[error("playing already in progress (track #{0})")]
    AlreadyPlaying(usize),

    #[error("no playing started")]
    NotPlaying,
}
