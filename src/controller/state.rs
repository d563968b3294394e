//! Shared playback state
//!
//! Read lock-free by the input and player threads. Transitions that must
//! not interleave (stop/play requests against the player's end-of-track
//! handling) take the transition lock first.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use xylo_core::types::tempo_ratio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    PlayOneTrack = 0,
    PlayAllTracks = 1,
    LoopOneTrack = 2,
    Stop = 3,
}

impl Mode {
    /// Order of the modes on the mode knob
    pub const KNOB_ORDER: [Mode; 4] = [
        Mode::LoopOneTrack,
        Mode::PlayAllTracks,
        Mode::PlayOneTrack,
        Mode::Stop,
    ];
}

impl TryFrom<u8> for Mode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(Mode::PlayOneTrack),
            1 => Ok(Mode::PlayAllTracks),
            2 => Ok(Mode::LoopOneTrack),
            3 => Ok(Mode::Stop),
            other => Err(other),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::PlayOneTrack => "PLAY_ONE_TRACK",
            Mode::PlayAllTracks => "PLAY_ALL_TRACKS",
            Mode::LoopOneTrack => "LOOP_ONE_TRACK",
            Mode::Stop => "STOP",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    PlayingTrack = 1,
    StoppingTrack = 2,
}

impl TryFrom<u8> for RunState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            0 => Ok(RunState::Idle),
            1 => Ok(RunState::PlayingTrack),
            2 => Ok(RunState::StoppingTrack),
            other => Err(other),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "IDLE",
            RunState::PlayingTrack => "PLAYING_TRACK",
            RunState::StoppingTrack => "STOPPING_TRACK",
        };
        write!(f, "{}", name)
    }
}

pub struct PlaybackState {
    mode: AtomicU8,
    run_state: AtomicU8,
    track_index: AtomicUsize,
    track_tempo: AtomicU32,
    play_tempo: AtomicU32,
    /// f64 bits
    tempo_ratio: AtomicU64,
    /// Bumped by every play request
    generation: AtomicU64,
    /// Set when the player forced the mode to STOP on its own
    auto_mode_change: AtomicBool,
    transition: Mutex<()>,
}

impl PlaybackState {
    pub fn new(track_index: usize, track_tempo: u32) -> Self {
        Self {
            mode: AtomicU8::new(Mode::Stop as u8),
            run_state: AtomicU8::new(RunState::Idle as u8),
            track_index: AtomicUsize::new(track_index),
            track_tempo: AtomicU32::new(track_tempo),
            play_tempo: AtomicU32::new(track_tempo),
            tempo_ratio: AtomicU64::new(1.0f64.to_bits()),
            generation: AtomicU64::new(0),
            auto_mode_change: AtomicBool::new(false),
            transition: Mutex::new(()),
        }
    }

    pub fn lock_transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> Mode {
        // only ever stores valid modes
        Mode::try_from(self.mode.load(Ordering::SeqCst)).unwrap_or(Mode::Stop)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::SeqCst);
    }

    /// Current run state, or the raw value if it is not a known state
    pub fn run_state(&self) -> Result<RunState, u8> {
        RunState::try_from(self.run_state.load(Ordering::SeqCst))
    }

    pub fn is_playing(&self) -> bool {
        self.run_state() == Ok(RunState::PlayingTrack)
    }

    pub fn set_run_state(&self, state: RunState) {
        self.run_state.store(state as u8, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn set_raw_run_state(&self, raw: u8) {
        self.run_state.store(raw, Ordering::SeqCst);
    }

    pub fn track_index(&self) -> usize {
        self.track_index.load(Ordering::SeqCst)
    }

    pub fn set_track_index(&self, index: usize) {
        self.track_index.store(index, Ordering::SeqCst);
    }

    pub fn track_tempo(&self) -> u32 {
        self.track_tempo.load(Ordering::SeqCst)
    }

    pub fn play_tempo(&self) -> u32 {
        self.play_tempo.load(Ordering::SeqCst)
    }

    pub fn tempo_ratio(&self) -> f64 {
        f64::from_bits(self.tempo_ratio.load(Ordering::SeqCst))
    }

    /// Set both tempos and recompute the ratio applied to rests
    pub fn set_tempos(&self, track_tempo: u32, play_tempo: u32) {
        self.track_tempo.store(track_tempo, Ordering::SeqCst);
        self.play_tempo.store(play_tempo, Ordering::SeqCst);
        self.update_ratio();
    }

    /// Change the native tempo only, keeping the operator's play tempo
    pub fn set_track_tempo(&self, track_tempo: u32) {
        self.track_tempo.store(track_tempo, Ordering::SeqCst);
        self.update_ratio();
    }

    pub fn set_play_tempo(&self, play_tempo: u32) {
        self.play_tempo.store(play_tempo, Ordering::SeqCst);
        self.update_ratio();
    }

    fn update_ratio(&self) {
        let ratio = tempo_ratio(self.track_tempo(), self.play_tempo());
        self.tempo_ratio.store(ratio.to_bits(), Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Ask the player to (re)start the current track as a new session
    pub fn request_play(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.set_run_state(RunState::PlayingTrack);
    }

    pub fn request_stop(&self) {
        self.set_run_state(RunState::StoppingTrack);
    }

    pub fn flag_auto_mode_change(&self) {
        self.auto_mode_change.store(true, Ordering::SeqCst);
    }

    /// Consume the auto mode change flag
    pub fn take_auto_mode_change(&self) -> bool {
        self.auto_mode_change.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_follows_tempos() {
        let state = PlaybackState::new(0, 120);
        assert_eq!(state.tempo_ratio(), 1.0);
        state.set_play_tempo(60);
        assert_eq!(state.tempo_ratio(), 2.0);
        state.set_tempos(60, 120);
        assert_eq!(state.tempo_ratio(), 0.5);
        state.set_track_tempo(90);
        assert_eq!(state.play_tempo(), 120);
        assert_eq!(state.tempo_ratio(), 0.75);
    }

    #[test]
    fn test_play_request_bumps_generation() {
        let state = PlaybackState::new(0, 120);
        let before = state.generation();
        state.request_play();
        assert!(state.is_playing());
        assert_eq!(state.generation(), before + 1);
        state.request_stop();
        assert_eq!(state.run_state(), Ok(RunState::StoppingTrack));
    }

    #[test]
    fn test_unknown_run_state_is_reported() {
        let state = PlaybackState::new(0, 120);
        state.set_raw_run_state(9);
        assert_eq!(state.run_state(), Err(9));
    }

    #[test]
    fn test_auto_mode_change_is_consumed_once() {
        let state = PlaybackState::new(0, 120);
        assert!(!state.take_auto_mode_change());
        state.flag_auto_mode_change();
        assert!(state.take_auto_mode_change());
        assert!(!state.take_auto_mode_change());
    }

    #[test]
    fn test_mode_round_trip_through_u8() {
        for mode in Mode::KNOB_ORDER {
            assert_eq!(Mode::try_from(mode as u8), Ok(mode));
        }
        assert_eq!(Mode::try_from(4), Err(4));
    }
}
