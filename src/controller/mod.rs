//! Playback controller
//!
//! Two loops share a [`PlaybackState`]:
//!
//! - the input loop polls the knobs, mirrors presets on the display and turns
//!   clicks into play/stop requests
//! - the player loop walks the transport over the selected track and drives
//!   the xylophone, then decides what to play next from the mode
//!
//! Knob positions are only presets; a click commits them. The operator
//! console calls in through the `*_from_console` methods.

pub mod knobs;
pub mod state;

pub use knobs::{Knob, Knobs};
pub use state::{Mode, PlaybackState, RunState};

use crate::actuator::{ActuatorError, Xylophone};
use crate::display::Display;
use crate::input::RotaryControl;
use crate::timing::Sleeper;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use xylo_core::types::quantize_bpm;
use xylo_core::{CatalogError, Cursor, Event, TrackCatalog, Transport};

/// Lowest xylophone note plus the next two, each followed by this rest
const WELCOME_REST_SECONDS: f64 = 0.3;
const WELCOME_TEMPO: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub inter_track_pause: Duration,
}

/// Snapshot printed by the console
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStatus {
    pub tracks_count: usize,
    pub track_index: usize,
    pub track_tempo: u32,
    pub play_tempo: u32,
    pub tempo_ratio: f64,
    pub mode: Mode,
    pub run_state: Result<RunState, u8>,
}

impl fmt::Display for ControllerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tracks count: {}", self.tracks_count)?;
        writeln!(f, "Track index : {}", self.track_index)?;
        writeln!(f, "Track tempo : {}", self.track_tempo)?;
        writeln!(f, "Play  tempo : {}", self.play_tempo)?;
        writeln!(f, "Tempo ratio : {:.3}", self.tempo_ratio)?;
        writeln!(f, "Mode        : {}", self.mode)?;
        match self.run_state {
            Ok(state) => write!(f, "State       : {}", state),
            Err(raw) => write!(f, "State       : unknown ({})", raw),
        }
    }
}

pub struct Controller {
    state: PlaybackState,
    catalog: Arc<TrackCatalog>,
    transport: Mutex<Transport>,
    xylophone: Arc<Xylophone>,
    knobs: Mutex<Knobs>,
    display: Mutex<Box<dyn Display>>,
    sleeper: Arc<dyn Sleeper>,
    config: ControllerConfig,
    shutdown: AtomicBool,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Controller {
    /// Build a stopped controller on track 0 at its native tempo
    pub fn new(
        catalog: Arc<TrackCatalog>,
        xylophone: Arc<Xylophone>,
        mut knobs: Knobs,
        display: Box<dyn Display>,
        sleeper: Arc<dyn Sleeper>,
        config: ControllerConfig,
    ) -> Result<Self, CatalogError> {
        info!("Setting up Controller");

        let track_tempo = catalog.tempo(0)?;
        let state = PlaybackState::new(0, track_tempo);

        knobs.mode.set_state(&state.mode());
        knobs.track.set_state(&0);
        knobs.tempo.set_state(&track_tempo);

        Ok(Self {
            state,
            transport: Mutex::new(Transport::new(catalog.clone())),
            catalog,
            xylophone,
            knobs: Mutex::new(knobs),
            display: Mutex::new(display),
            sleeper,
            config,
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn catalog(&self) -> &Arc<TrackCatalog> {
        &self.catalog
    }

    pub fn xylophone(&self) -> &Arc<Xylophone> {
        &self.xylophone
    }

    pub fn transport_cursor(&self) -> Option<Cursor> {
        lock(&self.transport).cursor()
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            tracks_count: self.catalog.count(),
            track_index: self.state.track_index(),
            track_tempo: self.state.track_tempo(),
            play_tempo: self.state.play_tempo(),
            tempo_ratio: self.state.tempo_ratio(),
            mode: self.state.mode(),
            run_state: self.state.run_state(),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn should_leave(&self, generation: u64) -> bool {
        self.is_shutting_down()
            || self.state.generation() != generation
            || !self.state.is_playing()
    }

    /// Select a track and reset both tempos to its native tempo.
    ///
    /// Caller holds the transition lock.
    fn select_track(&self, index: usize) -> Result<u32, CatalogError> {
        let tempo = self.catalog.tempo(index)?;
        self.state.set_track_index(index);
        self.state.set_tempos(tempo, tempo);
        let mut knobs = lock(&self.knobs);
        knobs.track.set_state(&index);
        knobs.tempo.set_state(&tempo);
        Ok(tempo)
    }

    // ---- input loop ----

    /// One pass of the input loop
    pub fn poll_inputs(&self) {
        let (mode, track, tempo, mode_clicked, track_clicked, tempo_clicked) = {
            let mut knobs = lock(&self.knobs);
            (
                knobs.mode.value(),
                knobs.track.value(),
                knobs.tempo.value(),
                knobs.mode.was_clicked(),
                knobs.track.was_clicked(),
                knobs.tempo.was_clicked(),
            )
        };

        {
            let mut display = lock(&self.display);
            display.preset_mode(mode);
            display.preset_play_tempo(tempo);
            display.set_track_tempo(track);
            display.set_track_length(track);
            display.preset_track(track);
        }

        let auto_change = self.state.take_auto_mode_change();
        if mode_clicked {
            self.commit_mode(mode, track);
        } else if auto_change {
            lock(&self.display).set_mode(self.state.mode());
        }

        if track_clicked {
            self.commit_track(track);
        }

        if tempo_clicked {
            self.state.set_play_tempo(tempo);
            lock(&self.display).set_play_tempo(tempo);
            info!("Play tempo set to {}", tempo);
        }

        lock(&self.display).refresh();
    }

    fn commit_mode(&self, mode: Mode, preset_track: usize) {
        info!("Mode {} selected", mode);
        let _guard = self.state.lock_transition();

        lock(&self.display).set_mode(mode);
        if self.state.is_playing() {
            self.state.request_stop();
        }
        self.state.set_mode(mode);
        if mode == Mode::Stop {
            return;
        }

        let track = match mode {
            Mode::PlayAllTracks => 0,
            _ => preset_track,
        };
        if track != self.state.track_index() {
            match self.select_track(track) {
                Ok(tempo) => {
                    let mut display = lock(&self.display);
                    display.set_track(track);
                    display.set_play_tempo(tempo);
                }
                Err(e) => {
                    error!("Cannot select track; {}", e);
                    return;
                }
            }
        }
        self.state.request_play();
    }

    fn commit_track(&self, track: usize) {
        info!("Track #{} selected", track);
        let _guard = self.state.lock_transition();

        if self.state.is_playing() {
            self.state.request_stop();
        }
        let tempo = match self.select_track(track) {
            Ok(tempo) => tempo,
            Err(e) => {
                error!("Cannot select track; {}", e);
                return;
            }
        };
        self.state.set_mode(Mode::PlayOneTrack);
        lock(&self.knobs).mode.set_state(&Mode::PlayOneTrack);
        {
            let mut display = lock(&self.display);
            display.set_mode(Mode::PlayOneTrack);
            display.set_play_tempo(tempo);
            display.set_track(track);
        }
        self.state.request_play();
    }

    // ---- player loop ----

    /// One pass of the player loop
    pub fn step_player(&self) {
        match self.state.run_state() {
            Ok(RunState::Idle) => self.sleeper.sleep(self.config.poll_interval),
            Ok(RunState::PlayingTrack) => self.play_session(),
            Ok(RunState::StoppingTrack) => self.finish_stop(),
            Err(raw) => {
                error!("Got to an unsupported state: {}", raw);
                self.state.set_run_state(RunState::Idle);
            }
        }
    }

    fn play_session(&self) {
        let generation = self.state.generation();
        let track_index = self.state.track_index();

        let started = lock(&self.transport).start(track_index).is_ok();
        if started {
            while !self.should_leave(generation) {
                let event = lock(&self.transport).next_event();
                match event {
                    Some(event) => self.dispatch(&event),
                    None => break,
                }
            }
            let _ = lock(&self.transport).stop();
        }

        let guard = self.state.lock_transition();
        if self.should_leave(generation) {
            // stopped, restarted or shutting down: the next pass takes over
            return;
        }

        match self.state.mode() {
            Mode::LoopOneTrack => {
                drop(guard);
                debug!("Looping track #{}", track_index);
                self.inter_track_pause(generation);
            }
            Mode::PlayAllTracks => {
                let next = track_index + 1;
                if next >= self.catalog.count() {
                    self.state.request_stop();
                    return;
                }
                // the operator's play tempo carries over to the next track
                match self.catalog.tempo(next) {
                    Ok(tempo) => {
                        self.state.set_track_index(next);
                        self.state.set_track_tempo(tempo);
                        lock(&self.knobs).track.set_state(&next);
                        drop(guard);
                        lock(&self.display).set_track(next);
                    }
                    Err(e) => {
                        error!("Cannot advance to next track; {}", e);
                        self.state.request_stop();
                        return;
                    }
                }
                self.inter_track_pause(generation);
            }
            Mode::PlayOneTrack | Mode::Stop => self.state.request_stop(),
        }
    }

    fn finish_stop(&self) {
        let _guard = self.state.lock_transition();
        if self.state.run_state() != Ok(RunState::StoppingTrack) {
            return;
        }
        self.state.set_mode(Mode::Stop);
        lock(&self.knobs).mode.set_state(&Mode::Stop);
        self.state.flag_auto_mode_change();
        self.state.set_run_state(RunState::Idle);
        info!("Playing stopped");
    }

    /// Sleep between tracks in poll-sized slices, leaving early on a new request
    fn inter_track_pause(&self, generation: u64) {
        let mut remaining = self.config.inter_track_pause;
        while !remaining.is_zero() && !self.should_leave(generation) {
            let slice = remaining.min(self.config.poll_interval);
            self.sleeper.sleep(slice);
            remaining -= slice;
        }
    }

    fn dispatch(&self, event: &Event) {
        match event {
            Event::Rest { seconds } => {
                let scaled = seconds * self.state.tempo_ratio();
                match Duration::try_from_secs_f64(scaled) {
                    Ok(duration) => {
                        self.xylophone.pause(duration);
                    }
                    Err(e) => warn!("Skipping invalid pause of {} s: {}", scaled, e),
                }
            }
            Event::Notes(notes) => {
                // out of range batches are logged and dropped by the xylophone
                let _ = self.xylophone.play_notes(notes.pitches());
            }
        }
    }

    // ---- console entry points ----

    pub fn play_welcome_sound(&self) {
        info!("Playing welcome sound");
        let saved_track_tempo = self.state.track_tempo();
        let saved_play_tempo = self.state.play_tempo();
        self.state.set_tempos(WELCOME_TEMPO, WELCOME_TEMPO);

        let lowest = self.xylophone.lowest_note();
        for step in 0..3u8 {
            self.dispatch(&Event::notes(vec![lowest.saturating_add(step)]));
            self.dispatch(&Event::rest(WELCOME_REST_SECONDS));
        }

        self.state.set_tempos(saved_track_tempo, saved_play_tempo);
    }

    /// Play one track in PLAY_ONE_TRACK mode, optionally keeping the play tempo
    pub fn play_track_from_console(
        &self,
        index: usize,
        use_file_tempo: bool,
    ) -> Result<(), CatalogError> {
        let track_tempo = self.catalog.tempo(index)?;
        let _guard = self.state.lock_transition();

        if self.state.is_playing() {
            self.state.request_stop();
        }
        let play_tempo = if use_file_tempo {
            track_tempo
        } else {
            self.state.play_tempo()
        };
        self.state.set_track_index(index);
        self.state.set_tempos(track_tempo, play_tempo);
        self.state.set_mode(Mode::PlayOneTrack);
        {
            let mut knobs = lock(&self.knobs);
            knobs.track.set_state(&index);
            knobs.tempo.set_state(&quantize_bpm(play_tempo));
            knobs.mode.set_state(&Mode::PlayOneTrack);
        }
        {
            let mut display = lock(&self.display);
            display.set_mode(Mode::PlayOneTrack);
            display.set_track(index);
            display.set_play_tempo(play_tempo);
        }
        self.state.request_play();
        Ok(())
    }

    pub fn set_tempo_from_console(&self, bpm: u32) {
        info!("Play tempo set to {} from console", bpm);
        self.state.set_play_tempo(bpm);
        // the knob only holds table tempos
        lock(&self.knobs).tempo.set_state(&quantize_bpm(bpm));
        lock(&self.display).set_play_tempo(bpm);
    }

    /// Interrupt the current track; false when nothing was playing
    pub fn stop_track(&self) -> bool {
        let _guard = self.state.lock_transition();
        if self.state.is_playing() {
            self.state.request_stop();
            true
        } else {
            false
        }
    }

    pub fn play_note_from_console(&self, note: u8) -> Result<(), ActuatorError> {
        self.xylophone.play_note(note)
    }

    pub fn play_notes_from_console(&self, notes: &[u8]) -> Result<Vec<u8>, ActuatorError> {
        self.xylophone.play_notes(notes)
    }

    // ---- threads ----

    /// Start the input and player loops
    pub fn spawn(self: &Arc<Self>) -> ControllerThreads {
        let input = {
            let controller = self.clone();
            thread::Builder::new()
                .name("controller_buttons_reader".into())
                .spawn(move || {
                    info!("Starting Controller's buttons reader thread");
                    while !controller.is_shutting_down() {
                        controller.poll_inputs();
                        controller.sleeper.sleep(controller.config.poll_interval);
                    }
                })
        };
        let player = {
            let controller = self.clone();
            thread::Builder::new()
                .name("controller_file_player".into())
                .spawn(move || {
                    info!("Starting Controller's file player thread");
                    while !controller.is_shutting_down() {
                        controller.step_player();
                    }
                })
        };

        let mut threads = Vec::new();
        for handle in [input, player] {
            match handle {
                Ok(handle) => threads.push(handle),
                Err(e) => error!("Cannot start controller thread: {}", e),
            }
        }
        ControllerThreads {
            controller: self.clone(),
            threads,
        }
    }
}

/// Running controller loops; stopped and joined on drop
pub struct ControllerThreads {
    controller: Arc<Controller>,
    threads: Vec<JoinHandle<()>>,
}

impl ControllerThreads {
    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Wait for both loops to end (they only end on shutdown)
    pub fn join(mut self) {
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }

    pub fn shutdown(self) {
        self.controller.shutdown.store(true, Ordering::SeqCst);
        self.join();
    }
}

impl Drop for ControllerThreads {
    fn drop(&mut self) {
        self.controller.shutdown.store(true, Ordering::SeqCst);
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}
