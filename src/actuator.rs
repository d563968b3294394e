//! Xylophone strikers
//!
//! Notes map to output pins of two banks: `pin = note - lowest_note`, bank A
//! for the first `bank_size` pins and bank B for the rest. A strike drives
//! the pins high, waits the strike length, then drives them low again.
//! Simultaneous notes are written in one transfer per bank.

use crate::hardware::{Level, OutputBank};
use crate::timing::Sleeper;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use xylo_core::types::note_name;

#[derive(Error, Debug)]
pub enum ActuatorError {
    #[error("out of range note {note} (playable {lowest}..={highest})")]
    OutOfRange { note: u8, lowest: u8, highest: u8 },

    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XylophoneConfig {
    pub lowest_note: u8,
    pub notes_count: u8,
    pub max_simultaneous: usize,
    pub bank_size: u8,
    pub note_length: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    A,
    B,
}

impl Bank {
    fn slot(self) -> usize {
        match self {
            Bank::A => 0,
            Bank::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAddress {
    pub bank: Bank,
    pub pin: u8,
}

pub struct Xylophone {
    lowest_note: u8,
    highest_note: u8,
    bank_size: u8,
    max_simultaneous: usize,
    note_length_micros: AtomicU64,
    quiet: AtomicBool,
    banks: Mutex<[Box<dyn OutputBank>; 2]>,
    sleeper: Arc<dyn Sleeper>,
}

impl Xylophone {
    pub fn new(
        config: XylophoneConfig,
        bank_a: Box<dyn OutputBank>,
        bank_b: Box<dyn OutputBank>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let highest_note = config
            .lowest_note
            .saturating_add(config.notes_count.saturating_sub(1));

        info!("Setup Xylophone with {} notes", config.notes_count);
        debug!(
            "Lowest  note: {} ({})",
            note_name(config.lowest_note),
            config.lowest_note
        );
        debug!("Highest note: {} ({})", note_name(highest_note), highest_note);

        Self {
            lowest_note: config.lowest_note,
            highest_note,
            bank_size: config.bank_size,
            max_simultaneous: config.max_simultaneous,
            note_length_micros: AtomicU64::new(config.note_length.as_micros() as u64),
            quiet: AtomicBool::new(false),
            banks: Mutex::new([bank_a, bank_b]),
            sleeper,
        }
    }

    pub fn lowest_note(&self) -> u8 {
        self.lowest_note
    }

    pub fn highest_note(&self) -> u8 {
        self.highest_note
    }

    pub fn note_length(&self) -> Duration {
        Duration::from_micros(self.note_length_micros.load(Ordering::Relaxed))
    }

    pub fn set_note_length(&self, length: Duration) {
        info!("Changing note length to {} ms", length.as_millis());
        self.note_length_micros
            .store(length.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet.load(Ordering::Relaxed)
    }

    /// In quiet mode strikes keep their timing but outputs are left untouched
    pub fn set_quiet(&self, quiet: bool) {
        info!("{} quiet mode", if quiet { "Entering" } else { "Leaving" });
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    /// Bank and pin striking `note`, if the instrument has it
    pub fn locate(&self, note: u8) -> Option<PinAddress> {
        if !(self.lowest_note..=self.highest_note).contains(&note) {
            return None;
        }
        let pin = note - self.lowest_note;
        Some(if pin < self.bank_size {
            PinAddress { bank: Bank::A, pin }
        } else {
            PinAddress {
                bank: Bank::B,
                pin: pin - self.bank_size,
            }
        })
    }

    fn out_of_range(&self, note: u8) -> ActuatorError {
        ActuatorError::OutOfRange {
            note,
            lowest: self.lowest_note,
            highest: self.highest_note,
        }
    }

    /// Strike a single note
    pub fn play_note(&self, note: u8) -> Result<(), ActuatorError> {
        debug!("Xylophone playing note #{}", note);

        let Some(address) = self.locate(note) else {
            let err = self.out_of_range(note);
            error!("Cannot play note; {}", err);
            return Err(err);
        };

        let mut pins: [Vec<u8>; 2] = Default::default();
        pins[address.bank.slot()].push(address.pin);
        self.strike(&pins)
    }

    /// Strike several notes at once.
    ///
    /// Any note out of range drops the whole batch. Past the simultaneous
    /// notes limit, the highest notes are dropped. Returns the notes struck.
    pub fn play_notes(&self, notes: &[u8]) -> Result<Vec<u8>, ActuatorError> {
        debug!("Xylophone playing note(s) {:?}", notes);

        if let Some(&note) = notes.iter().find(|&&n| self.locate(n).is_none()) {
            let err = self.out_of_range(note);
            error!("Cannot play note(s); {}", err);
            return Err(err);
        }

        let mut batch = notes.to_vec();
        batch.sort_unstable();
        batch.dedup();
        if batch.len() > self.max_simultaneous {
            let dropped = batch.split_off(self.max_simultaneous);
            warn!(
                "Maximum allowed simultaneous notes passed; dropping notes: {:?}",
                dropped
            );
        }
        if batch.is_empty() {
            return Ok(batch);
        }

        let mut pins: [Vec<u8>; 2] = Default::default();
        for address in batch.iter().filter_map(|&n| self.locate(n)) {
            pins[address.bank.slot()].push(address.pin);
        }
        self.strike(&pins)?;
        Ok(batch)
    }

    /// Drive high, wait, drive low. The low phase runs even when the high
    /// phase failed on some bank; the first error is returned afterwards.
    fn strike(&self, pins: &[Vec<u8>; 2]) -> Result<(), ActuatorError> {
        let high = self.write(pins, Level::High);
        self.sleeper.sleep(self.note_length());
        let low = self.write(pins, Level::Low);
        high.and(low)
    }

    /// Write every bank with pins to drive, even past a failing one
    fn write(&self, pins: &[Vec<u8>; 2], level: Level) -> Result<(), ActuatorError> {
        if self.is_quiet() {
            return Ok(());
        }
        let mut banks = self.banks.lock().unwrap_or_else(PoisonError::into_inner);
        let mut first_error = None;
        for (bank, bank_pins) in banks.iter_mut().zip(pins.iter()) {
            if bank_pins.is_empty() {
                continue;
            }
            if let Err(e) = bank.write_pins(bank_pins, level) {
                error!("Cannot drive striker outputs {:?}: {}", level, e);
                first_error.get_or_insert(ActuatorError::Output(e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Wait out a rest, minus the strike that already elapsed before it.
    ///
    /// Returns the time actually slept.
    pub fn pause(&self, duration: Duration) -> Duration {
        debug!("Xylophone pausing for: {:?}", duration);

        match duration.checked_sub(self.note_length()) {
            Some(remaining) if !remaining.is_zero() => {
                self.sleeper.sleep(remaining);
                remaining
            }
            _ => {
                warn!("Got a very short pause ({:?}): bypassing sleep", duration);
                Duration::ZERO
            }
        }
    }

    /// Drive every output low
    pub fn shutdown(&self) {
        info!("Driving all striker outputs low");
        let mut banks = self.banks.lock().unwrap_or_else(PoisonError::into_inner);
        for bank in banks.iter_mut() {
            if let Err(e) = bank.all_low() {
                error!("Cannot clear striker outputs: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{BankWrite, SimulatedBank};
    use crate::timing::testing::RecordingSleeper;
    use crossbeam_channel::Receiver;

    struct Rig {
        xylophone: Xylophone,
        sleeper: Arc<RecordingSleeper>,
        writes_a: Receiver<BankWrite>,
        writes_b: Receiver<BankWrite>,
    }

    fn rig(max_simultaneous: usize) -> Rig {
        let mut bank_a = SimulatedBank::new("A", 8);
        let mut bank_b = SimulatedBank::new("B", 8);
        let writes_a = bank_a.subscribe();
        let writes_b = bank_b.subscribe();
        let sleeper = Arc::new(RecordingSleeper::default());
        let config = XylophoneConfig {
            lowest_note: 60,
            notes_count: 16,
            max_simultaneous,
            bank_size: 8,
            note_length: Duration::from_millis(15),
        };
        Rig {
            xylophone: Xylophone::new(config, Box::new(bank_a), Box::new(bank_b), sleeper.clone()),
            sleeper,
            writes_a,
            writes_b,
        }
    }

    fn drain(rx: &Receiver<BankWrite>) -> Vec<(Vec<u8>, Level)> {
        rx.try_iter().map(|w| (w.pins, w.level)).collect()
    }

    #[test]
    fn test_failing_bank_still_releases_other_bank() {
        let mut bank_a = SimulatedBank::new("A", 8);
        let writes_a = bank_a.subscribe();
        // no pins: every write to bank B fails
        let bank_b = SimulatedBank::new("B", 0);
        let sleeper = Arc::new(RecordingSleeper::default());
        let xylophone = Xylophone::new(
            XylophoneConfig {
                lowest_note: 60,
                notes_count: 16,
                max_simultaneous: 3,
                bank_size: 8,
                note_length: Duration::from_millis(15),
            },
            Box::new(bank_a),
            Box::new(bank_b),
            sleeper.clone(),
        );

        let result = xylophone.play_notes(&[60, 68]);
        assert!(matches!(result, Err(ActuatorError::Output(_))));
        assert_eq!(
            drain(&writes_a),
            vec![(vec![0], Level::High), (vec![0], Level::Low)]
        );
        assert_eq!(sleeper.sleeps(), vec![Duration::from_millis(15)]);
    }

    #[test]
    fn test_bank_assignment() {
        let rig = rig(3);
        let x = &rig.xylophone;
        assert_eq!(x.locate(67), Some(PinAddress { bank: Bank::A, pin: 7 }));
        assert_eq!(x.locate(68), Some(PinAddress { bank: Bank::B, pin: 0 }));
        assert_eq!(x.locate(75), Some(PinAddress { bank: Bank::B, pin: 7 }));
        assert_eq!(x.locate(59), None);
        assert_eq!(x.locate(76), None);
    }

    #[test]
    fn test_play_note_strikes_one_pin() {
        let rig = rig(3);
        rig.xylophone.play_note(68).unwrap();
        assert!(drain(&rig.writes_a).is_empty());
        assert_eq!(
            drain(&rig.writes_b),
            vec![(vec![0], Level::High), (vec![0], Level::Low)]
        );
        assert_eq!(rig.sleeper.sleeps(), vec![Duration::from_millis(15)]);
    }

    #[test]
    fn test_play_note_out_of_range_is_dropped() {
        let rig = rig(3);
        assert!(matches!(
            rig.xylophone.play_note(59),
            Err(ActuatorError::OutOfRange { note: 59, .. })
        ));
        assert!(rig.xylophone.play_note(76).is_err());
        assert!(drain(&rig.writes_a).is_empty());
        assert!(rig.sleeper.sleeps().is_empty());
    }

    #[test]
    fn test_play_notes_batches_per_bank() {
        let rig = rig(4);
        let struck = rig.xylophone.play_notes(&[70, 61, 62]).unwrap();
        assert_eq!(struck, vec![61, 62, 70]);
        assert_eq!(
            drain(&rig.writes_a),
            vec![(vec![1, 2], Level::High), (vec![1, 2], Level::Low)]
        );
        assert_eq!(
            drain(&rig.writes_b),
            vec![(vec![2], Level::High), (vec![2], Level::Low)]
        );
        // one shared strike for the whole batch
        assert_eq!(rig.sleeper.sleeps().len(), 1);
    }

    #[test]
    fn test_play_notes_drops_highest_past_limit() {
        let rig = rig(2);
        let struck = rig.xylophone.play_notes(&[72, 60, 65, 64]).unwrap();
        assert_eq!(struck, vec![60, 64]);
        assert_eq!(
            drain(&rig.writes_a)[0],
            (vec![0, 4], Level::High)
        );
        assert!(drain(&rig.writes_b).is_empty());
    }

    #[test]
    fn test_play_notes_out_of_range_drops_batch() {
        let rig = rig(2);
        assert!(rig.xylophone.play_notes(&[60, 61, 90]).is_err());
        assert!(drain(&rig.writes_a).is_empty());
        assert!(rig.sleeper.sleeps().is_empty());
    }

    #[test]
    fn test_pause_subtracts_strike_length() {
        let rig = rig(2);
        let slept = rig.xylophone.pause(Duration::from_millis(515));
        assert_eq!(slept, Duration::from_millis(500));
        assert_eq!(rig.sleeper.sleeps(), vec![Duration::from_millis(500)]);
    }

    #[test]
    fn test_short_pause_is_skipped() {
        let rig = rig(2);
        assert_eq!(rig.xylophone.pause(Duration::from_millis(15)), Duration::ZERO);
        assert_eq!(rig.xylophone.pause(Duration::from_millis(3)), Duration::ZERO);
        assert!(rig.sleeper.sleeps().is_empty());
    }

    #[test]
    fn test_quiet_mode_keeps_timing_without_writes() {
        let rig = rig(2);
        rig.xylophone.set_quiet(true);
        rig.xylophone.play_notes(&[60, 61]).unwrap();
        assert!(drain(&rig.writes_a).is_empty());
        assert_eq!(rig.sleeper.sleeps().len(), 1);

        rig.xylophone.set_quiet(false);
        rig.xylophone.play_note(60).unwrap();
        assert_eq!(drain(&rig.writes_a).len(), 2);
    }

    #[test]
    fn test_note_length_change_applies_to_pause() {
        let rig = rig(2);
        rig.xylophone.set_note_length(Duration::from_millis(40));
        assert_eq!(
            rig.xylophone.pause(Duration::from_millis(100)),
            Duration::from_millis(60)
        );
    }

    #[test]
    fn test_shutdown_clears_both_banks() {
        let rig = rig(2);
        rig.xylophone.shutdown();
        assert_eq!(drain(&rig.writes_a), vec![((0..8).collect::<Vec<u8>>(), Level::Low)]);
        assert_eq!(drain(&rig.writes_b), vec![((0..8).collect::<Vec<u8>>(), Level::Low)]);
    }
}
