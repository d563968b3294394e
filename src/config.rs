//! Setup file loading
//!
//! The controller is configured from a JSON file (`setup.json` by default)
//! with SCREAMING_SNAKE_CASE keys, e.g.:
//!
//! ```json
//! {
//!     "LOG_LEVEL": 3,
//!     "MIDI_MUSIC_DIR": "midi",
//!     "XYLOPHONE_LOWEST_NOTE": 60,
//!     "XYLOPHONE_NOTES_COUNT": 32,
//!     "XYLOPHONE_MAX_SIM_NOTES": 3,
//!     "XYLOPHONE_NOTE_LENGTH": 15,
//!     "START_CONSOLE": 1
//! }
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SETUP_FILE: &str = "setup.json";

fn default_bank_size() -> u8 {
    16
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_inter_track_pause_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SetupConfig {
    /// 0 off, 1 error, 2 warning, 3 info, 4 debug
    pub log_level: u8,
    pub midi_music_dir: PathBuf,
    pub xylophone_lowest_note: u8,
    pub xylophone_notes_count: u8,
    pub xylophone_max_sim_notes: usize,
    /// Strike length in milliseconds
    pub xylophone_note_length: u64,
    /// 1 starts the operator console
    #[serde(default)]
    pub start_console: u8,
    /// Output pins per bank
    #[serde(default = "default_bank_size")]
    pub bank_size: u8,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_inter_track_pause_ms")]
    pub inter_track_pause_ms: u64,
    /// Mirror striker activity to the first MIDI output port containing this name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_mirror_port: Option<String>,
}

impl SetupConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read setup file {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("invalid setup file {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: SetupConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_level > 4 {
            bail!("LOG_LEVEL must be within 0..=4, got {}", self.log_level);
        }
        if self.xylophone_notes_count == 0 {
            bail!("XYLOPHONE_NOTES_COUNT must be positive");
        }
        if self.xylophone_lowest_note as u16 + self.xylophone_notes_count as u16 - 1 > 127 {
            bail!(
                "xylophone range {} + {} exceeds MIDI note 127",
                self.xylophone_lowest_note,
                self.xylophone_notes_count
            );
        }
        if self.bank_size == 0 {
            bail!("BANK_SIZE must be positive");
        }
        if self.xylophone_notes_count as u16 > 2 * self.bank_size as u16 {
            bail!(
                "{} notes do not fit on two banks of {} pins",
                self.xylophone_notes_count,
                self.bank_size
            );
        }
        if self.xylophone_max_sim_notes == 0 {
            bail!("XYLOPHONE_MAX_SIM_NOTES must be positive");
        }
        if self.poll_interval_ms == 0 {
            bail!("POLL_INTERVAL_MS must be positive");
        }
        Ok(())
    }

    pub fn console_enabled(&self) -> bool {
        self.start_console == 1
    }

    pub fn note_length(&self) -> Duration {
        Duration::from_millis(self.xylophone_note_length)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn inter_track_pause(&self) -> Duration {
        Duration::from_millis(self.inter_track_pause_ms)
    }
}
