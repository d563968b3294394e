//! Single-track playback cursor
//!
//! Serves the events of one catalog track at a time. Only one track may be
//! active; starting another before `stop` is refused and leaves the active
//! cursor untouched. All calls return immediately.

use crate::catalog::TrackCatalog;
use crate::error::TransportError;
use crate::types::Event;
use log::{debug, error, info};
use std::sync::Arc;

/// Position of the active playback, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub track_index: usize,
    pub event_index: usize,
}

pub struct Transport {
    catalog: Arc<TrackCatalog>,
    cursor: Option<Cursor>,
}

impl Transport {
    pub fn new(catalog: Arc<TrackCatalog>) -> Self {
        Self {
            catalog,
            cursor: None,
        }
    }

    pub fn catalog(&self) -> &Arc<TrackCatalog> {
        &self.catalog
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn is_active(&self) -> bool {
        self.cursor.is_some()
    }

    /// Activate the cursor at the first event of `track_index`
    pub fn start(&mut self, track_index: usize) -> Result<(), TransportError> {
        let result = self.try_start(track_index);
        if let Err(e) = &result {
            error!("Cannot start playing file; {}", e);
        }
        result
    }

    fn try_start(&mut self, track_index: usize) -> Result<(), TransportError> {
        let track = self
            .catalog
            .get(track_index)
            .ok_or(TransportError::OutOfRange(track_index))?;
        if let Some(active) = self.cursor {
            return Err(TransportError::AlreadyPlaying(active.track_index));
        }

        info!("Starting playing file #{}: {}", track_index, track.name);
        self.cursor = Some(Cursor {
            track_index,
            event_index: 0,
        });
        Ok(())
    }

    /// Next event of the active track, or `None` once the track is exhausted.
    ///
    /// Without an active cursor this logs an error and also returns `None`.
    pub fn next_event(&mut self) -> Option<Event> {
        let Some(cursor) = self.cursor.as_mut() else {
            error!("Cannot step playing; {}", TransportError::NotPlaying);
            return None;
        };

        let events = &self.catalog.get(cursor.track_index)?.events;
        match events.get(cursor.event_index) {
            Some(event) => {
                debug!(
                    "Do step #{} on file #{}",
                    cursor.event_index, cursor.track_index
                );
                cursor.event_index += 1;
                Some(event.clone())
            }
            None => {
                debug!("End of file #{} reached", cursor.track_index);
                None
            }
        }
    }

    /// Deactivate the cursor
    pub fn stop(&mut self) -> Result<(), TransportError> {
        match self.cursor.take() {
            Some(cursor) => {
                let name = self
                    .catalog
                    .get(cursor.track_index)
                    .map(|t| t.name.as_str())
                    .unwrap_or_default();
                info!("Stopping playing file #{}: {}", cursor.track_index, name);
                Ok(())
            }
            None => {
                error!("Cannot stop playing; {}", TransportError::NotPlaying);
                Err(TransportError::NotPlaying)
            }
        }
    }
}
