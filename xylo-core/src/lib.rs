//! # Xylo Core
//!
//! Hardware-independent half of the self-playing xylophone: turns MIDI files
//! into compact playback events, keeps the catalog of playable tracks and
//! walks a single playback cursor over it.
//!
//! ## Example
//!
//! ```ignore
//! use xylo_core::{TrackCatalog, Transport};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(TrackCatalog::scan("midi".as_ref())?);
//! let mut transport = Transport::new(catalog);
//! transport.start(0)?;
//! while let Some(event) = transport.next_event() {
//!     println!("{}", event);
//! }
//! ```

pub mod catalog;
pub mod compiler;
pub mod error;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use catalog::{Track, TrackCatalog, TrackInfo};
pub use compiler::{compile_bytes, compile_file, CompiledTrack};
pub use error::{CatalogError, CompileError, TransportError};
pub use transport::{Cursor, Transport};
pub use types::{Event, NoteSet, TEMPO_LIST};
