//! Session history of generated clips.
//!
//! * [`HistoryStore`]: newest-first records; owns and releases every audio
//!   handle.
//! * [`GeneratedAudioRecord`] / [`HistoryEntry`]: the record and its
//!   render-friendly copy.
//! * [`RecordId`] / [`RecordIdAllocator`]: creation-time-derived ids that are
//!   never reused within a session.

pub mod record;
pub mod store;

pub use record::{
    download_file_name, GeneratedAudioRecord, HistoryEntry, RecordId, RecordIdAllocator,
};
pub use store::{HistoryError, HistoryStore};
