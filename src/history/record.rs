//! Generated-audio records and their identifiers.

use std::fmt;

use serde::Serialize;

use crate::audio::AudioHandle;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Session-unique record identifier.
///
/// Derived from the creation time in epoch milliseconds, bumped when needed
/// so that identifiers stay strictly increasing (two clips finishing in the
/// same millisecond still get distinct ids).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates strictly increasing [`RecordId`]s from wall-clock instants.
#[derive(Debug, Default)]
pub struct RecordIdAllocator {
    last: Option<u64>,
}

impl RecordIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for a record created at `created_at_ms`.
    ///
    /// ```rust
    /// use tts_studio::history::{RecordId, RecordIdAllocator};
    ///
    /// let mut ids = RecordIdAllocator::new();
    /// assert_eq!(ids.next(1_000), RecordId(1_000));
    /// assert_eq!(ids.next(1_000), RecordId(1_001)); // same millisecond
    /// assert_eq!(ids.next(900), RecordId(1_002));   // clock stepped back
    /// ```
    pub fn next(&mut self, created_at_ms: i64) -> RecordId {
        let wall = u64::try_from(created_at_ms).unwrap_or(0);
        let id = match self.last {
            Some(last) if wall <= last => last + 1,
            _ => wall,
        };
        self.last = Some(id);
        RecordId(id)
    }
}

// ---------------------------------------------------------------------------
// GeneratedAudioRecord
// ---------------------------------------------------------------------------

/// One successfully generated clip.
///
/// Immutable after creation.  The record is the sole owner of its
/// [`AudioHandle`]; the [`HistoryStore`](super::HistoryStore) revokes it when
/// the record is removed.
#[derive(Debug)]
pub struct GeneratedAudioRecord {
    pub id: RecordId,
    /// Submitted text, already trimmed.
    pub text: String,
    /// Language name used for the request (e.g. `"Italian"`).
    pub language: String,
    /// Voice name used for the request (e.g. `"Kore"`).
    pub voice_name: String,
    pub audio_handle: AudioHandle,
    /// Creation instant in epoch milliseconds.
    pub created_at: i64,
    pub duration_secs: f64,
}

impl GeneratedAudioRecord {
    /// Borrow-free view of this record for rendering.
    pub fn entry(&self) -> HistoryEntry {
        HistoryEntry {
            id: self.id,
            text: self.text.clone(),
            language: self.language.clone(),
            voice_name: self.voice_name.clone(),
            audio_url: self.audio_handle.to_string(),
            created_at: self.created_at,
            duration_secs: self.duration_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// Immutable copy of a record's display fields, produced by
/// [`HistoryStore::snapshot`](super::HistoryStore::snapshot).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: RecordId,
    pub text: String,
    pub language: String,
    pub voice_name: String,
    pub audio_url: String,
    pub created_at: i64,
    pub duration_secs: f64,
}

impl HistoryEntry {
    /// Duration formatted as `m:ss` for the history list.
    pub fn duration_label(&self) -> String {
        let total = self.duration_secs.max(0.0).round() as u64;
        format!("{}:{:02}", total / 60, total % 60)
    }

    /// Creation time as local `HH:MM:SS`, or an empty string if out of range.
    pub fn created_label(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.created_at)
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// download_file_name
// ---------------------------------------------------------------------------

/// File name a record downloads as: `<prefix>-<id>.wav`.
///
/// ```rust
/// use tts_studio::history::{download_file_name, RecordId};
///
/// assert_eq!(
///     download_file_name("gemini-tts", RecordId(1_700_000_000_000)),
///     "gemini-tts-1700000000000.wav"
/// );
/// ```
pub fn download_file_name(prefix: &str, id: RecordId) -> String {
    format!("{prefix}-{id}.wav")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_follows_wall_clock_when_it_advances() {
        let mut ids = RecordIdAllocator::new();
        assert_eq!(ids.next(10), RecordId(10));
        assert_eq!(ids.next(25), RecordId(25));
    }

    #[test]
    fn allocator_never_repeats() {
        let mut ids = RecordIdAllocator::new();
        let a = ids.next(5);
        let b = ids.next(5);
        let c = ids.next(4);
        assert!(a < b && b < c);
    }

    #[test]
    fn allocator_clamps_negative_instants() {
        let mut ids = RecordIdAllocator::new();
        assert_eq!(ids.next(-50), RecordId(0));
        assert_eq!(ids.next(-50), RecordId(1));
    }

    fn entry(duration_secs: f64) -> HistoryEntry {
        HistoryEntry {
            id: RecordId(1),
            text: "Hello".into(),
            language: "English".into(),
            voice_name: "Kore".into(),
            audio_url: "blob:tts-studio/0".into(),
            created_at: 0,
            duration_secs,
        }
    }

    #[test]
    fn duration_label_formats_minutes() {
        assert_eq!(entry(1.0).duration_label(), "0:01");
        assert_eq!(entry(75.4).duration_label(), "1:15");
        assert_eq!(entry(0.0).duration_label(), "0:00");
    }

    #[test]
    fn created_label_is_clock_time() {
        let label = entry(1.0).created_label();
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }
}
