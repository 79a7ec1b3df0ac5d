//! Newest-first history of generated clips.
//!
//! [`HistoryStore`] owns both the records and the [`BlobRegistry`] that backs
//! their audio handles, so every handle it hands out is also one it is
//! responsible for releasing.  Removal revokes exactly once; the UI never
//! touches handles directly.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::audio::{AudioHandle, BlobRegistry, EncodedAudio};

use super::record::{download_file_name, GeneratedAudioRecord, HistoryEntry, RecordId, RecordIdAllocator};

// ---------------------------------------------------------------------------
// HistoryError
// ---------------------------------------------------------------------------

/// Errors from history operations that touch the filesystem.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// No record with this id is in the store.
    #[error("no history entry with id {0}")]
    NotFound(RecordId),

    /// Writing the downloaded file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// HistoryStore
// ---------------------------------------------------------------------------

/// Ordered collection of [`GeneratedAudioRecord`]s, newest first.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: VecDeque<GeneratedAudioRecord>,
    blobs: BlobRegistry,
    ids: RecordIdAllocator,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Resource handles
    // -----------------------------------------------------------------------

    /// Register an encoded clip and return the handle a new record will own.
    pub fn register(&mut self, audio: EncodedAudio) -> AudioHandle {
        self.blobs.register(audio)
    }

    /// Allocate the id for a record created at `created_at_ms`.
    pub fn next_id(&mut self, created_at_ms: i64) -> RecordId {
        self.ids.next(created_at_ms)
    }

    /// The encoded clip behind record `id`.
    pub fn resolve(&self, id: RecordId) -> Option<Arc<EncodedAudio>> {
        self.get(id).and_then(|r| self.blobs.resolve(&r.audio_handle))
    }

    // -----------------------------------------------------------------------
    // Collection operations
    // -----------------------------------------------------------------------

    /// Insert `record` at the front.
    pub fn append(&mut self, record: GeneratedAudioRecord) {
        log::debug!("history: append {} ({:.2}s)", record.id, record.duration_secs);
        self.records.push_front(record);
    }

    /// Remove the record with `id` and release its audio handle.
    ///
    /// Returns `false` (and does nothing) when no such record exists.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let Some(index) = self.records.iter().position(|r| r.id == id) else {
            return false;
        };
        let Some(record) = self.records.remove(index) else {
            return false;
        };
        self.release(&record);
        log::debug!("history: removed {id}");
        true
    }

    /// Remove every record, releasing each handle.  Returns how many were
    /// removed.
    pub fn clear(&mut self) -> usize {
        let removed: Vec<_> = self.records.drain(..).collect();
        for record in &removed {
            self.release(record);
        }
        removed.len()
    }

    /// Display copies of all records, newest first.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.records.iter().map(GeneratedAudioRecord::entry).collect()
    }

    pub fn get(&self, id: RecordId) -> Option<&GeneratedAudioRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Handles that currently resolve.  Equals [`len`](Self::len) unless a
    /// handle was registered but never attached to a record.
    pub fn live_handles(&self) -> usize {
        self.blobs.live_count()
    }

    /// Total handle releases performed by this store.
    pub fn released_handles(&self) -> u64 {
        self.blobs.revocation_count()
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    /// Write record `id`'s WAV file into `dir` as `<prefix>-<id>.wav`.
    ///
    /// # Errors
    ///
    /// [`HistoryError::NotFound`] for an unknown id, [`HistoryError::Write`]
    /// when the directory cannot be created or the file cannot be written.
    pub fn download(&self, id: RecordId, dir: &Path, prefix: &str) -> Result<PathBuf, HistoryError> {
        let audio = self.resolve(id).ok_or(HistoryError::NotFound(id))?;
        let path = dir.join(download_file_name(prefix, id));

        std::fs::create_dir_all(dir)
            .and_then(|()| std::fs::write(&path, audio.as_bytes()))
            .map_err(|source| HistoryError::Write {
                path: path.clone(),
                source,
            })?;

        log::info!("history: downloaded {id} to {}", path.display());
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn release(&mut self, record: &GeneratedAudioRecord) {
        if let Err(fault) = self.blobs.revoke(&record.audio_handle) {
            log::error!("history: internal fault releasing record {}: {fault}", record.id);
        }
    }
}

impl Drop for HistoryStore {
    fn drop(&mut self) {
        let remaining = self.clear();
        if remaining > 0 {
            log::debug!("history: released {remaining} handle(s) on teardown");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{decode, encode};
    use tempfile::tempdir;

    fn push(store: &mut HistoryStore, at_ms: i64, text: &str) -> RecordId {
        let audio = encode(&decode(&vec![0u8; 480], 24_000, 1).unwrap());
        let duration_secs = audio.duration_secs();
        let audio_handle = store.register(audio);
        let id = store.next_id(at_ms);
        store.append(GeneratedAudioRecord {
            id,
            text: text.into(),
            language: "English".into(),
            voice_name: "Kore".into(),
            audio_handle,
            created_at: at_ms,
            duration_secs,
        });
        id
    }

    fn ids(store: &HistoryStore) -> Vec<RecordId> {
        store.snapshot().iter().map(|e| e.id).collect()
    }

    #[test]
    fn snapshot_is_newest_first() {
        let mut store = HistoryStore::new();
        let r1 = push(&mut store, 1, "one");
        let r2 = push(&mut store, 2, "two");
        let r3 = push(&mut store, 3, "three");

        assert_eq!(ids(&store), vec![r3, r2, r1]);
        assert_eq!(store.snapshot()[0].text, "three");
    }

    #[test]
    fn remove_releases_exactly_once() {
        let mut store = HistoryStore::new();
        let r1 = push(&mut store, 1, "one");
        let r2 = push(&mut store, 2, "two");

        assert!(store.remove(r1));
        assert_eq!(store.released_handles(), 1);
        assert_eq!(store.live_handles(), 1);
        assert!(store.resolve(r1).is_none());
        assert!(store.resolve(r2).is_some());
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut store = HistoryStore::new();
        let r1 = push(&mut store, 1, "one");

        assert!(store.remove(r1));
        assert!(!store.remove(r1));
        assert!(!store.remove(RecordId(999)));
        assert_eq!(store.released_handles(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut store = HistoryStore::new();
        let r1 = push(&mut store, 1, "one");
        let r2 = push(&mut store, 2, "two");
        let r3 = push(&mut store, 3, "three");

        store.remove(r2);
        assert_eq!(ids(&store), vec![r3, r1]);
    }

    #[test]
    fn release_count_matches_removals_over_a_sequence() {
        let mut store = HistoryStore::new();
        let mut appended = Vec::new();
        for t in 0..10 {
            appended.push(push(&mut store, t, "clip"));
        }
        // Remove every other record, some twice.
        for id in appended.iter().step_by(2) {
            store.remove(*id);
            store.remove(*id);
        }

        assert_eq!(store.released_handles(), 5);
        assert_eq!(store.live_handles(), 5);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn clear_releases_everything() {
        let mut store = HistoryStore::new();
        push(&mut store, 1, "one");
        push(&mut store, 2, "two");

        assert_eq!(store.clear(), 2);
        assert_eq!(store.released_handles(), 2);
        assert_eq!(store.live_handles(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut store = HistoryStore::new();
        push(&mut store, 1, "one");
        let before = store.snapshot();
        let _ = store.snapshot();
        assert_eq!(before, store.snapshot());
        assert_eq!(store.released_handles(), 0);
    }

    #[test]
    fn ids_stay_unique_within_a_millisecond() {
        let mut store = HistoryStore::new();
        let a = push(&mut store, 7, "a");
        let b = push(&mut store, 7, "b");
        assert_ne!(a, b);
    }

    #[test]
    fn download_writes_named_wav() {
        let dir = tempdir().expect("temp dir");
        let mut store = HistoryStore::new();
        let id = push(&mut store, 1_700_000_000_000, "hello");

        let path = store.download(id, dir.path(), "gemini-tts").unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "gemini-tts-1700000000000.wav"
        );

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 480);
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn download_unknown_id_is_not_found() {
        let dir = tempdir().expect("temp dir");
        let store = HistoryStore::new();
        assert!(matches!(
            store.download(RecordId(1), dir.path(), "x"),
            Err(HistoryError::NotFound(RecordId(1)))
        ));
    }
}
