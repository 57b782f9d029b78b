//! Per-adapter memoization of file lists.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::magnet::InfoHash;
use crate::types::File;

/// In-memory `info-hash -> files` map owned by one adapter instance.
///
/// Keyed by info-hash so magnets that differ only in trackers or display
/// name share an entry. Guarded by a mutex, so a shared adapter can be used
/// from several tasks. Entries live until invalidated or the adapter drops.
#[derive(Debug, Default)]
pub struct FileCache {
    entries: Mutex<HashMap<InfoHash, Vec<File>>>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, info_hash: &InfoHash) -> Option<Vec<File>> {
        self.entries.lock().get(info_hash).cloned()
    }

    pub fn insert(&self, info_hash: InfoHash, files: Vec<File>) {
        self.entries.lock().insert(info_hash, files);
    }

    /// Drops the entry for `info_hash`; remote state may have changed.
    pub fn invalidate(&self, info_hash: &InfoHash) {
        if self.entries.lock().remove(info_hash).is_some() {
            tracing::debug!("Invalidated cached file list for {}", info_hash);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
