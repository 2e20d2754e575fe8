//! Parse history persistence
//!
//! Keeps a capped, newest-first list of parse attempts (successful and
//! failed) in a JSON file. Implements the decoder's [`HistorySink`]
//! collaborator trait so the parse driver stays storage-agnostic.

use logan_decoder::{HistorySink, ParseRecord};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Oldest records beyond this count are dropped
pub const MAX_HISTORY_ENTRIES: usize = 50;

/// JSON-file-backed history store
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the stored records, newest first. A missing or unreadable file
    /// yields an empty history rather than an error.
    pub fn load(&self) -> Vec<ParseRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("History file {:?} is corrupt ({}), starting fresh", self.path, e);
                Vec::new()
            }
        }
    }

    fn save(&self, records: &[ParseRecord]) -> logan_decoder::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl HistorySink for HistoryStore {
    fn record(&self, record: ParseRecord) -> logan_decoder::Result<()> {
        let mut records = self.load();
        records.insert(0, record);
        records.truncate(MAX_HISTORY_ENTRIES);
        self.save(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_records_are_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        store
            .record(ParseRecord::success("first.logan", "first_logs.json", 10, 1))
            .unwrap();
        store
            .record(ParseRecord::failure("second.logan", 20, "wrong key"))
            .unwrap();

        let records = store.load();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_path, PathBuf::from("second.logan"));
        assert!(!records[0].success);
        assert_eq!(records[1].source_path, PathBuf::from("first.logan"));
        assert!(records[1].success);
    }

    #[test]
    fn test_history_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        for i in 0..MAX_HISTORY_ENTRIES + 5 {
            store
                .record(ParseRecord::failure(format!("{}.logan", i), 0, "e"))
                .unwrap();
        }

        let records = store.load();
        assert_eq!(records.len(), MAX_HISTORY_ENTRIES);
        // The newest record survives, the oldest five were dropped
        assert_eq!(
            records[0].source_path,
            PathBuf::from(format!("{}.logan", MAX_HISTORY_ENTRIES + 4))
        );
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();

        let store = HistoryStore::new(&path);
        assert!(store.load().is_empty());
        store
            .record(ParseRecord::failure("x.logan", 0, "e"))
            .unwrap();
        assert_eq!(store.load().len(), 1);
    }
}
