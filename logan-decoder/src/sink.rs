//! Output-side collaborator interfaces
//!
//! The core emits a [`ParseResult`](crate::types::ParseResult) and performs no
//! disk writes itself. Persisting the decoded entries and keeping a parse
//! history are collaborator concerns behind the traits here, so the pipeline
//! stays testable without touching the filesystem.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{ParseResult, Result, Timestamp};

/// One entry of the persisted parse history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseRecord {
    /// The Logan file that was parsed
    pub source_path: PathBuf,
    /// Where the decoded entries were written, if the parse succeeded
    pub output_path: Option<PathBuf>,
    /// When the parse finished
    pub timestamp: Timestamp,
    /// Size of the source file in bytes
    pub file_size_bytes: u64,
    /// Number of decoded entries
    pub entry_count: usize,
    pub success: bool,
    /// Human-readable failure message for failed parses
    pub error_message: Option<String>,
}

impl ParseRecord {
    /// Record for a parse that produced entries and an output file
    pub fn success(
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        file_size_bytes: u64,
        entry_count: usize,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: Some(output_path.into()),
            timestamp: Utc::now(),
            file_size_bytes,
            entry_count,
            success: true,
            error_message: None,
        }
    }

    /// Record for a parse that terminated with an error
    pub fn failure(
        source_path: impl Into<PathBuf>,
        file_size_bytes: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: None,
            timestamp: Utc::now(),
            file_size_bytes,
            entry_count: 0,
            success: false,
            error_message: Some(error_message.into()),
        }
    }

    /// File size formatted for display (B / KB / MB)
    pub fn file_size_formatted(&self) -> String {
        const KB: f64 = 1024.0;
        const MB: f64 = 1024.0 * 1024.0;
        let size = self.file_size_bytes as f64;
        if size < KB {
            format!("{}B", self.file_size_bytes)
        } else if size < MB {
            format!("{:.1}KB", size / KB)
        } else {
            format!("{:.1}MB", size / MB)
        }
    }
}

/// Collaborator that serializes decoded entries to disk
pub trait OutputSink {
    /// Write the entries of `result` for `source`, returning where they landed
    fn write_entries(&self, source: &Path, result: &ParseResult) -> Result<PathBuf>;
}

/// Collaborator that persists parse history entries
pub trait HistorySink {
    fn record(&self, record: ParseRecord) -> Result<()>;
}
