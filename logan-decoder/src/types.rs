//! Core types for the Logan decoder library
//!
//! This module defines the entry/statistics types the pipeline emits and the
//! error taxonomy. The decoder is stateless across parses - everything here
//! lives for the duration of a single parse call and is handed to the caller
//! afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::inflate::DecompressionMethod;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur during a parse
///
/// Per-block failures are never surfaced through this enum - they are counted
/// in [`ParseStatistics`] and the parse continues. Only the orchestrator's
/// terminal classification (nothing usable recovered) and malformed key
/// material produce a caller-visible error.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No block marker with a plausible length field was found anywhere
    #[error("No Logan blocks found: the file is not a Logan container")]
    InvalidFileFormat,

    /// Blocks were found but none survived decrypt + decompress
    #[error("All {0} blocks failed to decode: the AES key or IV is most likely wrong")]
    DecryptionFailed(usize),

    /// Blocks decoded but the reassembled stream holds no non-trivial text
    #[error("Parse produced no content: the recovered stream is empty")]
    EmptyResult,

    /// AES key is not exactly 16 bytes
    #[error("Invalid AES key: expected 16 bytes, got {0}")]
    InvalidKey(usize),

    /// AES IV is not exactly 16 bytes
    #[error("Invalid AES IV: expected 16 bytes, got {0}")]
    InvalidIv(usize),

    /// A single block could not be decompressed by any strategy.
    /// Raised per block, caught by the orchestrator, never surfaced.
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Logan log type codes (the `f` field of a record)
///
/// Single-character codes distinguishing the producer-side log channels.
/// Unknown codes are treated as [`LogType::Info`], matching the default
/// flag `"3"` used for lines without a usable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogType {
    Debug,
    Info,
    Error,
    Warning,
    Fatal,
    Network,
    Performance,
}

impl LogType {
    /// Map a flag code ("2".."8") to its log type; anything else is Info
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "2" => LogType::Debug,
            "4" => LogType::Error,
            "5" => LogType::Warning,
            "6" => LogType::Fatal,
            "7" => LogType::Network,
            "8" => LogType::Performance,
            _ => LogType::Info,
        }
    }

    /// The wire code for this log type
    pub fn code(&self) -> &'static str {
        match self {
            LogType::Debug => "2",
            LogType::Info => "3",
            LogType::Error => "4",
            LogType::Warning => "5",
            LogType::Fatal => "6",
            LogType::Network => "7",
            LogType::Performance => "8",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogType::Debug => "debug",
            LogType::Info => "info",
            LogType::Error => "error",
            LogType::Warning => "warning",
            LogType::Fatal => "fatal",
            LogType::Network => "network",
            LogType::Performance => "performance",
        };
        write!(f, "{}", name)
    }
}

/// One decoded log record
///
/// Created by the record parser, immutable once created. Ordering equals
/// order of appearance in the reassembled stream, which equals file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log message body (the `c` field)
    pub content: String,
    /// Log type code "2".."8" (the `f` field)
    pub flag: String,
    /// ISO-8601 instant derived from the `l` millisecond timestamp
    pub log_time: String,
    /// Producer thread name (the `n` field)
    pub thread_name: String,
    /// Producer thread id (the `i` field)
    pub thread_id: String,
    /// Whether the record was written on the main thread (the `m` field)
    pub is_main_thread: bool,
}

impl LogEntry {
    /// Build a plain-text record for a line that is not well-formed JSON.
    /// The whole trimmed line becomes the content; metadata gets defaults.
    pub fn plain_text(line: &str) -> Self {
        Self {
            content: line.to_string(),
            flag: "3".to_string(),
            log_time: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            thread_name: "unknown".to_string(),
            thread_id: "0".to_string(),
            is_main_thread: false,
        }
    }

    /// Log type of this entry (unknown flags map to Info)
    pub fn log_type(&self) -> LogType {
        LogType::from_flag(&self.flag)
    }
}

/// Counters accumulated over one parse
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStatistics {
    /// Blocks discovered by the frame scanner
    pub total_blocks: usize,
    /// Blocks that survived decrypt + decompress
    pub successful_blocks: usize,
    /// Blocks that failed at either stage
    pub failed_blocks: usize,
    /// Successful blocks inflated from a GZIP-framed deflate stream
    pub gzip_blocks: usize,
    /// Successful blocks inflated as a raw zlib stream
    pub zlib_blocks: usize,
    /// Successful blocks passed through as already-plaintext
    pub passthrough_blocks: usize,
    /// Lines decoded as structured JSON records
    pub structured_lines: usize,
    /// Lines that degraded to plain-text records
    pub plain_text_lines: usize,
    /// Empty lines skipped during record parsing
    pub empty_lines: usize,
}

impl ParseStatistics {
    /// Record one successfully decoded block and which strategy decompressed it
    pub fn record_block_success(&mut self, method: DecompressionMethod) {
        self.successful_blocks += 1;
        match method {
            DecompressionMethod::GzipDeflate => self.gzip_blocks += 1,
            DecompressionMethod::RawZlib => self.zlib_blocks += 1,
            DecompressionMethod::PassthroughPlaintext => self.passthrough_blocks += 1,
        }
    }

    /// Record one block that failed decrypt or decompress
    pub fn record_block_failure(&mut self) {
        self.failed_blocks += 1;
    }

    /// Fraction of discovered blocks that decoded, 0.0 when none were found
    pub fn block_success_rate(&self) -> f64 {
        if self.total_blocks == 0 {
            0.0
        } else {
            self.successful_blocks as f64 / self.total_blocks as f64
        }
    }
}

/// The sole output of the core pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Decoded entries in file order
    pub entries: Vec<LogEntry>,
    /// Counters accumulated while producing them
    pub stats: ParseStatistics,
}
