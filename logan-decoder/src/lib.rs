//! Logan Log Decoder Library
//!
//! A stateless, reusable library for decoding Logan mobile log containers:
//! marker-delimited, individually AES-128/CBC-encrypted and GZIP/deflate-
//! compressed blocks of newline-separated structured log records.
//!
//! # Architecture
//!
//! The library is the decode pipeline and nothing else:
//! - Scans the raw buffer for block frames, resynchronizing past garbage
//! - Decrypts each block independently (per-block IV reset, lenient PKCS7)
//! - Decompresses with an ordered fallback chain (GZIP → zlib → plaintext)
//! - Reassembles the surviving chunks in file order
//! - Parses the stream into typed log entries with partial-failure statistics
//!
//! Individual corrupt blocks are counted and skipped; the parse only fails
//! when nothing usable is recovered.
//!
//! The library does NOT:
//! - Persist the key/IV configuration (see [`config::KeyProvider`])
//! - Write decoded entries or history to disk (see [`sink`])
//! - Present, filter or search decoded entries
//!
//! All higher-level functionality is in the application layer (logan-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use logan_decoder::{KeyMaterial, LoganParser, StaticKeyProvider};
//! use std::path::Path;
//!
//! let keys = KeyMaterial::from_strs("0123456789012345", "0123456789012345").unwrap();
//! let parser = LoganParser::new(StaticKeyProvider::new(keys));
//!
//! let result = parser.parse_file(Path::new("app.logan")).unwrap();
//! println!(
//!     "{} entries from {} blocks ({} failed)",
//!     result.entries.len(),
//!     result.stats.total_blocks,
//!     result.stats.failed_blocks
//! );
//! ```

// Public modules
pub mod config;
pub mod frame;
pub mod inflate;
pub mod parser;
pub mod sink;
pub mod types;

// Re-export main types for convenience
pub use config::{KeyMaterial, KeyProvider, StaticKeyProvider, DEFAULT_AES_IV, DEFAULT_AES_KEY};
pub use inflate::DecompressionMethod;
pub use parser::{LoganParser, ProgressHandle};
pub use sink::{HistorySink, OutputSink, ParseRecord};
pub use types::{LogEntry, LogType, ParseError, ParseResult, ParseStatistics, Result};

// Internal modules (not exposed in public API)
mod cipher;
mod record;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
