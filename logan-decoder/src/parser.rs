//! Parse orchestration
//!
//! Drives frame scanning, per-block decryption and decompression, stream
//! reassembly and record parsing, accumulating statistics along the way.
//! A block failing at any stage is counted and skipped - no single block
//! failure aborts the parse. Only when recovery leaves literally nothing
//! usable does the orchestrator classify a terminal failure.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::{KeyProvider, StaticKeyProvider};
use crate::frame::FrameScanner;
use crate::inflate::DecompressedChunk;
use crate::types::{ParseError, ParseResult, ParseStatistics, Result};
use crate::{cipher, inflate, record};

/// Progress fraction reached once the file is in memory
const PROGRESS_READ: f64 = 0.1;
/// Progress fraction reached once all blocks are decoded
const PROGRESS_DECODED: f64 = 0.7;
/// Progress fraction reached once records are parsed
const PROGRESS_PARSED: f64 = 0.9;
/// Span of the scan-and-decode phase
const DECODE_SPAN: f64 = PROGRESS_DECODED - PROGRESS_READ;

/// Observable progress of a parse, shared with the caller
///
/// Holds a single monotonically increasing fraction in 0.0..=1.0 plus a
/// parsing flag. Cloning is cheap; all clones observe the same parse.
#[derive(Clone, Debug, Default)]
pub struct ProgressHandle {
    inner: Arc<ProgressInner>,
}

#[derive(Debug, Default)]
struct ProgressInner {
    // f64 bits; non-negative IEEE 754 values order like their bit patterns,
    // so fetch_max keeps the fraction monotonic without a lock
    fraction_bits: AtomicU64,
    parsing: AtomicBool,
}

impl ProgressHandle {
    /// Current progress fraction, 0.0..=1.0
    pub fn fraction(&self) -> f64 {
        f64::from_bits(self.inner.fraction_bits.load(Ordering::Relaxed))
    }

    /// Whether a parse is currently in flight
    pub fn is_parsing(&self) -> bool {
        self.inner.parsing.load(Ordering::Relaxed)
    }

    fn begin(&self) {
        self.inner.fraction_bits.store(0, Ordering::Relaxed);
        self.inner.parsing.store(true, Ordering::Relaxed);
    }

    fn set(&self, fraction: f64) {
        self.inner
            .fraction_bits
            .fetch_max(fraction.to_bits(), Ordering::Relaxed);
    }

    fn finish(&self) {
        self.inner.parsing.store(false, Ordering::Relaxed);
    }
}

/// Concatenates successfully decompressed chunks in block-discovery order
///
/// No separator is inserted between chunks: the producer may split one log
/// line across a block boundary, and a separator would corrupt that line.
/// Failed blocks contribute nothing - they are skipped, not replaced by
/// placeholders.
#[derive(Default)]
struct StreamReassembler {
    text: String,
}

impl StreamReassembler {
    fn append(&mut self, chunk: &DecompressedChunk) {
        self.text.push_str(&chunk.text);
    }

    fn finish(self) -> String {
        self.text
    }
}

/// The main parser - entry point for decoding Logan files
///
/// Stateless across parses: statistics, the reassembled stream and the
/// decoded entries live only inside one `parse_*` call. The key/IV are read
/// from the provider once at the start of each parse.
pub struct LoganParser<P: KeyProvider> {
    key_provider: P,
    progress: ProgressHandle,
}

impl Default for LoganParser<StaticKeyProvider> {
    /// Parser using the well-known default Logan key and IV
    fn default() -> Self {
        Self::new(StaticKeyProvider::default())
    }
}

impl<P: KeyProvider> LoganParser<P> {
    pub fn new(key_provider: P) -> Self {
        Self {
            key_provider,
            progress: ProgressHandle::default(),
        }
    }

    /// Handle for observing progress of parses run on this parser
    pub fn progress_handle(&self) -> ProgressHandle {
        self.progress.clone()
    }

    /// Read a file and decode it end to end
    pub fn parse_file(&self, path: &Path) -> Result<ParseResult> {
        self.progress.begin();
        let result = self.run_file(path);
        self.progress.finish();
        result
    }

    /// Decode an already-loaded raw buffer
    pub fn parse_buffer(&self, data: &[u8]) -> Result<ParseResult> {
        self.progress.begin();
        let result = self.run_buffer(data);
        self.progress.finish();
        result
    }

    fn run_file(&self, path: &Path) -> Result<ParseResult> {
        log::info!("Parsing Logan file: {:?}", path);
        let data = std::fs::read(path)?;
        log::info!("Read {} bytes", data.len());
        self.run_buffer(&data)
    }

    fn run_buffer(&self, data: &[u8]) -> Result<ParseResult> {
        // Key material is read once and stays fixed even if the provider's
        // backing settings change mid-parse
        let keys = self.key_provider.key_material()?;
        self.progress.set(PROGRESS_READ);

        let mut stats = ParseStatistics::default();
        let mut reassembler = StreamReassembler::default();
        let mut scanner = FrameScanner::new(data);

        while let Some(block) = scanner.next() {
            stats.total_blocks += 1;
            self.progress
                .set(PROGRESS_READ + scanner.progress() * DECODE_SPAN);

            let plaintext = cipher::decrypt(block.ciphertext, &keys);
            match inflate::decompress(&plaintext) {
                Ok(chunk) => {
                    log::trace!(
                        "Block at offset {} decoded via {} ({} chars)",
                        block.offset,
                        chunk.method,
                        chunk.text.len()
                    );
                    stats.record_block_success(chunk.method);
                    reassembler.append(&chunk);
                }
                Err(e) => {
                    stats.record_block_failure();
                    log::warn!(
                        "Block at offset {} (length {}) failed to decode: {}",
                        block.offset,
                        block.length,
                        e
                    );
                }
            }
        }

        log::info!(
            "Processed {} blocks: {} succeeded, {} failed",
            stats.total_blocks,
            stats.successful_blocks,
            stats.failed_blocks
        );

        let stream = reassembler.finish();
        if stats.total_blocks == 0 {
            return Err(ParseError::InvalidFileFormat);
        }
        if stats.successful_blocks == 0 {
            return Err(ParseError::DecryptionFailed(stats.total_blocks));
        }
        if stream.trim().is_empty() {
            return Err(ParseError::EmptyResult);
        }
        self.progress.set(PROGRESS_DECODED);

        let entries = record::parse_content(&stream, &mut stats);
        self.progress.set(PROGRESS_PARSED);

        log::info!("Decoded {} log entries", entries.len());
        self.progress.set(1.0);
        Ok(ParseResult { entries, stats })
    }
}
