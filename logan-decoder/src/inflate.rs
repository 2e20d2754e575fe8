//! Block decompression with ordered fallback strategies
//!
//! A decrypted Logan block is normally a GZIP-framed deflate stream, but
//! field-collected files also contain raw zlib streams and, in corrupt files,
//! readable plaintext fragments. The strategies are tried in that fixed order
//! and the first success wins; each is a pure function over the block bytes.

use flate2::{Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ParseError, Result};

/// Which strategy produced a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecompressionMethod {
    /// GZIP header parsed, embedded raw-deflate payload inflated
    GzipDeflate,
    /// Whole block inflated as a zlib-wrapped deflate stream
    RawZlib,
    /// Block looked like readable text and was passed through verbatim
    PassthroughPlaintext,
}

impl fmt::Display for DecompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecompressionMethod::GzipDeflate => write!(f, "gzip"),
            DecompressionMethod::RawZlib => write!(f, "zlib"),
            DecompressionMethod::PassthroughPlaintext => write!(f, "plaintext"),
        }
    }
}

/// One successfully decompressed block, ordered by source block position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompressedChunk {
    pub text: String,
    pub method: DecompressionMethod,
}

/// Output buffer growth multiples tried in order. Log payloads compress well,
/// so the first multiple usually suffices.
const BUFFER_MULTIPLES: [usize; 4] = [4, 8, 16, 32];

/// Floor for the output buffer so tiny inputs still get a usable buffer
const MIN_BUFFER: usize = 64 * 1024;

/// GZIP header flag bits, in the order their fields appear in the stream
const FEXTRA: u8 = 0x04;
const FNAME: u8 = 0x08;
const FCOMMENT: u8 = 0x10;
const FHCRC: u8 = 0x02;

/// Decompress one block's plaintext, reporting which strategy succeeded
///
/// Fails with [`ParseError::DecompressionFailed`] only when every strategy
/// fails; the orchestrator converts that into a statistics increment.
pub fn decompress(plaintext: &[u8]) -> Result<DecompressedChunk> {
    if let Some(payload) = gzip_deflate_payload(plaintext) {
        if let Some(bytes) = inflate(payload, false) {
            return Ok(chunk(bytes, DecompressionMethod::GzipDeflate));
        }
        log::debug!("GZIP payload of {} bytes did not inflate", payload.len());
    }

    if let Some(bytes) = inflate(plaintext, true) {
        return Ok(chunk(bytes, DecompressionMethod::RawZlib));
    }

    if looks_like_plaintext(plaintext) {
        return Ok(chunk(
            plaintext.to_vec(),
            DecompressionMethod::PassthroughPlaintext,
        ));
    }

    Err(ParseError::DecompressionFailed(format!(
        "no strategy could decompress {} bytes",
        plaintext.len()
    )))
}

fn chunk(bytes: Vec<u8>, method: DecompressionMethod) -> DecompressedChunk {
    // Tolerant decode: a corrupt block with a few bad sequences still
    // contributes its readable remainder
    DecompressedChunk {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        method,
    }
}

/// Locate the raw-deflate payload inside a GZIP member
///
/// Requires the 2-byte magic and compression method 8 (deflate), then skips
/// the optional header fields in their fixed order: extra field, original
/// filename, comment, header CRC. The payload runs up to the trailing 8-byte
/// CRC32+ISIZE, which is not needed.
fn gzip_deflate_payload(data: &[u8]) -> Option<&[u8]> {
    if data.len() < 10 || data[0] != 0x1f || data[1] != 0x8b || data[2] != 0x08 {
        return None;
    }

    let flags = data[3];
    let mut index = 10;

    if flags & FEXTRA != 0 {
        if index + 2 > data.len() {
            return None;
        }
        let xlen = data[index] as usize | ((data[index + 1] as usize) << 8);
        index += 2 + xlen;
    }
    if flags & FNAME != 0 {
        while index < data.len() && data[index] != 0 {
            index += 1;
        }
        index += 1; // nul terminator
    }
    if flags & FCOMMENT != 0 {
        while index < data.len() && data[index] != 0 {
            index += 1;
        }
        index += 1;
    }
    if flags & FHCRC != 0 {
        index += 2;
    }

    let trailer_start = data.len().checked_sub(8)?;
    if index >= trailer_start {
        return None;
    }
    Some(&data[index..trailer_start])
}

/// Inflate a deflate stream into a growing destination buffer
///
/// `zlib_header` selects between a zlib-wrapped stream and a raw deflate
/// payload. Retries with progressively larger buffers until the stream ends
/// or all multiples are exhausted.
fn inflate(data: &[u8], zlib_header: bool) -> Option<Vec<u8>> {
    if data.is_empty() {
        return None;
    }
    for multiple in BUFFER_MULTIPLES {
        let capacity = std::cmp::max(data.len() * multiple, MIN_BUFFER);
        let mut out = Vec::with_capacity(capacity);
        let mut decoder = Decompress::new(zlib_header);
        match decoder.decompress_vec(data, &mut out, FlushDecompress::Finish) {
            Ok(Status::StreamEnd) => return Some(out),
            Ok(_) => continue, // buffer too small, retry larger
            Err(e) => {
                log::trace!("inflate failed (zlib_header={}): {}", zlib_header, e);
                return None;
            }
        }
    }
    None
}

/// Heuristic for blocks that were never compressed in the first place
///
/// Samples the first ~100 bytes: mostly printable ASCII, or at least two
/// JSON-ish characters, is taken as already-uncompressed text. Keeps readable
/// fragments from corrupt blocks instead of discarding them outright.
fn looks_like_plaintext(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let sample = &data[..data.len().min(100)];

    let printable = sample
        .iter()
        .filter(|&&b| (0x20..0x7f).contains(&b) || b == b'\n' || b == b'\r' || b == b'\t')
        .count();
    if printable as f64 / sample.len() as f64 > 0.8 {
        return true;
    }

    let json_markers = sample
        .iter()
        .filter(|&&b| b == b'{' || b == b'}' || b == b'"')
        .count();
    json_markers >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_gzip_block() {
        let text = "{\"c\":\"hello\"}\n";
        let chunk = decompress(&gzip(text.as_bytes())).unwrap();
        assert_eq!(chunk.method, DecompressionMethod::GzipDeflate);
        assert_eq!(chunk.text, text);
    }

    #[test]
    fn test_gzip_block_with_optional_header_fields() {
        // Hand-build a member with FNAME and FCOMMENT set
        let text = b"log line payload";
        let mut deflated = Vec::new();
        let mut enc = DeflateEncoder::new(&mut deflated, Compression::default());
        enc.write_all(text).unwrap();
        enc.finish().unwrap();

        let mut member = vec![0x1f, 0x8b, 0x08, FNAME | FCOMMENT, 0, 0, 0, 0, 0, 0xff];
        member.extend_from_slice(b"original.log\0");
        member.extend_from_slice(b"a comment\0");
        member.extend_from_slice(&deflated);
        member.extend_from_slice(&[0u8; 8]); // CRC32+ISIZE, unchecked

        let chunk = decompress(&member).unwrap();
        assert_eq!(chunk.method, DecompressionMethod::GzipDeflate);
        assert_eq!(chunk.text.as_bytes(), text);
    }

    #[test]
    fn test_zlib_fallback() {
        let text = "raw zlib stream without a gzip frame\n";
        let chunk = decompress(&zlib(text.as_bytes())).unwrap();
        assert_eq!(chunk.method, DecompressionMethod::RawZlib);
        assert_eq!(chunk.text, text);
    }

    #[test]
    fn test_plaintext_passthrough() {
        let text = "already readable log text, never compressed";
        let chunk = decompress(text.as_bytes()).unwrap();
        assert_eq!(chunk.method, DecompressionMethod::PassthroughPlaintext);
        assert_eq!(chunk.text, text);
    }

    #[test]
    fn test_json_marker_heuristic() {
        // Mostly non-printable, but carries JSON braces
        let mut data = vec![0x00u8; 90];
        data.extend_from_slice(b"{\"c\":1}");
        assert!(looks_like_plaintext(&data[80..]));
    }

    #[test]
    fn test_undecompressable_block_fails() {
        let data = [0x00u8, 0x01, 0x02, 0x03, 0x9c, 0x05];
        match decompress(&data) {
            Err(ParseError::DecompressionFailed(_)) => {}
            other => panic!("expected DecompressionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_block_fails() {
        assert!(decompress(&[]).is_err());
    }

    #[test]
    fn test_truncated_gzip_falls_back() {
        // Valid magic but the member is cut off before any deflate payload
        let data = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0, 0xff];
        assert!(decompress(&data).is_err());
    }

    #[test]
    fn test_lossy_utf8_decode() {
        let mut text = b"good prefix ".to_vec();
        text.push(0xFF); // invalid UTF-8
        text.extend_from_slice(b" good suffix");
        let chunk = decompress(&gzip(&text)).unwrap();
        assert!(chunk.text.starts_with("good prefix "));
        assert!(chunk.text.ends_with(" good suffix"));
        assert!(chunk.text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_buffer_growth_retry() {
        // One bit of entropy per byte deflates at roughly 8:1, so the first
        // x4 buffer is too small and the retry path has to kick in
        let mut state: u64 = 0x853c49e6748fea9b;
        let text: Vec<u8> = (0..1024 * 1024)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                if (state >> 33) & 1 == 1 {
                    b'1'
                } else {
                    b'0'
                }
            })
            .collect();
        let chunk = decompress(&gzip(&text)).unwrap();
        assert_eq!(chunk.method, DecompressionMethod::GzipDeflate);
        assert_eq!(chunk.text.as_bytes(), &text[..]);
    }
}
