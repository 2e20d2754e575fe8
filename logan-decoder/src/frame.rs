//! Frame scanner for the Logan container layout
//!
//! A Logan file is a byte stream with no fixed record alignment: each block
//! starts with a one-byte marker (0x01), followed by a 4-byte big-endian
//! length and that many bytes of AES ciphertext. Anything between blocks is
//! skipped byte-by-byte, so a corrupt region costs only the block it sits in.

use byteorder::{BigEndian, ByteOrder};

/// Marker byte that opens every encrypted block
pub const BLOCK_MARKER: u8 = 0x01;

/// Bytes consumed by the marker and the length field together
const HEADER_LENGTH: usize = 5;

/// One marker-delimited, length-prefixed ciphertext unit
///
/// Invariant: `offset + 5 + length <= file length` - the scanner never yields
/// a block whose declared length runs past the end of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlock<'a> {
    /// Offset of the marker byte within the source buffer
    pub offset: usize,
    /// Declared ciphertext length from the 4-byte big-endian field
    pub length: u32,
    /// The ciphertext itself, borrowed from the source buffer
    pub ciphertext: &'a [u8],
}

/// Lazy scanner producing [`EncryptedBlock`]s from a raw file buffer
///
/// The scan is a single forward pass with one cursor. A marker whose length
/// field is zero or runs past the buffer is treated as spurious data: the
/// cursor advances one byte past the marker and scanning resumes, so a single
/// corrupt length field cannot discard the remainder of the file.
pub struct FrameScanner<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> FrameScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Fraction of the buffer consumed so far, in 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.data.is_empty() {
            1.0
        } else {
            self.cursor as f64 / self.data.len() as f64
        }
    }
}

impl<'a> Iterator for FrameScanner<'a> {
    type Item = EncryptedBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.data.len() {
            let marker_at = self.cursor;
            if self.data[marker_at] != BLOCK_MARKER {
                self.cursor += 1;
                continue;
            }

            // Fewer than 4 length bytes after the marker: end of stream
            if marker_at + HEADER_LENGTH > self.data.len() {
                log::debug!(
                    "Marker at offset {} with truncated length field, stopping scan",
                    marker_at
                );
                self.cursor = self.data.len();
                return None;
            }

            let length = BigEndian::read_u32(&self.data[marker_at + 1..marker_at + HEADER_LENGTH]);
            let body_start = marker_at + HEADER_LENGTH;
            let remaining = self.data.len() - body_start;

            if length == 0 || length as usize > remaining {
                // Spurious marker: resume one byte in, the length bytes may
                // themselves contain the next genuine marker
                log::debug!(
                    "Implausible block length {} at offset {} ({} bytes remain), resyncing",
                    length,
                    marker_at,
                    remaining
                );
                self.cursor = marker_at + 1;
                continue;
            }

            let end = body_start + length as usize;
            self.cursor = end;
            return Some(EncryptedBlock {
                offset: marker_at,
                length,
                ciphertext: &self.data[body_start..end],
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame one ciphertext payload with marker + big-endian length
    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![BLOCK_MARKER];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_single_block() {
        let data = frame(&[0xAA; 16]);
        let blocks: Vec<_> = FrameScanner::new(&data).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].offset, 0);
        assert_eq!(blocks[0].length, 16);
        assert_eq!(blocks[0].ciphertext, &[0xAA; 16]);
    }

    #[test]
    fn test_garbage_between_blocks_is_skipped() {
        let mut data = vec![0x00, 0xFF, 0x42];
        data.extend(frame(&[0x11; 16]));
        data.extend([0xDE, 0xAD, 0xBE, 0xEF]);
        data.extend(frame(&[0x22; 32]));

        let blocks: Vec<_> = FrameScanner::new(&data).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].ciphertext, &[0x11; 16]);
        assert_eq!(blocks[1].ciphertext, &[0x22; 32]);
    }

    #[test]
    fn test_oversized_length_resyncs() {
        // First marker declares far more bytes than remain; the valid block
        // after it must still be discovered
        let mut data = vec![BLOCK_MARKER, 0xFF, 0xFF, 0xFF, 0xFF];
        data.extend([0x33, 0x44]);
        data.extend(frame(&[0x55; 16]));

        let blocks: Vec<_> = FrameScanner::new(&data).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].ciphertext, &[0x55; 16]);
    }

    #[test]
    fn test_zero_length_resyncs() {
        let mut data = vec![BLOCK_MARKER, 0x00, 0x00, 0x00, 0x00];
        data.extend(frame(&[0x66; 16]));

        let blocks: Vec<_> = FrameScanner::new(&data).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].ciphertext, &[0x66; 16]);
    }

    #[test]
    fn test_marker_inside_bad_length_field_is_found() {
        // The bogus length field hides a genuine marker one byte in
        let mut data = vec![BLOCK_MARKER];
        data.extend(frame(&[0x77; 16])); // this frame's marker is data[1]
        // data[0]'s length field reads 0x01_0000_0010 > remaining, so the
        // scanner resyncs to offset 1 and finds the real block
        let blocks: Vec<_> = FrameScanner::new(&data).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].offset, 1);
        assert_eq!(blocks[0].ciphertext, &[0x77; 16]);
    }

    #[test]
    fn test_truncated_length_field_ends_scan() {
        let data = [0x00, BLOCK_MARKER, 0x00, 0x00];
        let mut scanner = FrameScanner::new(&data);
        assert!(scanner.next().is_none());
        assert_eq!(scanner.progress(), 1.0);
    }

    #[test]
    fn test_no_marker_at_all() {
        let data = [0x02u8, 0x03, 0x04, 0x05];
        assert_eq!(FrameScanner::new(&data).count(), 0);
    }

    #[test]
    fn test_progress_advances() {
        let mut data = frame(&[0x11; 16]);
        data.extend(frame(&[0x22; 16]));

        let mut scanner = FrameScanner::new(&data);
        assert_eq!(scanner.progress(), 0.0);
        scanner.next().unwrap();
        let mid = scanner.progress();
        assert!(mid > 0.0 && mid < 1.0);
        scanner.next().unwrap();
        assert_eq!(scanner.progress(), 1.0);
    }
}
