//! Flat RIFF chunk scanning.
//!
//! A chunk is read through a view bounded by its own declared size, so an over-long declared
//! size can never escape its parent. This scanner doesn't validate any particular form type, it
//! just walks a flat sequence of chunks within `[start, start + pad16(max_data_size))` and hands
//! back whatever it found plus a list of diagnostics; it only fails on a genuine I/O error.

use crate::fourcc::FourCc;
use byteorder::{ReadBytesExt, LE};
use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};

/// The location and size of one chunk's payload within its underlying stream.
///
/// `start` is the offset of the first payload byte; `data_size` is the *unpadded* length
/// declared by the chunk header, not rounded up to an even boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub start: u64,
    pub data_size: u32,
}

impl ChunkDescriptor {
    /// The offset one past the last payload byte, *including* the pad byte if `data_size` is odd.
    pub fn end(&self) -> u64 {
        self.start + pad16(self.data_size)
    }
}

/// A mapping from chunk id to where its payload lives. Duplicate ids keep only the last
/// occurrence; see `scan_chunks`'s diagnostics for when that happened.
pub type ChunkMap = HashMap<FourCc, ChunkDescriptor>;

/// Rounds `n` up to the next even number: the RIFF padding rule, `n + (n & 1)`.
pub const fn pad16(n: u32) -> u64 {
    (n as u64) + (n & 1) as u64
}

/// Scans a flat sequence of `{ id: FourCc, size: u32 LE, payload, pad? }` records starting at
/// `start` within `reader`, stopping once `pad16(max_data_size)` bytes have been consumed.
///
/// Never fails except on a genuine I/O error from the underlying reader; anything else
/// (a truncated header, a chunk whose declared size overruns the parent, a duplicate id) is
/// recorded as a diagnostic string and scanning continues or stops cleanly.
pub fn scan_chunks<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    max_data_size: u32,
) -> io::Result<(ChunkMap, Vec<String>)> {
    let mut chunks = ChunkMap::new();
    let mut diagnostics = Vec::new();
    let end = start + pad16(max_data_size);

    reader.seek(SeekFrom::Start(start))?;
    loop {
        let pos = reader.stream_position()?;
        if pos >= end {
            break;
        }

        let id = match read_fourcc(reader) {
            Ok(Some(id)) => id,
            Ok(None) => break,
            Err(e) => return Err(e),
        };
        let size = match reader.read_u32::<LE>() {
            Ok(size) => size,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                diagnostics.push(format!("reading chunk id and size failed near offset {pos:#x}"));
                break;
            }
            Err(e) => return Err(e),
        };

        let payload_start = reader.stream_position()?;
        let candidate = ChunkDescriptor { start: payload_start, data_size: size };
        if candidate.end() > end {
            diagnostics.push(format!("less data available than claimed in chunk \"{id}\""));
            break;
        }

        if chunks.insert(id, candidate).is_some() {
            diagnostics.push(format!("duplicate chunk \"{id}\", using the latest one"));
        }

        reader.seek(SeekFrom::Start(candidate.end()))?;
    }

    Ok((chunks, diagnostics))
}

/// Reads a 4-byte chunk id, returning `Ok(None)` on a clean EOF (no partial read at all).
fn read_fourcc<R: Read>(reader: &mut R) -> io::Result<Option<FourCc>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated chunk id"))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(Some(FourCc::new(buf)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fourcc::FourCc;
    use std::io::Cursor;

    fn chunk(id: &str, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&FourCc::from_str(id).as_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            buf.push(0);
        }
        buf
    }

    #[test]
    fn scans_a_simple_sequence() {
        let mut data = Vec::new();
        data.extend(chunk("fmt ", &[1, 2, 3, 4]));
        data.extend(chunk("data", &[5, 6]));
        let len = data.len() as u32;
        let mut cursor = Cursor::new(data);

        let (chunks, diags) = scan_chunks(&mut cursor, 0, len).unwrap();
        assert!(diags.is_empty());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[&FourCc::from_str("fmt ")].data_size, 4);
        assert_eq!(chunks[&FourCc::from_str("data")].data_size, 2);
    }

    #[test]
    fn odd_payload_consumes_pad_byte() {
        let mut data = chunk("data", &[1, 2, 3]); // odd-sized -> one pad byte
        data.extend(chunk("fmt ", &[9, 9, 9, 9]));
        let len = data.len() as u32;
        let mut cursor = Cursor::new(data);

        let (chunks, diags) = scan_chunks(&mut cursor, 0, len).unwrap();
        assert!(diags.is_empty());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[&FourCc::from_str("data")].data_size, 3);
    }

    #[test]
    fn odd_payload_ending_exactly_at_pad_byte_is_clean() {
        let data = chunk("data", &[1, 2, 3]);
        let len = data.len() as u32;
        let mut cursor = Cursor::new(data);

        let (chunks, diags) = scan_chunks(&mut cursor, 0, len).unwrap();
        assert!(diags.is_empty());
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn duplicate_chunk_keeps_last_occurrence_with_diagnostic() {
        let mut data = chunk("fmt ", &[1, 1, 1, 1]);
        data.extend(chunk("fmt ", &[2, 2, 2, 2]));
        let len = data.len() as u32;
        let mut cursor = Cursor::new(data);

        let (chunks, diags) = scan_chunks(&mut cursor, 0, len).unwrap();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].contains("duplicate"));
        let desc = chunks[&FourCc::from_str("fmt ")];
        // The second chunk's payload starts after the first chunk + its header.
        assert_eq!(desc.data_size, 4);
        assert!(desc.start > 0);
    }

    #[test]
    fn truncated_trailing_chunk_is_discarded_not_recorded() {
        let mut data = chunk("fmt ", &[1, 2, 3, 4]);
        // Claim a "data" chunk bigger than what's actually present.
        data.extend_from_slice(&FourCc::from_str("data").as_bytes());
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&[0, 0]); // only 2 bytes present, not 100
        let len = data.len() as u32;
        let mut cursor = Cursor::new(data);

        let (chunks, diags) = scan_chunks(&mut cursor, 0, len).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks.contains_key(&FourCc::from_str("fmt ")));
        assert!(diags.iter().any(|d| d.contains("less data available")));
    }

    #[test]
    fn invariant_every_chunk_end_within_parent() {
        let mut data = Vec::new();
        data.extend(chunk("fmt ", &[0; 16]));
        data.extend(chunk("LIST", &[0; 5]));
        data.extend(chunk("data", &[0; 7]));
        let len = data.len() as u32;
        let mut cursor = Cursor::new(data);

        let (chunks, _) = scan_chunks(&mut cursor, 0, len).unwrap();
        for desc in chunks.values() {
            assert!(desc.end() <= len as u64);
        }
    }
}
