//! `LIST/INFO` tag aggregation into ID3v2-bound strings.

use crate::fourcc::{
    FourCc, ID_CMNT, ID_COMM, ID_GENR, ID_IART, ID_ICMT, ID_ICRD, ID_IGNR, ID_IMED, ID_INAM,
    ID_INFO, ID_ITRK, ID_LIST, ID_TRCK,
};
use crate::riff::{scan_chunks, ChunkMap};
use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

/// A mapping from a raw `LIST/INFO` sub-chunk id (`INAM`, `IART`, ...) to its null-terminated
/// string payload, decoded. Later aggregation passes overwrite earlier entries for the same key.
pub type TagMap = HashMap<FourCc, String>;

/// The 11 sub-chunk ids this crate understands.
pub const RECOGNIZED_TAG_IDS: &[FourCc] = &[
    ID_INAM, ID_IART, ID_IMED, ID_ICRD, ID_ICMT, ID_CMNT, ID_COMM, ID_TRCK, ID_ITRK, ID_GENR,
    ID_IGNR,
];

/// An ID3v2 field, and the WAVE tag keys tried for it in order (first successful source read
/// wins initially, but later aggregation passes -- i.e. RIFF-nested over top-level -- can still
/// overwrite it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id3Field {
    Title,
    Artist,
    Album,
    Year,
    Comment,
    Track,
    Genre,
}

pub const ID3_FIELD_SOURCES: &[(Id3Field, &[FourCc])] = &[
    (Id3Field::Title, &[ID_INAM]),
    (Id3Field::Artist, &[ID_IART]),
    (Id3Field::Album, &[ID_IMED]),
    (Id3Field::Year, &[ID_ICRD]),
    (Id3Field::Comment, &[ID_COMM, ID_CMNT, ID_ICMT]),
    (Id3Field::Track, &[ID_TRCK, ID_ITRK]),
    (Id3Field::Genre, &[ID_GENR, ID_IGNR]),
];

/// Looks up the value for `field`, trying its source keys in order and returning the last one
/// that's actually present (last successful source wins).
pub fn lookup_field(tags: &TagMap, field: Id3Field) -> Option<&str> {
    let (_, sources) = ID3_FIELD_SOURCES.iter().find(|(f, _)| *f == field)?;
    sources.iter().filter_map(|id| tags.get(id)).last().map(String::as_str)
}

/// Walks `chunks` for any `LIST` chunk whose form type is `INFO`, re-scans its payload as a
/// sub-chunk stream, and merges the decoded strings into `tags` (last-writer-wins within this
/// single pass -- callers aggregate top-level then RIFF-nested maps to get overall precedence).
pub fn aggregate_tags<R: Read + Seek>(
    reader: &mut R,
    chunks: &ChunkMap,
    tags: &mut TagMap,
) -> std::io::Result<()> {
    let Some(list_desc) = chunks.get(&ID_LIST) else { return Ok(()) };

    reader.seek(SeekFrom::Start(list_desc.start))?;
    let mut form = [0u8; 4];
    reader.read_exact(&mut form)?;
    if FourCc::new(form) != ID_INFO {
        return Ok(());
    }

    let info_start = list_desc.start + 4;
    let info_size = list_desc.data_size - 4;
    let (sub_chunks, _diagnostics) = scan_chunks(reader, info_start, info_size)?;

    for (id, desc) in &sub_chunks {
        if !RECOGNIZED_TAG_IDS.contains(id) {
            continue;
        }
        reader.seek(SeekFrom::Start(desc.start))?;
        let mut buf = vec![0u8; desc.data_size as usize];
        reader.read_exact(&mut buf)?;
        let nul_at = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        let text = String::from_utf8_lossy(&buf[..nul_at]).into_owned();
        tags.insert(*id, text);
    }
    Ok(())
}
