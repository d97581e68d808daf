//! Builds an ID3v2.3 tag header to prepend to an encoded MP3 stream, built directly against the
//! public ID3v2.3 frame format rather than through a library's tagging API.

use crate::tags::{lookup_field, Id3Field, TagMap};

const FRAME_IDS: &[(Id3Field, &[u8; 4])] = &[
    (Id3Field::Title, b"TIT2"),
    (Id3Field::Artist, b"TPE1"),
    (Id3Field::Album, b"TALB"),
    (Id3Field::Year, b"TYER"),
    (Id3Field::Comment, b"COMM"),
    (Id3Field::Track, b"TRCK"),
    (Id3Field::Genre, b"TCON"),
];

/// Builds a complete ID3v2.3 tag (10-byte header plus one text frame per populated field). Text
/// frames use ISO-8859-1 encoding (encoding byte `0x00`) when the value is pure Latin-1, and UTF-16
/// with BOM (encoding byte `0x01`) otherwise -- `COMM` frames additionally carry a 3-byte language
/// code and an empty short-description before the text, per the ID3v2.3 frame layout.
///
/// Returns `None` if no recognized field had a value, so callers can skip writing a tag entirely.
pub fn build_id3v2_tag(tags: &TagMap) -> Option<Vec<u8>> {
    let mut frames = Vec::new();
    for (field, id) in FRAME_IDS {
        let Some(value) = lookup_field(tags, *field) else { continue };
        if value.is_empty() {
            continue;
        }
        frames.extend_from_slice(&build_frame(*id, *field, value));
    }
    if frames.is_empty() {
        return None;
    }

    let mut tag = Vec::with_capacity(10 + frames.len());
    tag.extend_from_slice(b"ID3");
    tag.push(3); // version 2.3.0
    tag.push(0); // revision
    tag.push(0); // flags
    tag.extend_from_slice(&synchsafe(frames.len() as u32));
    tag.extend_from_slice(&frames);
    Some(tag)
}

fn build_frame(id: &[u8; 4], field: Id3Field, value: &str) -> Vec<u8> {
    let mut payload = Vec::new();
    if field == Id3Field::Comment {
        payload.extend_from_slice(b"eng");
        payload.extend_from_slice(&encode_text(""));
    }
    payload.extend_from_slice(&encode_text(value));

    let mut frame = Vec::with_capacity(10 + payload.len());
    frame.extend_from_slice(id);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0, 0]); // flags
    frame.extend_from_slice(&payload);
    frame
}

/// Encodes one ID3v2 text value, choosing Latin-1 when every character fits and UTF-16LE with a
/// byte-order mark otherwise.
fn encode_text(value: &str) -> Vec<u8> {
    if value.chars().all(|c| (c as u32) <= 0xFF) {
        let mut out = vec![0u8]; // encoding: ISO-8859-1
        out.extend(value.chars().map(|c| c as u8));
        out.push(0); // terminator
        out
    } else {
        let mut out = vec![1u8]; // encoding: UTF-16 with BOM
        out.extend_from_slice(&0xFEFFu16.to_le_bytes());
        for unit in value.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&[0, 0]); // terminator
        out
    }
}

/// Encodes `value` as a 4-byte synchsafe integer (7 significant bits per byte), as ID3v2.3 tag
/// sizes require.
fn synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}
