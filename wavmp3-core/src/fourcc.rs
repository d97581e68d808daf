use std::fmt;

/// A four-byte RIFF chunk identifier (`"RIFF"`, `"fmt "`, `"data"`, ...).
///
/// FOURCCs are opaque tags, not necessarily valid UTF-8, but in practice they're always
/// printable ASCII. `Display` renders them that way and falls back to a hex dump otherwise.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn from_str(s: &str) -> Self {
        let b = s.as_bytes();
        Self([b[0], b[1], b[2], b[3]])
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|&b| b.is_ascii_graphic() || b == b' ') {
            // SAFETY: just checked every byte is ASCII.
            write!(f, "{}", std::str::from_utf8(&self.0).unwrap())
        } else {
            write!(f, "{:02x}{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2], self.0[3])
        }
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

/// `"RIFF"`
pub const ID_RIFF: FourCc = FourCc::from_str("RIFF");
/// `"WAVE"`, the RIFF form type this crate understands.
pub const ID_WAVE: FourCc = FourCc::from_str("WAVE");
/// `"fmt "`
pub const ID_FMT: FourCc = FourCc::from_str("fmt ");
/// `"data"`
pub const ID_DATA: FourCc = FourCc::from_str("data");
/// `"LIST"`
pub const ID_LIST: FourCc = FourCc::from_str("LIST");
/// `"INFO"`, the only recognized form type of a `LIST` chunk.
pub const ID_INFO: FourCc = FourCc::from_str("INFO");

/// Recognized `LIST/INFO` sub-chunk ids that map to ID3v2 tag fields.
pub const ID_INAM: FourCc = FourCc::from_str("INAM");
pub const ID_IART: FourCc = FourCc::from_str("IART");
pub const ID_IMED: FourCc = FourCc::from_str("IMED");
pub const ID_ICRD: FourCc = FourCc::from_str("ICRD");
pub const ID_ICMT: FourCc = FourCc::from_str("ICMT");
pub const ID_CMNT: FourCc = FourCc::from_str("CMNT");
pub const ID_COMM: FourCc = FourCc::from_str("COMM");
pub const ID_TRCK: FourCc = FourCc::from_str("TRCK");
pub const ID_ITRK: FourCc = FourCc::from_str("ITRK");
pub const ID_GENR: FourCc = FourCc::from_str("GENR");
pub const ID_IGNR: FourCc = FourCc::from_str("IGNR");
