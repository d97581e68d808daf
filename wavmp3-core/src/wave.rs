//! WAVE format validation: turns a scanned `ChunkMap` into a `PcmDescriptor` or a rejection.

use crate::error::{Error, Result};
use crate::fourcc::{ID_DATA, ID_FMT};
use crate::guid::{Guid, KSDATAFORMAT_SUBTYPE_IEEE_FLOAT, KSDATAFORMAT_SUBTYPE_PCM};
use crate::riff::{ChunkDescriptor, ChunkMap};
use byteorder::{ReadBytesExt, LE};
use std::fmt;
use std::io::{Read, Seek, SeekFrom};

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of the base `FormatHeader` fields, in bytes.
const BASE_FORMAT_SIZE: u32 = 16;
/// Size of a full `WAVEFORMATEXTENSIBLE`: base fields + cbSize + validBits + channelMask + GUID.
const EXTENSIBLE_FORMAT_SIZE: u32 = BASE_FORMAT_SIZE + 2 + 2 + 4 + 16;

/// A diagnostic-only registry of other well-known `wFormatTag` values, so rejection messages can
/// name a format instead of printing a bare integer. None of these are accepted, they're purely
/// for naming.
const KNOWN_FORMAT_TAGS: &[(u16, &str)] = &[
    (0x0002, "ADPCM"),
    (0x0006, "ALAW"),
    (0x0007, "MULAW"),
    (0x0011, "DVI_ADPCM"),
    (0x0050, "MPEGLAYER3"),
    (0x2000, "AC3"),
];

/// The `audio_format` field of a WAVE `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormatTag {
    Pcm,
    IeeeFloat,
    Extensible,
    Other(u16),
}

impl AudioFormatTag {
    fn from_raw(raw: u16) -> Self {
        match raw {
            WAVE_FORMAT_PCM => Self::Pcm,
            WAVE_FORMAT_IEEE_FLOAT => Self::IeeeFloat,
            WAVE_FORMAT_EXTENSIBLE => Self::Extensible,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for AudioFormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pcm => write!(f, "\"PCM\" ({WAVE_FORMAT_PCM:#06x})"),
            Self::IeeeFloat => write!(f, "\"IEEE_FLOAT\" ({WAVE_FORMAT_IEEE_FLOAT:#06x})"),
            Self::Extensible => write!(f, "\"EXTENSIBLE\" ({WAVE_FORMAT_EXTENSIBLE:#06x})"),
            Self::Other(raw) => match KNOWN_FORMAT_TAGS.iter().find(|(tag, _)| tag == raw) {
                Some((_, name)) => write!(f, "\"{name}\" ({raw:#06x})"),
                None => write!(f, "{raw:#06x}"),
            },
        }
    }
}

/// The base WAVE format descriptor common to every `fmt ` chunk.
#[derive(Debug, Clone, Copy)]
pub struct FormatHeader {
    pub audio_format: u16,
    pub num_channels: u16,
    pub samples_per_second: u32,
    pub bytes_per_second: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FormatHeader {
    fn read_from(reader: &mut impl Read) -> Result<Self> {
        Ok(Self {
            audio_format: reader.read_u16::<LE>()?,
            num_channels: reader.read_u16::<LE>()?,
            samples_per_second: reader.read_u32::<LE>()?,
            bytes_per_second: reader.read_u32::<LE>()?,
            block_align: reader.read_u16::<LE>()?,
            bits_per_sample: reader.read_u16::<LE>()?,
        })
    }
}

/// The full format header including the `WAVEFORMATEXTENSIBLE` tail, when present.
///
/// Non-extensible `fmt ` chunks are normalized into this same shape: `valid_bits_per_sample`
/// mirrors `bits_per_sample` and `sub_format`/`channel_mask` are left at their defaults.
#[derive(Debug, Clone, Copy)]
pub struct FormatHeaderExtensible {
    pub header: FormatHeader,
    pub size: u16,
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: Option<Guid>,
}

impl FormatHeaderExtensible {
    fn read_tail_from(reader: &mut impl Read, header: FormatHeader) -> Result<Self> {
        let size = reader.read_u16::<LE>()?;
        let valid_bits_per_sample = reader.read_u16::<LE>()?;
        let channel_mask = reader.read_u32::<LE>()?;
        let mut guid = [0u8; 16];
        reader.read_exact(&mut guid)?;
        Ok(Self {
            header,
            size,
            valid_bits_per_sample,
            channel_mask,
            sub_format: Some(Guid::new(guid)),
        })
    }

    pub(crate) fn non_extensible(header: FormatHeader) -> Self {
        Self {
            header,
            size: 0,
            valid_bits_per_sample: header.bits_per_sample,
            channel_mask: 0,
            sub_format: None,
        }
    }

    /// The effective audio format after resolving `EXTENSIBLE` through its sub-format GUID.
    fn resolved_format(&self) -> AudioFormatTag {
        match AudioFormatTag::from_raw(self.header.audio_format) {
            AudioFormatTag::Extensible => match self.sub_format {
                Some(g) if g == KSDATAFORMAT_SUBTYPE_PCM => AudioFormatTag::Pcm,
                Some(g) if g == KSDATAFORMAT_SUBTYPE_IEEE_FLOAT => AudioFormatTag::IeeeFloat,
                _ => AudioFormatTag::Extensible,
            },
            tag => tag,
        }
    }
}

/// The validated result of parsing and sanity-checking a WAVE `fmt `/`data` chunk pair.
#[derive(Debug, Clone)]
pub struct PcmDescriptor {
    pub format: FormatHeaderExtensible,
    pub data_chunk: ChunkDescriptor,
    pub info_string: String,
}

/// Validates the `fmt `/`data` chunks found by `riff::scan_chunks` and builds a `PcmDescriptor`.
///
/// Returns the descriptor plus any non-fatal diagnostics (currently just the 8-bit-rounding
/// warning); rejections are returned as `Err`.
pub fn validate<R: Read + Seek>(
    reader: &mut R,
    chunks: &ChunkMap,
) -> Result<(PcmDescriptor, Vec<String>)> {
    let mut diagnostics = Vec::new();

    let fmt_desc = *chunks.get(&ID_FMT).ok_or(Error::MissingFmtChunk)?;
    let data_desc = *chunks.get(&ID_DATA).ok_or(Error::MissingDataChunk)?;
    if fmt_desc.data_size < BASE_FORMAT_SIZE {
        return Err(Error::FmtChunkTooSmall(fmt_desc.data_size));
    }

    reader.seek(SeekFrom::Start(fmt_desc.start))?;
    let header = FormatHeader::read_from(reader)?;
    let mut format = if header.audio_format == WAVE_FORMAT_EXTENSIBLE {
        if fmt_desc.data_size < EXTENSIBLE_FORMAT_SIZE {
            return Err(Error::FmtChunkTooSmall(fmt_desc.data_size));
        }
        FormatHeaderExtensible::read_tail_from(reader, header)?
    } else {
        FormatHeaderExtensible::non_extensible(header)
    };

    let resolved = format.resolved_format();
    match resolved {
        AudioFormatTag::Pcm | AudioFormatTag::IeeeFloat => {}
        AudioFormatTag::Extensible => {
            let guid = format.sub_format.unwrap_or(Guid::new([0; 16]));
            return Err(Error::UnsupportedSubFormat(guid));
        }
        AudioFormatTag::Other(_) => {
            return Err(Error::UnsupportedAudioFormat(AudioFormatTag::from_raw(
                header.audio_format,
            )));
        }
    }

    if !matches!(header.num_channels, 1 | 2) {
        return Err(Error::InvalidChannelCount(header.num_channels));
    }

    if resolved == AudioFormatTag::Pcm && format.header.bits_per_sample % 8 != 0 {
        let rounded = format.header.bits_per_sample.div_ceil(8) * 8;
        diagnostics.push(format!(
            "bits per sample ({}) is not a multiple of 8, rounding up to {}",
            format.header.bits_per_sample, rounded
        ));
        format.header.bits_per_sample = rounded;
        if format.valid_bits_per_sample > rounded {
            format.valid_bits_per_sample = rounded;
        }
    }
    if resolved == AudioFormatTag::Pcm && format.header.bits_per_sample > 32 {
        return Err(Error::BitsPerSampleTooLarge(format.header.bits_per_sample));
    }
    if resolved == AudioFormatTag::IeeeFloat && !matches!(format.header.bits_per_sample, 32 | 64) {
        return Err(Error::BitsPerSampleTooLarge(format.header.bits_per_sample));
    }

    let bytes_per_sample = format.header.bits_per_sample.div_ceil(8);
    let expected_block_align = header.num_channels * bytes_per_sample;
    if format.header.block_align != expected_block_align {
        return Err(Error::InconsistentBlockAlign {
            channels: header.num_channels,
            bytes_per_sample,
            block_align: format.header.block_align,
        });
    }
    let expected_bytes_per_second =
        format.header.samples_per_second * u32::from(format.header.block_align);
    if format.header.bytes_per_second != expected_bytes_per_second {
        return Err(Error::InconsistentByteRate {
            samples_per_second: format.header.samples_per_second,
            block_align: format.header.block_align,
            bytes_per_second: format.header.bytes_per_second,
        });
    }

    if format.valid_bits_per_sample > format.header.bits_per_sample {
        return Err(Error::InvalidValidBitsPerSample {
            valid: format.valid_bits_per_sample,
            container: format.header.bits_per_sample,
        });
    }

    let info_string = build_info_string(&format);
    let descriptor = PcmDescriptor { format, data_chunk: data_desc, info_string };
    Ok((descriptor, diagnostics))
}

fn build_info_string(format: &FormatHeaderExtensible) -> String {
    let rate = format.header.samples_per_second;
    let khz = rate as f64 / 1000.0;
    let khz_str = if (khz * 10.0).round() % 10.0 == 0.0 {
        format!("{}", khz.round() as u64)
    } else {
        format!("{khz:.1}")
    };
    let channels = match format.header.num_channels {
        1 => "mono",
        2 => "stereo",
        n => return format!("{khz_str} kHz, {} bit, {n} channels", format.header.bits_per_sample),
    };
    format!("{khz_str} kHz, {} bit, {channels}", format.header.bits_per_sample)
}
