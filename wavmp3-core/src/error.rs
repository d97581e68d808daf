use crate::fourcc::FourCc;
use crate::guid::Guid;
use std::io;
use thiserror::Error;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can terminate a single file's conversion.
///
/// This does not cover `riff::scan_chunks()`'s own soft failures (malformed trailing chunks,
/// duplicate ids) -- those are reported as diagnostic strings alongside a best-effort `ChunkMap`
/// rather than as an `Error`, per the scanner's "fatal only on read errors" contract.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("total file size is smaller than total data size")]
    RiffTooSmall,

    #[error("not a RIFF file")]
    NotRiff,

    #[error("unsupported RIFF form \"{0}\" instead of \"WAVE\"")]
    NotWave(FourCc),

    #[error("WAVE data is missing a \"fmt \" chunk")]
    MissingFmtChunk,

    #[error("WAVE data is missing a \"data\" chunk")]
    MissingDataChunk,

    #[error("\"fmt \" chunk is too small ({0} bytes)")]
    FmtChunkTooSmall(u32),

    #[error("unsupported audio format {0}")]
    UnsupportedAudioFormat(crate::wave::AudioFormatTag),

    #[error("unsupported sub-format {0} in WAVE_FORMAT_EXTENSIBLE header")]
    UnsupportedSubFormat(Guid),

    #[error("invalid channel count: {0} (must be 1 or 2)")]
    InvalidChannelCount(u16),

    #[error("bits per sample too large: {0} (must be <= 32)")]
    BitsPerSampleTooLarge(u16),

    #[error(
        "bytes per second ({bytes_per_second}) != samples per second ({samples_per_second}) * \
         block align ({block_align})"
    )]
    InconsistentByteRate { samples_per_second: u32, block_align: u16, bytes_per_second: u32 },

    #[error("block align ({block_align}) != channels ({channels}) * bytes per sample ({bytes_per_sample})")]
    InconsistentBlockAlign { channels: u16, bytes_per_sample: u16, block_align: u16 },

    #[error("valid bits per sample ({valid}) > bits per sample ({container})")]
    InvalidValidBitsPerSample { valid: u16, container: u16 },

    #[error("finding output file name failed")]
    NoOutputFileName,

    #[error("conversion cancelled by termination request")]
    Cancelled,

    #[error("failed to spawn a worker thread")]
    ThreadSpawn(#[source] io::Error),

    #[error("MP3 encoder initialization failed")]
    EncoderInit,

    #[error("MP3 encoder rejected its configuration")]
    EncoderConfig,

    #[error("MP3 encoder returned an error while encoding")]
    EncoderEncode,

    #[error("MP3 encoder returned an error while flushing")]
    EncoderFlush,

    #[error(transparent)]
    Io(#[from] io::Error),
}
