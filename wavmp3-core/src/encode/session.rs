//! Wraps `mp3lame-encoder` behind the narrow operation surface the driver needs: configure once,
//! feed PCM batches, flush once.

use crate::error::{Error, Result};
use crate::sample::SampleFormat;
use mp3lame_encoder::{Builder, DualPcm, FlushNoGap, MonoPcm, Quality};

/// A single file's encoder instance: built once per file with the stream's channel count and
/// sample rate, then fed PCM batches until `flush` closes it out.
pub struct EncoderSession {
    encoder: mp3lame_encoder::Encoder,
    scratch: Vec<u8>,
}

impl EncoderSession {
    /// Builds and configures an encoder for a stream with `num_channels` (1 or 2) at
    /// `sample_rate` Hz, using `quality` (0 = best/slowest, 9 = worst/fastest). Stereo input
    /// always gets `joint-stereo` mode; mono gets `Mono`.
    pub fn new(num_channels: u16, sample_rate: u32, quality: u8) -> Result<Self> {
        let mut builder = Builder::new().ok_or(Error::EncoderInit)?;
        builder.set_num_channels(num_channels as u8).map_err(|_| Error::EncoderConfig)?;
        builder.set_sample_rate(sample_rate).map_err(|_| Error::EncoderConfig)?;
        builder.set_quality(quality_from_u8(quality)).map_err(|_| Error::EncoderConfig)?;
        let mode = if num_channels == 2 {
            mp3lame_encoder::Mode::JointStereo
        } else {
            mp3lame_encoder::Mode::Mono
        };
        builder.set_mode(mode).map_err(|_| Error::EncoderConfig)?;
        let encoder = builder.build().map_err(|_| Error::EncoderInit)?;
        Ok(Self { encoder, scratch: Vec::new() })
    }

    /// Encodes one batch of mono samples already normalized to full-scale `i32` (MSB-aligned per
    /// `valid_bits`).
    pub fn encode_mono(&mut self, samples: &[i32]) -> Result<&[u8]> {
        self.scratch.clear();
        self.scratch.reserve(mp3lame_encoder::max_required_buffer_size(samples.len()));
        self.encoder
            .encode_to_vec(MonoPcm(samples), &mut self.scratch)
            .map_err(|_| Error::EncoderEncode)?;
        Ok(&self.scratch)
    }

    /// Encodes one batch of stereo samples, already de-interleaved into separate per-channel
    /// buffers of equal length (the crate's dual-channel input mirrors LAME's native
    /// non-interleaved `lame_encode_buffer_int` entry point).
    pub fn encode_stereo(&mut self, left: &[i32], right: &[i32]) -> Result<&[u8]> {
        self.scratch.clear();
        self.scratch.reserve(mp3lame_encoder::max_required_buffer_size(left.len()));
        self.encoder
            .encode_to_vec(DualPcm { left, right }, &mut self.scratch)
            .map_err(|_| Error::EncoderEncode)?;
        Ok(&self.scratch)
    }

    /// Encodes one batch of mono IEEE-float samples, fed directly rather than normalized
    /// through `i32`.
    pub fn encode_mono_float(&mut self, samples: &[f32]) -> Result<&[u8]> {
        self.scratch.clear();
        self.scratch.reserve(mp3lame_encoder::max_required_buffer_size(samples.len()));
        self.encoder
            .encode_to_vec(MonoPcm(samples), &mut self.scratch)
            .map_err(|_| Error::EncoderEncode)?;
        Ok(&self.scratch)
    }

    /// Encodes one batch of de-interleaved stereo IEEE-float samples.
    pub fn encode_stereo_float(&mut self, left: &[f32], right: &[f32]) -> Result<&[u8]> {
        self.scratch.clear();
        self.scratch.reserve(mp3lame_encoder::max_required_buffer_size(left.len()));
        self.encoder
            .encode_to_vec(DualPcm { left, right }, &mut self.scratch)
            .map_err(|_| Error::EncoderEncode)?;
        Ok(&self.scratch)
    }

    /// Flushes any samples buffered internally by the encoder. Must be called exactly once,
    /// after the last `encode_mono`/`encode_stereo` call.
    pub fn flush(&mut self) -> Result<&[u8]> {
        self.scratch.clear();
        self.scratch.reserve(mp3lame_encoder::max_required_buffer_size(0).max(7200));
        self.encoder
            .flush_to_vec::<FlushNoGap>(&mut self.scratch)
            .map_err(|_| Error::EncoderFlush)?;
        Ok(&self.scratch)
    }
}

/// Maps the CLI's `0..=9` quality knob onto the crate's named quality levels. `0` is the
/// slowest/best encode, `9` the fastest/worst, matching LAME's own `-q` convention.
fn quality_from_u8(quality: u8) -> Quality {
    match quality {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}

/// Normalizes a raw sample read from `container_bytes` little-endian bytes into a full-scale
/// `i32`, MSB-aligned so only the top `valid_bits` carry signal. 8-bit PCM is unsigned in WAVE
/// (bias 128); everything from 16 bits up is signed.
pub fn normalize_int_sample(raw_le_bytes: &[u8], container_bytes: u8, valid_bits: u8) -> i32 {
    let shift = 32 - u32::from(valid_bits);
    if container_bytes == 1 {
        let unsigned = raw_le_bytes[0] as i32 - 128;
        return unsigned << shift;
    }
    let mut value: i32 = 0;
    for (i, &b) in raw_le_bytes.iter().enumerate() {
        value |= (b as i32) << (8 * i);
    }
    // A full 4-byte container already occupies every bit of `value`, so the OR loop above has
    // already produced the correctly-signed two's-complement pattern; manually sign-extending it
    // would shift by 32, which overflows. Only containers narrower than 4 bytes need it.
    if container_bytes < 4 {
        let sign_bit = 1i32 << (container_bytes * 8 - 1);
        if value & sign_bit != 0 {
            value -= 1i32 << (container_bytes * 8);
        }
    }
    value << shift
}

/// Whether `format` is integer PCM (as opposed to IEEE float), used by the driver to pick between
/// the integer and float encode paths.
pub fn is_integer_format(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::PcmInt { .. })
}

/// Reads one IEEE-float sample from `container_bytes` little-endian bytes (4 or 8), narrowing
/// doubles to `f32` since the encoder only accepts single precision.
pub fn read_float_sample(raw_le_bytes: &[u8], container_bytes: u8) -> f32 {
    if container_bytes == 8 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw_le_bytes);
        f64::from_le_bytes(buf) as f32
    } else {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(raw_le_bytes);
        f32::from_le_bytes(buf)
    }
}
