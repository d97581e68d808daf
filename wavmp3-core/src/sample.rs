//! The tagged variant the encoding loop dispatches on: a plain enum instead of runtime
//! polymorphism, since there are exactly two sample shapes to handle.

use crate::wave::PcmDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Integer PCM samples. `container_bytes` is how many bytes each sample occupies on disk;
    /// `valid_bits` is how many of the most-significant bits actually carry signal (equal to
    /// `container_bytes * 8` except for `EXTENSIBLE` streams with a narrower `validBitsPerSample`).
    PcmInt { container_bytes: u8, valid_bits: u8 },
    /// IEEE-754 float samples, 4 (single) or 8 (double) bytes wide.
    IeeeFloat { container_bytes: u8 },
}

impl SampleFormat {
    pub fn container_bytes(self) -> u8 {
        match self {
            Self::PcmInt { container_bytes, .. } | Self::IeeeFloat { container_bytes } => {
                container_bytes
            }
        }
    }
}

impl From<&PcmDescriptor> for SampleFormat {
    fn from(desc: &PcmDescriptor) -> Self {
        let bits = desc.format.header.bits_per_sample;
        let container_bytes = (bits / 8) as u8;
        if bits == 32 && is_ieee_float(desc) {
            Self::IeeeFloat { container_bytes }
        } else if bits == 64 {
            Self::IeeeFloat { container_bytes }
        } else {
            Self::PcmInt { container_bytes, valid_bits: desc.format.valid_bits_per_sample as u8 }
        }
    }
}

fn is_ieee_float(desc: &PcmDescriptor) -> bool {
    use crate::guid::KSDATAFORMAT_SUBTYPE_IEEE_FLOAT;
    use crate::wave::{WAVE_FORMAT_EXTENSIBLE, WAVE_FORMAT_IEEE_FLOAT};

    match desc.format.header.audio_format {
        WAVE_FORMAT_IEEE_FLOAT => true,
        WAVE_FORMAT_EXTENSIBLE => desc.format.sub_format == Some(KSDATAFORMAT_SUBTYPE_IEEE_FLOAT),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riff::ChunkDescriptor;
    use crate::wave::{FormatHeader, FormatHeaderExtensible};

    fn descriptor(bits: u16, audio_format: u16) -> PcmDescriptor {
        let header = FormatHeader {
            audio_format,
            num_channels: 2,
            samples_per_second: 44_100,
            bytes_per_second: 44_100 * 2 * (bits / 8) as u32,
            block_align: 2 * (bits / 8),
            bits_per_sample: bits,
        };
        PcmDescriptor {
            format: FormatHeaderExtensible::non_extensible(header),
            data_chunk: ChunkDescriptor { start: 0, data_size: 0 },
            info_string: String::new(),
        }
    }

    #[test]
    fn sixteen_bit_pcm_is_pcm_int() {
        let desc = descriptor(16, crate::wave::WAVE_FORMAT_PCM);
        assert_eq!(
            SampleFormat::from(&desc),
            SampleFormat::PcmInt { container_bytes: 2, valid_bits: 16 }
        );
    }

    #[test]
    fn thirty_two_bit_float_is_ieee() {
        let desc = descriptor(32, crate::wave::WAVE_FORMAT_IEEE_FLOAT);
        assert_eq!(SampleFormat::from(&desc), SampleFormat::IeeeFloat { container_bytes: 4 });
    }
}
