//! The per-file driver: open -> scan RIFF -> validate WAVE -> aggregate tags -> resolve output
//! path -> run the encoder session.

use crate::config::Configuration;
use crate::encode::{is_integer_format, normalize_int_sample, read_float_sample, EncoderSession};
use crate::error::{Error, Result};
use crate::exit_code::{ExitSeverity, ReturnCode};
use crate::fourcc::{FourCc, ID_RIFF, ID_WAVE};
use crate::id3;
use crate::output_path::resolve_output_path;
use crate::riff::{pad16, scan_chunks, ChunkMap};
use crate::sample::SampleFormat;
use crate::sink::OutputSink;
use crate::tags::{aggregate_tags, TagMap};
use crate::wave::{self, PcmDescriptor};
use byteorder::{ReadBytesExt, LE};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The number of frames encoded per batch.
const BATCH_FRAMES: usize = 8_192;

/// Converts a single file, logging and raising `return_code` itself so the worker pool's job
/// closure is just `move || driver::convert_file(...)`.
///
/// A non-`.wav`-named file reached only because `--all` was given, and that isn't even a RIFF
/// container, is silently skipped: no diagnostic, no return-code raise. Every other failure --
/// a `.wav` file that failed for any reason, or a `--all` candidate that *is* RIFF but otherwise
/// invalid -- is logged and raises the code to the severity the failure kind maps to (see
/// `severity_for`): a cancelled job raises `AbortedBySignal`, an encoder failure raises
/// `EncoderFailure`, everything else raises `SomeFilesFailed`.
#[allow(clippy::too_many_arguments)]
pub fn convert_file(
    path: &Path,
    config: &Configuration,
    sink: &OutputSink,
    return_code: &ReturnCode,
    termination_requested: &Arc<AtomicBool>,
) {
    let is_wav = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if let Err(err) = try_convert_file(path, config, sink, termination_requested) {
        let silent_skip = !is_wav && config.convert_all_files && matches!(err, Error::NotRiff);
        if silent_skip {
            return;
        }
        sink.write_stderr(&format!("{}: {err}", path.display()));
        return_code.raise(severity_for(&err));
    }
}

/// Maps a per-file failure to its exit-code severity: a cancelled job is `AbortedBySignal` (2),
/// any encoder failure is `EncoderFailure` (6), and everything else (malformed RIFF/WAVE input,
/// I/O errors, an unresolvable output name, ...) is the generic `SomeFilesFailed` (1).
fn severity_for(err: &Error) -> ExitSeverity {
    match err {
        Error::Cancelled => ExitSeverity::AbortedBySignal,
        Error::EncoderInit | Error::EncoderConfig | Error::EncoderEncode | Error::EncoderFlush => {
            ExitSeverity::EncoderFailure
        }
        _ => ExitSeverity::SomeFilesFailed,
    }
}

fn try_convert_file(
    path: &Path,
    config: &Configuration,
    sink: &OutputSink,
    termination_requested: &Arc<AtomicBool>,
) -> Result<()> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let (top_level, nested) = parse_riff_wave_envelope(&mut reader, file_len)?;
    let (descriptor, mut diagnostics) = wave::validate(&mut reader, &nested)?;

    let mut tags = TagMap::new();
    aggregate_tags(&mut reader, &top_level, &mut tags)?;
    aggregate_tags(&mut reader, &nested, &mut tags)?;

    let (output_path, mut output_file, mut path_diagnostics) =
        resolve_output_path(path, config.overwrite_existing_mp3)?;
    diagnostics.append(&mut path_diagnostics);

    let result = encode_stream(
        &mut reader,
        &descriptor,
        &tags,
        config.encoding_quality,
        &mut output_file,
        termination_requested,
    );

    match result {
        Ok(EncodeOutcome::Completed) => {
            for diagnostic in &diagnostics {
                sink.write_stderr(&format!("{}: {diagnostic}", path.display()));
            }
            sink.write_stdout(&format!("{} -> {} ({})", path.display(), output_path.display(), descriptor.info_string));
            Ok(())
        }
        Ok(EncodeOutcome::Cancelled) => {
            drop(output_file);
            let _ = std::fs::remove_file(&output_path);
            Err(Error::Cancelled)
        }
        Err(err) => {
            drop(output_file);
            let _ = std::fs::remove_file(&output_path);
            Err(err)
        }
    }
}

enum EncodeOutcome {
    Completed,
    Cancelled,
}

/// Reads the outer `RIFF`/`WAVE` envelope and returns `(top_level_chunks, riff_nested_chunks)`.
/// The top level is scanned first, then the chunks nested inside the `RIFF` form, so a later
/// aggregation pass over the nested map can win on overlapping tag keys.
fn parse_riff_wave_envelope<R: Read + Seek>(
    reader: &mut R,
    file_len: u64,
) -> Result<(ChunkMap, ChunkMap)> {
    reader.seek(SeekFrom::Start(0))?;
    let mut id = [0u8; 4];
    if reader.read(&mut id)? < 4 {
        return Err(Error::NotRiff);
    }
    if FourCc::new(id) != ID_RIFF {
        return Err(Error::NotRiff);
    }
    let riff_size = reader.read_u32::<LE>()?;
    if 8 + pad16(riff_size) > file_len {
        return Err(Error::RiffTooSmall);
    }

    let mut form = [0u8; 4];
    reader.read_exact(&mut form)?;
    let form = FourCc::new(form);
    if form != ID_WAVE {
        return Err(Error::NotWave(form));
    }

    let nested_size = riff_size.saturating_sub(4);
    let (nested, _diagnostics) = scan_chunks(reader, 12, nested_size)?;

    let top_level_len = u32::try_from(file_len).unwrap_or(u32::MAX);
    let (top_level, _diagnostics) = scan_chunks(reader, 0, top_level_len)?;
    Ok((top_level, nested))
}

fn encode_stream<R: Read + Seek>(
    reader: &mut R,
    descriptor: &PcmDescriptor,
    tags: &TagMap,
    quality: u8,
    output: &mut File,
    termination_requested: &Arc<AtomicBool>,
) -> Result<EncodeOutcome> {
    let num_channels = descriptor.format.header.num_channels;
    let sample_rate = descriptor.format.header.samples_per_second;
    let format = SampleFormat::from(descriptor);
    let block_align = usize::from(descriptor.format.header.block_align);
    let bytes_per_sample = format.container_bytes() as usize;

    if let Some(tag_bytes) = id3::build_id3v2_tag(tags) {
        output.write_all(&tag_bytes)?;
    }

    let mut session = EncoderSession::new(num_channels, sample_rate, quality)?;

    reader.seek(SeekFrom::Start(descriptor.data_chunk.start))?;
    let total_samples = descriptor.data_chunk.data_size as usize / bytes_per_sample.max(1);
    let mut remaining_frames = total_samples / usize::from(num_channels);

    let valid_bits = match format {
        SampleFormat::PcmInt { valid_bits, .. } => valid_bits,
        SampleFormat::IeeeFloat { .. } => 0,
    };

    let mut batch_bytes = vec![0u8; BATCH_FRAMES * block_align];
    let mut left_int = Vec::with_capacity(BATCH_FRAMES);
    let mut right_int = Vec::with_capacity(BATCH_FRAMES);
    let mut left_float = Vec::with_capacity(BATCH_FRAMES);
    let mut right_float = Vec::with_capacity(BATCH_FRAMES);

    while remaining_frames > 0 {
        let batch_frames = remaining_frames.min(BATCH_FRAMES);
        let batch_len = batch_frames * block_align;
        reader.read_exact(&mut batch_bytes[..batch_len])?;

        left_int.clear();
        right_int.clear();
        left_float.clear();
        right_float.clear();

        for frame in 0..batch_frames {
            let frame_start = frame * block_align;
            for channel in 0..usize::from(num_channels) {
                let sample_start = frame_start + channel * bytes_per_sample;
                let raw = &batch_bytes[sample_start..sample_start + bytes_per_sample];
                match format {
                    SampleFormat::PcmInt { .. } => {
                        let sample = normalize_int_sample(raw, bytes_per_sample as u8, valid_bits);
                        if channel == 0 {
                            left_int.push(sample);
                        } else {
                            right_int.push(sample);
                        }
                    }
                    SampleFormat::IeeeFloat { .. } => {
                        let sample = read_float_sample(raw, bytes_per_sample as u8);
                        if channel == 0 {
                            left_float.push(sample);
                        } else {
                            right_float.push(sample);
                        }
                    }
                }
            }
        }

        let encoded = if is_integer_format(format) {
            if num_channels == 2 {
                session.encode_stereo(&left_int, &right_int)?
            } else {
                session.encode_mono(&left_int)?
            }
        } else if num_channels == 2 {
            session.encode_stereo_float(&left_float, &right_float)?
        } else {
            session.encode_mono_float(&left_float)?
        };
        output.write_all(encoded)?;

        remaining_frames -= batch_frames;

        if termination_requested.load(Ordering::SeqCst) {
            return Ok(EncodeOutcome::Cancelled);
        }
    }

    let flushed = session.flush()?;
    output.write_all(flushed)?;
    Ok(EncodeOutcome::Completed)
}
