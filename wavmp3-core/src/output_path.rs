//! Derives a non-colliding `.mp3` output path for a source file.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// The highest collision-probe suffix tried before giving up.
const MAX_CANDIDATES: u32 = 65_535;

/// Resolves and opens (for truncating write) a non-colliding `.mp3` path alongside `source`.
///
/// If `source` doesn't end in `.wav` (case-insensitive), the base path is `source` itself and a
/// warning is appended to the returned diagnostics -- this does not fail, since `--all` lets
/// non-`.wav` inputs reach here deliberately.
pub fn resolve_output_path(
    source: &Path,
    overwrite_existing: bool,
) -> Result<(PathBuf, File, Vec<String>)> {
    let mut diagnostics = Vec::new();
    let is_wav = source.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    let base = if is_wav {
        source.with_extension("")
    } else {
        diagnostics.push(format!("{} does not end with .wav", source.display()));
        source.to_path_buf()
    };

    for i in 0..=MAX_CANDIDATES {
        let candidate = if i == 0 {
            base.with_extension("mp3")
        } else {
            let stem = base.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            base.with_file_name(format!("{stem} ({i})")).with_extension("mp3")
        };

        if overwrite_existing || !candidate.exists() {
            let file = File::create(&candidate)?;
            return Ok((candidate, file, diagnostics));
        }
    }

    Err(Error::NoOutputFileName)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolves_simple_wav_path() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("song.wav");
        std::fs::write(&source, b"").unwrap();
        let (path, _file, diags) = resolve_output_path(&source, false).unwrap();
        assert_eq!(path, dir.path().join("song.mp3"));
        assert!(diags.is_empty());
    }

    #[test]
    fn avoids_collision_without_overwrite() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("song.wav");
        std::fs::write(&source, b"").unwrap();
        std::fs::write(dir.path().join("song.mp3"), b"existing").unwrap();

        let (path, _file, _) = resolve_output_path(&source, false).unwrap();
        assert_eq!(path, dir.path().join("song (1).mp3"));
    }

    #[test]
    fn overwrite_reuses_existing_name() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("song.wav");
        std::fs::write(&source, b"").unwrap();
        std::fs::write(dir.path().join("song.mp3"), b"existing").unwrap();

        let (path, _file, _) = resolve_output_path(&source, true).unwrap();
        assert_eq!(path, dir.path().join("song.mp3"));
    }

    #[test]
    fn non_wav_extension_warns_but_still_resolves() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("song.raw");
        std::fs::write(&source, b"").unwrap();
        let (path, _file, diags) = resolve_output_path(&source, false).unwrap();
        assert_eq!(path, dir.path().join("song.raw.mp3"));
        assert_eq!(diags.len(), 1);
    }
}
