//! Top-level orchestrator: walks the directory tree, filters entries, and feeds the worker pool.

use crate::terminal::progress_bar;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wavmp3_core::driver;
use wavmp3_core::exit_code::{ExitSeverity, ReturnCode};
use wavmp3_core::{Configuration, OutputSink, WorkerPool};

/// Walks `config.directory_path`, submitting one conversion job per matching file to `pool`.
/// Honors `termination_requested` between files.
pub fn run(
    config: &Arc<Configuration>,
    pool: &WorkerPool,
    sink: &OutputSink,
    return_code: &Arc<ReturnCode>,
    termination_requested: &Arc<AtomicBool>,
) {
    let entries = match collect_entries(config) {
        Ok(entries) => entries,
        Err(err) => {
            sink.write_stderr(&format!("{}: {err}", config.directory_path.display()));
            return_code.raise(ExitSeverity::DirectoryIterationFailed);
            return;
        }
    };

    let progress = progress_bar(entries.len() as u64);
    for path in entries {
        if termination_requested.load(Ordering::SeqCst) {
            return_code.raise(ExitSeverity::AbortedBySignal);
            break;
        }

        let config = Arc::clone(config);
        let sink = sink.clone();
        let return_code = Arc::clone(return_code);
        let termination_requested = Arc::clone(termination_requested);
        let progress = progress.clone();
        pool.submit(Box::new(move || {
            driver::convert_file(&path, &config, &sink, &return_code, &termination_requested);
            progress.inc(1);
        }));
    }
}

/// Collects every regular file under `config.directory_path`, honoring `recurse_directories` and
/// filtering by extension unless `convert_all_files` is set.
fn collect_entries(config: &Configuration) -> walkdir::Result<Vec<std::path::PathBuf>> {
    let max_depth = if config.recurse_directories { usize::MAX } else { 1 };
    let walker = walkdir::WalkDir::new(&config.directory_path).max_depth(max_depth);

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !config.convert_all_files && !is_wav(entry.path()) {
            continue;
        }
        entries.push(entry.into_path());
    }
    Ok(entries)
}

fn is_wav(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}
