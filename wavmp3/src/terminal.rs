//! Logging and progress-bar setup: a log-line-aware progress bar, no raw-mode playback UI.

use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressFinish, ProgressStyle};
use lazy_static::lazy_static;
use log::{log_enabled, Level, Log};
use simplelog::{Color, ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::sync::Mutex;

const PROGRESS_UPDATE_RATE: u64 = 10;
const TICK_CHARS: &str = r"⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

lazy_static! {
    static ref PROGRESS_STYLE: ProgressStyle = ProgressStyle::default_bar()
        .template("       {spinner:.cyan} [{eta_precise}] [{bar:40}] {percent}% {wide_msg}")
        .progress_chars("=> ")
        .tick_chars(TICK_CHARS)
        .on_finish(ProgressFinish::AndClear);

    /// The `Term` to use for visible progress bars.
    static ref PROGRESS_TERM: Term = Term::buffered_stderr();

    /// The currently-active progress bar, so the logger can hide/show it around a log line.
    static ref PROGRESS_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);
}

fn default_progress_target() -> ProgressDrawTarget {
    if log_enabled!(Level::Trace) {
        ProgressDrawTarget::hidden()
    } else {
        ProgressDrawTarget::term(PROGRESS_TERM.clone(), Some(1000 / PROGRESS_UPDATE_RATE))
    }
}

fn hide_progress() -> bool {
    let mut lock = PROGRESS_BAR.lock().unwrap();
    if let Some(bar) = &*lock {
        if bar.is_finished() {
            *lock = None;
            return false;
        }
        if !bar.is_hidden() {
            bar.disable_steady_tick();
            bar.tick();
            bar.set_draw_target(ProgressDrawTarget::hidden());
            let _ = PROGRESS_TERM.clear_last_lines(1);
            let _ = PROGRESS_TERM.flush();
            return true;
        }
    }
    false
}

fn show_progress() {
    let lock = PROGRESS_BAR.lock().unwrap();
    if let Some(bar) = &*lock {
        if bar.is_hidden() {
            bar.enable_steady_tick(1000 / PROGRESS_UPDATE_RATE);
            bar.set_draw_target(default_progress_target());
        }
    }
}

/// Wraps a logger so log lines never interleave with the progress bar's redraws.
struct ProgressBarLogger<L: Log> {
    inner: L,
}

impl<L: Log> Log for ProgressBarLogger<L> {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record<'_>) {
        let hidden = hide_progress();
        self.inner.log(record);
        if hidden {
            show_progress();
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Initializes terminal logging. `verbosity` is the number of times `-v` was given.
pub fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Trace)
        .set_level_color(Level::Info, Some(Color::Green))
        .build();
    let logger = TermLogger::new(filter, config, TerminalMode::Stderr, ColorChoice::Auto);
    let wrapper = Box::new(ProgressBarLogger { inner: logger });
    log::set_max_level(filter);
    log::set_boxed_logger(wrapper).expect("failed to set global logger");
}

/// Creates a progress bar tracking `total` files.
pub fn progress_bar(total: u64) -> ProgressBar {
    let target = default_progress_target();
    let bar = ProgressBar::with_draw_target(total, target).with_style(PROGRESS_STYLE.clone());
    if !bar.is_hidden() {
        *PROGRESS_BAR.lock().unwrap() = Some(bar.clone());
        bar.enable_steady_tick(1000 / PROGRESS_UPDATE_RATE);
    }
    bar
}
