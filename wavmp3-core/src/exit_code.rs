//! Process-wide exit code aggregation: a monotonically-rising severity. Raising only overwrites
//! the aggregated value when the new severity is numerically larger than the one already set.

use std::sync::atomic::{AtomicU8, Ordering};

/// The exit code taxonomy, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ExitSeverity {
    Ok = 0,
    SomeFilesFailed = 1,
    AbortedBySignal = 2,
    DirectoryIterationFailed = 3,
    UncaughtException = 4,
    ThreadingFailure = 5,
    EncoderFailure = 6,
}

impl ExitSeverity {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// A shared, lock-free "rises only" exit code.
#[derive(Debug, Default)]
pub struct ReturnCode(AtomicU8);

impl ReturnCode {
    pub const fn new() -> Self {
        Self(AtomicU8::new(ExitSeverity::Ok.code()))
    }

    /// Raises the aggregated code to at least `severity`. Never lowers it.
    pub fn raise(&self, severity: ExitSeverity) {
        self.0.fetch_max(severity.code(), Ordering::SeqCst);
    }

    /// The current aggregated exit code.
    pub fn get(&self) -> u8 {
        self.0.load(Ordering::SeqCst)
    }
}
