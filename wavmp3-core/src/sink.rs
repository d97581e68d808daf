//! Thread-safe stdout/stderr writer, serializing each call to `write` under a single lock.
//!
//! Every worker and the orchestrator share one of these; callers build a complete message
//! first, then hand it to one guarded call.

use std::io::{self, Write};
use std::sync::Mutex;

/// Serializes writes to stdout and stderr across threads. Cloning is cheap; clones share the
/// same underlying locks via `Arc` so every worker can hold its own handle.
#[derive(Clone)]
pub struct OutputSink {
    inner: std::sync::Arc<Inner>,
}

struct Inner {
    stdout: Mutex<()>,
    stderr: Mutex<()>,
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink {
    pub fn new() -> Self {
        Self { inner: std::sync::Arc::new(Inner { stdout: Mutex::new(()), stderr: Mutex::new(()) }) }
    }

    /// Writes `line` (without an appended newline) to stdout under the shared lock.
    pub fn write_stdout(&self, line: &str) {
        let _guard = self.inner.stdout.lock().unwrap();
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }

    /// Writes `line` (without an appended newline) to stderr under the shared lock.
    pub fn write_stderr(&self, line: &str) {
        let _guard = self.inner.stderr.lock().unwrap();
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{line}");
    }
}
