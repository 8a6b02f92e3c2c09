//! Default [`HostOutput`] writing to a terminal stream.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::HostOutput;

const OUTPUT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::output");

/// Writes warnings to a sink unless terminal output is disabled.
pub struct TerminalOutput<W> {
    sink: Mutex<W>,
    disabled: AtomicBool,
}

impl<W: Write + Send> TerminalOutput<W> {
    /// Wraps `sink` with output enabled.
    pub const fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
            disabled: AtomicBool::new(false),
        }
    }

    /// Reports whether output is currently suppressed.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Consumes the wrapper and returns the sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TerminalOutput<io::Stderr> {
    /// Writes to the process's standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> HostOutput for TerminalOutput<W> {
    fn display_warning(&self, warning: &str) {
        if self.is_disabled() {
            return;
        }
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = writeln!(sink, "{warning}") {
            debug!(target: OUTPUT_TARGET, %error, "failed to write warning");
        }
    }

    fn disable_terminal_output(&self, disable: bool) {
        self.disabled.store(disable, Ordering::SeqCst);
    }
}
