//! Output sinks for admission notices and helper messages.

use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Destination for the textual lines the registry and the message helpers
/// produce.
///
/// Implementations append the line terminator themselves.
pub trait NoticeSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Write `line` and a newline to `out`, then flush.
fn write_line<W: Write>(out: &mut W, line: &str) {
    if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
        warn!(error = %e, "Failed to write notice");
    }
}

/// Writes each line to the process's standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl NoticeSink for StdoutSink {
    fn line(&self, line: &str) {
        write_line(&mut std::io::stdout().lock(), line);
    }
}

/// Writes each line to an arbitrary writer.
#[derive(Debug, Default)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> NoticeSink for WriterSink<W> {
    fn line(&self, line: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        write_line(&mut *writer, line);
    }
}

/// Collects lines in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemorySink {
    lines: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemorySink {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl NoticeSink for MemorySink {
    fn line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
