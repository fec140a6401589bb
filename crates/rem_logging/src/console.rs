//! Process-wide text output stream.
//!
//! Code that wants its output to reach the user (including the external
//! pipeline bindings) writes through [`rem_print!`](crate::rem_print) and
//! [`rem_println!`](crate::rem_println) instead of `print!`. The slot starts out
//! holding [`StdoutStream`] and can be swapped for the duration of a task.
//! A slot holding `None` models a packaged build without an attached console.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, LazyLock, RwLock};

/// A sink for console text.
pub trait TextStream: Send + Sync {
    /// Writes a chunk of text. Chunks are not guaranteed to be whole lines.
    fn write_str(&self, text: &str);

    /// Flushes any buffered output.
    fn flush(&self) {}
}

/// Shared handle to a console stream.
pub type StreamHandle = Arc<dyn TextStream>;

/// Writes to the real standard output of the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutStream;

impl TextStream for StdoutStream {
    fn write_str(&self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

static SLOT: LazyLock<RwLock<Option<StreamHandle>>> =
    LazyLock::new(|| RwLock::new(Some(Arc::new(StdoutStream))));

/// Returns the stream currently installed, if any.
pub fn current() -> Option<StreamHandle> {
    SLOT.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Installs `next` and returns whatever was installed before.
pub fn replace(next: Option<StreamHandle>) -> Option<StreamHandle> {
    let mut slot = SLOT.write().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *slot, next)
}

/// Detaches the console entirely, returning the previous stream.
pub fn detach() -> Option<StreamHandle> {
    replace(None)
}

/// Identity comparison of two optional stream handles.
pub fn same_stream(a: &Option<StreamHandle>, b: &Option<StreamHandle>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const (),
        (None, None) => true,
        _ => false,
    }
}

/// Writes `text` to the current stream. Dropped when no stream is attached.
pub fn write_str(text: &str) {
    // Clone the handle so the slot lock is not held while writing.
    if let Some(stream) = current() {
        stream.write_str(text);
    }
}

/// Formats and writes to the current stream.
pub fn write_fmt(args: fmt::Arguments<'_>) {
    match args.as_str() {
        Some(text) => write_str(text),
        None => write_str(&args.to_string()),
    }
}

/// Flushes the current stream.
pub fn flush() {
    if let Some(stream) = current() {
        stream.flush();
    }
}
