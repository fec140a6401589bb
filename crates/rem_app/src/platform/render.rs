//! Terminal rendering of the console, dialogs and status line.
//!
//! Writes go straight to the real stdout. The process-wide console stream is
//! detached in this front end, so nothing here loops back into the task log.

use std::io::{self, IsTerminal, Write};

use rem_core::{AppViewModel, ConsoleLine, DialogKind, LineKind};

const RESET: &str = "\x1b[0m";

fn colour(kind: LineKind) -> Option<&'static str> {
    match kind {
        LineKind::Info => None,
        LineKind::Success => Some("\x1b[32m"),
        LineKind::Warning => Some("\x1b[33m"),
        LineKind::Error => Some("\x1b[31m"),
    }
}

pub fn console(lines: &[ConsoleLine]) {
    if lines.is_empty() {
        return;
    }
    let styled = io::stdout().is_terminal();
    let mut out = io::stdout().lock();
    for line in lines {
        let _ = match colour(line.kind).filter(|_| styled) {
            Some(code) => writeln!(out, "{code}{}{RESET}", line.formatted()),
            None => writeln!(out, "{}", line.formatted()),
        };
    }
    let _ = out.flush();
}

pub fn status(view: &AppViewModel) {
    let controls = match (view.run_enabled, view.cancel_enabled) {
        (true, _) => "run enabled",
        (false, true) => "type `c` + Enter to cancel",
        (false, false) => "waiting for the current step",
    };
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "-- {} ({controls}) --", view.status);
    let _ = out.flush();
}

pub fn dialog(kind: DialogKind, title: &str, body: &str) {
    let label = match kind {
        DialogKind::Info => "INFO",
        DialogKind::Error => "ERROR",
    };
    let mut out = io::stdout().lock();
    let _ = writeln!(out);
    let _ = writeln!(out, "[{label}] {title}");
    for line in body.lines() {
        let _ = writeln!(out, "    {line}");
    }
    let _ = writeln!(out);
    let _ = out.flush();
}

pub fn prompt(question: &str) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{question}");
    let _ = out.flush();
}
