#![deny(missing_docs)]
//! Shared logging utilities for the REM runner workspace.
//!
//! This crate provides the `rem_*` logging macros used across the codebase,
//! a minimal test initializer for the global logger, and the process-wide
//! text output stream in [`console`].

pub mod console;

/// `log::trace!` under the workspace name.
#[macro_export]
macro_rules! rem_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// `log::info!` under the workspace name.
#[macro_export]
macro_rules! rem_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// `log::debug!` under the workspace name.
#[macro_export]
macro_rules! rem_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// `log::warn!` under the workspace name.
#[macro_export]
macro_rules! rem_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// `log::error!` under the workspace name.
#[macro_export]
macro_rules! rem_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Writes formatted text to the process-wide console stream.
///
/// The text is dropped when no stream is attached.
#[macro_export]
macro_rules! rem_print {
    ($($arg:tt)*) => {{
        $crate::console::write_fmt(format_args!($($arg)*));
    }};
}

/// Writes formatted text plus a newline to the process-wide console stream.
#[macro_export]
macro_rules! rem_println {
    () => {{
        $crate::console::write_str("\n");
    }};
    ($($arg:tt)*) => {{
        $crate::console::write_fmt(format_args!("{}\n", format_args!($($arg)*)));
    }};
}

/// Installs a terminal logger for test binaries.
///
/// Debug level in debug builds, Info otherwise. Does nothing when a logger is
/// already installed, so every test may call it.
pub fn initialize_for_tests() {
    use log::LevelFilter;
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = match cfg!(debug_assertions) {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}
