//! Logger initialization for the runner.
//!
//! Log records go to `./rem_runner.log`, the terminal, or both. Records from
//! the process toolkit are additionally mirrored into the task console so
//! pipeline diagnostics show up next to the run output.

use std::fs::File;
use std::path::PathBuf;

use log::{LevelFilter, Log, Metadata, Record};
use rem_engine::{LogMessage, MessageChannel, Severity};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./rem_runner.log";

/// Targets whose records are mirrored into the console.
const MIRRORED_TARGETS: &[&str] = &["rem_app::platform::toolkit"];

/// Destination for log output.
pub enum LogDestination {
    /// Write to ./rem_runner.log in current directory.
    File,
    /// Write to terminal (stderr, stdout carries the console).
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Initialize the logger with the specified destination, mirroring toolkit
/// records into `channel`.
pub fn initialize(destination: LogDestination, channel: MessageChannel) {
    let level = LevelFilter::Info;
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = match destination {
        LogDestination::File => create_file_logger(level, config.clone())
            .map(|logger| vec![logger])
            .unwrap_or_default(),
        LogDestination::Terminal => vec![terminal_logger(level, config.clone())],
        LogDestination::Both => {
            let mut loggers = vec![terminal_logger(level, config.clone())];
            if let Some(file_logger) = create_file_logger(level, config.clone()) {
                loggers.push(file_logger);
            }
            loggers
        }
    };
    loggers.push(ChannelLogger::new(LevelFilter::Warn, config, channel));

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<dyn SharedLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<dyn SharedLogger>> {
    let log_path = PathBuf::from(LOG_FILE);
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", log_path, err);
            None
        }
    }
}

/// Forwards selected log records to the task console.
pub struct ChannelLogger {
    level: LevelFilter,
    config: Config,
    channel: MessageChannel,
}

impl ChannelLogger {
    pub fn new(level: LevelFilter, config: Config, channel: MessageChannel) -> Box<Self> {
        Box::new(Self {
            level,
            config,
            channel,
        })
    }
}

fn severity_of(level: log::Level) -> Severity {
    match level {
        log::Level::Error => Severity::Error,
        log::Level::Warn => Severity::Warning,
        log::Level::Info | log::Level::Debug | log::Level::Trace => Severity::Info,
    }
}

impl Log for ChannelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
            && MIRRORED_TARGETS
                .iter()
                .any(|target| metadata.target().starts_with(target))
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.channel.publish(LogMessage::new(
                record.args().to_string(),
                severity_of(record.level()),
            ));
        }
    }

    fn flush(&self) {}
}

impl SharedLogger for ChannelLogger {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        Some(&self.config)
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        self
    }
}
