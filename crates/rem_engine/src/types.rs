use std::fmt;

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One console line published by a producer and consumed once by the UI drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    text: String,
    severity: Severity,
    timestamp: DateTime<Local>,
}

impl LogMessage {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
            timestamp: Local::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Info)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Success)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Error)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// `[HH:MM:SS] text`, the form shown in the console.
    pub fn formatted(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Idle,
    Running,
    CancelRequested,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, TaskState::Running | TaskState::CancelRequested)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Idle => "idle",
            TaskState::Running => "running",
            TaskState::CancelRequested => "cancel requested",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Pipeline stage names used for errors and checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compatibility,
    Negotiation,
    Construction,
    Transform,
    Visualization,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Compatibility => "compatibility setup",
            Stage::Negotiation => "parameter negotiation",
            Stage::Construction => "pipeline construction",
            Stage::Transform => "REM transform",
            Stage::Visualization => "visualization",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(label)
    }
}
