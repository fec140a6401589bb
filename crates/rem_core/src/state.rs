use crate::view_model::{AppViewModel, STATUS_CANCELLING, STATUS_PROCESSING, STATUS_READY};

/// UI-side mirror of the task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
}

impl Phase {
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Running | Phase::Cancelling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    /// `HH:MM:SS`, already formatted by the producer.
    pub clock: String,
    pub text: String,
    pub kind: LineKind,
}

impl ConsoleLine {
    pub fn new(clock: impl Into<String>, text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            clock: clock.into(),
            text: text.into(),
            kind,
        }
    }

    pub fn formatted(&self) -> String {
        format!("[{}] {}", self.clock, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: Phase,
    console: Vec<ConsoleLine>,
    /// Index of the first line the renderer has not shown yet.
    rendered: usize,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> AppViewModel {
        let status = match self.phase {
            Phase::Running => STATUS_PROCESSING,
            Phase::Cancelling => STATUS_CANCELLING,
            _ => STATUS_READY,
        };
        AppViewModel {
            phase: self.phase,
            status: status.to_string(),
            run_enabled: !self.phase.is_active(),
            cancel_enabled: self.phase == Phase::Running,
            console_len: self.console.len(),
            dirty: self.dirty,
        }
    }

    pub fn console(&self) -> &[ConsoleLine] {
        &self.console
    }

    /// Lines appended since the previous call.
    pub fn take_unrendered(&mut self) -> Vec<ConsoleLine> {
        let lines = self.console[self.rendered..].to_vec();
        self.rendered = self.console.len();
        lines
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.dirty = true;
        }
    }

    pub(crate) fn append_lines(&mut self, lines: Vec<ConsoleLine>) {
        if !lines.is_empty() {
            self.console.extend(lines);
            self.dirty = true;
        }
    }

    pub(crate) fn clear_console(&mut self) {
        self.console.clear();
        self.rendered = 0;
        self.dirty = true;
    }
}
