use std::sync::mpsc;

use rem_core::{ConsoleLine, Effect, LineKind, Msg, Phase};
use rem_engine::{
    ConfigurationError, EngineHandle, LogMessage, RemParameters, Severity, TaskError, TaskState,
    UiNotice,
};
use rem_logging::{rem_info, rem_warn};

use super::render;

pub struct EffectRunner {
    engine: EngineHandle,
    params: RemParameters,
    msg_tx: mpsc::Sender<Msg>,
    quit_requested: bool,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, params: RemParameters, msg_tx: mpsc::Sender<Msg>) -> Self {
        Self {
            engine,
            params,
            msg_tx,
            quit_requested: false,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartRun => {
                    rem_info!("StartRun dem={:?}", self.params.dem_path);
                    if let Err(err) = self.engine.start(self.params.clone()) {
                        rem_warn!("Run rejected: {}", err);
                        let _ = self.msg_tx.send(Msg::RunRejected(rejection_text(&err)));
                    }
                }
                Effect::RequestCancel => {
                    let accepted = self.engine.request_cancel();
                    rem_info!("RequestCancel accepted={}", accepted);
                }
                Effect::ShowDialog { kind, title, body } => render::dialog(kind, &title, &body),
                Effect::ConfirmQuit => {
                    render::prompt("Processing is in progress. Are you sure you want to quit? [y/n]")
                }
                Effect::Quit => self.quit_requested = true,
            }
        }
    }

    /// Moves everything the worker produced since the last tick into messages.
    ///
    /// Notices are taken before the log drain: the worker publishes a run's
    /// lines before scheduling its notices, so the drain that follows holds
    /// every line those notices refer to.
    pub fn pump(&self) {
        let notices: Vec<UiNotice> =
            std::iter::from_fn(|| self.engine.try_recv_notice()).collect();
        let lines: Vec<ConsoleLine> = self.engine.drain_logs().iter().map(console_line).collect();
        if !lines.is_empty() {
            let _ = self.msg_tx.send(Msg::LogsArrived(lines));
        }
        for notice in notices {
            let _ = self.msg_tx.send(map_notice(notice));
        }
    }
}

fn rejection_text(err: &TaskError) -> String {
    match err {
        TaskError::Configuration(ConfigurationError::Invalid(problems)) => problems.join("\n"),
        other => other.to_string(),
    }
}

pub fn console_line(message: &LogMessage) -> ConsoleLine {
    ConsoleLine::new(
        message.timestamp().format("%H:%M:%S").to_string(),
        message.text(),
        map_severity(message.severity()),
    )
}

fn map_severity(severity: Severity) -> LineKind {
    match severity {
        Severity::Info => LineKind::Info,
        Severity::Success => LineKind::Success,
        Severity::Warning => LineKind::Warning,
        Severity::Error => LineKind::Error,
    }
}

pub fn map_state(state: TaskState) -> Phase {
    match state {
        TaskState::Idle => Phase::Idle,
        TaskState::Running => Phase::Running,
        TaskState::CancelRequested => Phase::Cancelling,
        TaskState::Completed => Phase::Completed,
        TaskState::Failed => Phase::Failed,
        TaskState::Cancelled => Phase::Cancelled,
    }
}

fn map_notice(notice: UiNotice) -> Msg {
    match notice {
        UiNotice::Info { title, body } => Msg::InfoNotice { title, body },
        UiNotice::Error { title, body } => Msg::ErrorNotice { title, body },
        UiNotice::ResetControls { state } => Msg::RunFinished(map_state(state)),
    }
}
