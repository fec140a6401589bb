use crate::{AppState, DialogKind, Effect, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RunClicked => {
            if state.phase().is_active() {
                Vec::new()
            } else {
                state.set_phase(Phase::Running);
                vec![Effect::StartRun]
            }
        }
        Msg::RunRejected(reason) => {
            if state.phase() == Phase::Running {
                state.set_phase(Phase::Idle);
            }
            vec![Effect::ShowDialog {
                kind: DialogKind::Error,
                title: "Invalid Parameters".to_string(),
                body: reason,
            }]
        }
        Msg::CancelClicked => {
            if state.phase() == Phase::Running {
                state.set_phase(Phase::Cancelling);
                vec![Effect::RequestCancel]
            } else {
                Vec::new()
            }
        }
        Msg::LogsArrived(lines) => {
            state.append_lines(lines);
            Vec::new()
        }
        Msg::InfoNotice { title, body } => vec![Effect::ShowDialog {
            kind: DialogKind::Info,
            title,
            body,
        }],
        Msg::ErrorNotice { title, body } => vec![Effect::ShowDialog {
            kind: DialogKind::Error,
            title,
            body,
        }],
        Msg::RunFinished(phase) => {
            // Controls always unlock; a stray non-terminal phase maps to Idle.
            let phase = match phase {
                Phase::Completed | Phase::Failed | Phase::Cancelled => phase,
                Phase::Idle | Phase::Running | Phase::Cancelling => Phase::Idle,
            };
            state.set_phase(phase);
            Vec::new()
        }
        Msg::ClearConsoleClicked => {
            state.clear_console();
            Vec::new()
        }
        Msg::QuitRequested => {
            if state.phase().is_active() {
                vec![Effect::ConfirmQuit]
            } else {
                vec![Effect::Quit]
            }
        }
        Msg::QuitConfirmed(true) => {
            if state.phase() == Phase::Running {
                state.set_phase(Phase::Cancelling);
                vec![Effect::RequestCancel, Effect::Quit]
            } else {
                vec![Effect::Quit]
            }
        }
        Msg::QuitConfirmed(false) | Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
