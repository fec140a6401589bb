use crate::{ConsoleLine, Phase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User pressed Run.
    RunClicked,
    /// The engine refused to start, e.g. because of invalid parameters.
    RunRejected(String),
    /// User pressed Cancel.
    CancelClicked,
    /// Console lines drained from the engine since the last tick.
    LogsArrived(Vec<ConsoleLine>),
    /// Worker asked for an information dialog.
    InfoNotice { title: String, body: String },
    /// Worker asked for an error dialog.
    ErrorNotice { title: String, body: String },
    /// Worker finished; re-enable the controls. Carries the terminal phase.
    RunFinished(Phase),
    /// User pressed Clear Console.
    ClearConsoleClicked,
    /// User asked to close the window.
    QuitRequested,
    /// Answer to the quit confirmation shown while a run is active.
    QuitConfirmed(bool),
    /// UI timer tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
