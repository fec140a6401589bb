#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartRun,
    RequestCancel,
    ShowDialog {
        kind: DialogKind,
        title: String,
        body: String,
    },
    /// Ask the user whether to quit while processing.
    ConfirmQuit,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Info,
    Error,
}
