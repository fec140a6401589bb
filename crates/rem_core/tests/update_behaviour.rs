use std::sync::Once;

use pretty_assertions::assert_eq;
use rem_core::{
    update, AppState, ConsoleLine, DialogKind, Effect, LineKind, Msg, Phase, STATUS_CANCELLING,
    STATUS_PROCESSING, STATUS_READY,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(rem_logging::initialize_for_tests);
}

fn running() -> AppState {
    let (state, effects) = update(AppState::new(), Msg::RunClicked);
    assert_eq!(effects, vec![Effect::StartRun]);
    state
}

fn line(text: &str, kind: LineKind) -> ConsoleLine {
    ConsoleLine::new("12:00:00", text, kind)
}

#[test]
fn run_locks_controls_and_sets_status() {
    init_logging();
    let state = running();
    let view = state.view();

    assert_eq!(view.phase, Phase::Running);
    assert_eq!(view.status, STATUS_PROCESSING);
    assert!(!view.run_enabled);
    assert!(view.cancel_enabled);
    assert!(view.dirty);
}

#[test]
fn second_run_click_is_ignored_while_active() {
    init_logging();
    let (state, effects) = update(running(), Msg::RunClicked);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Running);
}

#[test]
fn cancel_moves_to_cancelling_once() {
    init_logging();
    let (state, effects) = update(running(), Msg::CancelClicked);
    assert_eq!(effects, vec![Effect::RequestCancel]);
    let view = state.view();
    assert_eq!(view.status, STATUS_CANCELLING);
    assert!(!view.cancel_enabled);
    assert!(!view.run_enabled);

    let (_state, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
}

#[test]
fn cancel_when_idle_does_nothing() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::CancelClicked);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn run_finished_unlocks_controls() {
    init_logging();
    for terminal in [Phase::Completed, Phase::Failed, Phase::Cancelled] {
        let (state, effects) = update(running(), Msg::RunFinished(terminal));
        assert!(effects.is_empty());
        let view = state.view();
        assert_eq!(view.phase, terminal);
        assert_eq!(view.status, STATUS_READY);
        assert!(view.run_enabled);
        assert!(!view.cancel_enabled);
    }
}

#[test]
fn run_finished_with_non_terminal_phase_falls_back_to_idle() {
    init_logging();
    let (state, _) = update(running(), Msg::RunFinished(Phase::Running));
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.view().run_enabled);
}

#[test]
fn finished_run_can_be_started_again() {
    init_logging();
    let (state, _) = update(running(), Msg::RunFinished(Phase::Failed));
    let (state, effects) = update(state, Msg::RunClicked);
    assert_eq!(effects, vec![Effect::StartRun]);
    assert_eq!(state.phase(), Phase::Running);
}

#[test]
fn rejected_run_shows_error_and_returns_to_idle() {
    init_logging();
    let (state, effects) = update(running(), Msg::RunRejected("DEM file not found".into()));
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(
        effects,
        vec![Effect::ShowDialog {
            kind: DialogKind::Error,
            title: "Invalid Parameters".to_string(),
            body: "DEM file not found".to_string(),
        }]
    );
}

#[test]
fn notices_become_dialogs() {
    init_logging();
    let (_, effects) = update(
        running(),
        Msg::InfoNotice {
            title: "Success".into(),
            body: "done".into(),
        },
    );
    assert!(matches!(
        effects.as_slice(),
        [Effect::ShowDialog {
            kind: DialogKind::Info,
            ..
        }]
    ));
}

#[test]
fn console_collects_lines_and_renders_each_once() {
    init_logging();
    let mut state = AppState::new();
    assert!(!state.consume_dirty());

    let (next, _) = update(
        state,
        Msg::LogsArrived(vec![line("a", LineKind::Info), line("b", LineKind::Warning)]),
    );
    state = next;
    assert!(state.consume_dirty());
    assert_eq!(state.take_unrendered().len(), 2);
    assert!(state.take_unrendered().is_empty());

    let (next, _) = update(state, Msg::LogsArrived(vec![line("c", LineKind::Error)]));
    state = next;
    let fresh = state.take_unrendered();
    assert_eq!(fresh, vec![line("c", LineKind::Error)]);
    assert_eq!(fresh[0].formatted(), "[12:00:00] c");
    assert_eq!(state.view().console_len, 3);
}

#[test]
fn empty_log_batch_does_not_dirty() {
    init_logging();
    let (mut state, _) = update(AppState::new(), Msg::LogsArrived(Vec::new()));
    assert!(!state.consume_dirty());
}

#[test]
fn clear_console_empties_the_log() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::LogsArrived(vec![line("a", LineKind::Info)]),
    );
    let (mut state, _) = update(state, Msg::ClearConsoleClicked);
    assert!(state.console().is_empty());
    assert!(state.take_unrendered().is_empty());
    assert!(state.consume_dirty());
}

#[test]
fn quit_while_running_asks_first() {
    init_logging();
    let (state, effects) = update(running(), Msg::QuitRequested);
    assert_eq!(effects, vec![Effect::ConfirmQuit]);

    let (state, effects) = update(state, Msg::QuitConfirmed(true));
    assert_eq!(effects, vec![Effect::RequestCancel, Effect::Quit]);
    assert_eq!(state.phase(), Phase::Cancelling);
}

#[test]
fn quit_when_idle_is_immediate() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::QuitRequested);
    assert_eq!(effects, vec![Effect::Quit]);
}
