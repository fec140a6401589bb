use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use rem_core::{update, AppState, Msg, Phase};
use rem_engine::{EngineHandle, MessageChannel};
use rem_logging::{console, rem_error, rem_info};

use super::cli::Cli;
use super::effects::EffectRunner;
use super::{logging, render, settings, toolkit};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

pub fn run_app() -> ExitCode {
    let cli = Cli::parse();

    let channel = MessageChannel::new();
    logging::initialize(cli.log.into(), channel.clone());
    // The terminal render is the console; pipeline output only travels
    // through the task log.
    console::detach();

    let mut settings = match settings::load(&cli.settings) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Could not load settings: {err:#}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = cli.apply(&mut settings) {
        eprintln!("{err:#}");
        return ExitCode::from(2);
    }
    if cli.save_settings {
        if let Err(err) = settings::save(&cli.settings, &settings) {
            eprintln!("Could not save settings: {err:#}");
        }
    }

    let engine = EngineHandle::with_channel(toolkit::discover(&settings.pipeline), channel);
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    spawn_stdin_reader(msg_tx.clone());
    spawn_ticker(msg_tx.clone());

    let mut runner = EffectRunner::new(engine, settings.parameters, msg_tx.clone());
    let mut state = AppState::new();
    render::status(&state.view());
    let _ = msg_tx.send(Msg::RunClicked);

    while let Ok(msg) = msg_rx.recv() {
        if msg == Msg::Tick {
            runner.pump();
        }
        let outcome = match &msg {
            Msg::RunFinished(phase) => Some(exit_code(*phase)),
            Msg::RunRejected(_) => Some(ExitCode::from(2)),
            _ => None,
        };

        let (next, effects) = update(state, msg);
        state = next;
        render::console(&state.take_unrendered());
        runner.run(effects);
        if state.consume_dirty() {
            render::status(&state.view());
        }

        if runner.quit_requested() {
            rem_info!("Quit requested in phase {:?}", state.phase());
            return exit_code(state.phase());
        }
        if let Some(code) = outcome {
            return code;
        }
    }

    rem_error!("UI message loop ended unexpectedly");
    ExitCode::FAILURE
}

fn exit_code(phase: Phase) -> ExitCode {
    match phase {
        Phase::Completed => ExitCode::SUCCESS,
        Phase::Cancelled | Phase::Cancelling => ExitCode::from(130),
        Phase::Idle | Phase::Running | Phase::Failed => ExitCode::FAILURE,
    }
}

fn spawn_ticker(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        while msg_tx.send(Msg::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });
}

fn spawn_stdin_reader(msg_tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(Result::ok) {
            let Some(msg) = command(&line) else {
                continue;
            };
            if msg_tx.send(msg).is_err() {
                break;
            }
        }
    });
}

fn command(line: &str) -> Option<Msg> {
    match line.trim().to_ascii_lowercase().as_str() {
        "c" | "cancel" => Some(Msg::CancelClicked),
        "q" | "quit" => Some(Msg::QuitRequested),
        "y" | "yes" => Some(Msg::QuitConfirmed(true)),
        "n" | "no" => Some(Msg::QuitConfirmed(false)),
        "clear" => Some(Msg::ClearConsoleClicked),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typed_commands_map_to_messages() {
        assert_eq!(command(" C "), Some(Msg::CancelClicked));
        assert_eq!(command("quit"), Some(Msg::QuitRequested));
        assert_eq!(command("y"), Some(Msg::QuitConfirmed(true)));
        assert_eq!(command("no"), Some(Msg::QuitConfirmed(false)));
        assert_eq!(command("hello"), None);
    }

    #[test]
    fn terminal_phases_select_exit_codes() {
        assert_eq!(exit_code(Phase::Completed), ExitCode::SUCCESS);
        assert_eq!(exit_code(Phase::Failed), ExitCode::FAILURE);
        assert_eq!(exit_code(Phase::Cancelled), ExitCode::from(130));
    }
}
