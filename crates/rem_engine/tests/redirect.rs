use std::sync::{Arc, Mutex, MutexGuard};

use pretty_assertions::assert_eq;
use rem_engine::{MessageChannel, OutputRedirector, Severity};
use rem_logging::console::{self, TextStream};
use rem_logging::{rem_print, rem_println};

fn serial() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
struct Capture(Mutex<String>);

impl TextStream for Capture {
    fn write_str(&self, text: &str) {
        self.0.lock().unwrap().push_str(text);
    }
}

#[test]
fn writes_reach_channel_and_previous_stream() {
    let _serial = serial();
    let capture = Arc::new(Capture::default());
    let original = console::replace(Some(capture.clone()));
    let channel = MessageChannel::new();

    {
        let _redirect = OutputRedirector::install(&channel);
        rem_println!("Fitting {} points", 1000);
        rem_print!("   \n");
    }

    let messages = channel.drain_all();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text(), "Fitting 1000 points");
    assert_eq!(messages[0].severity(), Severity::Info);
    assert_eq!(*capture.0.lock().unwrap(), "Fitting 1000 points\n   \n");

    console::replace(original);
}

#[test]
fn original_stream_is_restored_by_identity() {
    let _serial = serial();
    let before = console::current();
    {
        let _redirect = OutputRedirector::install(&MessageChannel::new());
        assert!(!console::same_stream(&console::current(), &before));
    }
    assert!(console::same_stream(&console::current(), &before));
}

#[test]
fn detached_console_still_mirrors_and_restores_none() {
    let _serial = serial();
    let original = console::detach();
    let channel = MessageChannel::new();
    {
        let redirect = OutputRedirector::install(&channel);
        assert!(redirect.previous().is_none());
        rem_println!("no console attached");
    }
    assert!(console::current().is_none());
    assert_eq!(channel.drain_all()[0].text(), "no console attached");

    console::replace(original);
}

#[test]
fn restored_even_when_the_scope_panics() {
    let _serial = serial();
    let before = console::current();
    let result = std::panic::catch_unwind(|| {
        let _redirect = OutputRedirector::install(&MessageChannel::new());
        panic!("pipeline blew up");
    });
    assert!(result.is_err());
    assert!(console::same_stream(&console::current(), &before));
}
