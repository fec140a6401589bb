use std::sync::Arc;

use rem_logging::console::{self, StreamHandle, TextStream};
use rem_logging::rem_debug;

use crate::{LogMessage, MessageChannel};

/// Scoped capture of the process-wide console stream.
///
/// While alive, every write is passed through verbatim to the stream that was
/// installed before (when there was one) and every non-blank write is
/// published as an `info` message. Dropping the guard puts the original stream
/// back, so panics and early returns restore it too. Single slot: at most one
/// redirector is expected to be alive at a time.
pub struct OutputRedirector {
    previous: Option<StreamHandle>,
}

struct MirrorStream {
    previous: Option<StreamHandle>,
    channel: MessageChannel,
}

impl TextStream for MirrorStream {
    fn write_str(&self, text: &str) {
        let line = text.trim_end_matches(['\r', '\n']);
        if !line.trim().is_empty() {
            self.channel.publish(LogMessage::info(line));
        }
        if let Some(previous) = &self.previous {
            previous.write_str(text);
        }
    }

    fn flush(&self) {
        if let Some(previous) = &self.previous {
            previous.flush();
        }
    }
}

impl OutputRedirector {
    pub fn install(channel: &MessageChannel) -> Self {
        let mirror = MirrorStream {
            previous: console::current(),
            channel: channel.clone(),
        };
        let previous = console::replace(Some(Arc::new(mirror)));
        rem_debug!(
            "console redirected (previous stream attached: {})",
            previous.is_some()
        );
        Self { previous }
    }

    /// The stream that will be restored on drop.
    pub fn previous(&self) -> Option<&StreamHandle> {
        self.previous.as_ref()
    }
}

impl Drop for OutputRedirector {
    fn drop(&mut self) {
        console::flush();
        console::replace(self.previous.take());
        rem_debug!("console restored");
    }
}
