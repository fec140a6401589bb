use std::sync::Arc;

use crate::compat::CompatBindings;
use crate::task::CancellableTask;
use crate::{LogMessage, MessageChannel, RemParameters, TaskError, TaskState, Toolkit, UiNotice, UiQueue};

/// What the UI thread holds: one task, its log channel and its notice queue.
///
/// Everything here is non-blocking except [`EngineHandle::join`].
pub struct EngineHandle {
    task: CancellableTask,
    channel: MessageChannel,
    notices: UiQueue,
}

impl EngineHandle {
    pub fn new(toolkit: Toolkit) -> Self {
        Self::with_bindings(toolkit, CompatBindings::global())
    }

    pub fn with_bindings(toolkit: Toolkit, bindings: Arc<CompatBindings>) -> Self {
        Self::from_parts(toolkit, bindings, MessageChannel::new())
    }

    /// Uses an existing channel, e.g. one a log bridge already writes into.
    pub fn with_channel(toolkit: Toolkit, channel: MessageChannel) -> Self {
        Self::from_parts(toolkit, CompatBindings::global(), channel)
    }

    fn from_parts(toolkit: Toolkit, bindings: Arc<CompatBindings>, channel: MessageChannel) -> Self {
        let notices = UiQueue::new();
        let task = CancellableTask::new(
            toolkit,
            bindings,
            channel.clone(),
            Arc::new(notices.clone()),
        );
        Self {
            task,
            channel,
            notices,
        }
    }

    pub fn start(&mut self, params: RemParameters) -> Result<(), TaskError> {
        self.task.start(params)
    }

    pub fn request_cancel(&self) -> bool {
        self.task.request_cancel()
    }

    pub fn current_state(&self) -> TaskState {
        self.task.current_state()
    }

    pub fn drain_logs(&self) -> Vec<LogMessage> {
        self.channel.drain_all()
    }

    pub fn try_recv_notice(&self) -> Option<UiNotice> {
        self.notices.try_recv()
    }

    pub fn join(&mut self) -> TaskState {
        self.task.join()
    }
}
