use crate::Phase;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_PROCESSING: &str = "Processing...";
pub const STATUS_CANCELLING: &str = "Cancelling...";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub status: String,
    pub run_enabled: bool,
    pub cancel_enabled: bool,
    pub console_len: usize,
    pub dirty: bool,
}
