//! REM runner core: pure UI state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{DialogKind, Effect};
pub use msg::Msg;
pub use state::{AppState, ConsoleLine, LineKind, Phase};
pub use update::update;
pub use view_model::{AppViewModel, STATUS_CANCELLING, STATUS_PROCESSING, STATUS_READY};
