//! REM engine: background task orchestration and library compatibility.
mod channel;
pub mod compat;
mod engine;
mod error;
mod negotiate;
mod params;
mod persist;
mod pipeline;
mod redirect;
mod task;
mod types;
mod ui;

pub use channel::MessageChannel;
pub use compat::{AdapterPatch, CompatBindings, CompatReport, CompatibilityAdapter, ShimKind};
pub use engine::EngineHandle;
pub use error::{AdapterFailure, ConfigurationError, ExternalLibraryError, PersistError, TaskError};
pub use negotiate::{negotiate, CapabilityDescriptor, DesiredParameters, Negotiation, OptionalParam};
pub use params::{
    default_workers, CenterlineSource, Neighbors, RemParameters, VisualizationOptions, COLORMAPS,
    EPS_RANGE, INTERP_PTS_RANGE,
};
pub use persist::{ensure_output_dir, write_atomic};
pub use pipeline::{CellSize, ParamValue, Payload, PipelineEntryPoint, PipelineHandle, Toolkit};
pub use redirect::OutputRedirector;
pub use task::{CancellableTask, CancellationFlag, Checkpoint};
pub use types::{LogMessage, Severity, Stage, TaskState};
pub use ui::{UiNotice, UiQueue, UiScheduler};
