//! Background task orchestration.
//!
//! One worker thread per run. Cancellation is cooperative: `request_cancel`
//! raises a flag that the worker reads at four checkpoints (after negotiation,
//! after the transform, after visualization, after cleanup). A call already
//! inside the external pipeline is never interrupted, so the latency of a
//! cancel is bounded only by the longest pipeline stage.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use rem_logging::{rem_error, rem_info, rem_warn};

use crate::compat::{CompatBindings, CompatibilityAdapter};
use crate::negotiate::{negotiate, CapabilityDescriptor};
use crate::{
    AdapterFailure, CenterlineSource, ConfigurationError, ExternalLibraryError, MessageChannel,
    Neighbors, OutputRedirector, PipelineHandle, RemParameters, Stage, TaskError, TaskState,
    Toolkit, UiNotice, UiScheduler,
};

const BANNER: &str = "==================================================";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Negotiated,
    Transformed,
    Visualized,
    CleanedUp,
}

/// Advisory cancel flag shared between the UI and the worker.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    flag: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct TaskShared {
    state: Mutex<TaskState>,
    cancel: CancellationFlag,
}

impl TaskShared {
    fn state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct CancellableTask {
    toolkit: Toolkit,
    bindings: Arc<CompatBindings>,
    channel: MessageChannel,
    ui: Arc<dyn UiScheduler>,
    shared: Arc<TaskShared>,
    worker: Option<JoinHandle<()>>,
}

impl CancellableTask {
    pub fn new(
        toolkit: Toolkit,
        bindings: Arc<CompatBindings>,
        channel: MessageChannel,
        ui: Arc<dyn UiScheduler>,
    ) -> Self {
        Self {
            toolkit,
            bindings,
            channel,
            ui,
            shared: Arc::new(TaskShared::default()),
            worker: None,
        }
    }

    pub fn current_state(&self) -> TaskState {
        *self.shared.state()
    }

    /// Validates `params` and spawns the worker.
    ///
    /// Invalid parameters are reported here, on the calling thread, and no
    /// thread is started. A terminal state counts as idle for a new run.
    pub fn start(&mut self, params: RemParameters) -> Result<(), TaskError> {
        if self.current_state().is_active() {
            return Err(TaskError::AlreadyRunning);
        }
        params.validate(&self.channel)?;

        // The previous worker has already scheduled its reset; reap it.
        if let Some(previous) = self.worker.take() {
            let _ = previous.join();
        }

        {
            let mut state = self.shared.state();
            if state.is_active() {
                return Err(TaskError::AlreadyRunning);
            }
            *state = TaskState::Running;
            self.shared.cancel.reset();
        }

        let worker = Worker {
            toolkit: self.toolkit.clone(),
            bindings: self.bindings.clone(),
            channel: self.channel.clone(),
            ui: self.ui.clone(),
            shared: self.shared.clone(),
            stage: Cell::new(Stage::Compatibility),
        };
        let spawned = thread::Builder::new()
            .name("rem-worker".to_string())
            .spawn(move || worker.run(params));

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(err) => {
                *self.shared.state() = TaskState::Idle;
                Err(TaskError::Spawn(err))
            }
        }
    }

    /// Asks the worker to stop at its next checkpoint. Returns immediately.
    ///
    /// Returns `false` when no run is in progress.
    pub fn request_cancel(&self) -> bool {
        let mut state = self.shared.state();
        match *state {
            TaskState::Running => {
                *state = TaskState::CancelRequested;
                self.shared.cancel.request();
                drop(state);
                rem_info!("cancellation requested");
                self.channel.info(
                    "Cancellation requested. Processing will stop after current step...",
                );
                true
            }
            TaskState::CancelRequested => true,
            _ => false,
        }
    }

    /// Blocks until the current worker (if any) has exited and returns the final state.
    pub fn join(&mut self) -> TaskState {
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.current_state()
    }
}

enum RunEnd {
    Completed,
    Cancelled(Checkpoint),
}

#[derive(Debug)]
enum RunFailure {
    Adapter(AdapterFailure),
    Configuration(ConfigurationError),
    External(ExternalLibraryError),
}

impl RunFailure {
    fn summary(&self) -> String {
        match self {
            RunFailure::Adapter(err) => err.to_string(),
            RunFailure::Configuration(err) => err.to_string(),
            RunFailure::External(err) => err.to_string(),
        }
    }
}

struct Worker {
    toolkit: Toolkit,
    bindings: Arc<CompatBindings>,
    channel: MessageChannel,
    ui: Arc<dyn UiScheduler>,
    shared: Arc<TaskShared>,
    stage: Cell<Stage>,
}

impl Worker {
    fn run(self, params: RemParameters) {
        let redirect = OutputRedirector::install(&self.channel);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(&params)))
            .unwrap_or_else(|payload| {
                Err(RunFailure::External(ExternalLibraryError::from_panic(
                    self.stage.get(),
                    payload,
                )))
            });
        drop(redirect);
        self.finish(outcome, &params);
    }

    fn enter(&self, stage: Stage) {
        self.stage.set(stage);
    }

    fn external<T>(&self, result: anyhow::Result<T>) -> Result<T, RunFailure> {
        result.map_err(|err| {
            RunFailure::External(ExternalLibraryError::from_anyhow(self.stage.get(), &err))
        })
    }

    /// `true` when the run must stop here.
    fn checkpoint(&self, checkpoint: Checkpoint) -> bool {
        if self.shared.cancel.is_requested() {
            rem_info!("cancellation honoured at {checkpoint:?}");
            self.channel.info("Processing cancelled by user");
            true
        } else {
            false
        }
    }

    fn run_pipeline(&self, params: &RemParameters) -> Result<RunEnd, RunFailure> {
        self.channel.info(BANNER);
        self.channel.info("Starting REM generation...");
        self.channel.info(BANNER);

        self.enter(Stage::Compatibility);
        self.channel.info("Setting up library compatibility...");
        CompatibilityAdapter::new(&self.toolkit, &self.bindings, &self.channel)
            .apply()
            .map_err(|err| {
                self.channel.error(
                    "Error: the raster library is not properly installed (install GDAL, e.g. from conda-forge)",
                );
                RunFailure::Adapter(err)
            })?;

        self.describe_dem(params);
        self.echo_parameters(params);

        self.enter(Stage::Negotiation);
        let entry_point = self.toolkit.entry_point.as_ref();
        self.channel
            .info(format!("Initializing {}...", entry_point.name()));
        let capabilities = CapabilityDescriptor::introspect(entry_point);
        if capabilities.supports("centerline_shp") {
            self.channel.info("Using full pipeline API");
        } else {
            self.channel.info("Using basic pipeline API");
            self.channel
                .info("  For more options, install the latest pipeline release");
        }
        let negotiation =
            negotiate(&capabilities, &params.desired()).map_err(RunFailure::Configuration)?;
        for warning in &negotiation.warnings {
            rem_warn!("{warning}");
            self.channel.warning(warning.as_str());
        }
        if self.checkpoint(Checkpoint::Negotiated) {
            return Ok(RunEnd::Cancelled(Checkpoint::Negotiated));
        }

        self.enter(Stage::Construction);
        let mut handle = self.external(entry_point.construct(&negotiation.payload, &self.bindings))?;
        normalize_cell_size(handle.as_mut());

        self.enter(Stage::Transform);
        self.channel
            .info("Generating REM (this may take a while)...");
        let rem_path = self.external(handle.make_rem())?;
        self.channel
            .success(format!("REM created: {}", rem_path.display()));
        if self.checkpoint(Checkpoint::Transformed) {
            return Ok(RunEnd::Cancelled(Checkpoint::Transformed));
        }

        if let Some(viz) = &params.visualization {
            self.enter(Stage::Visualization);
            self.channel.info("Creating visualization...");
            self.channel.info(format!("  Colormap: {}", viz.colormap));
            self.channel.info(format!(
                "  Vertical exaggeration: {}x",
                viz.vertical_exaggeration
            ));
            self.channel
                .info(format!("  Hillshade blend: {}%", viz.blend_percent));
            self.external(handle.make_rem_viz(viz))?;
            self.channel
                .success("Visualization created successfully!");
        }
        if self.checkpoint(Checkpoint::Visualized) {
            return Ok(RunEnd::Cancelled(Checkpoint::Visualized));
        }

        self.enter(Stage::Cleanup);
        self.channel.info("Cleaning up temporary files...");
        self.external(handle.clean_up())?;
        if self.checkpoint(Checkpoint::CleanedUp) {
            return Ok(RunEnd::Cancelled(Checkpoint::CleanedUp));
        }

        self.channel.info(BANNER);
        self.channel.success("REM GENERATION COMPLETE!");
        self.channel.info(BANNER);
        self.channel.info(format!(
            "Output files saved to: {}",
            params.out_dir.display()
        ));
        Ok(RunEnd::Completed)
    }

    fn describe_dem(&self, params: &RemParameters) {
        let Some(module) = self.bindings.raster_module("gdal") else {
            return;
        };
        let file_name = file_name(&params.dem_path);
        match module.describe(&params.dem_path) {
            Ok(summary) => {
                for line in summary.report(&file_name) {
                    self.channel.info(line);
                }
            }
            Err(err) => self
                .channel
                .warning(format!("Could not read DEM metadata: {err:#}")),
        }
    }

    fn echo_parameters(&self, params: &RemParameters) {
        match &params.centerline {
            CenterlineSource::Custom(path) => self
                .channel
                .info(format!("Using custom centerline: {}", file_name(path))),
            CenterlineSource::OpenStreetMap => self
                .channel
                .info("Using OpenStreetMap for river centerline detection"),
        }
        self.channel
            .info(format!("DEM: {}", file_name(&params.dem_path)));
        self.channel
            .info(format!("Output directory: {}", params.out_dir.display()));
        self.channel
            .info(format!("Interpolation points: {}", params.interp_pts));
        let k = match params.k {
            Neighbors::Auto => "auto".to_string(),
            Neighbors::Fixed(k) => k.to_string(),
        };
        self.channel.info(format!("K neighbors: {k}"));
        self.channel.info(format!("Workers: {}", params.workers));
    }

    /// Records the terminal state and notifies the UI. Runs exactly once per run.
    fn finish(&self, outcome: Result<RunEnd, RunFailure>, params: &RemParameters) {
        let (terminal, dialog) = match outcome {
            Ok(RunEnd::Completed) => {
                rem_info!("run completed");
                let dialog = UiNotice::Info {
                    title: "Success".to_string(),
                    body: format!(
                        "REM generation complete!\n\nOutput saved to:\n{}",
                        params.out_dir.display()
                    ),
                };
                (TaskState::Completed, Some(dialog))
            }
            Ok(RunEnd::Cancelled(checkpoint)) => {
                rem_info!("run cancelled at {checkpoint:?}");
                (TaskState::Cancelled, None)
            }
            Err(failure) => {
                let summary = failure.summary();
                rem_error!("run failed: {summary}");
                self.channel.error(format!("ERROR: {summary}"));
                if let RunFailure::External(ExternalLibraryError {
                    detail: Some(detail),
                    ..
                }) = &failure
                {
                    self.channel.error(detail.as_str());
                }
                let dialog = UiNotice::Error {
                    title: "Error".to_string(),
                    body: format!("An error occurred during processing:\n\n{summary}"),
                };
                (TaskState::Failed, Some(dialog))
            }
        };

        *self.shared.state() = terminal;
        if let Some(dialog) = dialog {
            self.ui.schedule(dialog);
        }
        self.ui.schedule(UiNotice::ResetControls { state: terminal });
    }
}

fn normalize_cell_size(handle: &mut dyn PipelineHandle) {
    if let Some(size) = handle.cell_size() {
        let normalized = size.normalized();
        if normalized != size {
            rem_info!("normalizing cell size {size:?} -> {normalized:?}");
            handle.set_cell_size(normalized);
        }
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
