//! The external elevation-model pipeline as seen from the orchestrator.
//!
//! Nothing here computes a REM. Implementations wrap whatever pipeline is
//! installed and are free to fail in any stage; the task turns those failures
//! into log lines and a terminal state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::compat::{CompatBindings, GeocodingLibrary, GeometryLibrary, ModuleRegistry};
use crate::VisualizationOptions;

/// Value of one named constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Path(PathBuf),
    Int(i64),
    Float(f64),
    Text(String),
    Flag(bool),
    /// Explicitly leave the choice to the pipeline (e.g. `k = auto`).
    Unset,
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Path(path) => write!(f, "{}", path.display()),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
            ParamValue::Flag(value) => write!(f, "{value}"),
            ParamValue::Unset => f.write_str("auto"),
        }
    }
}

/// Named parameters handed to [`PipelineEntryPoint::construct`], ordered by name.
pub type Payload = BTreeMap<String, ParamValue>;

/// Raster cell dimensions as reported by a constructed pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    /// Raster writers reject negative cell sizes; geotransforms usually carry
    /// a negative height.
    pub fn normalized(self) -> Self {
        Self {
            width: self.width.abs(),
            height: self.height.abs(),
        }
    }
}

pub trait PipelineEntryPoint: Send + Sync {
    /// Human readable name used in log lines.
    fn name(&self) -> &str;

    /// Names of the constructor parameters this version accepts.
    fn accepted_parameters(&self) -> anyhow::Result<Vec<String>>;

    /// Builds a pipeline handle. Library lookups must go through `bindings`.
    fn construct(
        &self,
        payload: &Payload,
        bindings: &CompatBindings,
    ) -> anyhow::Result<Box<dyn PipelineHandle>>;
}

pub trait PipelineHandle: Send {
    /// Runs the main transform and returns the path of the produced REM raster.
    fn make_rem(&mut self) -> anyhow::Result<PathBuf>;

    fn make_rem_viz(&mut self, options: &VisualizationOptions) -> anyhow::Result<()> {
        let _ = options;
        anyhow::bail!("this pipeline version cannot render visualizations")
    }

    /// Removes intermediate cache files.
    fn clean_up(&mut self) -> anyhow::Result<()>;

    fn cell_size(&self) -> Option<CellSize> {
        None
    }

    fn set_cell_size(&mut self, size: CellSize) {
        let _ = size;
    }
}

/// Everything the orchestrator needs from the installed geospatial stack.
#[derive(Clone)]
pub struct Toolkit {
    pub entry_point: Arc<dyn PipelineEntryPoint>,
    pub modules: Arc<ModuleRegistry>,
    pub geometry: Option<Arc<dyn GeometryLibrary>>,
    pub geocoding: Option<Arc<dyn GeocodingLibrary>>,
}

impl Toolkit {
    pub fn new(entry_point: Arc<dyn PipelineEntryPoint>, modules: Arc<ModuleRegistry>) -> Self {
        Self {
            entry_point,
            modules,
            geometry: None,
            geocoding: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Arc<dyn GeometryLibrary>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_geocoding(mut self, geocoding: Arc<dyn GeocodingLibrary>) -> Self {
        self.geocoding = Some(geocoding);
        self
    }
}
