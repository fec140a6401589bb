use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::negotiate::{DesiredParameters, OptionalParam};
use crate::persist::ensure_output_dir;
use crate::{ConfigurationError, MessageChannel, ParamValue};

/// Colormaps the visualization stage knows how to render.
pub const COLORMAPS: &[&str] = &[
    "mako_r", "viridis", "plasma", "inferno", "magma", "cividis", "Blues", "Greens", "Oranges",
    "Reds", "YlOrBr", "YlOrRd", "OrRd", "PuRd", "BuPu", "GnBu", "PuBu", "YlGnBu", "PuBuGn",
    "BuGn", "YlGn", "terrain", "gist_earth", "ocean", "cubehelix",
];

pub const INTERP_PTS_RANGE: std::ops::RangeInclusive<u32> = 100..=10_000;
pub const EPS_RANGE: std::ops::RangeInclusive<f64> = 0.0..=1.0;

const CENTERLINE_HINT: &str = "custom centerlines need a newer pipeline release; \
     install the latest version from the project repository";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CenterlineSource {
    /// Detect the river centerline from OpenStreetMap.
    #[default]
    OpenStreetMap,
    /// User supplied centerline shapefile.
    Custom(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Neighbors {
    #[default]
    Auto,
    Fixed(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationOptions {
    pub colormap: String,
    pub vertical_exaggeration: u32,
    pub blend_percent: u32,
    pub make_png: bool,
    pub make_kmz: bool,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            colormap: "mako_r".to_string(),
            vertical_exaggeration: 4,
            blend_percent: 25,
            make_png: true,
            make_kmz: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemParameters {
    pub dem_path: PathBuf,
    pub out_dir: PathBuf,
    pub centerline: CenterlineSource,
    pub interp_pts: u32,
    pub k: Neighbors,
    pub eps: f64,
    pub workers: usize,
    pub chunk_size: u64,
    /// `None` skips the visualization stage.
    pub visualization: Option<VisualizationOptions>,
}

impl Default for RemParameters {
    fn default() -> Self {
        Self {
            dem_path: PathBuf::new(),
            out_dir: PathBuf::new(),
            centerline: CenterlineSource::default(),
            interp_pts: 1000,
            k: Neighbors::Auto,
            eps: 0.1,
            workers: default_workers(),
            chunk_size: 1_000_000,
            visualization: Some(VisualizationOptions::default()),
        }
    }
}

/// Half the available cores, at least one.
pub fn default_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cores / 2).max(1)
}

impl RemParameters {
    pub fn new(dem_path: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            dem_path: dem_path.into(),
            out_dir: out_dir.into(),
            ..Self::default()
        }
    }

    /// Checks every field and reports all problems together.
    ///
    /// A missing output directory is created here; that is announced on `channel`.
    pub fn validate(&self, channel: &MessageChannel) -> Result<(), ConfigurationError> {
        let mut errors = Vec::new();

        if self.dem_path.as_os_str().is_empty() {
            errors.push("Please select a DEM file".to_string());
        } else if !self.dem_path.is_file() {
            errors.push(format!("DEM file not found: {}", self.dem_path.display()));
        }

        if self.out_dir.as_os_str().is_empty() {
            errors.push("Please select an output directory".to_string());
        } else {
            match ensure_output_dir(&self.out_dir) {
                Ok(true) => {
                    channel.info(format!(
                        "Created output directory: {}",
                        self.out_dir.display()
                    ));
                }
                Ok(false) => {}
                Err(err) => errors.push(format!("Could not create output directory: {err}")),
            }
        }

        if let CenterlineSource::Custom(path) = &self.centerline {
            if path.as_os_str().is_empty() {
                errors.push("Please select a centerline shapefile or use OSM".to_string());
            } else if !path.is_file() {
                errors.push(format!("Shapefile not found: {}", path.display()));
            }
        }

        if self.k == Neighbors::Fixed(0) {
            errors.push("K neighbors must be a positive integer or 'auto'".to_string());
        }
        if !INTERP_PTS_RANGE.contains(&self.interp_pts) {
            errors.push(format!(
                "Interpolation points must be between {} and {}",
                INTERP_PTS_RANGE.start(),
                INTERP_PTS_RANGE.end()
            ));
        }
        if !EPS_RANGE.contains(&self.eps) {
            errors.push("Error tolerance must be between 0 and 1".to_string());
        }
        if self.workers == 0 {
            errors.push("At least one CPU worker is required".to_string());
        }
        if self.chunk_size == 0 {
            errors.push("Chunk size must be positive".to_string());
        }

        if let Some(viz) = &self.visualization {
            if !COLORMAPS.contains(&viz.colormap.as_str()) {
                errors.push(format!("Unknown colormap: {}", viz.colormap));
            }
            if viz.vertical_exaggeration == 0 {
                errors.push("Vertical exaggeration must be at least 1".to_string());
            }
            if viz.blend_percent > 100 {
                errors.push("Hillshade blend must be between 0 and 100 percent".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::Invalid(errors))
        }
    }

    /// Constructor parameters in the pipeline's vocabulary.
    pub fn desired(&self) -> DesiredParameters {
        let required = vec![
            ("dem".to_string(), ParamValue::Path(self.dem_path.clone())),
            ("out_dir".to_string(), ParamValue::Path(self.out_dir.clone())),
        ];

        let mut optional = Vec::new();
        if let CenterlineSource::Custom(path) = &self.centerline {
            optional.push(
                OptionalParam::new("centerline_shp", ParamValue::Path(path.clone()))
                    .with_hint(CENTERLINE_HINT),
            );
        }
        optional.push(OptionalParam::new(
            "interp_pts",
            ParamValue::Int(i64::from(self.interp_pts)),
        ));
        optional.push(OptionalParam::new(
            "k",
            match self.k {
                Neighbors::Auto => ParamValue::Unset,
                Neighbors::Fixed(k) => ParamValue::Int(i64::from(k)),
            },
        ));
        optional.push(OptionalParam::new("eps", ParamValue::Float(self.eps)));
        optional.push(OptionalParam::new(
            "workers",
            ParamValue::Int(i64::try_from(self.workers).unwrap_or(i64::MAX)),
        ));
        optional.push(OptionalParam::new(
            "chunk_size",
            ParamValue::Int(i64::try_from(self.chunk_size).unwrap_or(i64::MAX)),
        ));

        DesiredParameters { required, optional }
    }
}
