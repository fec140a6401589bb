//! Raster IO module naming drift.
//!
//! Older pipelines import the raster library as `gdal`, `ogr`, `osr` and
//! `gdal_array`. Current releases only ship them under the `osgeo` namespace.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock};

use rem_logging::rem_debug;

use super::{Applied, CompatBindings, ShimKind};

/// Legacy name and the namespaced module it maps to.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("gdal", "osgeo.gdal"),
    ("ogr", "osgeo.ogr"),
    ("osr", "osgeo.osr"),
    ("gdal_array", "osgeo.gdal_array"),
];

pub trait RasterModule: Send + Sync {
    fn qualified_name(&self) -> &str;

    /// Reads basic metadata of a raster file.
    fn describe(&self, path: &Path) -> anyhow::Result<DemSummary> {
        let _ = path;
        anyhow::bail!("{} cannot read raster metadata", self.qualified_name())
    }
}

pub type ModuleHandle = Arc<dyn RasterModule>;

/// Modules the installed raster library makes importable, by name.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<BTreeMap<String, ModuleHandle>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: impl Into<String>, module: ModuleHandle) {
        self.modules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), module);
    }

    pub fn resolve(&self, name: &str) -> Option<ModuleHandle> {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.modules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemSummary {
    pub width: u64,
    pub height: u64,
    pub bands: u32,
    pub resolution: (f64, f64),
    /// Projection as WKT, empty when the raster has none.
    pub projection: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionClass {
    Utm,
    Geographic,
    Projected,
    Unknown,
}

impl fmt::Display for ProjectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionClass::Utm => f.write_str("UTM"),
            ProjectionClass::Geographic => {
                f.write_str("Geographic (lat/lon) - Consider reprojecting to UTM")
            }
            ProjectionClass::Projected => f.write_str("Projected"),
            ProjectionClass::Unknown => f.write_str("Unknown"),
        }
    }
}

impl DemSummary {
    pub fn projection_class(&self) -> ProjectionClass {
        let wkt = &self.projection;
        if wkt.to_uppercase().contains("UTM") {
            ProjectionClass::Utm
        } else if wkt.contains("GEOGCS") && !wkt.contains("PROJCS") {
            ProjectionClass::Geographic
        } else if !wkt.is_empty() {
            ProjectionClass::Projected
        } else {
            ProjectionClass::Unknown
        }
    }

    /// Console lines describing the raster.
    pub fn report(&self, file_name: &str) -> Vec<String> {
        vec![
            format!("DEM loaded: {file_name}"),
            format!(
                "  Size: {}x{} pixels, {} band(s)",
                self.width, self.height, self.bands
            ),
            format!(
                "  Resolution: {:.4} x {:.4}",
                self.resolution.0.abs(),
                self.resolution.1.abs()
            ),
            format!("  Projection: {}", self.projection_class()),
        ]
    }
}

pub(super) fn apply(registry: &ModuleRegistry, bindings: &CompatBindings) -> Result<Applied, String> {
    if registry.contains("gdal") {
        for (legacy, _) in LEGACY_ALIASES {
            if let Some(module) = registry.resolve(legacy) {
                bindings.bind_raster_module(legacy, module);
            }
        }
        return Ok(Applied::already(
            ShimKind::RasterIo,
            "gdal",
            "Raster IO: legacy module names resolve natively",
        ));
    }

    if !registry.contains("osgeo.gdal") {
        return Err("neither `gdal` nor `osgeo.gdal` can be resolved".to_string());
    }

    let mut aliased = Vec::new();
    for (legacy, modern) in LEGACY_ALIASES {
        match registry.resolve(modern) {
            Some(module) => {
                bindings.bind_raster_module(legacy, module);
                aliased.push(*legacy);
            }
            None => rem_debug!("raster module {modern} not present; `{legacy}` left unbound"),
        }
    }

    Ok(Applied::new(
        ShimKind::RasterIo,
        "osgeo",
        format!(
            "GDAL compatibility shim applied (osgeo -> {})",
            aliased.join(", ")
        ),
    ))
}
