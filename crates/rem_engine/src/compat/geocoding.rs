//! Bounding-box feature query drift.
//!
//! Older geocoding releases expose `geometries_from_bbox(north, south, east, west, tags)`.
//! Newer ones renamed it to `features_from_bbox(bbox, tags)` taking a single
//! `(west, south, east, north)` box, sometimes only under the `features` namespace.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Applied, CompatBindings, ShimKind};

pub const LEGACY_NAME: &str = "geometries_from_bbox";
pub const MODERN_NAME: &str = "features_from_bbox";
pub const MODERN_NAMESPACED_NAME: &str = "features.features_from_bbox";

/// Tag filter: key to accepted values, an empty list accepts any value.
pub type Tags = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub id: u64,
    pub tags: BTreeMap<String, String>,
}

pub type FeatureSet = Vec<Feature>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Tuple in `(west, south, east, north)` order.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.west, self.south, self.east, self.north)
    }
}

/// `(north, south, east, west, tags)`
pub type LegacyBboxQuery =
    Arc<dyn Fn(f64, f64, f64, f64, &Tags) -> anyhow::Result<FeatureSet> + Send + Sync>;

/// `(bbox, tags)`
pub type ModernBboxQuery = Arc<dyn Fn(BoundingBox, &Tags) -> anyhow::Result<FeatureSet> + Send + Sync>;

#[derive(Clone)]
pub enum BboxFunction {
    Legacy(LegacyBboxQuery),
    Modern(ModernBboxQuery),
}

pub trait GeocodingLibrary: Send + Sync {
    /// Looks up a function by dotted path relative to the library root.
    fn lookup(&self, path: &str) -> Option<BboxFunction>;
}

/// Presents a box-tuple query under the legacy four-scalar calling convention.
/// Values are only reordered.
pub fn legacy_adapter(modern: ModernBboxQuery) -> LegacyBboxQuery {
    Arc::new(move |north: f64, south: f64, east: f64, west: f64, tags: &Tags| {
        modern(
            BoundingBox {
                west,
                south,
                east,
                north,
            },
            tags,
        )
    })
}

pub(super) fn apply(
    library: Option<&dyn GeocodingLibrary>,
    bindings: &CompatBindings,
) -> Result<Applied, String> {
    let library = library.ok_or_else(|| "no geocoding library is available".to_string())?;

    match library.lookup(LEGACY_NAME) {
        Some(BboxFunction::Legacy(query)) => {
            bindings.bind_bbox_query(query);
            return Ok(Applied::already(
                ShimKind::GeocodingBbox,
                LEGACY_NAME,
                format!("Geocoding: {LEGACY_NAME} is available natively"),
            ));
        }
        Some(BboxFunction::Modern(query)) => {
            bindings.bind_bbox_query(legacy_adapter(query));
            return Ok(Applied::new(
                ShimKind::GeocodingBbox,
                LEGACY_NAME,
                format!("Geocoding compatibility: {LEGACY_NAME} argument order adapted"),
            ));
        }
        None => {}
    }

    for (path, via) in [
        (MODERN_NAME, ""),
        (MODERN_NAMESPACED_NAME, " (via features module)"),
    ] {
        if let Some(function) = library.lookup(path) {
            let query = match function {
                BboxFunction::Modern(modern) => legacy_adapter(modern),
                BboxFunction::Legacy(legacy) => legacy,
            };
            bindings.bind_bbox_query(query);
            return Ok(Applied::new(
                ShimKind::GeocodingBbox,
                path,
                format!("Geocoding compatibility: {LEGACY_NAME} patched{via}"),
            ));
        }
    }

    Err(format!(
        "geocoding library is missing both {LEGACY_NAME} and {MODERN_NAME}"
    ))
}
