//! Runtime shims for API drift in the geospatial stack.
//!
//! Each shim probes the installed library, records what it did in
//! [`CompatBindings`], and publishes exactly one console line. Running the
//! adapter again finds the recorded outcome and changes nothing.

pub mod geocoding;
pub mod geometry;
pub mod raster_io;
mod registry;

use std::fmt;

use rem_logging::{rem_info, rem_warn};

pub use geocoding::{
    legacy_adapter, BboxFunction, BoundingBox, Feature, FeatureSet, GeocodingLibrary,
    LegacyBboxQuery, ModernBboxQuery, Tags,
};
pub use geometry::{
    GeometryKind, GeometryLibrary, GeometryPart, MultiGeometry, NotIterable, PartsAccess,
};
pub use raster_io::{DemSummary, ModuleHandle, ModuleRegistry, ProjectionClass, RasterModule};
pub use registry::{BindingsSnapshot, CompatBindings, ShimOutcome};

use crate::{AdapterFailure, MessageChannel, Toolkit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShimKind {
    RasterIo,
    GeometryIteration,
    GeocodingBbox,
}

impl ShimKind {
    pub const ALL: [ShimKind; 3] = [
        ShimKind::RasterIo,
        ShimKind::GeometryIteration,
        ShimKind::GeocodingBbox,
    ];

    /// Only the raster shim stops a run.
    pub fn is_fatal(self) -> bool {
        matches!(self, ShimKind::RasterIo)
    }

    fn degraded_consequence(self) -> &'static str {
        match self {
            ShimKind::RasterIo => "",
            ShimKind::GeometryIteration => {
                "geometries without multi-part values still process correctly"
            }
            ShimKind::GeocodingBbox => {
                "automatic centerline detection is unavailable; supply a centerline shapefile"
            }
        }
    }
}

impl fmt::Display for ShimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShimKind::RasterIo => f.write_str("raster IO naming"),
            ShimKind::GeometryIteration => f.write_str("geometry iteration"),
            ShimKind::GeocodingBbox => f.write_str("geocoding bbox"),
        }
    }
}

/// One compatibility binding and whether this pass created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterPatch {
    pub shim: ShimKind,
    pub target: String,
    /// `false` when the library already behaved as expected or a previous pass did the work.
    pub newly_applied: bool,
}

/// Result of a single successful probe, before it is recorded.
pub(crate) struct Applied {
    patch: AdapterPatch,
    message: String,
}

impl Applied {
    fn new(shim: ShimKind, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            patch: AdapterPatch {
                shim,
                target: target.into(),
                newly_applied: true,
            },
            message: message.into(),
        }
    }

    fn already(shim: ShimKind, target: impl Into<String>, message: impl Into<String>) -> Self {
        let mut applied = Self::new(shim, target, message);
        applied.patch.newly_applied = false;
        applied
    }
}

/// Per-shim outcomes of one adapter pass, in shim order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompatReport {
    pub outcomes: Vec<(ShimKind, ShimOutcome)>,
}

impl CompatReport {
    pub fn patches(&self) -> impl Iterator<Item = &AdapterPatch> {
        self.outcomes.iter().filter_map(|(_, outcome)| match outcome {
            ShimOutcome::Patched(patch) => Some(patch),
            ShimOutcome::Degraded { .. } => None,
        })
    }

    pub fn degraded(&self) -> impl Iterator<Item = ShimKind> + '_ {
        self.outcomes.iter().filter_map(|(kind, outcome)| match outcome {
            ShimOutcome::Degraded { .. } => Some(*kind),
            ShimOutcome::Patched(_) => None,
        })
    }
}

pub struct CompatibilityAdapter<'a> {
    toolkit: &'a Toolkit,
    bindings: &'a CompatBindings,
    channel: &'a MessageChannel,
}

impl<'a> CompatibilityAdapter<'a> {
    pub fn new(
        toolkit: &'a Toolkit,
        bindings: &'a CompatBindings,
        channel: &'a MessageChannel,
    ) -> Self {
        Self {
            toolkit,
            bindings,
            channel,
        }
    }

    /// Runs all shims. Stops at the raster shim if it fails, before anything else
    /// is probed.
    pub fn apply(&self) -> Result<CompatReport, AdapterFailure> {
        let _pass = self.bindings.lock_for_apply();
        let mut report = CompatReport::default();

        for kind in ShimKind::ALL {
            let outcome = self.run_shim(kind)?;
            report.outcomes.push((kind, outcome));
        }
        Ok(report)
    }

    fn probe(&self, kind: ShimKind) -> Result<Applied, String> {
        match kind {
            ShimKind::RasterIo => raster_io::apply(&self.toolkit.modules, self.bindings),
            ShimKind::GeometryIteration => {
                geometry::apply(self.toolkit.geometry.as_deref(), self.bindings)
            }
            ShimKind::GeocodingBbox => {
                geocoding::apply(self.toolkit.geocoding.as_deref(), self.bindings)
            }
        }
    }

    fn run_shim(&self, kind: ShimKind) -> Result<ShimOutcome, AdapterFailure> {
        if let Some(previous) = self.bindings.outcome(kind) {
            return Ok(self.report_previous(kind, previous));
        }

        match self.probe(kind) {
            Ok(applied) => {
                rem_info!("{kind} shim: {}", applied.message);
                self.channel.info(applied.message);
                let outcome = ShimOutcome::Patched(applied.patch);
                self.bindings.record(kind, outcome.clone());
                Ok(outcome)
            }
            Err(reason) if kind.is_fatal() => {
                // Not recorded: a later run re-probes in case the library appeared.
                self.channel
                    .error(format!("Could not set up {kind} compatibility: {reason}"));
                Err(AdapterFailure { shim: kind, reason })
            }
            Err(reason) => {
                rem_warn!("{kind} shim degraded: {reason}");
                self.channel.warning(format!(
                    "Warning: {kind} compatibility shim failed ({reason}); continuing, {}",
                    kind.degraded_consequence()
                ));
                let outcome = ShimOutcome::Degraded { reason };
                self.bindings.record(kind, outcome.clone());
                Ok(outcome)
            }
        }
    }

    fn report_previous(&self, kind: ShimKind, previous: ShimOutcome) -> ShimOutcome {
        match previous {
            ShimOutcome::Patched(mut patch) => {
                self.channel
                    .info(format!("{kind} compatibility already in place"));
                patch.newly_applied = false;
                ShimOutcome::Patched(patch)
            }
            degraded @ ShimOutcome::Degraded { .. } => {
                self.channel
                    .info(format!("{kind} compatibility unavailable (see earlier warning)"));
                degraded
            }
        }
    }
}
