use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::geocoding::{FeatureSet, LegacyBboxQuery, Tags};
use super::geometry::{GeometryKind, GeometryPart, MultiGeometry, NotIterable, PartsAccess};
use super::raster_io::ModuleHandle;
use super::{AdapterPatch, ShimKind};

/// What a shim ended up doing, remembered for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShimOutcome {
    Patched(AdapterPatch),
    /// Non-fatal: the capability is unavailable and callers must cope.
    Degraded { reason: String },
}

/// Comparable view of the bindings, mainly for idempotence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingsSnapshot {
    pub outcomes: BTreeMap<ShimKind, ShimOutcome>,
    /// Legacy alias to the qualified name of the module it resolves to.
    pub raster_modules: BTreeMap<String, String>,
    pub parts_access: BTreeMap<GeometryKind, PartsAccess>,
    pub bbox_query_bound: bool,
}

#[derive(Default)]
struct BindingsState {
    outcomes: BTreeMap<ShimKind, ShimOutcome>,
    raster_modules: BTreeMap<String, ModuleHandle>,
    parts_access: BTreeMap<GeometryKind, PartsAccess>,
    bbox_query: Option<LegacyBboxQuery>,
}

/// Registry of compatibility bindings.
///
/// Shims populate it; pipeline code resolves library entry points through it
/// instead of reaching into the libraries directly.
#[derive(Default)]
pub struct CompatBindings {
    state: RwLock<BindingsState>,
    apply_lock: Mutex<()>,
}

static GLOBAL: LazyLock<Arc<CompatBindings>> = LazyLock::new(|| Arc::new(CompatBindings::new()));

impl CompatBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance, created on first use and never torn down.
    pub fn global() -> Arc<CompatBindings> {
        GLOBAL.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, BindingsState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BindingsState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Serializes whole adapter passes so two runs cannot both patch.
    pub(crate) fn lock_for_apply(&self) -> MutexGuard<'_, ()> {
        self.apply_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn outcome(&self, shim: ShimKind) -> Option<ShimOutcome> {
        self.read().outcomes.get(&shim).cloned()
    }

    pub(crate) fn record(&self, shim: ShimKind, outcome: ShimOutcome) {
        self.write().outcomes.insert(shim, outcome);
    }

    pub(crate) fn bind_raster_module(&self, legacy_name: &str, module: ModuleHandle) {
        self.write()
            .raster_modules
            .insert(legacy_name.to_string(), module);
    }

    pub(crate) fn bind_parts_access(&self, kind: GeometryKind, access: PartsAccess) {
        self.write().parts_access.insert(kind, access);
    }

    pub(crate) fn bind_bbox_query(&self, query: LegacyBboxQuery) {
        self.write().bbox_query = Some(query);
    }

    /// Raster module by its legacy import name (`gdal`, `ogr`, `osr`, `gdal_array`).
    pub fn raster_module(&self, legacy_name: &str) -> Option<ModuleHandle> {
        self.read().raster_modules.get(legacy_name).cloned()
    }

    pub fn parts_access(&self, kind: GeometryKind) -> Option<PartsAccess> {
        self.read().parts_access.get(&kind).copied()
    }

    /// Parts of a multi-part geometry, via whichever protocol this release supports.
    pub fn parts(&self, geometry: &dyn MultiGeometry) -> Result<Vec<GeometryPart>, NotIterable> {
        match self.parts_access(geometry.kind()) {
            Some(PartsAccess::Accessor) => Ok(geometry.geoms()),
            Some(PartsAccess::Native) | None => geometry.iter_parts(),
        }
    }

    pub fn bbox_query(&self) -> Option<LegacyBboxQuery> {
        self.read().bbox_query.clone()
    }

    /// Legacy-convention bounding-box feature query.
    pub fn geometries_from_bbox(
        &self,
        north: f64,
        south: f64,
        east: f64,
        west: f64,
        tags: &Tags,
    ) -> anyhow::Result<FeatureSet> {
        let query = self.bbox_query().ok_or_else(|| {
            anyhow::anyhow!(
                "bounding-box feature query is unavailable; supply a centerline shapefile instead"
            )
        })?;
        query(north, south, east, west, tags)
    }

    pub fn snapshot(&self) -> BindingsSnapshot {
        let state = self.read();
        BindingsSnapshot {
            outcomes: state.outcomes.clone(),
            raster_modules: state
                .raster_modules
                .iter()
                .map(|(alias, module)| (alias.clone(), module.qualified_name().to_string()))
                .collect(),
            parts_access: state.parts_access.clone(),
            bbox_query_bound: state.bbox_query.is_some(),
        }
    }
}
