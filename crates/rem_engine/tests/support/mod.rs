#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier, Mutex, MutexGuard};

use rem_engine::compat::{
    BboxFunction, BoundingBox, DemSummary, FeatureSet, GeocodingLibrary, GeometryKind,
    GeometryLibrary, GeometryPart, ModuleRegistry, ModernBboxQuery, MultiGeometry, NotIterable,
    RasterModule, Tags,
};
use rem_engine::{
    CellSize, CompatBindings, LogMessage, Payload, PipelineEntryPoint, PipelineHandle,
    RemParameters, Severity, Toolkit, VisualizationOptions,
};
use rem_logging::rem_println;
use tempfile::TempDir;

/// Serializes tests that install console redirectors.
pub fn serial() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct FakeModule {
    name: String,
    summary: Option<DemSummary>,
}

impl FakeModule {
    pub fn handle(name: &str) -> Arc<dyn RasterModule> {
        Arc::new(Self {
            name: name.to_string(),
            summary: None,
        })
    }

    pub fn describing(name: &str, summary: DemSummary) -> Arc<dyn RasterModule> {
        Arc::new(Self {
            name: name.to_string(),
            summary: Some(summary),
        })
    }
}

impl RasterModule for FakeModule {
    fn qualified_name(&self) -> &str {
        &self.name
    }

    fn describe(&self, _path: &Path) -> anyhow::Result<DemSummary> {
        self.summary
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no metadata"))
    }
}

/// Registry of a current raster release: only the namespaced modules.
pub fn modern_modules() -> Arc<ModuleRegistry> {
    let registry = ModuleRegistry::new();
    for name in ["osgeo.gdal", "osgeo.ogr", "osgeo.osr"] {
        registry.register(name, FakeModule::handle(name));
    }
    Arc::new(registry)
}

pub fn legacy_modules() -> Arc<ModuleRegistry> {
    let registry = ModuleRegistry::new();
    for name in ["gdal", "ogr", "osr", "gdal_array"] {
        registry.register(name, FakeModule::handle(name));
    }
    Arc::new(registry)
}

struct FakeMulti {
    kind: GeometryKind,
    native: bool,
}

impl MultiGeometry for FakeMulti {
    fn kind(&self) -> GeometryKind {
        self.kind
    }

    fn iter_parts(&self) -> Result<Vec<GeometryPart>, NotIterable> {
        if self.native {
            Ok(self.geoms())
        } else {
            Err(NotIterable { kind: self.kind })
        }
    }

    fn geoms(&self) -> Vec<GeometryPart> {
        vec![GeometryPart {
            coords: vec![(0.0, 0.0), (1.0, 1.0)],
        }]
    }
}

pub struct FakeGeometry {
    pub native: bool,
}

impl FakeGeometry {
    pub fn multi(&self, kind: GeometryKind) -> Box<dyn MultiGeometry> {
        Box::new(FakeMulti {
            kind,
            native: self.native,
        })
    }
}

impl GeometryLibrary for FakeGeometry {
    fn empty(&self, kind: GeometryKind) -> anyhow::Result<Box<dyn MultiGeometry>> {
        Ok(self.multi(kind))
    }
}

#[derive(Default)]
pub struct FakeGeocoding {
    functions: BTreeMap<String, BboxFunction>,
}

impl FakeGeocoding {
    pub fn with(mut self, path: &str, function: BboxFunction) -> Self {
        self.functions.insert(path.to_string(), function);
        self
    }
}

impl GeocodingLibrary for FakeGeocoding {
    fn lookup(&self, path: &str) -> Option<BboxFunction> {
        self.functions.get(path).cloned()
    }
}

/// Modern query that records every box it receives.
pub fn recording_query() -> (ModernBboxQuery, Arc<Mutex<Vec<BoundingBox>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let query: ModernBboxQuery = Arc::new(move |bbox: BoundingBox, _tags: &Tags| {
        sink.lock().unwrap().push(bbox);
        Ok(FeatureSet::new())
    });
    (query, calls)
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Succeed,
    FailTransform,
    PanicTransform,
}

/// Pipeline stand-in. Optionally parks inside `make_rem` on a two-party barrier
/// twice: once to announce it entered, once to wait for release.
pub struct FakeEntryPoint {
    accepted: Result<Vec<String>, String>,
    behaviour: Behaviour,
    gate: Option<Arc<Barrier>>,
    pub received: Mutex<Option<Payload>>,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl FakeEntryPoint {
    pub fn new(accepted: &[&str]) -> Self {
        Self {
            accepted: Ok(accepted.iter().map(|s| s.to_string()).collect()),
            behaviour: Behaviour::Succeed,
            gate: None,
            received: Mutex::new(None),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn full() -> Self {
        Self::new(&[
            "dem",
            "out_dir",
            "centerline_shp",
            "interp_pts",
            "k",
            "eps",
            "workers",
            "chunk_size",
        ])
    }

    pub fn opaque() -> Self {
        Self {
            accepted: Err("signature unavailable".to_string()),
            ..Self::new(&[])
        }
    }

    pub fn behaving(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn gated(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl PipelineEntryPoint for FakeEntryPoint {
    fn name(&self) -> &str {
        "FakeRem"
    }

    fn accepted_parameters(&self) -> anyhow::Result<Vec<String>> {
        self.accepted.clone().map_err(|e| anyhow::anyhow!(e))
    }

    fn construct(
        &self,
        payload: &Payload,
        _bindings: &CompatBindings,
    ) -> anyhow::Result<Box<dyn PipelineHandle>> {
        *self.received.lock().unwrap() = Some(payload.clone());
        let out_dir = match payload.get("out_dir") {
            Some(rem_engine::ParamValue::Path(path)) => path.clone(),
            _ => PathBuf::from("."),
        };
        Ok(Box::new(FakeHandle {
            out_dir,
            behaviour: self.behaviour,
            gate: self.gate.clone(),
            calls: self.calls.clone(),
            cell: CellSize {
                width: 1.0,
                height: -1.0,
            },
        }))
    }
}

struct FakeHandle {
    out_dir: PathBuf,
    behaviour: Behaviour,
    gate: Option<Arc<Barrier>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    cell: CellSize,
}

impl FakeHandle {
    fn called(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

impl PipelineHandle for FakeHandle {
    fn make_rem(&mut self) -> anyhow::Result<PathBuf> {
        self.called("make_rem");
        if let Some(gate) = &self.gate {
            gate.wait();
            gate.wait();
        }
        rem_println!("processing tile 1/1");
        match self.behaviour {
            Behaviour::Succeed => Ok(self.out_dir.join("dem_REM.tif")),
            Behaviour::FailTransform => {
                Err(anyhow::anyhow!("disk full").context("writing REM raster"))
            }
            Behaviour::PanicTransform => panic!("index out of range"),
        }
    }

    fn make_rem_viz(&mut self, _options: &VisualizationOptions) -> anyhow::Result<()> {
        self.called("make_rem_viz");
        Ok(())
    }

    fn clean_up(&mut self) -> anyhow::Result<()> {
        self.called("clean_up");
        Ok(())
    }

    fn cell_size(&self) -> Option<CellSize> {
        Some(self.cell)
    }

    fn set_cell_size(&mut self, size: CellSize) {
        assert!(size.height > 0.0);
        self.cell = size;
        self.called("set_cell_size");
    }
}

pub fn toolkit(entry_point: Arc<FakeEntryPoint>) -> Toolkit {
    Toolkit::new(entry_point, modern_modules())
        .with_geometry(Arc::new(FakeGeometry { native: false }))
        .with_geocoding(Arc::new(FakeGeocoding::default().with(
            "features_from_bbox",
            BboxFunction::Modern(recording_query().0),
        )))
}

/// A DEM file and an output directory inside a fresh temp dir.
pub fn workspace() -> (TempDir, RemParameters) {
    let temp = TempDir::new().unwrap();
    let dem = temp.path().join("dem.tif");
    std::fs::write(&dem, b"II*\0").unwrap();
    let params = RemParameters::new(dem, temp.path().join("out"));
    (temp, params)
}

pub fn texts(messages: &[LogMessage]) -> Vec<String> {
    messages.iter().map(|m| m.text().to_string()).collect()
}

pub fn with_severity(messages: &[LogMessage], severity: Severity) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.severity() == severity)
        .map(|m| m.text().to_string())
        .collect()
}
