//! Multi-part geometry iteration drift.
//!
//! Multi* values used to be directly iterable over their parts. Newer geometry
//! releases removed that protocol and only offer the explicit `geoms` accessor.

use thiserror::Error;

use super::{Applied, CompatBindings, ShimKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeometryKind {
    MultiPolygon,
    MultiLineString,
    MultiPoint,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 3] = [
        GeometryKind::MultiPolygon,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPoint,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPart {
    pub coords: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind:?} values are not directly iterable")]
pub struct NotIterable {
    pub kind: GeometryKind,
}

pub trait MultiGeometry: Send + Sync {
    fn kind(&self) -> GeometryKind;

    /// The legacy direct-iteration protocol.
    fn iter_parts(&self) -> Result<Vec<GeometryPart>, NotIterable>;

    /// Explicit parts accessor, present in every release.
    fn geoms(&self) -> Vec<GeometryPart>;
}

pub trait GeometryLibrary: Send + Sync {
    fn empty(&self, kind: GeometryKind) -> anyhow::Result<Box<dyn MultiGeometry>>;
}

/// How the bindings reach the parts of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartsAccess {
    Native,
    Accessor,
}

pub(super) fn apply(
    library: Option<&dyn GeometryLibrary>,
    bindings: &CompatBindings,
) -> Result<Applied, String> {
    let library = library.ok_or_else(|| "no geometry library is available".to_string())?;

    // Probe everything before binding anything so a failed probe leaves no partial state.
    let mut access = Vec::with_capacity(GeometryKind::ALL.len());
    for kind in GeometryKind::ALL {
        let probe = library
            .empty(kind)
            .map_err(|err| format!("could not create an empty {kind:?}: {err:#}"))?;
        let mode = match probe.iter_parts() {
            Ok(_) => PartsAccess::Native,
            Err(_) => PartsAccess::Accessor,
        };
        access.push((kind, mode));
    }

    let patched: Vec<String> = access
        .iter()
        .filter(|(_, mode)| *mode == PartsAccess::Accessor)
        .map(|(kind, _)| format!("{kind:?}"))
        .collect();
    for (kind, mode) in access {
        bindings.bind_parts_access(kind, mode);
    }

    if patched.is_empty() {
        Ok(Applied::already(
            ShimKind::GeometryIteration,
            "Multi*",
            "Geometry: multi-part values iterate natively",
        ))
    } else {
        let target = patched.join(", ");
        let message = format!("Geometry compatibility: iteration patched for {target}");
        Ok(Applied::new(ShimKind::GeometryIteration, target, message))
    }
}
