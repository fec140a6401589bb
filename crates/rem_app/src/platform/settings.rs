//! Last-used parameters, stored as RON next to where the runner is started.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rem_engine::{write_atomic, RemParameters};
use rem_logging::{rem_info, rem_warn};
use serde::{Deserialize, Serialize};

const DEFAULT_PIPELINE: &str = "rem-pipeline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Executable that implements the REM pipeline sub-commands.
    pub pipeline: PathBuf,
    pub parameters: RemParameters,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline: PathBuf::from(DEFAULT_PIPELINE),
            parameters: RemParameters::default(),
        }
    }
}

/// Reads `path`; a missing file yields the defaults.
pub fn load(path: &Path) -> anyhow::Result<Settings> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            rem_info!("No settings at {:?}, using defaults", path);
            return Ok(Settings::default());
        }
        Err(err) => {
            rem_warn!("Failed to read settings from {:?}: {}", path, err);
            return Err(err).with_context(|| format!("reading {}", path.display()));
        }
    };

    let settings = ron::from_str(&content)
        .with_context(|| format!("parsing settings file {}", path.display()))?;
    rem_info!("Loaded settings from {:?}", path);
    Ok(settings)
}

pub fn save(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    let pretty = ron::ser::PrettyConfig::new();
    let content =
        ron::ser::to_string_pretty(settings, pretty).context("serializing settings")?;
    write_atomic(path, content.as_bytes())
        .with_context(|| format!("writing settings to {}", path.display()))?;
    rem_info!("Saved settings to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rem_engine::{CenterlineSource, Neighbors};
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rem_settings.ron");
        let mut settings = Settings::default();
        settings.parameters.dem_path = PathBuf::from("/data/dem.tif");
        settings.parameters.k = Neighbors::Fixed(6);
        settings.parameters.centerline = CenterlineSource::Custom(PathBuf::from("river.shp"));
        settings.parameters.visualization = None;

        save(&path, &settings).unwrap();
        assert_eq!(load(&path).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rem_settings.ron");
        fs::write(&path, "(pipeline: \"/usr/local/bin/rem\")").unwrap();

        let settings = load(&path).unwrap();
        assert_eq!(settings.pipeline, PathBuf::from("/usr/local/bin/rem"));
        assert_eq!(settings.parameters.interp_pts, 1000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rem_settings.ron");
        fs::write(&path, "(pipeline: ").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing settings file"));
    }
}
