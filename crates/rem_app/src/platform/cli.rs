use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, ValueEnum};
use rem_engine::{CenterlineSource, Neighbors, VisualizationOptions};

use super::logging::LogDestination;
use super::settings::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "rem-runner",
    version,
    about = "Generate a relative elevation model from a DEM with the installed REM pipeline"
)]
pub struct Cli {
    /// Input DEM raster.
    #[arg(long)]
    pub dem: Option<PathBuf>,
    /// Directory that receives the REM and its visualization.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
    /// River centerline shapefile; OpenStreetMap is queried when omitted.
    #[arg(long)]
    pub centerline: Option<PathBuf>,
    /// Force OpenStreetMap centerline detection even if the settings name a shapefile.
    #[arg(long, conflicts_with = "centerline")]
    pub osm: bool,
    #[arg(long)]
    pub interp_pts: Option<u32>,
    /// Nearest neighbours for interpolation: a positive integer or `auto`.
    #[arg(long)]
    pub k: Option<String>,
    /// Error tolerance of the interpolation.
    #[arg(long)]
    pub eps: Option<f64>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long)]
    pub chunk_size: Option<u64>,
    /// Skip the visualization stage.
    #[arg(long)]
    pub no_viz: bool,
    #[arg(long)]
    pub colormap: Option<String>,
    /// Vertical exaggeration of the hillshade.
    #[arg(long)]
    pub z: Option<u32>,
    /// Hillshade blend in percent.
    #[arg(long)]
    pub blend: Option<u32>,
    #[arg(long)]
    pub no_png: bool,
    #[arg(long)]
    pub kmz: bool,
    /// External pipeline executable.
    #[arg(long)]
    pub pipeline: Option<PathBuf>,
    #[arg(long, default_value = "rem_settings.ron")]
    pub settings: PathBuf,
    /// Write the merged settings back before running.
    #[arg(long)]
    pub save_settings: bool,
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

pub fn parse_neighbors(raw: &str) -> anyhow::Result<Neighbors> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("auto") {
        return Ok(Neighbors::Auto);
    }
    match raw.parse::<u32>() {
        Ok(k) if k > 0 => Ok(Neighbors::Fixed(k)),
        _ => bail!("K neighbors must be a positive integer or 'auto', got `{raw}`"),
    }
}

impl Cli {
    /// Layers the flags given on the command line over `settings`.
    pub fn apply(&self, settings: &mut Settings) -> anyhow::Result<()> {
        if let Some(pipeline) = &self.pipeline {
            settings.pipeline = pipeline.clone();
        }

        let params = &mut settings.parameters;
        if let Some(dem) = &self.dem {
            params.dem_path = dem.clone();
        }
        if let Some(out_dir) = &self.out_dir {
            params.out_dir = out_dir.clone();
        }
        if let Some(centerline) = &self.centerline {
            params.centerline = CenterlineSource::Custom(centerline.clone());
        } else if self.osm {
            params.centerline = CenterlineSource::OpenStreetMap;
        }
        if let Some(interp_pts) = self.interp_pts {
            params.interp_pts = interp_pts;
        }
        if let Some(k) = &self.k {
            params.k = parse_neighbors(k)?;
        }
        if let Some(eps) = self.eps {
            params.eps = eps;
        }
        if let Some(workers) = self.workers {
            params.workers = workers;
        }
        if let Some(chunk_size) = self.chunk_size {
            params.chunk_size = chunk_size;
        }

        if self.no_viz {
            params.visualization = None;
            return Ok(());
        }
        let touches_viz = self.colormap.is_some()
            || self.z.is_some()
            || self.blend.is_some()
            || self.no_png
            || self.kmz;
        if !touches_viz {
            return Ok(());
        }
        let viz = params
            .visualization
            .get_or_insert_with(VisualizationOptions::default);
        if let Some(colormap) = &self.colormap {
            viz.colormap = colormap.clone();
        }
        if let Some(z) = self.z {
            viz.vertical_exaggeration = z;
        }
        if let Some(blend) = self.blend {
            viz.blend_percent = blend;
        }
        if self.no_png {
            viz.make_png = false;
        }
        if self.kmz {
            viz.make_kmz = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn neighbors_accept_auto_and_positive_integers() {
        assert_eq!(parse_neighbors("auto").unwrap(), Neighbors::Auto);
        assert_eq!(parse_neighbors(" AUTO ").unwrap(), Neighbors::Auto);
        assert_eq!(parse_neighbors("12").unwrap(), Neighbors::Fixed(12));
        assert!(parse_neighbors("0").is_err());
        assert!(parse_neighbors("-3").is_err());
        assert!(parse_neighbors("many").is_err());
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "rem-runner",
            "--dem",
            "dem.tif",
            "--out-dir",
            "out",
            "--k",
            "8",
            "--colormap",
            "viridis",
            "--kmz",
            "--pipeline",
            "/opt/rem/bin/rem-pipeline",
        ]);
        let mut settings = Settings::default();
        cli.apply(&mut settings).unwrap();

        let params = &settings.parameters;
        assert_eq!(params.dem_path, PathBuf::from("dem.tif"));
        assert_eq!(params.out_dir, PathBuf::from("out"));
        assert_eq!(params.k, Neighbors::Fixed(8));
        let viz = params.visualization.as_ref().unwrap();
        assert_eq!(viz.colormap, "viridis");
        assert!(viz.make_kmz);
        assert!(viz.make_png);
        assert_eq!(settings.pipeline, PathBuf::from("/opt/rem/bin/rem-pipeline"));
    }

    #[test]
    fn absent_flags_keep_saved_values() {
        let mut settings = Settings::default();
        settings.parameters.interp_pts = 2500;
        settings.parameters.centerline = CenterlineSource::Custom(PathBuf::from("river.shp"));

        Cli::parse_from(["rem-runner"]).apply(&mut settings).unwrap();
        assert_eq!(settings.parameters.interp_pts, 2500);
        assert_eq!(
            settings.parameters.centerline,
            CenterlineSource::Custom(PathBuf::from("river.shp"))
        );

        Cli::parse_from(["rem-runner", "--osm", "--no-viz"])
            .apply(&mut settings)
            .unwrap();
        assert_eq!(settings.parameters.centerline, CenterlineSource::OpenStreetMap);
        assert!(settings.parameters.visualization.is_none());
    }
}
