//! Binds the engine to tools installed on this machine.
//!
//! The REM pipeline is an external executable with `rem`, `viz` and
//! `clean-up` sub-commands that all take the constructor parameters as
//! `--long-flags`. Raster metadata comes from the GDAL command line tools.
//! No geometry or geocoding library can be loaded out of process, so those
//! shims degrade.

use std::collections::VecDeque;
use std::env;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context};
use rem_engine::compat::{DemSummary, ModuleRegistry, RasterModule};
use rem_engine::{
    CompatBindings, ParamValue, Payload, PipelineEntryPoint, PipelineHandle, Toolkit,
    VisualizationOptions,
};
use rem_logging::{rem_info, rem_println, rem_warn};
use serde_json::Value;

/// Line prefix the pipeline uses to announce the produced raster.
const OUTPUT_MARKER: &str = "rem_path=";
const STDERR_TAIL: usize = 20;

pub fn discover(pipeline: &Path) -> Toolkit {
    let modules = ModuleRegistry::new();
    match find_on_path("gdalinfo") {
        Some(program) => modules.register("gdal", Arc::new(GdalCli::legacy(program))),
        None => rem_info!("gdalinfo not found on PATH"),
    }
    match find_on_path("gdal") {
        Some(program) => modules.register("osgeo.gdal", Arc::new(GdalCli::unified(program))),
        None => rem_info!("unified gdal CLI not found on PATH"),
    }
    if modules.names().is_empty() {
        rem_warn!("No GDAL command line tools found on PATH");
    }

    let program = if pipeline.components().count() > 1 {
        pipeline.to_path_buf()
    } else {
        find_on_path(&pipeline.to_string_lossy()).unwrap_or_else(|| pipeline.to_path_buf())
    };
    Toolkit::new(Arc::new(ProcessEntryPoint::new(program)), Arc::new(modules))
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path).find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        let exe = candidate.with_extension(env::consts::EXE_EXTENSION);
        (!env::consts::EXE_EXTENSION.is_empty() && exe.is_file()).then_some(exe)
    })
}

/// Long option names in a `--help` text, with dashes mapped to underscores.
pub fn parse_help_flags(help: &str) -> Vec<String> {
    let mut names = Vec::new();
    for token in help.split(|c: char| c.is_whitespace() || c == ',' || c == '[' || c == ']') {
        let Some(flag) = token.strip_prefix("--") else {
            continue;
        };
        let name: String = flag
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        let name = name.replace('-', "_");
        if name.is_empty() || name == "help" || name == "version" || names.contains(&name) {
            continue;
        }
        names.push(name);
    }
    names
}

/// Command line arguments for a payload. `Unset` and `false` flags are omitted.
pub fn payload_args(payload: &Payload) -> Vec<String> {
    let mut args = Vec::with_capacity(payload.len() * 2);
    for (name, value) in payload {
        let flag = format!("--{}", name.replace('_', "-"));
        match value {
            ParamValue::Unset | ParamValue::Flag(false) => {}
            ParamValue::Flag(true) => args.push(flag),
            other => {
                args.push(flag);
                args.push(other.to_string());
            }
        }
    }
    args
}

pub struct ProcessEntryPoint {
    program: PathBuf,
    name: String,
}

impl ProcessEntryPoint {
    pub fn new(program: PathBuf) -> Self {
        let name = program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self { program, name }
    }
}

impl PipelineEntryPoint for ProcessEntryPoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepted_parameters(&self) -> anyhow::Result<Vec<String>> {
        let output = Command::new(&self.program)
            .args(["rem", "--help"])
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("running {} rem --help", self.program.display()))?;
        if !output.status.success() {
            bail!("{} rem --help exited with {}", self.name, output.status);
        }
        let flags = parse_help_flags(&String::from_utf8_lossy(&output.stdout));
        rem_info!("{} accepts: {}", self.name, flags.join(", "));
        Ok(flags)
    }

    fn construct(
        &self,
        payload: &Payload,
        bindings: &CompatBindings,
    ) -> anyhow::Result<Box<dyn PipelineHandle>> {
        let Some(ParamValue::Path(out_dir)) = payload.get("out_dir") else {
            bail!("payload has no output directory");
        };
        let default_output = match payload.get("dem") {
            Some(ParamValue::Path(dem)) => {
                let stem = dem
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "dem".to_string());
                out_dir.join(format!("{stem}_REM.tif"))
            }
            _ => bail!("payload has no DEM"),
        };
        if let Some(module) = bindings.raster_module("gdal") {
            rem_info!("{} constructed; raster IO via {}", self.name, module.qualified_name());
        }
        Ok(Box::new(ProcessHandle {
            program: self.program.clone(),
            args: payload_args(payload),
            default_output,
        }))
    }
}

struct ProcessHandle {
    program: PathBuf,
    args: Vec<String>,
    default_output: PathBuf,
}

impl ProcessHandle {
    /// Runs one sub-command, streaming stdout to the console. Returns the
    /// path announced with [`OUTPUT_MARKER`], if any.
    fn run(&self, subcommand: &str, extra: &[String]) -> anyhow::Result<Option<PathBuf>> {
        let mut child = Command::new(&self.program)
            .arg(subcommand)
            .args(&self.args)
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("starting {} {subcommand}", self.program.display()))?;

        let stderr = child.stderr.take().map(spawn_tail_reader);
        let mut announced = None;
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                if let Some(path) = line.trim().strip_prefix(OUTPUT_MARKER) {
                    announced = Some(PathBuf::from(path));
                }
                rem_println!("{line}");
            }
        }

        let status = child
            .wait()
            .with_context(|| format!("waiting for {subcommand}"))?;
        let tail = stderr
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        if !status.success() {
            let summary = format!("`{subcommand}` exited with {status}");
            if tail.is_empty() {
                bail!(summary);
            }
            let stderr = tail.into_iter().collect::<Vec<_>>().join("\n");
            return Err(anyhow::anyhow!(stderr).context(summary));
        }
        Ok(announced)
    }
}

fn spawn_tail_reader<R: Read + Send + 'static>(reader: R) -> thread::JoinHandle<VecDeque<String>> {
    thread::spawn(move || {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL);
        for line in BufReader::new(reader).lines().map_while(Result::ok) {
            if tail.len() == STDERR_TAIL {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail
    })
}

fn viz_args(options: &VisualizationOptions) -> Vec<String> {
    let mut args = vec![
        "--colormap".to_string(),
        options.colormap.clone(),
        "--z".to_string(),
        options.vertical_exaggeration.to_string(),
        "--blend-percent".to_string(),
        options.blend_percent.to_string(),
    ];
    if options.make_png {
        args.push("--make-png".to_string());
    }
    if options.make_kmz {
        args.push("--make-kmz".to_string());
    }
    args
}

impl PipelineHandle for ProcessHandle {
    fn make_rem(&mut self) -> anyhow::Result<PathBuf> {
        let announced = self.run("rem", &[])?;
        Ok(announced.unwrap_or_else(|| self.default_output.clone()))
    }

    fn make_rem_viz(&mut self, options: &VisualizationOptions) -> anyhow::Result<()> {
        self.run("viz", &viz_args(options)).map(|_| ())
    }

    fn clean_up(&mut self) -> anyhow::Result<()> {
        self.run("clean-up", &[]).map(|_| ())
    }
}

enum GdalFlavour {
    /// `gdalinfo -json <file>`
    Legacy,
    /// `gdal raster info --format json <file>`
    Unified,
}

struct GdalCli {
    program: PathBuf,
    flavour: GdalFlavour,
    qualified_name: &'static str,
}

impl GdalCli {
    fn legacy(program: PathBuf) -> Self {
        Self {
            program,
            flavour: GdalFlavour::Legacy,
            qualified_name: "gdal",
        }
    }

    fn unified(program: PathBuf) -> Self {
        Self {
            program,
            flavour: GdalFlavour::Unified,
            qualified_name: "osgeo.gdal",
        }
    }
}

impl RasterModule for GdalCli {
    fn qualified_name(&self) -> &str {
        self.qualified_name
    }

    fn describe(&self, path: &Path) -> anyhow::Result<DemSummary> {
        let mut command = Command::new(&self.program);
        match self.flavour {
            GdalFlavour::Legacy => command.arg("-json"),
            GdalFlavour::Unified => command.args(["raster", "info", "--format", "json"]),
        };
        let output = command
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("running {}", self.program.display()))?;
        if !output.status.success() {
            bail!(
                "{} failed: {}",
                self.program.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let info: Value =
            serde_json::from_slice(&output.stdout).context("parsing raster info JSON")?;
        summary_from_info(&info)
    }
}

/// Reads the fields we report from GDAL's JSON raster info.
pub fn summary_from_info(info: &Value) -> anyhow::Result<DemSummary> {
    let size = info
        .get("size")
        .and_then(Value::as_array)
        .context("raster info has no size")?;
    let dim = |i: usize| size.get(i).and_then(Value::as_u64).unwrap_or(0);
    let transform = info.get("geoTransform").and_then(Value::as_array);
    let coefficient = |i: usize| {
        transform
            .and_then(|t| t.get(i))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    };
    let bands = info
        .get("bands")
        .and_then(Value::as_array)
        .map_or(0, |bands| bands.len());
    let projection = info
        .pointer("/coordinateSystem/wkt")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(DemSummary {
        width: dim(0),
        height: dim(1),
        bands: u32::try_from(bands).unwrap_or(u32::MAX),
        resolution: (coefficient(1), coefficient(5)),
        projection,
    })
}
