use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use roomtour_core::{FloorManifest, TourConfig, Viewport};

use crate::script::Script;

#[derive(Parser, Debug)]
#[command(
    about = "Headless tour driver that replays an input script through the view-state machine",
    version
)]
pub struct Args {
    /// Tour configuration JSON (markers, mapping rules, panoramas); defaults to the built-in tour
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Floor node manifest JSON exported next to the building models
    #[arg(long)]
    pub floors: Option<PathBuf>,

    /// Timed input script JSON to replay
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Viewport size in pixels, as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720", value_parser = parse_viewport)]
    pub viewport: Viewport,

    /// Frame interval in milliseconds
    #[arg(long, default_value_t = 16)]
    pub frame_ms: u64,

    /// Total simulated time; defaults to one second past the last scripted event
    #[arg(long)]
    pub duration_ms: Option<u64>,

    /// When set, write every frame with events or directives to this JSON file
    #[arg(long)]
    pub transcript_json: Option<PathBuf>,

    /// When set, a panorama only loads if its image exists under this directory
    #[arg(long)]
    pub panorama_root: Option<PathBuf>,
}

pub fn parse_viewport(value: &str) -> Result<Viewport, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value}"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|err| format!("invalid viewport width {width:?}: {err}"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|err| format!("invalid viewport height {height:?}: {err}"))?;
    if width == 0 || height == 0 {
        return Err(format!("viewport must be non-empty, got {value}"));
    }
    Ok(Viewport::new(width as f32, height as f32))
}

pub fn load_config(path: Option<&Path>) -> Result<TourConfig> {
    match path {
        Some(path) => TourConfig::from_path(path)
            .with_context(|| format!("loading tour config {}", path.display())),
        None => TourConfig::builtin().context("loading built-in tour config"),
    }
}

pub fn load_manifest(path: Option<&Path>) -> Result<FloorManifest> {
    match path {
        Some(path) => FloorManifest::from_path(path)
            .with_context(|| format!("loading floor manifest {}", path.display())),
        None => Ok(FloorManifest::default()),
    }
}

pub fn load_script(path: Option<&Path>) -> Result<Script> {
    let Some(path) = path else {
        return Ok(Script::default());
    };
    let data =
        fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))?;
    let script: Script = serde_json::from_str(&data)
        .with_context(|| format!("parsing script {}", path.display()))?;
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_parses_width_and_height() {
        let viewport = parse_viewport("800x600").expect("viewport");
        assert_eq!(viewport, Viewport::new(800.0, 600.0));
        assert!(parse_viewport("800").is_err());
        assert!(parse_viewport("0x600").is_err());
        assert!(parse_viewport("wide x tall").is_err());
    }

    #[test]
    fn defaults_match_documented_values() {
        let args = Args::try_parse_from(["roomtour_viewer"]).expect("args");
        assert_eq!(args.viewport, Viewport::new(1280.0, 720.0));
        assert_eq!(args.frame_ms, 16);
        assert!(args.duration_ms.is_none());
    }
}
