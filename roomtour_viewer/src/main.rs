mod cli;
mod script;
mod session;

use std::{fs, time::Duration};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use roomtour_core::ViewStateMachine;

use crate::cli::{Args, load_config, load_manifest, load_script};
use crate::session::{DirectoryLoader, SessionOptions, run_session};

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    ensure!(args.frame_ms > 0, "--frame-ms must be positive");

    let config = load_config(args.config.as_deref())?;
    let manifest = load_manifest(args.floors.as_deref())?;
    let script = load_script(args.script.as_deref())?;

    let mut machine = ViewStateMachine::new(config).context("building view-state machine")?;
    if let Some(root) = args.panorama_root.clone() {
        ensure!(
            root.is_dir(),
            "panorama root {} is not a directory",
            root.display()
        );
        machine = machine.with_loader(DirectoryLoader::new(root));
    }
    machine.resize(args.viewport);

    let end_ms = args
        .duration_ms
        .unwrap_or_else(|| script.last_event_ms().unwrap_or(0) + 1000);
    let outcome = run_session(
        &mut machine,
        &manifest,
        &script,
        SessionOptions {
            frame: Duration::from_millis(args.frame_ms),
            end: Duration::from_millis(end_ms),
        },
    );
    log::info!(
        "replayed {} frames, {} directives",
        outcome.summary.frames,
        outcome.summary.directive_count
    );

    if let Some(path) = args.transcript_json.as_ref() {
        let json = serde_json::to_string_pretty(&outcome.transcript)
            .context("serializing session transcript to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing transcript JSON to {}", path.display()))?;
        log::info!("saved transcript to {}", path.display());
    }

    let summary =
        serde_json::to_string_pretty(&outcome.summary).context("serializing session summary")?;
    println!("{summary}");
    Ok(())
}
