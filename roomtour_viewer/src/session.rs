//! Fixed-step replay of a script against the view-state machine.

use std::{path::PathBuf, time::Duration};

use roomtour_core::{
    Directive, Floor, FloorManifest, FloorView, FrameReport, InputCommand, LoadFailure,
    PanoramaLoader, PanoramaSession, ViewMode, ViewStateMachine, Viewport,
};
use serde::Serialize;

use crate::script::{Script, ScriptAction, ScriptEvent};

/// Panoramas load only when the image exists under `root`.
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl PanoramaLoader for DirectoryLoader {
    fn load(&mut self, image: &str) -> Result<(), LoadFailure> {
        let path = self.root.join(image);
        if path.is_file() {
            Ok(())
        } else {
            Err(LoadFailure::new(
                image,
                format!("{} does not exist", path.display()),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub frame: Duration,
    pub end: Duration,
}

#[derive(Debug, Serialize)]
pub struct FrameRecord {
    pub t_ms: u64,
    pub events: Vec<ScriptAction>,
    pub directives: Vec<Directive>,
    pub report: FrameReport,
}

#[derive(Debug, Serialize)]
pub struct LabelSummary {
    pub text: String,
    pub floor: Floor,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub frames: usize,
    pub end_ms: u64,
    pub mode: ViewMode,
    pub floor_view: FloorView,
    pub panorama: Option<PanoramaSession>,
    pub hotspots: usize,
    pub displayed_labels: Vec<LabelSummary>,
    pub panoramas_opened: Vec<String>,
    pub notifications: Vec<String>,
    pub directive_count: usize,
}

pub struct SessionOutcome {
    pub transcript: Vec<FrameRecord>,
    pub summary: SessionSummary,
}

pub fn run_session(
    machine: &mut ViewStateMachine,
    manifest: &FloorManifest,
    script: &Script,
    options: SessionOptions,
) -> SessionOutcome {
    let frame = if options.frame.is_zero() {
        Duration::from_millis(1)
    } else {
        options.frame
    };

    if !script.loads_floors() {
        for entry in machine.config().floors.clone() {
            load_floor(machine, manifest, entry.floor);
        }
    }

    let events = script.ordered();
    let mut next_event = 0;
    let mut transcript = Vec::new();
    let mut frames = 0;
    let mut panoramas_opened = Vec::new();
    let mut notifications = Vec::new();
    let mut directive_count = 0;
    let mut now = Duration::ZERO;
    let mut last_report = None;

    loop {
        let mut fired = Vec::new();
        while let Some(event) = events.get(next_event) {
            if Duration::from_millis(event.at_ms) > now {
                break;
            }
            apply_event(machine, manifest, event);
            fired.push(event.action.clone());
            next_event += 1;
        }

        let report = machine.tick(now);
        frames += 1;
        let directives = machine.drain_directives();
        directive_count += directives.len();
        for directive in &directives {
            match directive {
                Directive::PanoramaOpened { image, .. } => panoramas_opened.push(image.clone()),
                Directive::Notify { message } => notifications.push(message.clone()),
                _ => {}
            }
        }

        let finished = now >= options.end;
        if !fired.is_empty() || !directives.is_empty() || finished {
            transcript.push(FrameRecord {
                t_ms: millis(now),
                events: fired,
                directives,
                report: report.clone(),
            });
        }
        last_report = Some(report);
        if finished {
            break;
        }
        now = (now + frame).min(options.end);
    }

    let registry = machine.registry();
    let displayed_labels = last_report
        .iter()
        .flat_map(|report| report.displayed_labels())
        .filter_map(|placement| registry.label(placement.label))
        .map(|label| LabelSummary {
            text: label.text.clone(),
            floor: label.floor,
        })
        .collect();

    let summary = SessionSummary {
        frames,
        end_ms: millis(now),
        mode: machine.mode(),
        floor_view: machine.floor_view(),
        panorama: machine.panorama().cloned(),
        hotspots: registry.hotspot_count(),
        displayed_labels,
        panoramas_opened,
        notifications,
        directive_count,
    };
    SessionOutcome {
        transcript,
        summary,
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn load_floor(machine: &mut ViewStateMachine, manifest: &FloorManifest, floor: Floor) {
    let nodes = manifest.nodes(floor).map(<[_]>::to_vec).unwrap_or_default();
    if nodes.is_empty() {
        log::warn!("no nodes listed for {}", floor.key());
    }
    machine.floor_loaded(floor, nodes);
}

fn apply_event(machine: &mut ViewStateMachine, manifest: &FloorManifest, event: &ScriptEvent) {
    log::debug!("t={}ms {:?}", event.at_ms, event.action);
    match &event.action {
        ScriptAction::Key { key } => match InputCommand::from_key(key) {
            Some(command) => {
                if !machine.apply(command) {
                    log::info!("{command:?} rejected in current state");
                }
            }
            None => log::warn!("unmapped key {key:?}"),
        },
        ScriptAction::ClickHotspot { name } => {
            let Some(id) = machine.registry().find_hotspot(name).map(|hotspot| hotspot.id) else {
                log::warn!("no hotspot matching {name:?}");
                return;
            };
            if let Err(failure) = machine.pointer_clicked(Some(id)) {
                log::info!("click did not open a panorama: {failure}");
            }
        }
        ScriptAction::ClickMarker { name } => {
            let Some(id) = machine.registry().find_marker(name).map(|entity| entity.id) else {
                log::warn!("no panorama marker named {name:?}");
                return;
            };
            if let Err(failure) = machine.pointer_clicked(Some(id)) {
                log::info!("click did not open a panorama: {failure}");
            }
        }
        ScriptAction::ClickNothing => {
            if let Err(failure) = machine.pointer_clicked(None) {
                log::info!("click did not open a panorama: {failure}");
            }
        }
        ScriptAction::Hover { marker, x, y } => {
            let hit = marker
                .as_deref()
                .and_then(|name| machine.registry().find_marker(name))
                .map(|entity| entity.id);
            machine.pointer_moved(hit, *x, *y);
        }
        ScriptAction::Wheel { delta_y } => machine.wheel(*delta_y),
        ScriptAction::InteractionStart => machine.interaction_started(),
        ScriptAction::InteractionEnd => machine.interaction_ended(),
        ScriptAction::LoadFloor { floor } => load_floor(machine, manifest, *floor),
        ScriptAction::Resize { width, height } => {
            machine.resize(Viewport::new(*width, *height));
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use roomtour_core::floors::FloorNodes;
    use roomtour_core::{FloorNode, TourConfig};

    use super::*;

    fn manifest() -> FloorManifest {
        FloorManifest {
            floors: vec![
                FloorNodes {
                    floor: Floor::Floor1,
                    nodes: vec![FloorNode::new(
                        "Kitchen_ROT",
                        Mat4::from_translation(Vec3::new(2.0, 0.5, 1.0)),
                    )],
                },
                FloorNodes {
                    floor: Floor::Floor2,
                    nodes: Vec::new(),
                },
            ],
        }
    }

    fn options(end_ms: u64) -> SessionOptions {
        SessionOptions {
            frame: Duration::from_millis(16),
            end: Duration::from_millis(end_ms),
        }
    }

    #[test]
    fn floors_load_at_start_without_scripted_loads() {
        let mut machine = ViewStateMachine::new(TourConfig::builtin().expect("built-in config"))
            .expect("machine");
        let outcome = run_session(&mut machine, &manifest(), &Script::default(), options(200));
        assert_eq!(outcome.summary.hotspots, 1);
        assert_eq!(outcome.summary.end_ms, 200);
        assert_eq!(outcome.summary.displayed_labels.len(), 1);
        assert_eq!(outcome.summary.displayed_labels[0].text, "Kitchen ROT");
    }

    #[test]
    fn missing_image_is_reported_and_session_stays_closed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut machine = ViewStateMachine::new(TourConfig::builtin().expect("built-in config"))
            .expect("machine")
            .with_loader(DirectoryLoader::new(dir.path().to_path_buf()));
        let script: Script = serde_json::from_str(
            r#"{"events": [{"atMs": 100, "action": "click_hotspot", "name": "kitchen"}]}"#,
        )
        .expect("script");

        let outcome = run_session(&mut machine, &manifest(), &script, options(1500));
        assert!(outcome.summary.panorama.is_none());
        assert!(outcome.summary.panoramas_opened.is_empty());
        assert_eq!(
            outcome.summary.notifications,
            vec!["Failed to load panorama: TaskID_0001/Kitchen.jpg.".to_string()]
        );
    }
}
