use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tempfile::tempdir;

fn translation(x: f32, y: f32, z: f32) -> Value {
    json!([1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, x, y, z, 1.0])
}

fn write_fixtures(dir: &Path, events: Value) -> Result<()> {
    let floors = json!({
        "floors": [
            {"floor": "floor1", "nodes": [
                {"name": "Scene", "worldTransform": translation(0.0, 0.0, 0.0)},
                {"name": "Kitchen_ROT", "isMesh": true, "worldTransform": translation(2.0, 0.5, 1.0)},
                {"name": "Living_Room_ROT", "isMesh": true, "worldTransform": translation(-2.0, 0.5, 1.0)}
            ]},
            {"floor": "floor2", "nodes": [
                {"name": "Bedroom_1_ROT", "isMesh": true, "worldTransform": translation(1.0, 2.7, -1.0)},
                {"name": "Bathroom_ROT", "isMesh": true, "worldTransform": translation(-1.0, 2.7, -1.0)}
            ]}
        ]
    });
    fs::write(dir.join("floors.json"), serde_json::to_vec_pretty(&floors)?)
        .context("writing floors fixture")?;
    fs::write(
        dir.join("script.json"),
        serde_json::to_vec_pretty(&json!({ "events": events }))?,
    )
    .context("writing script fixture")?;
    Ok(())
}

struct Run {
    summary: Value,
    transcript: Value,
}

fn run_viewer(dir: &Path, extra: &[&str]) -> Result<Run> {
    let transcript_path = dir.join("transcript.json");
    let output = Command::new(env!("CARGO_BIN_EXE_roomtour_viewer"))
        .arg("--floors")
        .arg(dir.join("floors.json"))
        .arg("--script")
        .arg(dir.join("script.json"))
        .arg("--transcript-json")
        .arg(&transcript_path)
        .args(extra)
        .output()
        .context("executing roomtour_viewer")?;

    assert!(
        output.status.success(),
        "roomtour_viewer exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: Value =
        serde_json::from_slice(&output.stdout).context("parsing summary from stdout")?;
    let transcript: Value = serde_json::from_slice(
        &fs::read(&transcript_path).context("reading transcript JSON")?,
    )
    .context("parsing transcript JSON")?;
    Ok(Run {
        summary,
        transcript,
    })
}

fn directives<'a>(transcript: &'a Value, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    transcript
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|frame| frame["directives"].as_array())
        .flatten()
        .filter_map(move |directive| directive.get(name))
}

fn label_floors(summary: &Value) -> Vec<String> {
    summary["displayed_labels"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|label| label["floor"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn selecting_floor_two_shows_only_its_labels() -> Result<()> {
    let dir = tempdir().context("creating fixture directory")?;
    write_fixtures(dir.path(), json!([{"atMs": 100, "action": "key", "key": "2"}]))?;

    let run = run_viewer(dir.path(), &["--duration-ms", "600"])?;

    assert_eq!(run.summary["floor_view"], "floor2");
    assert_eq!(run.summary["hotspots"], 4);
    let floors = label_floors(&run.summary);
    assert_eq!(floors, vec!["floor2", "floor2"], "summary: {}", run.summary);

    let hidden_floor_one = directives(&run.transcript, "set_floor_visible").any(|directive| {
        directive["floor"] == "floor1" && directive["model_visible"] == false
    });
    assert!(hidden_floor_one, "floor1 was never hidden");
    Ok(())
}

#[test]
fn hotspot_click_opens_panorama_and_escape_leaves_it() -> Result<()> {
    let dir = tempdir().context("creating fixture directory")?;
    write_fixtures(
        dir.path(),
        json!([
            {"atMs": 100, "action": "click_hotspot", "name": "kitchen"},
            {"atMs": 1500, "action": "key", "key": "Escape"}
        ]),
    )?;

    let run = run_viewer(dir.path(), &["--duration-ms", "2000"])?;

    assert_eq!(
        run.summary["panoramas_opened"],
        json!(["TaskID_0001/Kitchen.jpg"])
    );
    assert!(run.summary["panorama"].is_null());
    assert_eq!(run.summary["mode"], "normal");
    assert_eq!(label_floors(&run.summary).len(), 4);

    let opened: Vec<&Value> = directives(&run.transcript, "panorama_opened").collect();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0]["room"], "Kitchen");
    assert!(directives(&run.transcript, "move_camera").count() > 10);
    Ok(())
}

#[test]
fn missing_panorama_image_notifies_and_stays_in_model_view() -> Result<()> {
    let dir = tempdir().context("creating fixture directory")?;
    let panoramas = dir.path().join("panoramas");
    fs::create_dir_all(&panoramas).context("creating panorama root")?;
    write_fixtures(
        dir.path(),
        json!([{"atMs": 100, "action": "click_hotspot", "name": "kitchen"}]),
    )?;

    let root = panoramas.to_str().context("panorama root is not valid UTF-8")?;
    let run = run_viewer(dir.path(), &["--duration-ms", "1500", "--panorama-root", root])?;

    assert!(run.summary["panorama"].is_null());
    assert_eq!(run.summary["panoramas_opened"], json!([]));
    assert_eq!(
        run.summary["notifications"],
        json!(["Failed to load panorama: TaskID_0001/Kitchen.jpg."])
    );
    assert_eq!(label_floors(&run.summary).len(), 4);
    Ok(())
}

#[test]
fn marker_click_travels_between_rooms() -> Result<()> {
    let dir = tempdir().context("creating fixture directory")?;
    let panoramas = dir.path().join("panoramas");
    let images = panoramas.join("TaskID_0001");
    fs::create_dir_all(&images).context("creating panorama root")?;
    for room in ["Living Room", "Hallway"] {
        fs::write(images.join(format!("{room}.jpg")), b"jpeg").context("writing panorama")?;
    }
    write_fixtures(
        dir.path(),
        json!([
            {"atMs": 100, "action": "click_hotspot", "name": "living_room"},
            {"atMs": 1400, "action": "hover", "marker": "Hallway", "x": 300, "y": 200},
            {"atMs": 1500, "action": "click_marker", "name": "Hallway"},
            {"atMs": 1600, "action": "key", "key": "2"}
        ]),
    )?;

    let root = panoramas.to_str().context("panorama root is not valid UTF-8")?;
    let run = run_viewer(dir.path(), &["--duration-ms", "2000", "--panorama-root", root])?;

    assert_eq!(
        run.summary["panoramas_opened"],
        json!(["TaskID_0001/Living Room.jpg", "TaskID_0001/Hallway.jpg"])
    );
    assert_eq!(run.summary["panorama"]["room"], "Hallway");
    // Floor selection is rejected while a panorama is open.
    assert_eq!(run.summary["floor_view"], "all");

    let tooltip = directives(&run.transcript, "show_tooltip")
        .next()
        .context("tooltip directive missing")?;
    assert_eq!(tooltip["text"], "Hallway: ");
    assert_eq!(tooltip["x"], 310.0);
    Ok(())
}
