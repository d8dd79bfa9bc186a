//! Timed input scripts replayed by the headless driver.

use roomtour_core::Floor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    /// Keyboard shortcut, e.g. `"2"` or `"Escape"`.
    Key { key: String },
    /// Click the first hotspot whose node name contains `name`.
    ClickHotspot { name: String },
    /// Click a panorama marker by display name.
    ClickMarker { name: String },
    /// Click that hit nothing.
    ClickNothing,
    Hover {
        #[serde(default)]
        marker: Option<String>,
        x: f32,
        y: f32,
    },
    Wheel { delta_y: f32 },
    InteractionStart,
    InteractionEnd,
    LoadFloor { floor: Floor },
    Resize { width: f32, height: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl Script {
    /// Events in firing order; ties keep file order.
    pub fn ordered(&self) -> Vec<ScriptEvent> {
        let mut events = self.events.clone();
        events.sort_by_key(|event| event.at_ms);
        events
    }

    pub fn last_event_ms(&self) -> Option<u64> {
        self.events.iter().map(|event| event.at_ms).max()
    }

    pub fn loads_floors(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event.action, ScriptAction::LoadFloor { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flattened_actions() {
        let json = r#"{"events": [
            {"atMs": 500, "action": "key", "key": "2"},
            {"atMs": 100, "action": "load_floor", "floor": "floor1"},
            {"atMs": 500, "action": "interaction_start"},
            {"atMs": 900, "action": "hover", "marker": "Hallway", "x": 10, "y": 20}
        ]}"#;
        let script: Script = serde_json::from_str(json).expect("parse script");
        assert!(script.loads_floors());
        assert_eq!(script.last_event_ms(), Some(900));

        let ordered = script.ordered();
        assert_eq!(ordered[0].action, ScriptAction::LoadFloor { floor: Floor::Floor1 });
        assert_eq!(ordered[1].action, ScriptAction::Key { key: "2".to_string() });
        assert_eq!(ordered[2].action, ScriptAction::InteractionStart);
    }
}
