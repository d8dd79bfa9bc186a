use serde::{Deserialize, Serialize};

use crate::floors::FloorView;

/// Abstract commands delivered by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputCommand {
    Home,
    ToggleDollhouse,
    ToggleFloorPlan,
    FloorSelect(FloorView),
    /// Leave the panorama, or go home when none is open.
    Escape,
}

impl InputCommand {
    /// Keyboard shortcuts of the tour page.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "h" | "H" => Some(InputCommand::Home),
            "d" | "D" => Some(InputCommand::ToggleDollhouse),
            "f" | "F" => Some(InputCommand::ToggleFloorPlan),
            "1" => Some(InputCommand::FloorSelect(FloorView::Floor1)),
            "2" => Some(InputCommand::FloorSelect(FloorView::Floor2)),
            "a" | "A" => Some(InputCommand::FloorSelect(FloorView::All)),
            "Escape" | "Esc" => Some(InputCommand::Escape),
            _ => None,
        }
    }
}
