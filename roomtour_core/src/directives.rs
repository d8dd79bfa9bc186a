//! Directives the view-state machine hands to the render/UI collaborator.
//! They are queued in emission order and drained by the caller once per
//! frame, after the machine has finished mutating state.

use std::collections::VecDeque;

use glam::Vec3;
use serde::Serialize;

use crate::camera::CameraProfile;
use crate::floors::Floor;
use crate::registry::{EntityId, LabelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorStyle {
    Pointer,
    Grab,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    SetCameraProfile { profile: CameraProfile },
    MoveCamera { position: Vec3, target: Vec3 },
    SetFieldOfView { fov: f32 },
    SetAutoRotate { enabled: bool },
    SetFloorVisible {
        floor: Floor,
        model_visible: bool,
        wireframe_visible: bool,
    },
    SetLabelVisible { label: LabelId, visible: bool },
    HideRoomElements,
    ShowRoomElements,
    ShowHint,
    HideHint,
    ShowTooltip { text: String, x: f32, y: f32 },
    HideTooltip,
    SetCursor { style: CursorStyle },
    ShowLoading,
    HideLoading,
    Notify { message: String },
    SetMarkerScale { entity: EntityId, scale: f32 },
    PanoramaOpened {
        image: String,
        room: String,
        markers: Vec<EntityId>,
    },
    PanoramaClosed,
    HotspotsRebuilt { count: usize },
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Directive::SetCameraProfile { .. } => "set_camera_profile",
            Directive::MoveCamera { .. } => "move_camera",
            Directive::SetFieldOfView { .. } => "set_field_of_view",
            Directive::SetAutoRotate { .. } => "set_auto_rotate",
            Directive::SetFloorVisible { .. } => "set_floor_visible",
            Directive::SetLabelVisible { .. } => "set_label_visible",
            Directive::HideRoomElements => "hide_room_elements",
            Directive::ShowRoomElements => "show_room_elements",
            Directive::ShowHint => "show_hint",
            Directive::HideHint => "hide_hint",
            Directive::ShowTooltip { .. } => "show_tooltip",
            Directive::HideTooltip => "hide_tooltip",
            Directive::SetCursor { .. } => "set_cursor",
            Directive::ShowLoading => "show_loading",
            Directive::HideLoading => "hide_loading",
            Directive::Notify { .. } => "notify",
            Directive::SetMarkerScale { .. } => "set_marker_scale",
            Directive::PanoramaOpened { .. } => "panorama_opened",
            Directive::PanoramaClosed => "panorama_closed",
            Directive::HotspotsRebuilt { .. } => "hotspots_rebuilt",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DirectiveQueue {
    pending: VecDeque<Directive>,
}

impl DirectiveQueue {
    pub fn push(&mut self, directive: Directive) {
        log::trace!("directive {}", directive.name());
        self.pending.push_back(directive);
    }

    pub fn drain(&mut self) -> Vec<Directive> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_emission_order() {
        let mut queue = DirectiveQueue::default();
        queue.push(Directive::ShowLoading);
        queue.push(Directive::Notify {
            message: "hello".to_string(),
        });
        queue.push(Directive::HideLoading);
        let names: Vec<&str> = queue.drain().iter().map(Directive::name).collect();
        assert_eq!(names, vec!["show_loading", "notify", "hide_loading"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn directives_serialize_with_snake_case_tags() {
        let json = serde_json::to_value(Directive::SetFloorVisible {
            floor: Floor::Floor2,
            model_visible: true,
            wireframe_visible: false,
        })
        .expect("serialize");
        assert_eq!(json["set_floor_visible"]["floor"], "floor2");
        assert_eq!(json["set_floor_visible"]["model_visible"], true);

        let unit = serde_json::to_value(Directive::PanoramaClosed).expect("serialize");
        assert_eq!(unit, "panorama_closed");
    }
}
