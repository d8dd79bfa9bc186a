//! Per-frame placement of the screen-space room labels. Nothing is cached
//! between frames; every call recomputes from the camera it is given.

use glam::{Mat4, Vec3};
use serde::Serialize;

use crate::camera::{CameraProfile, Viewport};
use crate::registry::LabelId;

/// A label ready to project: its registry flag and where it sits in world
/// space this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelAnchor {
    pub label: LabelId,
    pub visible: bool,
    pub world_position: Vec3,
}

impl LabelAnchor {
    /// Anchor for a label offset locally from an entity's world transform.
    pub fn from_transform(label: LabelId, visible: bool, owner: Mat4, offset: Vec3) -> Self {
        Self {
            label,
            visible,
            world_position: owner.transform_point3(offset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelPlacement {
    pub label: LabelId,
    pub x: f32,
    pub y: f32,
    pub ndc_z: f32,
    /// Visibility flag set and in front of the camera.
    pub displayed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct LabelProjectionSynchronizer {
    viewport: Viewport,
}

impl Default for LabelProjectionSynchronizer {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl LabelProjectionSynchronizer {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Projects every anchor whose visibility flag is set. Hidden labels are
    /// skipped entirely.
    pub fn synchronize<I>(&self, camera: &CameraProfile, anchors: I) -> Vec<LabelPlacement>
    where
        I: IntoIterator<Item = LabelAnchor>,
    {
        let Some(projector) = camera.projector(self.viewport) else {
            log::trace!("label projection skipped: degenerate camera or viewport");
            return Vec::new();
        };

        let mut placements = Vec::new();
        for anchor in anchors.into_iter().filter(|anchor| anchor.visible) {
            let Some(ndc) = projector.project(anchor.world_position) else {
                placements.push(LabelPlacement {
                    label: anchor.label,
                    x: 0.0,
                    y: 0.0,
                    ndc_z: f32::INFINITY,
                    displayed: false,
                });
                continue;
            };
            let pixels = self.viewport.to_pixels(ndc);
            placements.push(LabelPlacement {
                label: anchor.label,
                x: pixels.x,
                y: pixels.y,
                ndc_z: ndc.z,
                displayed: ndc.z <= 1.0,
            });
        }
        log::trace!("projected {} labels", placements.len());
        placements
    }
}
