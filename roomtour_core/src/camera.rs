//! Camera profiles for every view mode and the view-projection used to place
//! screen-space labels.

use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::Serialize;

use crate::floors::FloorView;

pub const DEFAULT_FOV_DEGREES: f32 = 60.0;
pub const PANORAMA_FOV_DEGREES: f32 = 75.0;
pub const PANORAMA_MIN_FOV_DEGREES: f32 = 30.0;
pub const PANORAMA_MAX_FOV_DEGREES: f32 = 90.0;
pub const PANORAMA_AUTO_ROTATE_SPEED: f32 = 0.9;
/// Keeps the panorama camera off the poles.
pub const PANORAMA_POLAR_MARGIN: f32 = 0.01;
/// Half height of the orthographic floor-plan frustum.
pub const ORTHO_HALF_HEIGHT: f32 = 8.0;
pub const NEAR_CLIP: f32 = 0.1;
pub const FAR_CLIP: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Orbit-control constraints that travel with a camera profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlLimits {
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_azimuth_angle: f32,
    pub max_azimuth_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_fov: f32,
    pub max_fov: f32,
    pub zoom_speed: f32,
}

impl ControlLimits {
    /// Free orbit: rotate, pan and zoom, any polar or azimuth angle.
    pub fn orbit() -> Self {
        Self {
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            min_azimuth_angle: f32::NEG_INFINITY,
            max_azimuth_angle: f32::INFINITY,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_fov: DEFAULT_FOV_DEGREES,
            max_fov: DEFAULT_FOV_DEGREES,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraProfile {
    pub projection: Projection,
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
    pub limits: ControlLimits,
    /// Orbit auto-rotate speed when enabled.
    pub auto_rotate: Option<f32>,
}

impl CameraProfile {
    pub fn orbit(position: Vec3, target: Vec3) -> Self {
        Self {
            projection: Projection::Perspective,
            position,
            target,
            fov: DEFAULT_FOV_DEGREES,
            limits: ControlLimits::orbit(),
            auto_rotate: None,
        }
    }

    pub fn home() -> Self {
        Self::orbit(Vec3::new(10.0, 7.0, 10.0), Vec3::new(0.0, 2.0, 0.0))
    }

    /// Normal-mode framing for the selected floors.
    pub fn normal(view: FloorView) -> Self {
        match view {
            FloorView::Floor1 => Self::orbit(Vec3::new(8.0, 5.0, 8.0), Vec3::new(0.0, 1.0, 0.0)),
            FloorView::Floor2 => Self::orbit(Vec3::new(8.0, 9.0, 8.0), Vec3::new(0.0, 4.0, 0.0)),
            FloorView::All => Self::orbit(Vec3::new(10.0, 7.0, 10.0), Vec3::new(0.0, 2.0, 0.0)),
        }
    }

    pub fn dollhouse() -> Self {
        Self::orbit(Vec3::new(12.0, 15.0, 12.0), Vec3::new(0.0, 2.0, 0.0))
    }

    /// Straight-down orthographic view; only azimuth spin is left free.
    pub fn floor_plan(view: FloorView) -> Self {
        let (height, target_y) = match view {
            FloorView::Floor2 => (20.0, 4.0),
            FloorView::Floor1 => (8.0, 0.0),
            FloorView::All => (15.0, 2.0),
        };
        let mut limits = ControlLimits::orbit();
        limits.min_polar_angle = 0.0;
        limits.max_polar_angle = 0.0;
        Self {
            projection: Projection::Orthographic,
            // The small z offset keeps look-at away from the pole.
            position: Vec3::new(0.0, height, 0.001),
            target: Vec3::new(0.0, target_y, 0.0),
            fov: DEFAULT_FOV_DEGREES,
            limits,
            auto_rotate: None,
        }
    }

    pub fn panorama() -> Self {
        Self {
            projection: Projection::Perspective,
            position: Vec3::ZERO,
            target: Vec3::new(0.0, 0.0, -1.0),
            fov: PANORAMA_FOV_DEGREES,
            limits: ControlLimits {
                enable_rotate: true,
                enable_zoom: false,
                enable_pan: false,
                min_polar_angle: PANORAMA_POLAR_MARGIN,
                max_polar_angle: PI - PANORAMA_POLAR_MARGIN,
                min_azimuth_angle: f32::NEG_INFINITY,
                max_azimuth_angle: f32::INFINITY,
                min_distance: 0.0,
                max_distance: f32::INFINITY,
                min_fov: PANORAMA_MIN_FOV_DEGREES,
                max_fov: PANORAMA_MAX_FOV_DEGREES,
                zoom_speed: 1.0,
            },
            auto_rotate: Some(PANORAMA_AUTO_ROTATE_SPEED),
        }
    }

    /// One wheel notch of field-of-view zoom; negative delta zooms in.
    pub fn wheel_zoom(&mut self, delta_y: f32) {
        self.fov = if delta_y < 0.0 {
            (self.fov - 1.0).max(self.limits.min_fov)
        } else {
            (self.fov + 1.0).min(self.limits.max_fov)
        };
    }

    pub fn projector(&self, viewport: Viewport) -> Option<CameraProjector> {
        let aspect = viewport.aspect()?;
        let forward = self.target - self.position;
        if forward.length_squared() <= f32::EPSILON {
            return None;
        }

        let view = Mat4::look_at_rh(self.position, self.target, stable_up(forward));
        let projection = match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh_gl(self.fov.to_radians(), aspect, NEAR_CLIP, FAR_CLIP)
            }
            Projection::Orthographic => Mat4::orthographic_rh_gl(
                -ORTHO_HALF_HEIGHT * aspect,
                ORTHO_HALF_HEIGHT * aspect,
                -ORTHO_HALF_HEIGHT,
                ORTHO_HALF_HEIGHT,
                NEAR_CLIP,
                FAR_CLIP,
            ),
        };

        Some(CameraProjector {
            view_projection: projection * view,
        })
    }
}

/// Avoid a degenerate basis when looking almost straight up or down.
fn stable_up(forward: Vec3) -> Vec3 {
    let dir = forward.normalize();
    if dir.y.abs() > 0.999 {
        if dir.y < 0.0 { Vec3::NEG_Z } else { Vec3::Z }
    } else {
        Vec3::Y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> Option<f32> {
        let aspect = self.width / self.height;
        if aspect.is_finite() && aspect > 0.0 {
            Some(aspect)
        } else {
            None
        }
    }

    /// NDC to pixels with the origin at the top-left corner.
    pub fn to_pixels(&self, ndc: Vec3) -> Vec2 {
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * self.width,
            (-ndc.y * 0.5 + 0.5) * self.height,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

#[derive(Debug, Clone)]
pub struct CameraProjector {
    view_projection: Mat4,
}

impl CameraProjector {
    /// World position to normalized device coordinates. Points behind a
    /// perspective camera come back with `z > 1`.
    pub fn project(&self, position: Vec3) -> Option<Vec3> {
        let clip = self.view_projection * Vec4::new(position.x, position.y, position.z, 1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        if !ndc.is_finite() {
            return None;
        }
        Some(ndc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn look_target_projects_to_screen_centre() {
        let profile = CameraProfile::home();
        let viewport = Viewport::new(800.0, 600.0);
        let projector = profile.projector(viewport).expect("projector");
        let ndc = projector.project(profile.target).expect("ndc");
        assert!(ndc.x.abs() < EPSILON && ndc.y.abs() < EPSILON);
        assert!(ndc.z < 1.0);
        let pixels = viewport.to_pixels(ndc);
        assert!((pixels - Vec2::new(400.0, 300.0)).length() < 1e-2);
    }

    #[test]
    fn points_behind_camera_have_depth_beyond_one() {
        let profile = CameraProfile::orbit(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let projector = profile.projector(Viewport::default()).expect("projector");
        let behind = projector.project(Vec3::new(0.0, 0.0, 5.0)).expect("ndc");
        assert!(behind.z > 1.0, "behind z = {}", behind.z);
        let ahead = projector.project(Vec3::new(0.0, 0.0, -5.0)).expect("ndc");
        assert!(ahead.z <= 1.0);
    }

    #[test]
    fn floor_plan_looks_straight_down() {
        let profile = CameraProfile::floor_plan(FloorView::Floor2);
        assert_eq!(profile.projection, Projection::Orthographic);
        assert_eq!(profile.limits.min_polar_angle, 0.0);
        assert_eq!(profile.limits.max_polar_angle, 0.0);
        assert_eq!(profile.position.y, 20.0);
        assert_eq!(profile.target.y, 4.0);
        let projector = profile.projector(Viewport::default()).expect("projector");
        let ndc = projector.project(Vec3::new(0.0, 4.0, 0.0)).expect("ndc");
        assert!(ndc.x.abs() < 1e-3 && ndc.y.abs() < 1e-3);
    }

    #[test]
    fn floor_two_sits_above_floor_one() {
        let lower = CameraProfile::normal(FloorView::Floor1);
        let upper = CameraProfile::normal(FloorView::Floor2);
        assert!(upper.position.y > lower.position.y);
        assert!(upper.target.y > lower.target.y);
    }

    #[test]
    fn wheel_zoom_clamps_to_limits() {
        let mut profile = CameraProfile::panorama();
        for _ in 0..100 {
            profile.wheel_zoom(-120.0);
        }
        assert_eq!(profile.fov, PANORAMA_MIN_FOV_DEGREES);
        for _ in 0..100 {
            profile.wheel_zoom(120.0);
        }
        assert_eq!(profile.fov, PANORAMA_MAX_FOV_DEGREES);
    }

    #[test]
    fn degenerate_viewport_has_no_projector() {
        assert!(CameraProfile::home().projector(Viewport::new(0.0, 0.0)).is_none());
    }
}
