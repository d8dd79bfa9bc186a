//! The view-state machine: the single owner of camera, floor visibility,
//! label registry and panorama session state.
//!
//! The caller drives it with commands and pointer results, calls
//! [`ViewStateMachine::tick`] once per render frame with its clock, and
//! drains the queued [`Directive`]s afterwards. All timers (label reveal,
//! pulse revert, auto-rotate resume, transition completion) fire from
//! `tick`, so every mutation for a frame lands before that frame's labels
//! are projected.

use std::f32::consts::TAU;
use std::time::Duration;

use glam::{Mat4, Vec3};
use serde::Serialize;

use crate::camera::{CameraProfile, Viewport};
use crate::config::{TourConfig, room_id_for_image};
use crate::directives::{CursorStyle, Directive, DirectiveQueue};
use crate::error::{ConfigError, LoadFailure};
use crate::floors::{Floor, FloorModels, FloorNode, FloorView, floor_visibility};
use crate::input::InputCommand;
use crate::labels::{LabelAnchor, LabelPlacement, LabelProjectionSynchronizer};
use crate::registry::{EntityId, NewHotspot, Pick, Registry};
use crate::resolver::HotspotTargetResolver;
use crate::timers::OneShot;
use crate::transition::{Advance, CameraTransitionEngine, PulseEffect, ScaleChange};
use crate::view_config::{Snapshot, ViewConfigStack};

pub const LABEL_REVEAL_DELAY: Duration = Duration::from_millis(100);
pub const AUTO_ROTATE_RESUME_DELAY: Duration = Duration::from_millis(3000);
/// Yaw added to each visible floor model per frame in normal mode.
pub const IDLE_SPIN_PER_FRAME: f32 = 0.002;
pub const TOOLTIP_OFFSET_X: f32 = 10.0;
pub const TOOLTIP_OFFSET_Y: f32 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Normal,
    Dollhouse,
    FloorPlan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanoramaSession {
    pub image: String,
    pub room: String,
}

/// The (mode, floor selection, session) triple. `mode` inside a panorama is
/// the mode the session returns to.
#[derive(Debug, Clone, PartialEq)]
enum ViewState {
    Exploring {
        mode: ViewMode,
        floor: FloorView,
    },
    Panorama {
        mode: ViewMode,
        floor: FloorView,
        session: PanoramaSession,
    },
}

/// Fetches and decodes a panorama image for the renderer.
pub trait PanoramaLoader {
    fn load(&mut self, image: &str) -> Result<(), LoadFailure>;
}

impl<F> PanoramaLoader for F
where
    F: FnMut(&str) -> Result<(), LoadFailure>,
{
    fn load(&mut self, image: &str) -> Result<(), LoadFailure> {
        self(image)
    }
}

struct AcceptAll;

impl PanoramaLoader for AcceptAll {
    fn load(&mut self, _image: &str) -> Result<(), LoadFailure> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPose {
    pub id: EntityId,
    pub name: String,
    pub position: Vec3,
    pub icon_scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloorPose {
    pub floor: Floor,
    pub yaw: f32,
}

/// What the renderer needs for one frame besides the directives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub now_ms: u64,
    pub mode: ViewMode,
    pub floor_view: FloorView,
    pub panorama: Option<PanoramaSession>,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub fov: f32,
    pub labels: Vec<LabelPlacement>,
    pub markers: Vec<MarkerPose>,
    pub floors: Vec<FloorPose>,
}

impl FrameReport {
    pub fn displayed_labels(&self) -> impl Iterator<Item = &LabelPlacement> {
        self.labels.iter().filter(|placement| placement.displayed)
    }
}

enum ClickTarget {
    Hotspot {
        id: EntityId,
        scale: f32,
        focus: Vec3,
        image: String,
    },
    Marker {
        image: String,
    },
}

pub struct ViewStateMachine {
    config: TourConfig,
    resolver: HotspotTargetResolver,
    loader: Box<dyn PanoramaLoader>,
    state: ViewState,
    camera: CameraProfile,
    views: ViewConfigStack,
    transitions: CameraTransitionEngine<String>,
    pulse: PulseEffect<EntityId>,
    label_reveal: OneShot<FloorView>,
    rotate_resume: OneShot<()>,
    auto_rotating: bool,
    floors: FloorModels,
    registry: Registry,
    labels: LabelProjectionSynchronizer,
    directives: DirectiveQueue,
    now: Duration,
}

impl ViewStateMachine {
    /// Starts in (normal, all floors, no panorama) with every load accepted.
    pub fn new(config: TourConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolver = HotspotTargetResolver::from_config(&config)?;
        let floors = FloorModels::new(config.floors.iter().map(|entry| (entry.floor, entry.position)));
        Ok(Self {
            config,
            resolver,
            loader: Box::new(AcceptAll),
            state: ViewState::Exploring {
                mode: ViewMode::Normal,
                floor: FloorView::All,
            },
            camera: CameraProfile::normal(FloorView::All),
            views: ViewConfigStack::new(),
            transitions: CameraTransitionEngine::new(),
            pulse: PulseEffect::new(),
            label_reveal: OneShot::new("label-reveal"),
            rotate_resume: OneShot::new("auto-rotate-resume"),
            auto_rotating: false,
            floors,
            registry: Registry::new(),
            labels: LabelProjectionSynchronizer::default(),
            directives: DirectiveQueue::default(),
            now: Duration::ZERO,
        })
    }

    pub fn with_loader(mut self, loader: impl PanoramaLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn mode(&self) -> ViewMode {
        match &self.state {
            ViewState::Exploring { mode, .. } | ViewState::Panorama { mode, .. } => *mode,
        }
    }

    pub fn floor_view(&self) -> FloorView {
        match &self.state {
            ViewState::Exploring { floor, .. } | ViewState::Panorama { floor, .. } => *floor,
        }
    }

    pub fn panorama(&self) -> Option<&PanoramaSession> {
        match &self.state {
            ViewState::Panorama { session, .. } => Some(session),
            ViewState::Exploring { .. } => None,
        }
    }

    pub fn is_panorama_active(&self) -> bool {
        matches!(self.state, ViewState::Panorama { .. })
    }

    pub fn camera(&self) -> &CameraProfile {
        &self.camera
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.views.peek()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn floors(&self) -> &FloorModels {
        &self.floors
    }

    pub fn is_transition_active(&self) -> bool {
        self.transitions.is_active()
    }

    pub fn is_auto_rotating(&self) -> bool {
        self.auto_rotating
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn viewport(&self) -> Viewport {
        self.labels.viewport()
    }

    pub fn drain_directives(&mut self) -> Vec<Directive> {
        self.directives.drain()
    }

    /// Routes an input-collaborator command. Returns false when a guard
    /// rejected it.
    pub fn apply(&mut self, command: InputCommand) -> bool {
        match command {
            InputCommand::Home => {
                self.go_home();
                true
            }
            InputCommand::ToggleDollhouse => self.toggle_dollhouse(),
            InputCommand::ToggleFloorPlan => self.toggle_floor_plan(),
            InputCommand::FloorSelect(view) => self.set_floor_view(view),
            InputCommand::Escape => {
                if self.is_panorama_active() {
                    self.exit_panorama()
                } else {
                    self.go_home();
                    true
                }
            }
        }
    }

    pub fn set_floor_view(&mut self, view: FloorView) -> bool {
        let ViewState::Exploring { mode, .. } = self.state else {
            log::debug!("floor selection {} ignored during panorama", view.label());
            return false;
        };
        log::info!("floor view -> {}", view.label());
        self.state = ViewState::Exploring { mode, floor: view };
        self.apply_floor_visibility();
        self.jump(profile_for(mode, view));
        true
    }

    pub fn toggle_dollhouse(&mut self) -> bool {
        self.toggle_mode(ViewMode::Dollhouse)
    }

    pub fn toggle_floor_plan(&mut self) -> bool {
        self.toggle_mode(ViewMode::FloorPlan)
    }

    fn toggle_mode(&mut self, target: ViewMode) -> bool {
        let ViewState::Exploring { mode, floor } = self.state else {
            log::debug!("{target:?} toggle ignored during panorama");
            return false;
        };
        let next = if mode == target { ViewMode::Normal } else { target };
        log::info!("view mode {mode:?} -> {next:?}");
        self.state = ViewState::Exploring { mode: next, floor };
        self.floors.reset_rotation();
        self.jump(profile_for(next, floor));
        self.apply_floor_visibility();
        true
    }

    /// Loads `image` and enters (or moves within) a panorama session. On
    /// failure the session is left as it was and labels come back.
    pub fn open_panorama(&mut self, image: &str) -> Result<(), LoadFailure> {
        let was_active = self.is_panorama_active();
        self.label_reveal.cancel();
        self.hide_labels();

        self.directives.push(Directive::ShowLoading);
        let loaded = self.loader.load(image);
        self.directives.push(Directive::HideLoading);
        if let Err(failure) = loaded {
            log::warn!("{failure}");
            self.directives.push(Directive::Notify {
                message: format!("Failed to load panorama: {image}."),
            });
            if !was_active {
                self.reveal_labels(self.floor_view());
            }
            return Err(failure);
        }

        self.transitions.cancel();
        let (mode, floor) = (self.mode(), self.floor_view());
        if !was_active {
            self.directives.push(Directive::HideRoomElements);
            for entry in &self.config.floors {
                self.directives.push(Directive::SetFloorVisible {
                    floor: entry.floor,
                    model_visible: false,
                    wireframe_visible: false,
                });
            }
            self.views.save(&self.camera);
        }

        self.camera = CameraProfile::panorama();
        self.directives.push(Directive::SetCameraProfile {
            profile: self.camera,
        });
        self.auto_rotating = true;
        self.rotate_resume.cancel();
        self.directives.push(Directive::SetAutoRotate { enabled: true });
        self.directives.push(Directive::ShowHint);

        let room = room_id_for_image(image);
        let markers = self
            .registry
            .replace_markers(self.config.markers_for_room(&room));
        log::info!("panorama {room} open with {} markers", markers.len());
        self.directives.push(Directive::PanoramaOpened {
            image: image.to_string(),
            room: room.clone(),
            markers,
        });
        self.state = ViewState::Panorama {
            mode,
            floor,
            session: PanoramaSession {
                image: image.to_string(),
                room,
            },
        };
        Ok(())
    }

    /// Returns false when no panorama was open.
    pub fn exit_panorama(&mut self) -> bool {
        let (mode, floor) = match &self.state {
            ViewState::Panorama {
                mode,
                floor,
                session,
            } => {
                log::info!("leaving panorama {}", session.room);
                (*mode, *floor)
            }
            ViewState::Exploring { .. } => {
                log::debug!("exit requested with no panorama open");
                return false;
            }
        };
        self.state = ViewState::Exploring { mode, floor };

        self.registry.clear_markers();
        self.directives.push(Directive::PanoramaClosed);
        self.directives.push(Directive::ShowRoomElements);
        if self.views.restore(&mut self.camera) {
            self.directives.push(Directive::SetCameraProfile {
                profile: self.camera,
            });
        } else {
            log::warn!("panorama closed without a saved view");
        }

        self.auto_rotating = false;
        self.rotate_resume.cancel();
        self.directives.push(Directive::SetAutoRotate { enabled: false });
        self.directives.push(Directive::HideHint);
        self.directives.push(Directive::HideTooltip);
        self.directives.push(Directive::SetCursor {
            style: CursorStyle::Grab,
        });
        self.apply_floor_visibility();
        true
    }

    /// Back to the normal overview. The floor selection is kept.
    pub fn go_home(&mut self) {
        if self.is_panorama_active() {
            self.exit_panorama();
        }
        let floor = self.floor_view();
        log::info!("home");
        self.state = ViewState::Exploring {
            mode: ViewMode::Normal,
            floor,
        };
        self.floors.reset_rotation();
        self.jump(CameraProfile::home());
        self.apply_floor_visibility();
    }

    /// Stores a floor's node list. Hotspots are regenerated once every
    /// configured floor has reported. Returns the accepted node count.
    pub fn floor_loaded(&mut self, floor: Floor, nodes: Vec<FloorNode>) -> usize {
        let accepted = self.floors.insert(floor, nodes);
        log::info!("{} loaded with {accepted} hotspot nodes", floor.key());
        if !self.floors.all_loaded() {
            log::debug!("hotspot generation deferred until every floor is loaded");
            return accepted;
        }
        self.rebuild_hotspots();
        if !self.is_panorama_active() {
            self.apply_floor_visibility();
        }
        accepted
    }

    fn rebuild_hotspots(&mut self) {
        self.registry.clear_hotspots();
        let mut count = 0;
        for model in self.floors.loaded() {
            for (ordinal, node) in model.nodes.iter().enumerate() {
                let (image, via) = self.resolver.resolve_with_reason(&node.name, ordinal);
                log::debug!(
                    "hotspot {} ({} #{ordinal}) -> {image} via {}",
                    node.name,
                    model.floor.key(),
                    via.label()
                );
                self.registry.insert_hotspot(NewHotspot {
                    node_name: node.name.clone(),
                    floor: model.floor,
                    ordinal,
                    target_image: image.to_string(),
                    node_transform: node.world_transform,
                });
                count += 1;
            }
        }
        log::info!("generated {count} hotspots");
        self.directives.push(Directive::HotspotsRebuilt { count });
    }

    /// Pointer-ray hit result for a click.
    pub fn pointer_clicked(&mut self, hit: Option<EntityId>) -> Result<(), LoadFailure> {
        match hit {
            Some(id) => self.marker_clicked(id),
            None => Ok(()),
        }
    }

    /// A pickable entity was clicked. Hotspots fly the camera in and open
    /// their panorama; panorama markers open theirs directly.
    pub fn marker_clicked(&mut self, id: EntityId) -> Result<(), LoadFailure> {
        let active = self.is_panorama_active();
        let target = match self.registry.pick(id) {
            Some(Pick::Hotspot(hotspot)) if !active => ClickTarget::Hotspot {
                id,
                scale: hotspot.scale,
                focus: self.hotspot_transform(hotspot.floor, hotspot.marker_transform())
                    .transform_point3(Vec3::ZERO),
                image: hotspot.target_image.clone(),
            },
            Some(Pick::Marker(entity)) if active => ClickTarget::Marker {
                image: entity.marker.target_image.clone(),
            },
            _ => {
                log::debug!("click on entity {} ignored", id.index());
                return Ok(());
            }
        };

        match target {
            ClickTarget::Hotspot {
                id,
                scale,
                focus,
                image,
            } => {
                for change in self.pulse.trigger(id, scale, self.now) {
                    self.apply_scale(change);
                }
                let superseded = self.transitions.begin(
                    self.camera.position,
                    self.camera.target,
                    focus,
                    self.now,
                    image,
                );
                if superseded {
                    log::debug!("camera transition superseded");
                }
                Ok(())
            }
            ClickTarget::Marker { image } => self.open_panorama(&image),
        }
    }

    /// Hover feedback inside a panorama, in viewport pixels.
    pub fn pointer_moved(&mut self, hit: Option<EntityId>, x: f32, y: f32) {
        if !self.is_panorama_active() {
            return;
        }
        match hit.and_then(|id| self.registry.marker(id)) {
            Some(entity) => {
                let text = format!("{}: {}", entity.marker.name, entity.marker.description);
                self.directives.push(Directive::ShowTooltip {
                    text,
                    x: x + TOOLTIP_OFFSET_X,
                    y: y + TOOLTIP_OFFSET_Y,
                });
                self.directives.push(Directive::SetCursor {
                    style: CursorStyle::Pointer,
                });
            }
            None => {
                self.directives.push(Directive::HideTooltip);
                self.directives.push(Directive::SetCursor {
                    style: CursorStyle::Grab,
                });
            }
        }
    }

    /// Field-of-view zoom inside a panorama; orbit zoom is the renderer's.
    pub fn wheel(&mut self, delta_y: f32) {
        if !self.is_panorama_active() {
            return;
        }
        self.camera.wheel_zoom(delta_y);
        self.directives.push(Directive::SetFieldOfView {
            fov: self.camera.fov,
        });
    }

    pub fn interaction_started(&mut self) {
        if !self.is_panorama_active() {
            return;
        }
        self.rotate_resume.cancel();
        if self.auto_rotating {
            self.auto_rotating = false;
            self.directives.push(Directive::SetAutoRotate { enabled: false });
        }
    }

    pub fn interaction_ended(&mut self) {
        if !self.is_panorama_active() {
            return;
        }
        self.rotate_resume
            .arm(self.now + AUTO_ROTATE_RESUME_DELAY, ());
    }

    pub fn resize(&mut self, viewport: Viewport) {
        log::debug!("viewport {}x{}", viewport.width, viewport.height);
        self.labels.resize(viewport);
    }

    /// World position of a hotspot marker, following the floor's spin.
    pub fn hotspot_world_position(&self, id: EntityId) -> Option<Vec3> {
        let hotspot = self.registry.hotspot(id)?;
        Some(
            self.hotspot_transform(hotspot.floor, hotspot.marker_transform())
                .transform_point3(Vec3::ZERO),
        )
    }

    /// Advances the clock to `now`, fires due timers, steps the camera
    /// flight and the idle spin, then projects labels for this frame.
    pub fn tick(&mut self, now: Duration) -> FrameReport {
        self.now = now;

        if let Some(change) = self.pulse.poll(now) {
            self.apply_scale(change);
        }

        if let Some(view) = self.label_reveal.poll(now) {
            if self.is_panorama_active() {
                log::debug!("label reveal dropped inside panorama");
            } else {
                self.reveal_labels(view);
            }
        }

        if self.rotate_resume.poll(now).is_some() && self.is_panorama_active() && !self.auto_rotating {
            self.auto_rotating = true;
            self.directives.push(Directive::SetAutoRotate { enabled: true });
        }

        match self.transitions.advance(now) {
            Advance::Idle => {}
            Advance::Moved(step) => {
                log::trace!("camera flight {:.3}", step.progress);
                self.camera.position = step.position;
                self.camera.target = step.target;
                self.directives.push(Directive::MoveCamera {
                    position: step.position,
                    target: step.target,
                });
            }
            Advance::Completed(image) => {
                if self.open_panorama(&image).is_err() {
                    log::debug!("camera flight ended without a panorama");
                }
            }
        }

        if let ViewState::Exploring {
            mode: ViewMode::Normal,
            floor,
        } = self.state
        {
            for model in self.floors.loaded_mut() {
                if floor.includes(model.floor) {
                    model.yaw = (model.yaw + IDLE_SPIN_PER_FRAME) % TAU;
                }
            }
        }

        self.frame_report()
    }

    fn frame_report(&self) -> FrameReport {
        let now_ms = u64::try_from(self.now.as_millis()).unwrap_or(u64::MAX);
        let (labels, markers) = if self.is_panorama_active() {
            let icon_scale = 1.4 + (now_ms as f32 * 0.015).sin() * 0.1;
            let markers = self
                .registry
                .markers()
                .map(|entity| MarkerPose {
                    id: entity.id,
                    name: entity.marker.name.clone(),
                    position: entity.position,
                    icon_scale,
                })
                .collect();
            (Vec::new(), markers)
        } else {
            let anchors = self.registry.labels().filter_map(|label| {
                let hotspot = self.registry.hotspot(label.owner)?;
                let owner = self.hotspot_transform(hotspot.floor, hotspot.marker_transform());
                Some(LabelAnchor::from_transform(
                    label.id,
                    label.visible,
                    owner,
                    label.offset,
                ))
            });
            (self.labels.synchronize(&self.camera, anchors), Vec::new())
        };

        FrameReport {
            now_ms,
            mode: self.mode(),
            floor_view: self.floor_view(),
            panorama: self.panorama().cloned(),
            camera_position: self.camera.position,
            camera_target: self.camera.target,
            fov: self.camera.fov,
            labels,
            markers,
            floors: self
                .floors
                .loaded()
                .map(|model| FloorPose {
                    floor: model.floor,
                    yaw: model.yaw,
                })
                .collect(),
        }
    }

    fn hotspot_transform(&self, floor: Floor, local: Mat4) -> Mat4 {
        self.floors.root_transform(floor) * local
    }

    fn jump(&mut self, profile: CameraProfile) {
        if self.transitions.cancel() {
            log::debug!("camera transition cancelled by jump");
        }
        self.camera = profile;
        self.directives.push(Directive::SetCameraProfile { profile });
    }

    /// Pushes floor visibility for the current (mode, selection), hides all
    /// labels and schedules the filtered reveal.
    fn apply_floor_visibility(&mut self) {
        let floor_plan = self.mode() == ViewMode::FloorPlan;
        let view = self.floor_view();
        for entry in &self.config.floors {
            let visibility = floor_visibility(view, entry.floor, floor_plan);
            self.directives.push(Directive::SetFloorVisible {
                floor: entry.floor,
                model_visible: visibility.model_visible,
                wireframe_visible: visibility.wireframe_visible,
            });
        }
        self.hide_labels();
        self.label_reveal.arm(self.now + LABEL_REVEAL_DELAY, view);
    }

    fn hide_labels(&mut self) {
        for label in self.registry.labels_mut() {
            if label.visible {
                label.visible = false;
                self.directives.push(Directive::SetLabelVisible {
                    label: label.id,
                    visible: false,
                });
            }
        }
    }

    fn reveal_labels(&mut self, view: FloorView) {
        for label in self.registry.labels_mut() {
            let visible = view.includes(label.floor);
            if label.visible != visible {
                label.visible = visible;
                self.directives.push(Directive::SetLabelVisible {
                    label: label.id,
                    visible,
                });
            }
        }
    }

    fn apply_scale(&mut self, change: ScaleChange<EntityId>) {
        let Some(hotspot) = self.registry.hotspot_mut(change.entity) else {
            return;
        };
        hotspot.scale = change.scale;
        self.directives.push(Directive::SetMarkerScale {
            entity: change.entity,
            scale: change.scale,
        });
    }
}

fn profile_for(mode: ViewMode, view: FloorView) -> CameraProfile {
    match mode {
        ViewMode::Normal => CameraProfile::normal(view),
        ViewMode::Dollhouse => CameraProfile::dollhouse(),
        ViewMode::FloorPlan => CameraProfile::floor_plan(view),
    }
}
