//! Navigation view-state coordination for a multi-floor building tour with
//! 360° room panoramas: view modes, floor filtering, panorama sessions,
//! hotspot target resolution, eased camera flights and label projection.
//! Rendering, asset loading and ray picking stay with the caller.

pub mod camera;
pub mod config;
pub mod directives;
pub mod error;
pub mod floors;
pub mod input;
pub mod labels;
pub mod machine;
pub mod registry;
pub mod resolver;
pub mod timers;
pub mod transition;
pub mod view_config;

pub use camera::{CameraProfile, ControlLimits, Projection, Viewport};
pub use config::{MappingRule, PanoramaMarker, TourConfig, room_id_for_image};
pub use directives::{CursorStyle, Directive};
pub use error::{ConfigError, LoadFailure, ManifestError};
pub use floors::{Floor, FloorManifest, FloorNode, FloorView};
pub use input::InputCommand;
pub use labels::{LabelPlacement, LabelProjectionSynchronizer};
pub use machine::{FrameReport, PanoramaLoader, PanoramaSession, ViewMode, ViewStateMachine};
pub use registry::{EntityId, LabelId};
pub use resolver::{HotspotTargetResolver, Resolution};
pub use view_config::{Snapshot, ViewConfigStack};
