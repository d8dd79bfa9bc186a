//! Floor identities, the floor selector, and intake of the per-floor node
//! lists supplied by the model loader. Node world transforms arrive in the
//! unspun pose; the idle spin is applied on top through
//! [`FloorModel::root_transform`].

use std::{collections::BTreeMap, fs, path::Path};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Floor {
    Floor1,
    Floor2,
}

impl Floor {
    pub const ALL: [Floor; 2] = [Floor::Floor1, Floor::Floor2];

    pub fn key(self) -> &'static str {
        match self {
            Floor::Floor1 => "floor1",
            Floor::Floor2 => "floor2",
        }
    }

    /// World offset of the floor model when the config does not override it.
    pub fn default_offset(self) -> Vec3 {
        match self {
            Floor::Floor1 => Vec3::ZERO,
            Floor::Floor2 => Vec3::new(0.0, 2.2, 0.0),
        }
    }
}

/// Which floors the user asked to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorView {
    #[default]
    All,
    Floor1,
    Floor2,
}

impl FloorView {
    pub fn includes(self, floor: Floor) -> bool {
        match self {
            FloorView::All => true,
            FloorView::Floor1 => floor == Floor::Floor1,
            FloorView::Floor2 => floor == Floor::Floor2,
        }
    }

    pub fn only(self) -> Option<Floor> {
        match self {
            FloorView::All => None,
            FloorView::Floor1 => Some(Floor::Floor1),
            FloorView::Floor2 => Some(Floor::Floor2),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FloorView::All => "All Floors",
            FloorView::Floor1 => "Floor 1",
            FloorView::Floor2 => "Floor 2",
        }
    }
}

impl From<Floor> for FloorView {
    fn from(floor: Floor) -> Self {
        match floor {
            Floor::Floor1 => FloorView::Floor1,
            Floor::Floor2 => FloorView::Floor2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FloorVisibility {
    pub model_visible: bool,
    pub wireframe_visible: bool,
}

/// The model is visible when the selector includes the floor; the wireframe
/// additionally requires the floor-plan mode.
pub fn floor_visibility(view: FloorView, floor: Floor, floor_plan: bool) -> FloorVisibility {
    let model_visible = view.includes(floor);
    FloorVisibility {
        model_visible,
        wireframe_visible: floor_plan && model_visible,
    }
}

/// One traversed node as reported by the model loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorNode {
    pub name: String,
    #[serde(default)]
    pub is_mesh: bool,
    #[serde(default)]
    pub world_transform: Mat4,
}

impl FloorNode {
    pub fn new(name: impl Into<String>, world_transform: Mat4) -> Self {
        Self {
            name: name.into(),
            is_mesh: false,
            world_transform,
        }
    }
}

/// Root objects and authoring helpers never become hotspots.
pub fn is_hotspot_node(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let lower = name.to_ascii_lowercase();
    lower != "scene" && !lower.contains("empty") && !lower.contains("plane")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorNodes {
    pub floor: Floor,
    #[serde(default)]
    pub nodes: Vec<FloorNode>,
}

/// Node lists for every floor, as exported next to the building models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorManifest {
    #[serde(default)]
    pub floors: Vec<FloorNodes>,
}

impl FloorManifest {
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let data = fs::read(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn nodes(&self, floor: Floor) -> Option<&[FloorNode]> {
        self.floors
            .iter()
            .find(|entry| entry.floor == floor)
            .map(|entry| entry.nodes.as_slice())
    }
}

#[derive(Debug, Clone)]
pub struct FloorModel {
    pub floor: Floor,
    pub offset: Vec3,
    pub yaw: f32,
    /// Accepted hotspot nodes in traversal order.
    pub nodes: Vec<FloorNode>,
    pub mesh_count: usize,
}

impl FloorModel {
    /// Spin about the vertical axis through the floor's own origin.
    pub fn root_transform(&self) -> Mat4 {
        if self.yaw == 0.0 {
            return Mat4::IDENTITY;
        }
        Mat4::from_translation(self.offset)
            * Mat4::from_rotation_y(self.yaw)
            * Mat4::from_translation(-self.offset)
    }
}

/// Load state of every configured floor. Hotspot generation waits until
/// [`FloorModels::all_loaded`] holds.
#[derive(Debug, Clone)]
pub struct FloorModels {
    expected: BTreeMap<Floor, Vec3>,
    loaded: BTreeMap<Floor, FloorModel>,
}

impl FloorModels {
    pub fn new<I>(expected: I) -> Self
    where
        I: IntoIterator<Item = (Floor, Vec3)>,
    {
        Self {
            expected: expected.into_iter().collect(),
            loaded: BTreeMap::new(),
        }
    }

    /// Stores the floor's hotspot nodes, dropping helpers. Returns the number
    /// of accepted nodes.
    pub fn insert(&mut self, floor: Floor, nodes: Vec<FloorNode>) -> usize {
        let mesh_count = nodes.iter().filter(|node| node.is_mesh).count();
        let accepted: Vec<FloorNode> = nodes
            .into_iter()
            .filter(|node| is_hotspot_node(&node.name))
            .collect();
        let count = accepted.len();
        let offset = self
            .expected
            .get(&floor)
            .copied()
            .unwrap_or_else(|| floor.default_offset());
        self.expected.entry(floor).or_insert(offset);
        self.loaded.insert(
            floor,
            FloorModel {
                floor,
                offset,
                yaw: 0.0,
                nodes: accepted,
                mesh_count,
            },
        );
        count
    }

    pub fn is_loaded(&self, floor: Floor) -> bool {
        self.loaded.contains_key(&floor)
    }

    pub fn all_loaded(&self) -> bool {
        self.expected.keys().all(|floor| self.loaded.contains_key(floor))
    }

    pub fn get(&self, floor: Floor) -> Option<&FloorModel> {
        self.loaded.get(&floor)
    }

    pub fn loaded(&self) -> impl Iterator<Item = &FloorModel> {
        self.loaded.values()
    }

    pub fn loaded_mut(&mut self) -> impl Iterator<Item = &mut FloorModel> {
        self.loaded.values_mut()
    }

    pub fn root_transform(&self, floor: Floor) -> Mat4 {
        self.loaded
            .get(&floor)
            .map(FloorModel::root_transform)
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn reset_rotation(&mut self) {
        for model in self.loaded.values_mut() {
            model.yaw = 0.0;
        }
    }
}
