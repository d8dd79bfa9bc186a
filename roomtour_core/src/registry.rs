//! Owned registry of every pickable entity and overlay label, keyed by stable
//! ids. The hit-test collaborator reports ids from this registry directly.

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use serde::Serialize;

use crate::config::PanoramaMarker;
use crate::floors::Floor;

/// Offset of a hotspot marker from the node it is attached to.
pub const HOTSPOT_MARKER_OFFSET: Vec3 = Vec3::new(0.0, 0.0, 0.28);
/// Offset of a hotspot's label from its marker.
pub const HOTSPOT_LABEL_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(u32);

impl EntityId {
    pub fn index(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LabelId(u32);

/// A node on a floor model that opens a panorama when clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: EntityId,
    pub node_name: String,
    pub display_name: String,
    pub floor: Floor,
    pub ordinal: usize,
    pub target_image: String,
    /// Node world transform with the floor unspun.
    pub node_transform: Mat4,
    pub scale: f32,
}

impl Hotspot {
    pub fn marker_transform(&self) -> Mat4 {
        self.node_transform * Mat4::from_translation(HOTSPOT_MARKER_OFFSET)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelEntry {
    pub id: LabelId,
    pub owner: EntityId,
    pub offset: Vec3,
    pub visible: bool,
    pub floor: Floor,
    pub text: String,
}

/// A marker on the active panorama sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntity {
    pub id: EntityId,
    pub marker: PanoramaMarker,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy)]
pub enum Pick<'a> {
    Hotspot(&'a Hotspot),
    Marker(&'a MarkerEntity),
}

#[derive(Debug, Clone)]
pub struct NewHotspot {
    pub node_name: String,
    pub floor: Floor,
    pub ordinal: usize,
    pub target_image: String,
    pub node_transform: Mat4,
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    next_id: u32,
    hotspots: BTreeMap<EntityId, Hotspot>,
    labels: BTreeMap<LabelId, LabelEntry>,
    markers: BTreeMap<EntityId, MarkerEntity>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Drops every hotspot together with the labels they own.
    pub fn clear_hotspots(&mut self) {
        self.hotspots.clear();
        self.labels.clear();
    }

    /// Adds a hotspot and its hidden label.
    pub fn insert_hotspot(&mut self, new: NewHotspot) -> EntityId {
        let id = EntityId(self.allocate());
        let label_id = LabelId(self.allocate());
        let display_name = new.node_name.replace('_', " ");
        self.labels.insert(
            label_id,
            LabelEntry {
                id: label_id,
                owner: id,
                offset: HOTSPOT_LABEL_OFFSET,
                visible: false,
                floor: new.floor,
                text: display_name.clone(),
            },
        );
        self.hotspots.insert(
            id,
            Hotspot {
                id,
                node_name: new.node_name,
                display_name,
                floor: new.floor,
                ordinal: new.ordinal,
                target_image: new.target_image,
                node_transform: new.node_transform,
                scale: 1.0,
            },
        );
        id
    }

    /// Swaps the panorama markers for a new set, returning their ids.
    pub fn replace_markers<'a, I>(&mut self, markers: I) -> Vec<EntityId>
    where
        I: IntoIterator<Item = &'a PanoramaMarker>,
    {
        self.markers.clear();
        let mut ids = Vec::new();
        for marker in markers {
            let id = EntityId(self.allocate());
            self.markers.insert(
                id,
                MarkerEntity {
                    id,
                    position: marker.position(),
                    marker: marker.clone(),
                },
            );
            ids.push(id);
        }
        ids
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    pub fn pick(&self, id: EntityId) -> Option<Pick<'_>> {
        if let Some(hotspot) = self.hotspots.get(&id) {
            return Some(Pick::Hotspot(hotspot));
        }
        self.markers.get(&id).map(Pick::Marker)
    }

    pub fn hotspot(&self, id: EntityId) -> Option<&Hotspot> {
        self.hotspots.get(&id)
    }

    pub fn hotspot_mut(&mut self, id: EntityId) -> Option<&mut Hotspot> {
        self.hotspots.get_mut(&id)
    }

    pub fn hotspots(&self) -> impl Iterator<Item = &Hotspot> {
        self.hotspots.values()
    }

    /// First hotspot whose node name contains `needle`, ignoring case.
    pub fn find_hotspot(&self, needle: &str) -> Option<&Hotspot> {
        let needle = needle.to_lowercase();
        self.hotspots
            .values()
            .find(|hotspot| hotspot.node_name.to_lowercase().contains(&needle))
    }

    pub fn marker(&self, id: EntityId) -> Option<&MarkerEntity> {
        self.markers.get(&id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerEntity> {
        self.markers.values()
    }

    pub fn find_marker(&self, name: &str) -> Option<&MarkerEntity> {
        self.markers
            .values()
            .find(|entity| entity.marker.name.eq_ignore_ascii_case(name))
    }

    pub fn labels(&self) -> impl Iterator<Item = &LabelEntry> {
        self.labels.values()
    }

    pub fn labels_mut(&mut self) -> impl Iterator<Item = &mut LabelEntry> {
        self.labels.values_mut()
    }

    pub fn label(&self, id: LabelId) -> Option<&LabelEntry> {
        self.labels.get(&id)
    }

    pub fn hotspot_count(&self) -> usize {
        self.hotspots.len()
    }
}
