//! Externally authored tour data: panorama markers, node-to-panorama mapping
//! rules, the panorama catalogue, room adjacency and floor placement.

use std::{collections::BTreeMap, fs, path::Path};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::floors::Floor;

const BUILTIN_CONFIG: &str = include_str!("../assets/tour_config.json");

/// A clickable marker placed on the panorama sphere of `source_room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanoramaMarker {
    /// Azimuth in radians.
    pub theta: f32,
    /// Polar angle from +Y in radians.
    pub phi: f32,
    pub radius: f32,
    #[serde(default)]
    pub color: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "fromRoom")]
    pub source_room: String,
    #[serde(alias = "panoramaImage")]
    pub target_image: String,
}

impl PanoramaMarker {
    pub fn position(&self) -> Vec3 {
        spherical_to_cartesian(self.theta, self.phi, self.radius)
    }
}

pub fn spherical_to_cartesian(theta: f32, phi: f32, radius: f32) -> Vec3 {
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    #[serde(default, alias = "nodeNamePatterns")]
    pub name_patterns: Vec<String>,
    #[serde(default)]
    pub fallback_index: Option<usize>,
    #[serde(alias = "panoramaImage")]
    pub target_image: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorConfig {
    pub floor: Floor,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub position: Vec3,
}

fn default_floors() -> Vec<FloorConfig> {
    Floor::ALL
        .iter()
        .map(|floor| FloorConfig {
            floor: *floor,
            model_path: None,
            position: floor.default_offset(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourConfig {
    #[serde(default, alias = "hotspotData")]
    pub hotspots: Vec<PanoramaMarker>,
    #[serde(default, alias = "modelToPanoramaMapping")]
    pub mapping_rules: Vec<MappingRule>,
    pub available_panoramas: Vec<String>,
    #[serde(default)]
    pub room_connections: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_floors")]
    pub floors: Vec<FloorConfig>,
}

impl TourConfig {
    /// The two-floor tour shipped with the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_CONFIG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: TourConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.available_panoramas.is_empty() {
            return Err(ConfigError::NoPanoramas);
        }
        for (idx, entry) in self.floors.iter().enumerate() {
            if self.floors[..idx].iter().any(|prior| prior.floor == entry.floor) {
                return Err(ConfigError::DuplicateFloor(entry.floor.key()));
            }
        }
        Ok(())
    }

    pub fn floor_offset(&self, floor: Floor) -> Vec3 {
        self.floors
            .iter()
            .find(|entry| entry.floor == floor)
            .map(|entry| entry.position)
            .unwrap_or_else(|| floor.default_offset())
    }

    pub fn markers_for_room<'a>(
        &'a self,
        room: &'a str,
    ) -> impl Iterator<Item = &'a PanoramaMarker> + 'a {
        self.hotspots
            .iter()
            .filter(move |marker| marker.source_room == room)
    }

    pub fn neighbours(&self, room: &str) -> &[String] {
        self.room_connections
            .get(room)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Room identity of a panorama: the image's file stem.
pub fn room_id_for_image(image: &str) -> String {
    Path::new(image)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_loads() {
        let config = TourConfig::builtin().expect("built-in config");
        assert_eq!(config.available_panoramas.len(), 10);
        assert_eq!(config.mapping_rules.len(), 10);
        assert_eq!(config.hotspots.len(), 3);
        assert_eq!(config.floor_offset(Floor::Floor2), Vec3::new(0.0, 2.2, 0.0));
        assert_eq!(
            config.neighbours("Living Room"),
            ["Breakfast Nook".to_string(), "Hallway".to_string()]
        );
        assert!(config.neighbours("Attic").is_empty());
    }

    #[test]
    fn original_field_names_are_accepted() {
        let json = r#"{
            "hotspotData": [{"theta": 0.0, "phi": 1.57, "radius": 480, "name": "Hallway",
                             "panoramaImage": "pano/Hallway.jpg", "fromRoom": "Kitchen"}],
            "modelToPanoramaMapping": [{"nodeNamePatterns": ["kitchen"], "fallbackIndex": 0,
                                        "panoramaImage": "pano/Kitchen.jpg"}],
            "availablePanoramas": ["pano/Kitchen.jpg"]
        }"#;
        let config = TourConfig::from_json_str(json).expect("parse");
        assert_eq!(config.hotspots[0].source_room, "Kitchen");
        assert_eq!(config.hotspots[0].target_image, "pano/Hallway.jpg");
        assert_eq!(config.mapping_rules[0].name_patterns, vec!["kitchen"]);
        assert_eq!(config.floors.len(), 2);
    }

    #[test]
    fn empty_catalogue_is_rejected() {
        let err = TourConfig::from_json_str(r#"{"availablePanoramas": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoPanoramas));
    }

    #[test]
    fn duplicate_floor_is_rejected() {
        let json = r#"{"availablePanoramas": ["a.jpg"],
                       "floors": [{"floor": "floor1"}, {"floor": "floor1"}]}"#;
        let err = TourConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFloor("floor1")));
    }

    #[test]
    fn config_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tour.json");
        fs::write(&path, r#"{"availablePanoramas": ["Kitchen.jpg"]}"#).expect("write");
        let config = TourConfig::from_path(&path).expect("load");
        assert_eq!(config.available_panoramas, vec!["Kitchen.jpg"]);

        let missing = TourConfig::from_path(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn marker_position_follows_spherical_convention() {
        let overhead = spherical_to_cartesian(0.0, 0.0, 10.0);
        assert!((overhead - Vec3::new(0.0, 10.0, 0.0)).length() < 1e-4);

        let east = spherical_to_cartesian(0.0, std::f32::consts::FRAC_PI_2, 10.0);
        assert!((east - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);

        let south = spherical_to_cartesian(std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2, 2.0);
        assert!((south - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn room_id_is_image_stem() {
        assert_eq!(room_id_for_image("TaskID_0001/Living Room.jpg"), "Living Room");
        assert_eq!(room_id_for_image("Closet"), "Closet");
    }

    #[test]
    fn markers_filter_by_source_room() {
        let config = TourConfig::builtin().expect("built-in config");
        let names: Vec<&str> = config
            .markers_for_room("Living Room")
            .map(|marker| marker.name.as_str())
            .collect();
        assert_eq!(names, vec!["Breakfast Nook", "Hallway"]);
    }
}
