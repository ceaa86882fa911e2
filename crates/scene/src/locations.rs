//! Named map locations the viewer can switch between.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::coords::GeoCoord;
use crate::error::SceneError;

/// Environment variable naming a JSON file with a replacement preset list.
pub const LOCATIONS_ENV: &str = "OSM3D_LOCATIONS";
/// Environment variable naming the directory dataset paths are relative to.
pub const DATA_DIR_ENV: &str = "OSM3D_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "assets";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPreset {
    pub key: String,
    pub name: String,
    /// `[lon, lat]`.
    pub center: [f64; 2],
    /// GeoJSON dataset, relative to the data directory.
    pub dataset: PathBuf,
    /// Elevation raster, if the location has one.
    #[serde(default)]
    pub terrain: Option<PathBuf>,
}

impl LocationPreset {
    pub fn center(&self) -> GeoCoord {
        GeoCoord::new(self.center[0], self.center[1])
    }

    pub fn has_terrain(&self) -> bool {
        self.terrain.is_some()
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Locations {
    pub presets: Vec<LocationPreset>,
    pub data_dir: PathBuf,
}

impl Default for Locations {
    fn default() -> Self {
        Self {
            presets: vec![
                LocationPreset {
                    key: "la".into(),
                    name: "Los Angeles".into(),
                    center: [-118.326019, 34.102646],
                    dataset: "data/vinest.geojson".into(),
                    terrain: Some("data/terrain.tif".into()),
                },
                LocationPreset {
                    key: "paris".into(),
                    name: "Paris".into(),
                    center: [2.29541, 48.85726],
                    dataset: "data/eiffelave.geojson".into(),
                    terrain: None,
                },
            ],
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl Locations {
    /// Built-in presets, overridden by the environment when set. A broken
    /// override file falls back to the built-ins.
    pub fn from_env() -> Self {
        let mut locations = Self::default();
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            locations.data_dir = PathBuf::from(dir);
        }
        if let Ok(file) = std::env::var(LOCATIONS_ENV) {
            match Self::read_presets(Path::new(&file)) {
                Ok(presets) if !presets.is_empty() => {
                    info!("Loaded {} locations from {}", presets.len(), file);
                    locations.presets = presets;
                }
                Ok(_) => warn!("{} lists no locations, using built-ins", file),
                Err(e) => warn!("Ignoring {}: {}", file, e),
            }
        }
        locations
    }

    pub fn read_presets(path: &Path) -> Result<Vec<LocationPreset>, SceneError> {
        let text = std::fs::read_to_string(path).map_err(|e| SceneError::Io(path.to_path_buf(), e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn get(&self, key: &str) -> Result<&LocationPreset, SceneError> {
        self.presets
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| SceneError::UnknownLocation(key.to_string()))
    }

    pub fn first(&self) -> Option<&LocationPreset> {
        self.presets.first()
    }

    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.data_dir.join(relative)
    }
}
