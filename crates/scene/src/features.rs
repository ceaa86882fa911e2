//! Source features and their classification.
//!
//! The dataset is a GeoJSON feature collection. Each feature is decoded into a
//! [`GeoFeature`] and classified exactly once into a closed [`FeatureKind`];
//! everything downstream matches on the kind instead of re-reading tags.

use std::path::Path;

use geojson::{GeoJson, Value};
use serde_json::{Map, Value as JsonValue};

use crate::config::EXCLUDED_HIGHWAYS;
use crate::coords::GeoCoord;
use crate::error::SceneError;

pub type Properties = Map<String, JsonValue>;

// ---------------------------------------------------------------------------
// GeoFeature
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(GeoCoord),
    LineString(Vec<GeoCoord>),
    Polygon(Vec<Vec<GeoCoord>>),
    MultiPolygon(Vec<Vec<Vec<GeoCoord>>>),
    /// Geometry types the viewer does not draw, or a missing geometry.
    Other,
}

/// One entry of the source dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub geometry: FeatureGeometry,
    pub properties: Option<Properties>,
}

impl GeoFeature {
    pub fn new(geometry: FeatureGeometry, properties: Option<Properties>) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    fn tag(&self, key: &str) -> Option<&JsonValue> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    fn tag_str(&self, key: &str) -> Option<&str> {
        self.tag(key).and_then(JsonValue::as_str)
    }

    /// Decides what this feature becomes. Priority: building, road, water, tree.
    pub fn classify(&self) -> FeatureKind {
        if self.properties.is_none() {
            return FeatureKind::Unknown;
        }

        if self.tag("building").is_some_and(is_truthy) {
            return match self.geometry {
                FeatureGeometry::Polygon(_) | FeatureGeometry::MultiPolygon(_) => {
                    FeatureKind::Building {
                        levels: self.numeric_tag("building:levels").filter(|l| *l != 0.0).unwrap_or(1.0),
                    }
                }
                _ => FeatureKind::Unknown,
            };
        }

        if let Some(highway) = self.tag("highway").filter(|v| is_truthy(v)) {
            let excluded = highway
                .as_str()
                .is_some_and(|h| EXCLUDED_HIGHWAYS.contains(&h));
            return match self.geometry {
                FeatureGeometry::LineString(_) if !excluded => FeatureKind::Road,
                _ => FeatureKind::Unknown,
            };
        }

        match (self.tag_str("natural"), &self.geometry) {
            (Some("water"), FeatureGeometry::Polygon(_)) => FeatureKind::Water,
            (Some("tree"), FeatureGeometry::Point(_)) => FeatureKind::Tree {
                height: self.numeric_tag("height").unwrap_or(0.0),
            },
            _ => FeatureKind::Unknown,
        }
    }

    /// A tag read as a number. OSM exports often store numbers as strings.
    pub fn numeric_tag(&self, key: &str) -> Option<f32> {
        let value = match self.tag(key)? {
            JsonValue::Number(n) => n.as_f64().map(|v| v as f32),
            JsonValue::String(s) => s.trim().parse::<f32>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }

    pub fn name(&self) -> Option<&str> {
        self.tag_str("name").filter(|n| !n.is_empty())
    }
}

/// JavaScript-like truthiness for tag values.
fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// What a feature turns into, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureKind {
    Building { levels: f32 },
    Road,
    Water,
    Tree { height: f32 },
    Unknown,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Reads and decodes a dataset file.
pub fn read_dataset(path: &Path) -> Result<Vec<GeoFeature>, SceneError> {
    let text = std::fs::read_to_string(path).map_err(|e| SceneError::Io(path.to_path_buf(), e))?;
    parse_dataset(&text, path)
}

/// Decodes a GeoJSON document. A lone feature or geometry is accepted as a
/// one-element collection.
pub fn parse_dataset(text: &str, path: &Path) -> Result<Vec<GeoFeature>, SceneError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| SceneError::GeoJson(path.to_path_buf(), e.to_string()))?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    Ok(features
        .into_iter()
        .map(|f| {
            let geometry = f
                .geometry
                .as_ref()
                .map(|g| convert_geometry(&g.value))
                .unwrap_or(FeatureGeometry::Other);
            GeoFeature::new(geometry, f.properties)
        })
        .collect())
}

fn ring(positions: &[Vec<f64>]) -> Vec<GeoCoord> {
    positions
        .iter()
        .filter_map(|p| GeoCoord::from_position(p))
        .collect()
}

fn convert_geometry(value: &Value) -> FeatureGeometry {
    match value {
        Value::Point(p) => GeoCoord::from_position(p)
            .map(FeatureGeometry::Point)
            .unwrap_or(FeatureGeometry::Other),
        Value::LineString(line) => FeatureGeometry::LineString(ring(line)),
        Value::Polygon(rings) => FeatureGeometry::Polygon(rings.iter().map(|r| ring(r)).collect()),
        Value::MultiPolygon(polys) => FeatureGeometry::MultiPolygon(
            polys
                .iter()
                .map(|rings| rings.iter().map(|r| ring(r)).collect())
                .collect(),
        ),
        _ => FeatureGeometry::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(geometry: FeatureGeometry, props: JsonValue) -> GeoFeature {
        let props = props.as_object().cloned();
        GeoFeature::new(geometry, props)
    }

    fn square() -> FeatureGeometry {
        FeatureGeometry::Polygon(vec![vec![
            GeoCoord::new(0.0, 0.0),
            GeoCoord::new(0.001, 0.0),
            GeoCoord::new(0.001, 0.001),
            GeoCoord::new(0.0, 0.0),
        ]])
    }

    fn line() -> FeatureGeometry {
        FeatureGeometry::LineString(vec![GeoCoord::new(1.0, 1.0), GeoCoord::new(1.001, 1.0)])
    }

    #[test]
    fn test_building_levels_default_to_one() {
        let f = feature(square(), json!({ "building": "yes" }));
        assert_eq!(f.classify(), FeatureKind::Building { levels: 1.0 });
    }

    #[test]
    fn test_building_levels_from_string_tag() {
        let f = feature(square(), json!({ "building": "yes", "building:levels": "3" }));
        assert_eq!(f.classify(), FeatureKind::Building { levels: 3.0 });
        let f = feature(square(), json!({ "building": "yes", "building:levels": 0 }));
        assert_eq!(f.classify(), FeatureKind::Building { levels: 1.0 });
    }

    #[test]
    fn test_building_takes_priority_over_highway() {
        let f = feature(square(), json!({ "building": "yes", "highway": "primary" }));
        assert!(matches!(f.classify(), FeatureKind::Building { .. }));
    }

    #[test]
    fn test_excluded_highways_are_unknown() {
        for h in ["pedestrian", "footway", "path"] {
            let f = feature(line(), json!({ "highway": h }));
            assert_eq!(f.classify(), FeatureKind::Unknown, "{h}");
        }
        let f = feature(line(), json!({ "highway": "residential" }));
        assert_eq!(f.classify(), FeatureKind::Road);
    }

    #[test]
    fn test_highway_polygon_is_not_road() {
        let f = feature(square(), json!({ "highway": "residential" }));
        assert_eq!(f.classify(), FeatureKind::Unknown);
    }

    #[test]
    fn test_water_and_tree() {
        let water = feature(square(), json!({ "natural": "water" }));
        assert_eq!(water.classify(), FeatureKind::Water);
        let tree = feature(
            FeatureGeometry::Point(GeoCoord::new(1.0, 1.0)),
            json!({ "natural": "tree", "height": 12 }),
        );
        assert_eq!(tree.classify(), FeatureKind::Tree { height: 12.0 });
        let water_point = feature(FeatureGeometry::Point(GeoCoord::new(1.0, 1.0)), json!({ "natural": "water" }));
        assert_eq!(water_point.classify(), FeatureKind::Unknown);
    }

    #[test]
    fn test_missing_properties_is_unknown() {
        let f = GeoFeature::new(square(), None);
        assert_eq!(f.classify(), FeatureKind::Unknown);
    }

    #[test]
    fn test_parse_feature_collection() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "building": "yes", "name": "Hall" },
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] } },
                { "type": "Feature", "properties": null,
                  "geometry": { "type": "Point", "coordinates": [2, 3] } },
                { "type": "Feature", "properties": { "highway": "primary" },
                  "geometry": { "type": "MultiLineString", "coordinates": [[[0,0],[1,1]]] } }
            ]
        }"#;
        let features = parse_dataset(text, Path::new("mem.geojson")).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].name(), Some("Hall"));
        assert!(features[1].properties.is_none());
        assert_eq!(features[1].geometry, FeatureGeometry::Point(GeoCoord::new(2.0, 3.0)));
        assert_eq!(features[2].geometry, FeatureGeometry::Other);
    }

    #[test]
    fn test_parse_rejects_non_geojson() {
        let err = parse_dataset("{\"hello\": 1}", Path::new("bad.geojson")).unwrap_err();
        assert!(matches!(err, SceneError::GeoJson(_, _)));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let err = read_dataset(Path::new("/definitely/not/here.geojson")).unwrap_err();
        assert!(matches!(err, SceneError::Io(_, _)));
    }
}
