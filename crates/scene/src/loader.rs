//! Feature loader: turns a decoded dataset into scene geometry.

use bevy::log::{debug, info, warn};
use bevy::math::{Vec2, Vec3};
use geo::{Contains, Point, Polygon};
use rand::Rng;

use crate::config::{BUILDING_CURVE_SEGMENTS, HEIGHT_UNIT, WATER_CURVE_SEGMENTS, WATER_DEPTH};
use crate::coords::{project, GeoCoord};
use crate::features::{FeatureGeometry, FeatureKind, GeoFeature, Properties};
use crate::mesh_data::{Aabb, MeshData};
use crate::road_overlay::{RoadOverlay, RoadPolyline};
use crate::shape::{build_footprint, extrude, placement_helper, Shape2D};
use crate::terrain::{GroundSampler, Layered, NoGround, ProbeWindow, TerrainSurface};
use crate::trees::TreeInstances;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One extruded building footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingGeometry {
    pub mesh: MeshData,
    pub footprint: Shape2D,
    pub levels: f32,
    /// Extrusion height, `HEIGHT_UNIT * levels`.
    pub depth: f32,
}

/// Placement helper for a building: bounds plus the ground footprint, used by
/// probes, tree rejection and focus picking.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub name: String,
    pub properties: Properties,
    pub aabb: Aabb,
    pub footprint: Polygon<f64>,
    /// Index into the building list.
    pub building: usize,
}

impl Collider {
    pub fn covers(&self, x: f32, z: f32) -> bool {
        self.aabb.contains_xz(x, z) && self.footprint.contains(&Point::new(x as f64, z as f64))
    }

    /// Height at which an upward probe through `window` meets this collider.
    pub fn probe(&self, x: f32, z: f32, window: ProbeWindow) -> Option<f32> {
        if !self.covers(x, z) {
            return None;
        }
        [self.aabb.min.y, self.aabb.max.y].into_iter().find(|h| window.admits(*h))
    }
}

/// Colliders as a probe target.
pub struct ColliderSet<'a>(pub &'a [Collider]);

impl GroundSampler for ColliderSet<'_> {
    fn ground_height_at(&self, x: f32, z: f32) -> Option<f32> {
        self.0
            .iter()
            .filter_map(|c| c.probe(x, z, ProbeWindow::GROUND))
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Per-load counters, logged once when the load completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub features: usize,
    pub buildings: usize,
    pub roads: usize,
    pub overlays: usize,
    pub water: usize,
    pub trees: usize,
    pub rejected_trees: usize,
    pub skipped: usize,
    pub dropped_roads: usize,
    pub skipped_helpers: usize,
}

/// Everything one dataset load produces.
#[derive(Debug, Clone, Default)]
pub struct SceneData {
    pub center: GeoCoord,
    pub buildings: Vec<BuildingGeometry>,
    pub colliders: Vec<Collider>,
    pub roads: Vec<RoadPolyline>,
    pub overlays: Vec<RoadOverlay>,
    pub water: Vec<MeshData>,
    pub water_footprints: Vec<Shape2D>,
    pub trees: TreeInstances,
    pub stats: LoadStats,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Builds scene geometry for `features` around `center`.
///
/// `terrain` is `Some` only in terrain mode; buildings, roads and trees are
/// then draped onto it. Buildings are built first so roads can also rest on
/// them and trees can be rejected against them.
pub fn load(
    features: &[GeoFeature],
    center: GeoCoord,
    terrain: Option<&TerrainSurface>,
    rng: &mut impl Rng,
) -> SceneData {
    let mut data = SceneData {
        center,
        trees: TreeInstances::with_capacity(features.len()),
        ..Default::default()
    };
    data.stats.features = features.len();

    let kinds: Vec<FeatureKind> = features.iter().map(GeoFeature::classify).collect();

    let terrain_ground: &dyn GroundSampler = match terrain {
        Some(t) => t,
        None => &NoGround,
    };

    for (feature, kind) in features.iter().zip(&kinds) {
        if let FeatureKind::Building { levels } = kind {
            add_building(&mut data, feature, *levels, terrain_ground);
        }
    }

    for (index, (feature, kind)) in features.iter().zip(&kinds).enumerate() {
        match kind {
            FeatureKind::Road => {
                let colliders = ColliderSet(&data.colliders);
                let layered = Layered(vec![terrain_ground, &colliders as &dyn GroundSampler]);
                let ground: &dyn GroundSampler = if terrain.is_some() { &layered } else { &NoGround };
                let road = road_from_feature(feature, center, ground);
                match road {
                    Some(road) => data.roads.push(road),
                    None => data.stats.dropped_roads += 1,
                }
            }
            FeatureKind::Water => add_water(&mut data, feature),
            FeatureKind::Tree { height } => {
                add_tree(&mut data, feature, index, *height, terrain_ground, rng)
            }
            FeatureKind::Unknown => data.stats.skipped += 1,
            FeatureKind::Building { .. } => {}
        }
    }

    data.overlays = overlays_for(&data.roads);
    data.stats.roads = data.roads.len();
    data.stats.overlays = data.overlays.len();

    let s = &data.stats;
    info!(
        "Loaded {} features: {} buildings, {} roads ({} animated), {} water, {} trees",
        s.features, s.buildings, s.roads, s.overlays, s.water, s.trees
    );
    if s.skipped + s.dropped_roads + s.rejected_trees + s.skipped_helpers > 0 {
        warn!(
            "Dropped while loading: {} unclassified features, {} roads with missing coordinates, \
             {} blocked trees, {} buildings without placement helper",
            s.skipped, s.dropped_roads, s.rejected_trees, s.skipped_helpers
        );
    }

    data
}

/// Overlays for every road long enough to carry one.
pub fn overlays_for(roads: &[RoadPolyline]) -> Vec<RoadOverlay> {
    roads
        .iter()
        .enumerate()
        .filter_map(|(i, r)| RoadOverlay::for_road(i, r))
        .collect()
}

/// Extrudes one building and anchors it on `ground` at its centroid.
pub fn build_building(rings: &[Vec<GeoCoord>], center: GeoCoord, levels: f32, ground: &dyn GroundSampler) -> BuildingGeometry {
    let footprint = build_footprint(rings, center);
    let depth = HEIGHT_UNIT * levels;
    let mut mesh = extrude(&footprint, depth, BUILDING_CURVE_SEGMENTS);
    let bounds = mesh.bounds();
    if bounds.is_finite() {
        let c = bounds.center();
        if let Some(h) = ground.ground_height_at(c.x, c.z) {
            mesh.translate(Vec3::new(0.0, h, 0.0));
        }
    }
    BuildingGeometry {
        mesh,
        footprint,
        levels,
        depth,
    }
}

/// Collider for `building`, or `None` when its bounds are not finite.
pub fn collider_for(building: &BuildingGeometry, index: usize, properties: &Properties, name: Option<&str>) -> Option<Collider> {
    let aabb = placement_helper(&building.mesh)?;
    Some(Collider {
        name: name.unwrap_or("Building").to_string(),
        properties: properties.clone(),
        aabb,
        footprint: building.footprint.ground_polygon(),
        building: index,
    })
}

fn add_building(data: &mut SceneData, feature: &GeoFeature, levels: f32, ground: &dyn GroundSampler) {
    let polygons: Vec<&[Vec<GeoCoord>]> = match &feature.geometry {
        FeatureGeometry::Polygon(rings) => vec![rings.as_slice()],
        FeatureGeometry::MultiPolygon(parts) => parts.iter().map(Vec::as_slice).collect(),
        _ => return,
    };
    let properties = feature.properties.clone().unwrap_or_default();

    for rings in polygons {
        let building = build_building(rings, data.center, levels, ground);
        let index = data.buildings.len();
        match collider_for(&building, index, &properties, feature.name()) {
            Some(collider) => data.colliders.push(collider),
            None => {
                debug!("Skipping placement helper for malformed building footprint");
                data.stats.skipped_helpers += 1;
            }
        }
        data.buildings.push(building);
        data.stats.buildings += 1;
    }
}

/// Road polyline for a line feature. `None` when any vertex has a zero or
/// missing longitude/latitude.
pub fn road_from_feature(feature: &GeoFeature, center: GeoCoord, ground: &dyn GroundSampler) -> Option<RoadPolyline> {
    let FeatureGeometry::LineString(coords) = &feature.geometry else {
        return None;
    };
    if coords.is_empty() || coords.iter().any(|c| c.lon == 0.0 || c.lat == 0.0) {
        return None;
    }
    let points: Vec<Vec2> = coords.iter().map(|c| project(*c, center).ground()).collect();
    Some(RoadPolyline::new(
        points,
        feature.properties.clone().unwrap_or_default(),
        ground,
    ))
}

fn add_water(data: &mut SceneData, feature: &GeoFeature) {
    let FeatureGeometry::Polygon(rings) = &feature.geometry else {
        return;
    };
    let footprint = build_footprint(rings, data.center);
    data.water.push(extrude(&footprint, WATER_DEPTH, WATER_CURVE_SEGMENTS));
    data.water_footprints.push(footprint);
    data.stats.water += 1;
}

fn add_tree(
    data: &mut SceneData,
    feature: &GeoFeature,
    index: usize,
    height: f32,
    ground: &dyn GroundSampler,
    rng: &mut impl Rng,
) {
    let FeatureGeometry::Point(coord) = feature.geometry else {
        return;
    };
    let at = project(coord, data.center).ground();
    if data.colliders.iter().any(|c| c.covers(at.x, at.y)) {
        data.stats.rejected_trees += 1;
        return;
    }
    let base = ground.ground_height_at(at.x, at.y).unwrap_or(0.0);
    if data.trees.place(index, at, base, height, rng) {
        data.stats.trees += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    const CENTER: GeoCoord = GeoCoord::new(-118.326019, 34.102646);

    fn props(v: serde_json::Value) -> Option<Properties> {
        v.as_object().cloned()
    }

    fn triangle_rings(offset: f64) -> Vec<Vec<GeoCoord>> {
        vec![vec![
            GeoCoord::new(CENTER.lon + offset, CENTER.lat),
            GeoCoord::new(CENTER.lon + offset + 0.0005, CENTER.lat),
            GeoCoord::new(CENTER.lon + offset, CENTER.lat + 0.0005),
            GeoCoord::new(CENTER.lon + offset, CENTER.lat),
        ]]
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_building_depth_follows_levels() {
        let f = GeoFeature::new(
            FeatureGeometry::Polygon(triangle_rings(0.0)),
            props(json!({ "building": "yes", "building:levels": 2 })),
        );
        let data = load(&[f], CENTER, None, &mut rng());
        assert_eq!(data.buildings.len(), 1);
        let b = &data.buildings[0];
        assert!((b.depth - 0.10).abs() < 1e-6);
        let bounds = b.mesh.bounds();
        assert!((bounds.size().y - 0.10).abs() < 1e-6);
        assert_eq!(data.colliders.len(), 1);
        assert_eq!(data.colliders[0].name, "Building");
    }

    #[test]
    fn test_collider_uses_name_tag() {
        let f = GeoFeature::new(
            FeatureGeometry::Polygon(triangle_rings(0.0)),
            props(json!({ "building": "yes", "name": "Capitol Records" })),
        );
        let data = load(&[f], CENTER, None, &mut rng());
        assert_eq!(data.colliders[0].name, "Capitol Records");
    }

    #[test]
    fn test_degenerate_building_keeps_geometry_without_helper() {
        let f = GeoFeature::new(
            FeatureGeometry::Polygon(vec![vec![CENTER, GeoCoord::new(CENTER.lon + 0.001, CENTER.lat)]]),
            props(json!({ "building": "yes" })),
        );
        let data = load(&[f], CENTER, None, &mut rng());
        assert_eq!(data.buildings.len(), 1);
        assert!(data.colliders.is_empty());
        assert_eq!(data.stats.skipped_helpers, 1);
    }

    #[test]
    fn test_missing_properties_skips_only_that_feature() {
        let features = vec![
            GeoFeature::new(FeatureGeometry::Polygon(triangle_rings(0.0)), None),
            GeoFeature::new(
                FeatureGeometry::Polygon(triangle_rings(0.002)),
                props(json!({ "building": "yes" })),
            ),
        ];
        let data = load(&features, CENTER, None, &mut rng());
        assert_eq!(data.buildings.len(), 1);
        assert_eq!(data.stats.skipped, 1);
    }

    #[test]
    fn test_road_with_zero_coordinate_is_dropped() {
        let f = GeoFeature::new(
            FeatureGeometry::LineString(vec![CENTER, GeoCoord::new(0.0, CENTER.lat)]),
            props(json!({ "highway": "primary" })),
        );
        let data = load(&[f], CENTER, None, &mut rng());
        assert!(data.roads.is_empty());
        assert_eq!(data.stats.dropped_roads, 1);
    }

    #[test]
    fn test_long_road_gets_overlay() {
        let f = GeoFeature::new(
            FeatureGeometry::LineString(vec![CENTER, GeoCoord::new(CENTER.lon + 0.01, CENTER.lat)]),
            props(json!({ "highway": "primary" })),
        );
        let short = GeoFeature::new(
            FeatureGeometry::LineString(vec![CENTER, GeoCoord::new(CENTER.lon + 0.00001, CENTER.lat)]),
            props(json!({ "highway": "primary" })),
        );
        let data = load(&[f, short], CENTER, None, &mut rng());
        assert_eq!(data.roads.len(), 2);
        assert_eq!(data.overlays.len(), 1);
        assert_eq!(data.overlays[0].road, 0);
        assert_eq!(data.overlays[0].length, data.roads[0].length);
        assert!(data.roads.iter().all(|r| r.points.iter().all(|p| p.y == 0.0)));
    }

    #[test]
    fn test_water_is_thin_slab() {
        let f = GeoFeature::new(
            FeatureGeometry::Polygon(triangle_rings(0.0)),
            props(json!({ "natural": "water" })),
        );
        let data = load(&[f], CENTER, None, &mut rng());
        assert_eq!(data.water.len(), 1);
        assert!((data.water[0].bounds().size().y - WATER_DEPTH).abs() < 1e-7);
    }

    #[test]
    fn test_tree_slot_matches_feature_index() {
        let features = vec![
            GeoFeature::new(FeatureGeometry::Other, props(json!({ "amenity": "bench" }))),
            GeoFeature::new(
                FeatureGeometry::Point(GeoCoord::new(CENTER.lon + 0.003, CENTER.lat)),
                props(json!({ "natural": "tree" })),
            ),
        ];
        let data = load(&features, CENTER, None, &mut rng());
        assert_eq!(data.trees.capacity(), 2);
        assert!(data.trees.get(0).is_none());
        assert!(data.trees.get(1).is_some());
    }

    #[test]
    fn test_terrain_drapes_building() {
        let terrain = TerrainSurface::from_heights(3, 3, Vec2::ZERO, Vec2::splat(200.0), vec![2.0; 9]);
        let f = GeoFeature::new(
            FeatureGeometry::Polygon(triangle_rings(0.0)),
            props(json!({ "building": "yes" })),
        );
        let data = load(&[f], CENTER, Some(&terrain), &mut rng());
        let bounds = data.buildings[0].mesh.bounds();
        assert!((bounds.min.y - 2.0).abs() < 1e-5);
        assert!((data.colliders[0].aabb.min.y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_collider_probe_hits_base_then_roof() {
        let f = GeoFeature::new(
            FeatureGeometry::Polygon(triangle_rings(0.0)),
            props(json!({ "building": "yes", "building:levels": 4 })),
        );
        let data = load(&[f], CENTER, None, &mut rng());
        let c = &data.colliders[0];
        let mid = c.aabb.center();
        // Base at 0 is below the probe floor, so the roof is hit.
        let probe_point = data.buildings[0].footprint.outer.iter().fold(Vec2::ZERO, |acc, p| acc + p.ground()) / 3.0;
        assert!(c.covers(probe_point.x, probe_point.y));
        assert_eq!(ColliderSet(&data.colliders).ground_height_at(probe_point.x, probe_point.y), Some(c.aabb.max.y));
        assert!(ColliderSet(&data.colliders).ground_height_at(mid.x + 100.0, mid.z).is_none());
    }
}
