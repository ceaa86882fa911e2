//! Footprints and extrusion.
//!
//! A footprint is the projected outline of a polygon feature (outer ring plus
//! holes). [`extrude`] lifts it into a closed solid standing on y = 0 in world
//! space, with caps triangulated by `earcutr` and vertical side walls.

use bevy::log::warn;
use bevy::math::{Vec2, Vec3};
use geo::{Coord, LineString, Polygon};

use crate::coords::{project, GeoCoord, PlanarCoord};
use crate::mesh_data::{face_normal, Aabb, MeshData};

/// Projected polygon outline with optional holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape2D {
    pub outer: Vec<PlanarCoord>,
    pub holes: Vec<Vec<PlanarCoord>>,
}

impl Shape2D {
    /// True when the outer ring cannot enclose any area.
    pub fn is_degenerate(&self) -> bool {
        self.outer.len() < 3
    }

    /// Footprint on the world ground plane, as a `geo` polygon over (X, Z).
    pub fn ground_polygon(&self) -> Polygon<f64> {
        let ring = |points: &[PlanarCoord]| -> LineString<f64> {
            points
                .iter()
                .map(|p| {
                    let g = p.ground();
                    Coord {
                        x: g.x as f64,
                        y: g.y as f64,
                    }
                })
                .collect::<Vec<_>>()
                .into()
        };
        Polygon::new(
            ring(&self.outer),
            self.holes.iter().map(|h| ring(h)).collect(),
        )
    }
}

/// Projects the first ring as the outer boundary and the rest as holes.
///
/// GeoJSON rings repeat their first vertex at the end; the duplicate is
/// dropped so the extruder does not emit a zero-width wall.
pub fn build_footprint(rings: &[Vec<GeoCoord>], center: GeoCoord) -> Shape2D {
    let mut projected = rings.iter().map(|ring| {
        let mut points: Vec<PlanarCoord> = ring.iter().map(|c| project(*c, center)).collect();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        points
    });

    let outer = projected.next().unwrap_or_default();
    let holes = projected.filter(|h| h.len() >= 3).collect();
    Shape2D { outer, holes }
}

/// Extrudes `shape` from y = 0 to y = `depth`.
///
/// The outline is made of straight edges, so `curve_segments` only controls
/// how many wall panels each edge is split into.
pub fn extrude(shape: &Shape2D, depth: f32, curve_segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    if shape.is_degenerate() {
        return mesh;
    }

    let rings: Vec<Vec<Vec2>> = std::iter::once(&shape.outer)
        .chain(shape.holes.iter())
        .map(|ring| ring.iter().map(|p| p.ground()).collect())
        .collect();

    // Caps.
    let mut flat = Vec::new();
    let mut hole_starts = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_starts.push(flat.len() / 2);
        }
        for v in ring {
            flat.push(v.x as f64);
            flat.push(v.y as f64);
        }
    }
    let triangles = match earcutr::earcut(&flat, &hole_starts, 2) {
        Ok(t) => t,
        Err(e) => {
            warn!("Footprint triangulation failed: {e:?}");
            return mesh;
        }
    };
    let vertex = |i: usize, y: f32| -> [f32; 3] { [flat[i * 2] as f32, y, flat[i * 2 + 1] as f32] };
    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        push_facing(&mut mesh, vertex(a, depth), vertex(b, depth), vertex(c, depth), Vec3::Y);
        push_facing(&mut mesh, vertex(a, 0.0), vertex(b, 0.0), vertex(c, 0.0), Vec3::NEG_Y);
    }

    // Walls.
    let panels = curve_segments.max(1);
    for (ring_index, ring) in rings.iter().enumerate() {
        let ccw = signed_area(ring) > 0.0;
        // Outward for the solid: away from the interior of the outer ring,
        // into the interior of a hole.
        let flip = ccw == (ring_index > 0);
        for i in 0..ring.len() {
            let start = ring[i];
            let end = ring[(i + 1) % ring.len()];
            let edge = end - start;
            if edge.length_squared() < 1e-12 {
                continue;
            }
            let mut outward = Vec3::new(edge.y, 0.0, -edge.x);
            if flip {
                outward = -outward;
            }
            for s in 0..panels {
                let p0 = start + edge * (s as f32 / panels as f32);
                let p1 = start + edge * ((s + 1) as f32 / panels as f32);
                let b0 = [p0.x, 0.0, p0.y];
                let b1 = [p1.x, 0.0, p1.y];
                let t0 = [p0.x, depth, p0.y];
                let t1 = [p1.x, depth, p1.y];
                push_facing(&mut mesh, b0, b1, t1, outward);
                push_facing(&mut mesh, b0, t1, t0, outward);
            }
        }
    }

    mesh
}

/// Bounds used for placement queries. `None` when the extents are not
/// finite, which happens for empty or malformed footprints.
pub fn placement_helper(mesh: &MeshData) -> Option<Aabb> {
    let bounds = mesh.bounds();
    bounds.is_finite().then_some(bounds)
}

/// Shoelace area of a ring in the (X, Z) plane. Positive when counter-clockwise.
pub fn signed_area(ring: &[Vec2]) -> f32 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

fn push_facing(mesh: &mut MeshData, a: [f32; 3], b: [f32; 3], c: [f32; 3], facing: Vec3) {
    let n = Vec3::from_array(face_normal(a, b, c));
    if n.dot(facing) < 0.0 {
        mesh.push_flat_triangle(a, c, b);
    } else {
        mesh.push_flat_triangle(a, b, c);
    }
}
