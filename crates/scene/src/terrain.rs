//! Elevation raster, terrain surface and vertical ground probes.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use bevy::math::{Vec2, Vec3};
use tiff::decoder::{Decoder, DecodingResult};

use crate::config::{
    PROBE_CEILING, PROBE_FLOOR, TERRAIN_HALF_SPAN_LAT, TERRAIN_HALF_SPAN_LON,
    TERRAIN_HEIGHT_DIVISOR, TERRAIN_OFFSET_Y,
};
use crate::coords::{project, GeoCoord};
use crate::error::SceneError;
use crate::mesh_data::{Aabb, MeshData};

// ---------------------------------------------------------------------------
// Probes
// ---------------------------------------------------------------------------

/// Vertical extent a ground probe scans, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeWindow {
    pub floor: f32,
    pub ceiling: f32,
}

impl ProbeWindow {
    pub const GROUND: Self = Self {
        floor: PROBE_FLOOR,
        ceiling: PROBE_CEILING,
    };

    pub fn admits(&self, height: f32) -> bool {
        height >= self.floor && height <= self.ceiling
    }
}

impl Default for ProbeWindow {
    fn default() -> Self {
        Self::GROUND
    }
}

/// Something a vertical probe can hit.
///
/// `ground_height_at` returns the first surface height met by a probe cast
/// upward through the default [`ProbeWindow`] at (x, z), or `None` when the
/// probe passes through empty space.
pub trait GroundSampler {
    fn ground_height_at(&self, x: f32, z: f32) -> Option<f32>;
}

impl<F> GroundSampler for F
where
    F: Fn(f32, f32) -> Option<f32>,
{
    fn ground_height_at(&self, x: f32, z: f32) -> Option<f32> {
        self(x, z)
    }
}

/// A sampler that never hits anything (flat mode, or terrain not ready).
pub struct NoGround;

impl GroundSampler for NoGround {
    fn ground_height_at(&self, _x: f32, _z: f32) -> Option<f32> {
        None
    }
}

/// Lowest hit among several samplers.
pub struct Layered<'a>(pub Vec<&'a dyn GroundSampler>);

impl GroundSampler for Layered<'_> {
    fn ground_height_at(&self, x: f32, z: f32) -> Option<f32> {
        self.0
            .iter()
            .filter_map(|s| s.ground_height_at(x, z))
            .min_by(|a, b| a.total_cmp(b))
    }
}

// ---------------------------------------------------------------------------
// Raster
// ---------------------------------------------------------------------------

/// Single-band elevation grid, row 0 at the north edge.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightRaster {
    pub width: usize,
    pub height: usize,
    pub samples: Vec<f32>,
}

impl HeightRaster {
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Self {
        Self {
            width,
            height,
            samples,
        }
    }

    /// Reads the first image of a (Geo)TIFF file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let file = File::open(path).map_err(|e| SceneError::Io(path.to_path_buf(), e))?;
        Self::decode(BufReader::new(file), path)
    }

    pub fn decode<R: Read + Seek>(reader: R, path: &Path) -> Result<Self, SceneError> {
        let raster_err = |e: tiff::TiffError| SceneError::Raster(path.to_path_buf(), e.to_string());
        let mut decoder = Decoder::new(reader).map_err(raster_err)?;
        let (width, height) = decoder.dimensions().map_err(raster_err)?;
        let (width, height) = (width as usize, height as usize);

        let samples: Vec<f32> = match decoder.read_image().map_err(raster_err)? {
            DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
            DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
            DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
            DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
            _ => return Err(SceneError::UnsupportedRaster(path.to_path_buf())),
        };

        if width == 0 || height == 0 || samples.is_empty() {
            return Err(SceneError::EmptyRaster(path.to_path_buf()));
        }

        // Multi-band rasters: keep the first band.
        let bands = (samples.len() / (width * height)).max(1);
        let samples = samples.into_iter().step_by(bands).take(width * height).collect();

        Ok(Self::new(width, height, samples))
    }

    fn at(&self, row: usize, col: usize) -> f32 {
        let row = row.min(self.height - 1);
        let col = col.min(self.width - 1);
        self.samples.get(row * self.width + col).copied().unwrap_or(0.0)
    }

    /// Resamples to `out_width` x `out_height` with bilinear interpolation,
    /// pixel centers aligned.
    pub fn resample_bilinear(&self, out_width: usize, out_height: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(out_width * out_height);
        let sx = self.width as f32 / out_width.max(1) as f32;
        let sy = self.height as f32 / out_height.max(1) as f32;
        for row in 0..out_height {
            let fy = ((row as f32 + 0.5) * sy - 0.5).clamp(0.0, (self.height - 1) as f32);
            let r0 = fy.floor() as usize;
            let ty = fy - r0 as f32;
            for col in 0..out_width {
                let fx = ((col as f32 + 0.5) * sx - 0.5).clamp(0.0, (self.width - 1) as f32);
                let c0 = fx.floor() as usize;
                let tx = fx - c0 as f32;
                let top = self.at(r0, c0) * (1.0 - tx) + self.at(r0, c0 + 1) * tx;
                let bottom = self.at(r0 + 1, c0) * (1.0 - tx) + self.at(r0 + 1, c0 + 1) * tx;
                out.push(top * (1.0 - ty) + bottom * ty);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Geographic bbox the elevation raster covers for a given map center.
pub fn raster_bounds(center: GeoCoord) -> (GeoCoord, GeoCoord) {
    (
        GeoCoord::new(center.lon - TERRAIN_HALF_SPAN_LON, center.lat - TERRAIN_HALF_SPAN_LAT),
        GeoCoord::new(center.lon + TERRAIN_HALF_SPAN_LON, center.lat + TERRAIN_HALF_SPAN_LAT),
    )
}

/// Regular height grid on the world ground plane.
///
/// Rows run along +X (north to south), columns along -Z (west to east),
/// matching the orientation the projector gives features.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSurface {
    pub rows: usize,
    pub cols: usize,
    /// World position of row 0 / column 0.
    pub origin: Vec2,
    /// World distance between neighbouring samples along X and Z.
    pub spacing: Vec2,
    /// World heights, row-major.
    pub heights: Vec<f32>,
}

impl TerrainSurface {
    /// Builds the surface for `center` from a raster covering [`raster_bounds`].
    ///
    /// The grid spans the projected extent of the bbox with one sample per
    /// whole world unit, centered on the projected map center.
    pub fn from_raster(raster: &HeightRaster, center: GeoCoord) -> Self {
        let (south_west, north_east) = raster_bounds(center);
        let a = project(south_west, center);
        let b = project(north_east, center);
        let extent = Vec2::new((a.x - b.x).abs(), (a.y - b.y).abs());
        let rows = (extent.x.floor() as usize).max(2);
        let cols = (extent.y.floor() as usize).max(2);

        let heights = raster
            .resample_bilinear(cols, rows)
            .into_iter()
            .map(|s| s / TERRAIN_HEIGHT_DIVISOR + TERRAIN_OFFSET_Y)
            .collect();

        let mid = project(center, center).ground();
        Self::from_heights(rows, cols, mid, extent, heights)
    }

    /// Grid of `rows` x `cols` heights centered on `mid`, covering `extent`
    /// world units along X and Z.
    pub fn from_heights(rows: usize, cols: usize, mid: Vec2, extent: Vec2, heights: Vec<f32>) -> Self {
        let spacing = Vec2::new(
            extent.x / (rows.max(2) - 1) as f32,
            -extent.y / (cols.max(2) - 1) as f32,
        );
        let origin = Vec2::new(mid.x - extent.x * 0.5, mid.y + extent.y * 0.5);
        Self {
            rows,
            cols,
            origin,
            spacing,
            heights,
        }
    }

    fn height(&self, row: usize, col: usize) -> f32 {
        self.heights.get(row * self.cols + col).copied().unwrap_or(TERRAIN_OFFSET_Y)
    }

    fn vertex(&self, row: usize, col: usize) -> [f32; 3] {
        [
            self.origin.x + row as f32 * self.spacing.x,
            self.height(row, col),
            self.origin.y + col as f32 * self.spacing.y,
        ]
    }

    /// Interpolated surface height at (x, z), `None` outside the grid.
    pub fn surface_at(&self, x: f32, z: f32) -> Option<f32> {
        let fr = (x - self.origin.x) / self.spacing.x;
        let fc = (z - self.origin.y) / self.spacing.y;
        let max_r = (self.rows - 1) as f32;
        let max_c = (self.cols - 1) as f32;
        if !(0.0..=max_r).contains(&fr) || !(0.0..=max_c).contains(&fc) {
            return None;
        }
        let r0 = (fr.floor() as usize).min(self.rows - 2);
        let c0 = (fc.floor() as usize).min(self.cols - 2);
        let (tr, tc) = (fr - r0 as f32, fc - c0 as f32);
        let top = self.height(r0, c0) * (1.0 - tc) + self.height(r0, c0 + 1) * tc;
        let bottom = self.height(r0 + 1, c0) * (1.0 - tc) + self.height(r0 + 1, c0 + 1) * tc;
        Some(top * (1.0 - tr) + bottom * tr)
    }

    /// Surface height if it lies inside `window`.
    pub fn probe(&self, x: f32, z: f32, window: ProbeWindow) -> Option<f32> {
        self.surface_at(x, z).filter(|h| window.admits(*h))
    }

    pub fn bounds(&self) -> Aabb {
        self.to_mesh_data().bounds()
    }

    /// Ray against the height field, marching in steps of half a cell.
    pub fn ray_hit(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        let step = self.spacing.abs().min_element() * 0.5;
        if step <= 0.0 {
            return None;
        }
        let mut t = 0.0;
        let mut above = None;
        while t <= max_distance {
            let p = origin + dir * t;
            if let Some(h) = self.surface_at(p.x, p.z) {
                let is_above = p.y >= h;
                if above == Some(true) && !is_above {
                    return Some(t);
                }
                above = Some(is_above);
            }
            t += step;
        }
        None
    }

    /// Triangle grid of the surface with smoothed normals.
    pub fn to_mesh_data(&self) -> MeshData {
        let mut mesh = MeshData::default();
        for row in 0..self.rows {
            for col in 0..self.cols {
                mesh.positions.push(self.vertex(row, col));
            }
        }
        for row in 0..self.rows {
            for col in 0..self.cols {
                let at = |r: usize, c: usize| Vec3::from_array(self.vertex(r, c));
                let dx = at((row + 1).min(self.rows - 1), col) - at(row.saturating_sub(1), col);
                let dz = at(row, (col + 1).min(self.cols - 1)) - at(row, col.saturating_sub(1));
                let mut n = dz.cross(dx).normalize_or_zero();
                if n.y < 0.0 {
                    n = -n;
                }
                mesh.normals.push(n.to_array());
            }
        }
        let stride = self.cols as u32;
        for row in 0..self.rows.saturating_sub(1) as u32 {
            for col in 0..self.cols.saturating_sub(1) as u32 {
                let i = row * stride + col;
                mesh.indices.extend_from_slice(&[i, i + 1, i + stride]);
                mesh.indices.extend_from_slice(&[i + 1, i + stride + 1, i + stride]);
            }
        }
        mesh
    }
}

impl GroundSampler for TerrainSurface {
    fn ground_height_at(&self, x: f32, z: f32) -> Option<f32> {
        self.probe(x, z, ProbeWindow::GROUND)
    }
}
