/// Edge length of the flat play area (and the grid helper) in world units.
pub const GRID_SIZE: f32 = 60.0;
/// Number of grid helper divisions along each axis.
pub const GRID_DIVISIONS: u32 = 160;

/// Planar units per metre of projected distance.
pub const PROJECTION_DIVISOR: f64 = 100.0;
/// Sphere radius used by the projector (WGS84 equatorial radius, metres).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Extrusion depth per building level.
pub const HEIGHT_UNIT: f32 = 0.05;
/// Curve resolution for building footprints.
pub const BUILDING_CURVE_SEGMENTS: u32 = 1;
/// Extrusion depth for water surfaces.
pub const WATER_DEPTH: f32 = 0.001;
/// Curve resolution for water surfaces.
pub const WATER_CURVE_SEGMENTS: u32 = 2;
/// Water shader time advance per animation step.
pub const WATER_TIME_STEP: f32 = 1.0 / 300.0;

/// Vertical probe window: probes start just above ground and stop at the ceiling.
pub const PROBE_FLOOR: f32 = 0.01;
pub const PROBE_CEILING: f32 = 10.0;
/// The camera target probe starts higher so it does not catch low road geometry.
pub const TARGET_PROBE_FLOOR: f32 = 1.0;

/// Roads shorter than this (in world units) get no animated overlay.
pub const OVERLAY_MIN_LENGTH: f32 = 0.8;
/// Dash growth per animation step.
pub const OVERLAY_DASH_SPEED: f32 = 0.004;
/// Overlay opacity decay per animation step.
pub const OVERLAY_FADE: f32 = 0.002;

/// Road highway subtypes that are never drawn.
pub const EXCLUDED_HIGHWAYS: [&str; 3] = ["pedestrian", "footway", "path"];

/// Tree silhouette height in world units.
pub const TREE_HEIGHT: f32 = 0.075;
/// Divisor applied to the `height` property when lifting tree crowns.
pub const TREE_CROWN_LIFT_DIVISOR: f32 = 600.0;

/// Elevation raster: half extents of the bbox around the center (degrees).
pub const TERRAIN_HALF_SPAN_LON: f64 = 0.080296;
pub const TERRAIN_HALF_SPAN_LAT: f64 = 0.044940;
/// Raster samples are divided by this to get world heights.
pub const TERRAIN_HEIGHT_DIVISOR: f32 = 30.0;
/// Vertical offset of the terrain mesh.
pub const TERRAIN_OFFSET_Y: f32 = -4.0;

/// Orbit camera limits.
pub const CAMERA_MAX_DISTANCE: f32 = 35.0;
pub const CAMERA_MIN_DISTANCE: f32 = 1.0;
pub const CAMERA_PITCH_MAX_DEG: f32 = 80.0;
pub const CAMERA_YAW_MAX_DEG: f32 = 360.0;
pub const CAMERA_FOV_DEG: f32 = 10.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;
