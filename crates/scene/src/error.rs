// ---------------------------------------------------------------------------
// SceneError: typed failures at the file and parsing boundaries
// ---------------------------------------------------------------------------

use std::fmt;
use std::path::PathBuf;

/// Errors raised while fetching or decoding the inputs of a dataset load.
///
/// Malformed features, missing tags and not-yet-ready terrain are recovered
/// locally and never show up here.
#[derive(Debug)]
pub enum SceneError {
    /// The dataset or raster file could not be read.
    Io(PathBuf, std::io::Error),
    /// The locations override file is not valid JSON for the preset schema.
    Json(String),
    /// The dataset is not a GeoJSON document.
    GeoJson(PathBuf, String),
    /// The raster could not be decoded as a TIFF image.
    Raster(PathBuf, String),
    /// The raster decoded to a sample format we do not handle.
    UnsupportedRaster(PathBuf),
    /// The raster decoded to zero samples.
    EmptyRaster(PathBuf),
    /// A location key that is not in the preset list.
    UnknownLocation(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Io(path, e) => write!(f, "Failed to read {}: {e}", path.display()),
            SceneError::Json(msg) => write!(f, "Invalid locations file: {msg}"),
            SceneError::GeoJson(path, msg) => {
                write!(f, "Failed to parse {} as GeoJSON: {msg}", path.display())
            }
            SceneError::Raster(path, msg) => {
                write!(f, "Failed to decode raster {}: {msg}", path.display())
            }
            SceneError::UnsupportedRaster(path) => {
                write!(f, "Unsupported raster sample format in {}", path.display())
            }
            SceneError::EmptyRaster(path) => write!(f, "Raster {} has no samples", path.display()),
            SceneError::UnknownLocation(key) => write!(f, "Unknown location: {key}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SceneError {
    fn from(e: serde_json::Error) -> Self {
        SceneError::Json(e.to_string())
    }
}
