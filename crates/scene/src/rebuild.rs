//! Location switching and the asynchronous dataset load.
//!
//! A switch runs `Idle -> Degrowing -> Loading -> AwaitingBatch -> Idle`:
//! the buildings shrink away, the scene is cleared once their progress hits
//! zero, the new dataset is read on the async compute pool, and growth only
//! restarts once the composed batch exists. Feature-dependent work waits on
//! the load gate instead of polling on a timer.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy::tasks::{block_on, AsyncComputeTaskPool, Task};

use crate::composer::SceneState;
use crate::coords::GeoCoord;
use crate::error::SceneError;
use crate::features::{read_dataset, GeoFeature};
use crate::growth::Growth;
use crate::loader::load;
use crate::locations::Locations;
use crate::rng::SceneRng;
use crate::settings::ViewerSettings;
use crate::terrain::{HeightRaster, TerrainSurface};

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RebuildPhase {
    #[default]
    Idle,
    /// Waiting for the buildings to shrink to zero before teardown.
    Degrowing { target: String },
    /// Scene cleared; waiting on the load gate.
    Loading { target: String },
    /// Scene composed; growth restarts once the batch is present.
    AwaitingBatch,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct RebuildHandshake {
    phase: RebuildPhase,
}

impl RebuildHandshake {
    pub fn phase(&self) -> &RebuildPhase {
        &self.phase
    }

    /// The location selector and terrain toggle stay locked while busy.
    pub fn is_busy(&self) -> bool {
        self.phase != RebuildPhase::Idle
    }

    /// Starts a switch to `target` by shrinking the current buildings.
    pub fn request(&mut self, target: String, growth: &mut Growth) {
        info!("Switching location to {target}");
        growth.buildings.state.request_hide();
        self.phase = RebuildPhase::Degrowing { target };
    }

    /// Skips the degrow (nothing is on screen yet).
    pub fn request_immediate(&mut self, target: String) {
        self.phase = RebuildPhase::Loading { target };
    }
}

// ---------------------------------------------------------------------------
// Load gate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading(String),
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn label(&self) -> String {
        match self {
            LoadStatus::Idle => String::new(),
            LoadStatus::Loading(name) => format!("Loading {name}..."),
            LoadStatus::Ready => String::new(),
            LoadStatus::Failed(msg) => format!("Load failed: {msg}"),
        }
    }
}

/// Datasets and terrain surfaces available without touching the filesystem,
/// keyed by location.
#[derive(Resource, Debug, Clone, Default)]
pub struct PreloadedData {
    pub datasets: HashMap<String, Vec<GeoFeature>>,
    pub terrains: HashMap<String, TerrainSurface>,
}

struct PendingDataset {
    center: GeoCoord,
    task: Task<Result<Vec<GeoFeature>, SceneError>>,
}

struct PendingTerrain {
    location: String,
    task: Task<Result<TerrainSurface, SceneError>>,
}

/// Holds the in-flight reads. The gate opens once the dataset is parsed and,
/// if terrain mode is on, the terrain surface is present.
#[derive(Resource, Default)]
pub struct LoadGate {
    dataset: Option<PendingDataset>,
    features: Option<(GeoCoord, Vec<GeoFeature>)>,
    terrain: Option<PendingTerrain>,
    /// Location the current terrain surface belongs to.
    terrain_location: Option<String>,
    pub status: LoadStatus,
}

impl LoadGate {
    pub fn terrain_pending(&self) -> bool {
        self.terrain.is_some()
    }

    /// Starts the reads for `key` and points the settings at it.
    pub fn begin(
        &mut self,
        key: &str,
        locations: &Locations,
        preloaded: &PreloadedData,
        settings: &mut ViewerSettings,
        scene: &mut SceneState,
    ) -> Result<(), SceneError> {
        let preset = locations.get(key)?;
        let center = preset.center();
        let pool = AsyncComputeTaskPool::get();

        settings.location = preset.key.clone();
        settings.terrain_available = preset.has_terrain();
        if !settings.terrain_available {
            settings.terrain = false;
        }
        scene.center = center;

        let task = match preloaded.datasets.get(key) {
            Some(features) => {
                let features = features.clone();
                pool.spawn(async move { Ok(features) })
            }
            None => {
                let path = locations.resolve(&preset.dataset);
                pool.spawn(async move { read_dataset(&path) })
            }
        };
        self.dataset = Some(PendingDataset { center, task });
        self.features = None;
        self.status = LoadStatus::Loading(preset.name.clone());

        if self.terrain_location.as_deref() != Some(key) {
            scene.terrain = None;
            self.terrain = None;
            self.terrain_location = None;
            if let Some(surface) = preloaded.terrains.get(key) {
                let surface = surface.clone();
                self.terrain = Some(PendingTerrain {
                    location: key.to_string(),
                    task: pool.spawn(async move { Ok(surface) }),
                });
            } else if let Some(raster) = &preset.terrain {
                let path = locations.resolve(raster);
                self.terrain = Some(PendingTerrain {
                    location: key.to_string(),
                    task: pool.spawn(async move {
                        let raster = HeightRaster::load(&path)?;
                        Ok(TerrainSurface::from_raster(&raster, center))
                    }),
                });
            }
        }
        Ok(())
    }

    /// Polls the dataset read. Returns an error once if it failed.
    fn poll_dataset(&mut self) -> Result<(), SceneError> {
        let Some(pending) = self.dataset.as_mut() else {
            return Ok(());
        };
        let Some(result) = block_on(futures_lite::future::poll_once(&mut pending.task)) else {
            return Ok(());
        };
        let center = pending.center;
        self.dataset = None;
        self.features = Some((center, result?));
        Ok(())
    }

    /// Polls the terrain read; `Some` once it finished.
    fn poll_terrain(&mut self) -> Option<(String, Result<TerrainSurface, SceneError>)> {
        let pending = self.terrain.as_mut()?;
        let result = block_on(futures_lite::future::poll_once(&mut pending.task))?;
        let location = pending.location.clone();
        self.terrain = None;
        Some((location, result))
    }

    /// Hands out the parsed features once nothing they depend on is missing.
    fn take_ready(&mut self, needs_terrain: bool) -> Option<(GeoCoord, Vec<GeoFeature>)> {
        if needs_terrain && self.terrain.is_some() {
            return None;
        }
        self.features.take()
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Kicks off the first location without a degrow.
pub fn start_initial_load(
    locations: Res<Locations>,
    preloaded: Res<PreloadedData>,
    mut gate: ResMut<LoadGate>,
    mut settings: ResMut<ViewerSettings>,
    mut scene: ResMut<SceneState>,
    mut handshake: ResMut<RebuildHandshake>,
) {
    let key = if locations.get(&settings.location).is_ok() {
        settings.location.clone()
    } else if let Some(first) = locations.first() {
        first.key.clone()
    } else {
        warn!("No locations configured");
        return;
    };
    match gate.begin(&key, &locations, &preloaded, &mut settings, &mut scene) {
        Ok(()) => handshake.request_immediate(key),
        Err(e) => {
            warn!("{e}");
            gate.status = LoadStatus::Failed(e.to_string());
        }
    }
}

/// Receives the terrain surface. A terrain toggle that arrived before the
/// surface is applied now.
pub fn receive_terrain(
    mut gate: ResMut<LoadGate>,
    mut scene: ResMut<SceneState>,
    mut settings: ResMut<ViewerSettings>,
    mut growth: ResMut<Growth>,
) {
    let Some((location, result)) = gate.poll_terrain() else {
        return;
    };
    match result {
        Ok(surface) => {
            info!(
                "Terrain for {} ready: {}x{} samples",
                location, surface.rows, surface.cols
            );
            scene.terrain = Some(surface);
            gate.terrain_location = Some(location);
            if settings.terrain && !scene.terrain_mode && scene.has_batch() {
                scene.set_terrain_mode(true);
                growth.buildings.state.restart();
            }
        }
        Err(e) => {
            warn!("Terrain unavailable for {location}: {e}");
            settings.terrain_available = false;
            settings.terrain = false;
        }
    }
}

/// Advances the location-switch handshake.
#[allow(clippy::too_many_arguments)]
pub fn drive_rebuild(
    mut handshake: ResMut<RebuildHandshake>,
    mut gate: ResMut<LoadGate>,
    mut scene: ResMut<SceneState>,
    mut growth: ResMut<Growth>,
    mut settings: ResMut<ViewerSettings>,
    mut rng: ResMut<SceneRng>,
    locations: Res<Locations>,
    preloaded: Res<PreloadedData>,
) {
    match handshake.phase.clone() {
        RebuildPhase::Idle => {}
        RebuildPhase::Degrowing { target } => {
            let buildings = &growth.buildings.state;
            if buildings.is_degrowing() || buildings.progress() > 0.0 {
                return;
            }
            scene.clear();
            match gate.begin(&target, &locations, &preloaded, &mut settings, &mut scene) {
                Ok(()) => handshake.phase = RebuildPhase::Loading { target },
                Err(e) => {
                    warn!("{e}");
                    gate.status = LoadStatus::Failed(e.to_string());
                    handshake.phase = RebuildPhase::Idle;
                }
            }
        }
        RebuildPhase::Loading { target } => {
            if let Err(e) = gate.poll_dataset() {
                warn!("Loading {target} failed: {e}");
                gate.status = LoadStatus::Failed(e.to_string());
                handshake.phase = RebuildPhase::Idle;
                return;
            }
            let Some((center, features)) = gate.take_ready(settings.terrain) else {
                return;
            };
            let terrain_mode = settings.terrain && scene.terrain.is_some();
            let data = {
                let terrain = scene.terrain.as_ref().filter(|_| terrain_mode);
                load(&features, center, terrain, &mut rng.0)
            };
            scene.compose(data);
            scene.terrain_mode = terrain_mode;
            growth.reset_for_new_scene();
            gate.status = LoadStatus::Ready;
            handshake.phase = RebuildPhase::AwaitingBatch;
        }
        RebuildPhase::AwaitingBatch => {
            if scene.has_batch() {
                growth.buildings.state.restart();
                if settings.trees {
                    growth.trees.state.request_show();
                }
                handshake.phase = RebuildPhase::Idle;
            }
        }
    }
}
