//! # TestScene: headless harness for the viewer core
//!
//! Wraps `bevy::app::App` + `ScenePlugin` with in-memory datasets so the
//! load, rebuild and animation systems run without a window or files.

use bevy::app::App;
use bevy::prelude::*;

use crate::clock::{AnimationClock, VisibilityChanged};
use crate::coords::GeoCoord;
use crate::features::GeoFeature;
use crate::growth::Growth;
use crate::locations::{LocationPreset, Locations};
use crate::rebuild::{LoadGate, LoadStatus, PreloadedData, RebuildHandshake};
use crate::settings::{ViewerCommand, ViewerSettings};
use crate::terrain::TerrainSurface;
use crate::{SceneState, ScenePlugin};

/// Upper bound on updates spent waiting for something to happen.
const MAX_WAIT_UPDATES: u32 = 20_000;

/// Builder for a [`TestScene`].
#[derive(Default)]
pub struct TestSceneBuilder {
    locations: Vec<LocationPreset>,
    preloaded: PreloadedData,
}

impl TestSceneBuilder {
    /// Adds a location served from memory.
    pub fn with_location(mut self, key: &str, center: GeoCoord, features: Vec<GeoFeature>) -> Self {
        self.locations.push(LocationPreset {
            key: key.to_string(),
            name: key.to_string(),
            center: [center.lon, center.lat],
            dataset: format!("{key}.geojson").into(),
            terrain: None,
        });
        self.preloaded.datasets.insert(key.to_string(), features);
        self
    }

    /// Adds a location whose dataset file does not exist.
    pub fn with_missing_dataset(mut self, key: &str, center: GeoCoord) -> Self {
        self.locations.push(LocationPreset {
            key: key.to_string(),
            name: key.to_string(),
            center: [center.lon, center.lat],
            dataset: format!("missing/{key}.geojson").into(),
            terrain: None,
        });
        self
    }

    /// Gives the most recently added location a terrain surface.
    pub fn with_terrain(mut self, surface: TerrainSurface) -> Self {
        if let Some(preset) = self.locations.last_mut() {
            preset.terrain = Some(format!("{}.tif", preset.key).into());
            self.preloaded.terrains.insert(preset.key.clone(), surface);
        }
        self
    }

    pub fn build(self) -> TestScene {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(Locations {
            presets: self.locations,
            data_dir: "test-data".into(),
        });
        app.insert_resource(self.preloaded);
        app.add_plugins(ScenePlugin);
        // Startup systems.
        app.update();
        TestScene { app }
    }
}

/// A headless app running the scene systems.
pub struct TestScene {
    app: App,
}

impl TestScene {
    pub fn builder() -> TestSceneBuilder {
        TestSceneBuilder::default()
    }

    /// One location at `center` with `features`, nothing else.
    pub fn with_features(center: GeoCoord, features: Vec<GeoFeature>) -> Self {
        Self::builder().with_location("test", center, features).build()
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Runs `n` frames. Yields between frames so the async compute pool can
    /// finish dataset reads.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
            std::thread::yield_now();
        }
    }

    /// Ticks until `done` holds, panicking after a generous bound.
    pub fn tick_until(&mut self, what: &str, mut done: impl FnMut(&mut World) -> bool) -> u32 {
        for n in 0..MAX_WAIT_UPDATES {
            if done(self.app.world_mut()) {
                return n;
            }
            self.tick(1);
        }
        panic!("timed out waiting for {what}");
    }

    /// Waits for the pending load to compose and the growth to start.
    pub fn wait_for_load(&mut self) {
        self.tick_until("dataset load", |world| {
            !world.resource::<RebuildHandshake>().is_busy()
                && world.resource::<LoadGate>().status != LoadStatus::Idle
        });
    }

    /// Waits until the buildings stop animating.
    pub fn wait_for_growth(&mut self) {
        self.tick_until("building growth", |world| {
            let growth = world.resource::<Growth>();
            !growth.buildings.state.is_growing() && !growth.buildings.state.is_degrowing()
        });
    }

    pub fn send(&mut self, command: ViewerCommand) {
        self.app.world_mut().send_event(command);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.app.world_mut().send_event(VisibilityChanged { visible });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<R: Resource>(&self) -> &R {
        self.app.world().resource::<R>()
    }

    pub fn scene(&self) -> &SceneState {
        self.resource::<SceneState>()
    }

    pub fn growth(&self) -> &Growth {
        self.resource::<Growth>()
    }

    pub fn settings(&self) -> &ViewerSettings {
        self.resource::<ViewerSettings>()
    }

    pub fn clock(&self) -> &AnimationClock {
        self.resource::<AnimationClock>()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.resource::<LoadGate>().status
    }

    pub fn rebuild(&self) -> &RebuildHandshake {
        self.resource::<RebuildHandshake>()
    }
}
