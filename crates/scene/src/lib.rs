use bevy::prelude::*;

pub mod animation;
pub mod arena;
pub mod clock;
pub mod composer;
pub mod config;
pub mod coords;
pub mod error;
pub mod features;
pub mod growth;
pub mod loader;
pub mod locations;
pub mod mesh_data;
pub mod rebuild;
pub mod rng;
pub mod road_overlay;
pub mod settings;
pub mod shape;
pub mod terrain;
pub mod trees;

#[cfg(test)]
mod integration_tests;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use composer::SceneState;
pub use growth::Growth;
pub use settings::{ViewerCommand, ViewerSettings};

// ---------------------------------------------------------------------------
// Update phases
// ---------------------------------------------------------------------------

/// Ordered phases of the scene systems in the `Update` schedule.
///
/// Configured as a chain: `Commands` → `Load` → `Animate`. Rendering reads the
/// scene after `Animate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneSet {
    /// Panel commands and visibility changes.
    Commands,
    /// Terrain arrival and the location-switch handshake.
    Load,
    /// The animation step; skipped while the clock is paused.
    Animate,
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<locations::Locations>()
            .init_resource::<rebuild::PreloadedData>()
            .init_resource::<ViewerSettings>()
            .init_resource::<SceneState>()
            .init_resource::<Growth>()
            .init_resource::<clock::AnimationClock>()
            .init_resource::<rng::SceneRng>()
            .init_resource::<rebuild::RebuildHandshake>()
            .init_resource::<rebuild::LoadGate>()
            .add_event::<ViewerCommand>()
            .add_event::<clock::VisibilityChanged>()
            .configure_sets(
                Update,
                (SceneSet::Commands, SceneSet::Load, SceneSet::Animate).chain(),
            )
            .add_systems(Startup, rebuild::start_initial_load)
            .add_systems(
                Update,
                (settings::apply_viewer_commands, clock::apply_visibility).in_set(SceneSet::Commands),
            )
            .add_systems(
                Update,
                (rebuild::receive_terrain, rebuild::drive_rebuild)
                    .chain()
                    .in_set(SceneSet::Load),
            )
            .add_systems(
                Update,
                animation::step_animation
                    .run_if(clock::clock_running)
                    .in_set(SceneSet::Animate),
            );
    }
}
