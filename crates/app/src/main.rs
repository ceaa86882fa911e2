use bevy::prelude::*;
use bevy::window::{PresentMode, WindowOccluded};
use bevy::winit::{UpdateMode, WinitSettings};

use scene::clock::VisibilityChanged;
use scene::locations::Locations;

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "OSM 3D".to_string(),
            resolution: (1280.0, 720.0).into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(WinitSettings {
        focused_mode: UpdateMode::Continuous,
        unfocused_mode: UpdateMode::reactive_low_power(std::time::Duration::from_millis(16)),
    })
    // Presets may come from OSM3D_LOCATIONS; must be in place before the
    // scene plugin's initial load
    .insert_resource(Locations::from_env())
    .add_plugins((
        scene::ScenePlugin,
        rendering::RenderingPlugin,
        ui::UiPlugin,
    ))
    .add_systems(Update, forward_occlusion.before(scene::SceneSet::Commands));

    app.run();
}

/// The animation freezes while the window is hidden behind other windows or
/// minimized.
fn forward_occlusion(
    mut occluded: EventReader<WindowOccluded>,
    mut visibility: EventWriter<VisibilityChanged>,
) {
    for event in occluded.read() {
        visibility.send(VisibilityChanged {
            visible: !event.occluded,
        });
    }
}
