//! Viewer control panel.
//!
//! The panel edits a copy of [`ViewerSettings`] and sends one
//! [`ViewerCommand`] per changed control. The scene applies the commands, so
//! the settings resource is never written from here.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use scene::locations::Locations;
use scene::rebuild::{LoadGate, RebuildHandshake};
use scene::{SceneState, ViewerCommand, ViewerSettings};

// =============================================================================
// Command diff
// =============================================================================

/// Commands turning `current` into `edited`, in panel order.
pub fn panel_commands(current: &ViewerSettings, edited: &ViewerSettings) -> Vec<ViewerCommand> {
    let mut out = Vec::new();
    let toggles: [(bool, bool, fn(bool) -> ViewerCommand); 7] = [
        (current.road_animation, edited.road_animation, ViewerCommand::SetRoadAnimation),
        (current.map_2d, edited.map_2d, ViewerCommand::SetMap2d),
        (current.depth_of_field, edited.depth_of_field, ViewerCommand::SetDepthOfField),
        (current.rendered_lighting, edited.rendered_lighting, ViewerCommand::SetRenderedLighting),
        (current.rendered_water, edited.rendered_water, ViewerCommand::SetRenderedWater),
        (current.trees, edited.trees, ViewerCommand::SetTrees),
        (current.terrain, edited.terrain, ViewerCommand::SetTerrain),
    ];
    for (before, after, command) in toggles {
        if before != after {
            out.push(command(after));
        }
    }
    if current.location != edited.location {
        out.push(ViewerCommand::SelectLocation(edited.location.clone()));
    }
    if current.transparency != edited.transparency {
        out.push(ViewerCommand::SetTransparency(edited.transparency));
    }
    if current.pitch != edited.pitch || current.yaw != edited.yaw {
        out.push(ViewerCommand::SetCameraAngles {
            pitch: edited.pitch,
            yaw: edited.yaw,
        });
    }
    out
}

/// Text of the info line.
pub fn info_line(scene: &SceneState, status: &str) -> String {
    let center = format!("Map Center: {:.6} {:.6}", scene.center.lat, scene.center.lon);
    if status.is_empty() {
        center
    } else {
        format!("{center}  |  {status}")
    }
}

// =============================================================================
// Systems
// =============================================================================

pub fn control_panel_ui(
    mut contexts: EguiContexts,
    settings: Res<ViewerSettings>,
    locations: Res<Locations>,
    rebuild: Res<RebuildHandshake>,
    gate: Res<LoadGate>,
    scene: Res<SceneState>,
    mut commands: EventWriter<ViewerCommand>,
) {
    let busy = rebuild.is_busy();
    let mut edited = settings.clone();

    egui::Window::new("Viewer")
        .resizable(false)
        .default_width(240.0)
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .show(contexts.ctx_mut(), |ui| {
            ui.spacing_mut().item_spacing.y = 6.0;

            // --- Location ---
            let selected = locations
                .presets
                .iter()
                .find(|p| p.key == edited.location)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            ui.add_enabled_ui(!busy, |ui| {
                egui::ComboBox::from_label("Location")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for preset in &locations.presets {
                            ui.selectable_value(
                                &mut edited.location,
                                preset.key.clone(),
                                preset.name.as_str(),
                            );
                        }
                    });
            });

            ui.separator();

            // --- Toggles ---
            ui.checkbox(&mut edited.road_animation, "Road animation");
            ui.checkbox(&mut edited.map_2d, "2D map");
            ui.checkbox(&mut edited.depth_of_field, "Depth of field");
            ui.checkbox(&mut edited.rendered_lighting, "Rendered lighting");
            ui.checkbox(&mut edited.rendered_water, "Rendered water");
            ui.checkbox(&mut edited.trees, "Trees");
            ui.add_enabled(
                settings.terrain_available && !busy,
                egui::Checkbox::new(&mut edited.terrain, "Terrain"),
            )
            .on_disabled_hover_text(if busy {
                "Loading a location"
            } else {
                "No elevation data for this location"
            })
            .on_hover_text(if gate.terrain_pending() {
                "Elevation data still loading; applies when ready"
            } else {
                "Drape the scene on the elevation data"
            });

            ui.separator();

            // --- Sliders ---
            ui.add(egui::Slider::new(&mut edited.transparency, 0.0..=1.0).text("Transparency"));
            ui.add(egui::Slider::new(&mut edited.pitch, 0.0..=80.0).text("Pitch"));
            ui.add(egui::Slider::new(&mut edited.yaw, 0.0..=360.0).text("Yaw"));

            ui.separator();
            ui.small(info_line(&scene, &gate.status.label()));
        });

    let changes = panel_commands(&settings, &edited);
    if !changes.is_empty() {
        commands.send_batch(changes);
    }
}
