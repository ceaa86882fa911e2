use bevy::prelude::*;

use scene::ViewerSettings;

/// Positions of the two rendered-lighting point lights.
pub const POINT_LIGHT_POSITIONS: [Vec3; 2] = [Vec3::new(200.0, 90.0, 40.0), Vec3::new(200.0, 90.0, -40.0)];

/// Marker for the lights the rendered-lighting toggle switches.
#[derive(Component)]
pub struct RenderedLight;

pub fn setup_lighting(mut commands: Commands) {
    // Ambient light is always on
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 250.0,
    });

    for position in POINT_LIGHT_POSITIONS {
        commands.spawn((
            PointLight {
                intensity: 5.0e9,
                range: 500.0,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_translation(position),
            Visibility::Inherited,
            RenderedLight,
        ));
    }
}

/// Shows the point lights only in rendered-lighting mode.
pub fn toggle_rendered_lighting(
    settings: Res<ViewerSettings>,
    mut lights: Query<&mut Visibility, With<RenderedLight>>,
) {
    if !settings.is_changed() {
        return;
    }
    let wanted = if settings.rendered_lighting {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut visibility in &mut lights {
        visibility.set_if_neq(wanted);
    }
}
