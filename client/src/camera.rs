use crate::scene::{BevyScene, SceneSync};
use bevy::prelude::*;

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, add_camera);
    app.add_systems(Update, follow_target.after(SceneSync));
}

/// Start position before the game places the camera behind the player.
const CAMERA_START: Vec3 = Vec3::new(240.0, 0.0, 190.0);

fn add_camera(mut commands: Commands) {
    commands.spawn((
        bevy::core_pipeline::tonemapping::Tonemapping::AcesFitted,
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 45f32.to_radians(),
            near: 1.0,
            far: 10_000.0,
            ..default()
        }),
        // The course is Z-up.
        Transform::from_translation(CAMERA_START).looking_at(Vec3::ZERO, Vec3::Z),
        // Stands in for the white hemisphere light.
        AmbientLight {
            color: Color::WHITE,
            brightness: 600.0,
            ..default()
        },
    ));
}

fn follow_target(
    scene: Res<BevyScene>,
    mut camera: Single<&mut Transform, With<Camera3d>>,
) {
    let Some(target) = scene.camera() else {
        return;
    };
    **camera = Transform::from_translation(target.position).looking_at(target.look_at, Vec3::Z);
}
