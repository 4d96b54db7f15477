//! Debug/performance tooling for native dev builds.
//!
//! Adds bevy's frame/entity diagnostics, the perf overlay, course diagnostics (registered
//! bodies, simulated time) and bounding-box gizmos toggled with F3.

use crate::{game::CourseGame, scene::to_vec3};
use bevy::diagnostic::{
    Diagnostic, DiagnosticPath, Diagnostics, EntityCountDiagnosticsPlugin,
    FrameTimeDiagnosticsPlugin, RegisterDiagnostic, SystemInformationDiagnosticsPlugin,
};
use bevy::prelude::*;
use bevy::render::diagnostic::RenderDiagnosticsPlugin;
use iyes_perf_ui::prelude::*;

const BODY_COUNT: DiagnosticPath = DiagnosticPath::const_new("course/bodies");
const SIMULATED_TIME: DiagnosticPath = DiagnosticPath::const_new("course/simulated_time");

const AABB_COLOR: Color = Color::srgb(1.0, 0.4, 0.2);

/// Whether body bounds are drawn.
#[derive(Resource, Default)]
struct ShowAabbs(bool);

/// Add debug/perf tooling (intended for `dev_native` builds only).
pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        SystemInformationDiagnosticsPlugin::default(),
        RenderDiagnosticsPlugin,
        PerfUiPlugin,
    ));

    app.register_diagnostic(Diagnostic::new(BODY_COUNT))
        .register_diagnostic(Diagnostic::new(SIMULATED_TIME).with_suffix("s"));
    app.init_resource::<ShowAabbs>();

    app.add_systems(Startup, spawn_perf_ui);
    app.add_systems(
        Update,
        (measure_course, toggle_aabbs, draw_aabbs).run_if(resource_exists::<CourseGame>),
    );
}

fn spawn_perf_ui(mut commands: Commands) {
    commands.spawn(PerfUiAllEntries::default());
}

fn measure_course(game: Res<CourseGame>, mut diagnostics: Diagnostics) {
    let physics = game.0.physics();
    diagnostics.add_measurement(&BODY_COUNT, || physics.body_count() as f64);
    diagnostics.add_measurement(&SIMULATED_TIME, || physics.simulated_time());
}

fn toggle_aabbs(keys: Res<ButtonInput<KeyCode>>, mut show: ResMut<ShowAabbs>) {
    if keys.just_pressed(KeyCode::F3) {
        show.0 = !show.0;
        info!("bounding boxes {}", if show.0 { "shown" } else { "hidden" });
    }
}

fn draw_aabbs(game: Res<CourseGame>, show: Res<ShowAabbs>, mut gizmos: Gizmos) {
    if !show.0 {
        return;
    }
    for aabb in game.0.physics().aabbs() {
        gizmos.cuboid(
            Transform::from_translation(to_vec3(&aabb.center()))
                .with_scale(to_vec3(&aabb.extents())),
            AABB_COLOR,
        );
    }
}
