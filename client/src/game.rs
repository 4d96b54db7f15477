use crate::{
    input::{PlayerInput, read_controls},
    scene::{BevyScene, SceneSync, to_vec3},
};
use bevy::prelude::*;
use course_shared::{Demo, FrameOutcome, Game, GameConfig};
use std::path::Path;

/// Optional config file, read from the working directory.
const CONFIG_PATH: &str = "course.toml";

/// Demo preset used when no config file exists: `basic`, `light-cycle` or `movable`.
const DEMO_ENV: &str = "COURSE_DEMO";

#[derive(Resource)]
pub struct CourseGame(pub Game);

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, start_game);
    app.add_systems(
        Update,
        run_frame
            .after(read_controls)
            .before(SceneSync)
            .run_if(resource_exists::<CourseGame>),
    );
    app.add_systems(PostUpdate, draw_trail.run_if(resource_exists::<CourseGame>));
}

fn load_config() -> course_shared::Result<GameConfig> {
    if Path::new(CONFIG_PATH).exists() {
        return GameConfig::load(CONFIG_PATH);
    }

    let demo = match std::env::var(DEMO_ENV) {
        Ok(name) => Demo::from_name(&name).unwrap_or_else(|| {
            warn!("unknown {DEMO_ENV} value {name:?}, using the basic course");
            Demo::Basic
        }),
        Err(_) => Demo::default(),
    };
    info!("starting the {demo:?} demo");
    Ok(GameConfig::for_demo(demo))
}

fn start_game(
    mut commands: Commands,
    mut scene: ResMut<BevyScene>,
    mut exit: MessageWriter<AppExit>,
) {
    match load_config().and_then(|config| Game::new(config, &mut *scene)) {
        Ok(game) => commands.insert_resource(CourseGame(game)),
        Err(err) => {
            error!("failed to start the game: {err}");
            exit.write(AppExit::error());
        }
    }
}

fn run_frame(
    mut game: ResMut<CourseGame>,
    mut scene: ResMut<BevyScene>,
    input: Res<PlayerInput>,
    mut exit: MessageWriter<AppExit>,
) {
    let game = &mut game.0;
    for control in &input.pressed {
        game.on_key_down(*control);
    }
    for control in &input.released {
        game.on_key_up(*control);
    }

    match game.frame(&input.state, &mut *scene) {
        Ok(FrameOutcome::Reset) => info!("fell off the course, restarting"),
        Ok(_) => {}
        Err(err) => {
            error!("failed to rebuild the course: {err}");
            exit.write(AppExit::error());
        }
    }
}

fn draw_trail(game: Res<CourseGame>, mut gizmos: Gizmos) {
    let Some(trail) = game.0.trail() else {
        return;
    };
    let c = trail.color();
    let color = Color::srgb_u8((c >> 16) as u8, (c >> 8) as u8, c as u8);
    gizmos.linestrip(trail.vertices().map(to_vec3), color);
}
