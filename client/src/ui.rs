use crate::game::CourseGame;
use bevy::prelude::*;
use course_shared::ui::{FADE_OUT, INFOBOX_INTRO};

/// Seconds the intro box takes to fade out.
const FADE_SECONDS: f32 = 1.0;

const INTRO_TEXT: &str = "W / S: accelerate and brake\nA / D: turn\nSPACE: jump\n\nFall off the course and it starts over.";

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_intro);
    app.add_systems(Update, fade_intro.run_if(resource_exists::<CourseGame>));
}

#[derive(Component, Debug)]
struct IntroInfobox {
    opacity: f32,
}

fn spawn_intro(mut commands: Commands) {
    commands.spawn((
        Name::new("InfoboxIntro"),
        IntroInfobox { opacity: 1.0 },
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(20.0),
            top: Val::Px(20.0),
            padding: UiRect::all(Val::Px(12.0)),
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
        Text::new(INTRO_TEXT),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::WHITE),
    ));
}

fn fade_intro(
    game: Res<CourseGame>,
    time: Res<Time>,
    mut intro: Query<(
        &mut IntroInfobox,
        &mut BackgroundColor,
        &mut TextColor,
        &mut Visibility,
    )>,
) {
    if !game.0.ui().has_class(INFOBOX_INTRO, FADE_OUT) {
        return;
    }
    for (mut infobox, mut background, mut text, mut visibility) in &mut intro {
        if infobox.opacity <= 0.0 {
            continue;
        }
        infobox.opacity = (infobox.opacity - time.delta_secs() / FADE_SECONDS).max(0.0);
        background.0.set_alpha(0.7 * infobox.opacity);
        text.0.set_alpha(infobox.opacity);
        if infobox.opacity == 0.0 {
            *visibility = Visibility::Hidden;
        }
    }
}
