use bevy::prelude::*;
use course_shared::{Control, InputState};
use leafwing_input_manager::prelude::*;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

impl From<InputAction> for Control {
    fn from(action: InputAction) -> Self {
        match action {
            InputAction::Forward => Control::Forward,
            InputAction::Backward => Control::Backward,
            InputAction::Left => Control::Left,
            InputAction::Right => Control::Right,
            InputAction::Jump => Control::Jump,
        }
    }
}

const ACTIONS: [InputAction; 5] = [
    InputAction::Forward,
    InputAction::Backward,
    InputAction::Left,
    InputAction::Right,
    InputAction::Jump,
];

/// Controls held this frame plus the edges since the last one.
#[derive(Resource, Default, Debug)]
pub struct PlayerInput {
    pub state: InputState,
    pub pressed: Vec<Control>,
    pub released: Vec<Control>,
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<InputAction>::default());

    app.register_type::<InputAction>();

    let input_map = InputMap::new([
        (InputAction::Forward, KeyCode::KeyW),
        (InputAction::Backward, KeyCode::KeyS),
        (InputAction::Left, KeyCode::KeyA),
        (InputAction::Right, KeyCode::KeyD),
        (InputAction::Jump, KeyCode::Space),
    ]);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<InputAction>::default());
    app.init_resource::<PlayerInput>();

    app.add_systems(Update, read_controls);
}

pub(crate) fn read_controls(actions: Res<ActionState<InputAction>>, mut input: ResMut<PlayerInput>) {
    input.pressed.clear();
    input.released.clear();

    for action in ACTIONS {
        let control = Control::from(action);
        input.state.set(control, actions.pressed(&action));
        if actions.just_pressed(&action) {
            input.pressed.push(control);
        }
        if actions.just_released(&action) {
            input.released.push(control);
        }
    }
}
