//! Third-person player controller.
//!
//! Input ramps two signed scalars, a linear acceleration and a rotational one. The linear
//! scalar becomes the horizontal velocity along the current heading and the rotational one is
//! applied as a yaw increment every frame. Grounded state comes from contacts: a partner hit
//! by a ray cast straight down from the player counts as ground.

use crate::config::{PlayerSettings, TiltSettings};
use crate::constants::{UPRIGHT_LIMIT_DEG, colors};
use crate::error::{CourseError, Result};
use crate::input::{Control, InputState};
use crate::physics::{BodyVisual, PhysicsBinding, RigidBodyOptions};
use crate::scene::RenderScene;
use crate::shape::ShapeDef;
use crate::types::{Quat, Vec2, Vec3, up, vec3};
use crate::utils::{euler_xyz, polar_to_cartesian, rad_to_deg, yaw_rotation};
use crate::visual::{Geometry, MeshMaterial, VisualNode};
use rapier3d::prelude::RigidBodyHandle;

/// Which scalar an input ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Linear,
    Rotation,
}

/// Forward and right are `Positive`, backward and left are `Negative`.
///
/// A positive command drives the scalar towards `-max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

/// One tick of the two-phase acceleration ramp.
///
/// The scalar moves by `step` towards the commanded extreme and is clamped there. When the
/// command reverses a scalar that is still at least half of `max` on the other side, it snaps
/// to a quarter of `max` in the commanded direction instead.
pub fn ramp(value: f32, step: f32, max: f32, direction: Direction) -> f32 {
    match direction {
        Direction::Positive => {
            if value <= -max {
                -max
            } else if value >= max / 2.0 {
                -(max / 4.0)
            } else {
                (value - step).max(-max)
            }
        }
        Direction::Negative => {
            if value >= max {
                max
            } else if value <= -(max / 2.0) {
                max / 4.0
            } else {
                (value + step).min(max)
            }
        }
    }
}

/// Visual lean of the player model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tilt {
    pub settings: TiltSettings,
    pub angle: f32,
    pub turning_left: bool,
    pub turning_right: bool,
}

impl Tilt {
    pub fn new(settings: TiltSettings) -> Self {
        Self {
            settings,
            angle: settings.rest,
            turning_left: false,
            turning_right: false,
        }
    }

    fn lean_right(&mut self) {
        self.turning_right = true;
        if self.angle > self.settings.max_right {
            self.angle -= self.settings.step;
        }
    }

    fn lean_left(&mut self) {
        self.turning_left = true;
        if self.angle < self.settings.max_left {
            self.angle += self.settings.step;
        }
    }

    /// Move one step back towards the `[right_limit, left_limit]` band.
    fn relax(&mut self) {
        if !self.turning_right && self.angle < self.settings.right_limit {
            self.angle += self.settings.step;
        } else if !self.turning_left && self.angle > self.settings.left_limit {
            self.angle -= self.settings.step;
        }
    }
}

/// Runtime scalars of the controller, comparable against a fresh player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub acceleration: f32,
    pub rotation_acceleration: f32,
    pub is_grounded: bool,
    pub rotation_radians: Vec3,
    pub tilt: Option<Tilt>,
}

pub struct Player {
    settings: PlayerSettings,
    body: BodyVisual,

    pub acceleration: f32,
    pub rotation_acceleration: f32,
    pub is_grounded: bool,

    /// Euler angles (X-Y-Z order) of the body, refreshed after every step.
    pub rotation_radians: Vec3,
    /// Rounded pitch/roll in degrees.
    pub rotation_angle_x: f32,
    pub rotation_angle_y: f32,

    pub player_coords: Vec2,
    pub camera_coords: Vec2,

    pub tilt: Option<Tilt>,
}

impl Player {
    /// Create the player body and register the player material with itself.
    pub fn create(
        settings: PlayerSettings,
        physics: &mut PhysicsBinding,
        scene: &mut dyn RenderScene,
    ) -> Result<Self> {
        let material = physics.create_physics_material(Some(physics.player_material()), None, None);
        let half_extents = vec3(settings.half_extents);

        let options = RigidBodyOptions::new(
            ShapeDef::Box { half_extents },
            settings.mass,
            vec3(settings.spawn),
        )
        .with_physics_material(material)
        .with_custom_mesh(player_model(&settings))
        .never_sleeping();

        let body = physics
            .create_rigid_body(options, scene)?
            .ok_or(CourseError::NotRegistered("player"))?;

        log::info!("player created at {:?}", settings.spawn);

        Ok(Self {
            settings,
            body,
            acceleration: 0.0,
            rotation_acceleration: 0.0,
            is_grounded: false,
            rotation_radians: Vec3::zeros(),
            rotation_angle_x: 0.0,
            rotation_angle_y: 0.0,
            player_coords: Vec2::zeros(),
            camera_coords: Vec2::zeros(),
            tilt: settings.tilt.map(Tilt::new),
        })
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PlayerSettings {
        &mut self.settings
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.body.body
    }

    pub fn body(&self) -> BodyVisual {
        self.body
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            acceleration: self.acceleration,
            rotation_acceleration: self.rotation_acceleration,
            is_grounded: self.is_grounded,
            rotation_radians: self.rotation_radians,
            tilt: self.tilt,
        }
    }

    pub fn heading(&self) -> f32 {
        self.rotation_radians.z
    }

    pub fn position(&self, physics: &PhysicsBinding) -> Option<Vec3> {
        physics.position(self.body.body)
    }

    fn collisions(&self, physics: &PhysicsBinding) -> usize {
        physics
            .index_of(self.body.body)
            .map_or(0, |index| physics.get_collisions(index))
    }

    /// Per-frame update after the physics step.
    pub fn update(
        &mut self,
        input: &InputState,
        physics: &mut PhysicsBinding,
        scene: &mut dyn RenderScene,
    ) {
        self.process_user_input(input, physics);
        self.accelerate(input, physics);
        self.rotate(input, physics);
        self.update_camera(physics, scene);
    }

    /// Runs right after each physics step.
    pub fn post_step(&mut self, physics: &mut PhysicsBinding) {
        let handle = self.body.body;
        physics.set_angular_velocity_z(handle, 0.0);

        if !self.is_grounded {
            if let (Some(index), Some(position)) = (physics.index_of(handle), physics.position(handle)) {
                self.is_grounded = physics
                    .contacts_with(index)
                    .into_iter()
                    .any(|partner| physics.ray_down_hits(position, partner));
            }
        }

        self.update_orientation(physics);
    }

    pub fn update_acceleration(&mut self, axis: Axis, direction: Direction) {
        let s = &self.settings;
        match axis {
            Axis::Linear => {
                self.acceleration = ramp(self.acceleration, s.speed, s.speed_max, direction);
            }
            Axis::Rotation => {
                self.rotation_acceleration = ramp(
                    self.rotation_acceleration,
                    s.rotation_speed,
                    s.rotation_speed_max,
                    direction,
                );
            }
        }
    }

    pub fn process_user_input(&mut self, input: &InputState, physics: &mut PhysicsBinding) {
        if input.is_pressed(Control::Jump) {
            self.jump(physics);
        }

        if input.is_pressed(Control::Forward) {
            self.update_acceleration(Axis::Linear, Direction::Positive);

            // Straighten up while airborne.
            if self.collisions(physics) == 0 {
                physics.set_rotation(self.body.body, yaw_rotation(self.heading()));
            }
        }

        if input.is_pressed(Control::Backward) {
            self.update_acceleration(Axis::Linear, Direction::Negative);
        }

        if input.is_pressed(Control::Right) {
            self.update_acceleration(Axis::Rotation, Direction::Positive);
            if let Some(tilt) = &mut self.tilt {
                tilt.lean_right();
            }
        }

        if input.is_pressed(Control::Left) {
            self.update_acceleration(Axis::Rotation, Direction::Negative);
            if let Some(tilt) = &mut self.tilt {
                tilt.lean_left();
            }
        }
    }

    /// Set horizontal velocity from the linear scalar and the heading. Vertical velocity is kept.
    pub fn accelerate(&mut self, input: &InputState, physics: &mut PhysicsBinding) {
        let handle = self.body.body;
        self.player_coords = polar_to_cartesian(self.acceleration, self.heading());

        let vz = physics.linvel(handle).map_or(0.0, |v| v.z);
        physics.set_linvel(
            handle,
            Vec3::new(self.player_coords.x, self.player_coords.y, vz),
        );

        if !input.any_pressed(&[Control::Forward, Control::Backward]) {
            self.acceleration *= self.settings.damping;
        }
    }

    pub fn rotate(&mut self, input: &InputState, physics: &mut PhysicsBinding) {
        physics.rotate_on_axis(self.body.body, &up(), self.rotation_acceleration);
        self.update_tilt(physics);

        if !input.any_pressed(&[Control::Left, Control::Right]) {
            self.rotation_acceleration *= self.settings.rotation_damping;
        }
    }

    /// Apply the current lean to the model's first child, then relax it one step.
    pub fn update_tilt(&mut self, physics: &mut PhysicsBinding) {
        let Some(tilt) = &mut self.tilt else {
            return;
        };
        if let Some(model) = physics
            .visual_mut(self.body.body)
            .and_then(|v| v.root.children.first_mut())
        {
            model.orientation = Quat::from_axis_angle(&Vec3::x_axis(), tilt.angle);
        }
        tilt.relax();
    }

    pub fn clear_turning(&mut self) {
        if let Some(tilt) = &mut self.tilt {
            tilt.turning_left = false;
            tilt.turning_right = false;
        }
    }

    /// Jump if grounded and touching something. Returns whether the jump happened.
    pub fn jump(&mut self, physics: &mut PhysicsBinding) -> bool {
        if self.collisions(physics) > 0 && self.is_grounded {
            self.is_grounded = false;
            physics.set_vertical_velocity(self.body.body, self.settings.jump_velocity);
            true
        } else {
            false
        }
    }

    /// Refresh the Euler cache and put a grounded player that tipped over back on its wheels.
    pub fn update_orientation(&mut self, physics: &mut PhysicsBinding) {
        let Some(rotation) = physics.rotation(self.body.body) else {
            return;
        };
        self.rotation_radians = euler_xyz(&rotation);
        self.rotation_angle_x = rad_to_deg(self.rotation_radians.x).round();
        self.rotation_angle_y = rad_to_deg(self.rotation_radians.y).round();

        let tipped = self.rotation_angle_x.abs() >= UPRIGHT_LIMIT_DEG
            || self.rotation_angle_y.abs() >= UPRIGHT_LIMIT_DEG;
        if tipped && self.collisions(physics) > 0 {
            physics.set_rotation(self.body.body, yaw_rotation(self.heading()));
        }
    }

    /// Camera position and look-at target for a player at `position`.
    pub fn camera_pose(&self, position: Vec3) -> (Vec3, Vec3) {
        let offset = polar_to_cartesian(self.settings.camera_offset_h, self.heading());
        let camera = Vec3::new(
            position.x + offset.x,
            position.y + offset.y,
            position.z + self.settings.camera_offset_v,
        );
        (camera, position)
    }

    pub fn update_camera(&mut self, physics: &PhysicsBinding, scene: &mut dyn RenderScene) {
        let Some(position) = self.position(physics) else {
            return;
        };
        self.camera_coords = polar_to_cartesian(self.settings.camera_offset_h, self.heading());
        let (camera, target) = self.camera_pose(position);
        scene.set_camera(camera, target);
    }

    pub fn is_game_over(&self, physics: &PhysicsBinding, game_over_z: f32) -> bool {
        self.position(physics).is_some_and(|p| p.z <= game_over_z)
    }
}

/// Player mesh: the imported model with one child, the light cycle when tilt is enabled.
fn player_model(settings: &PlayerSettings) -> VisualNode {
    let half_extents = vec3(settings.half_extents);
    let body_material = MeshMaterial {
        opacity: settings.model_opacity,
        transparent: settings.model_opacity < 1.0,
        ..MeshMaterial::flat(colors::CYAN)
    };

    let child = match settings.tilt {
        Some(tilt) => VisualNode::new(
            Geometry::Model {
                name: "light-cycle".into(),
                half_extents,
            },
            Some(MeshMaterial::flat(colors::NEON_BLUE)),
        )
        .with_orientation(Quat::from_axis_angle(&Vec3::x_axis(), tilt.rest)),
        None => VisualNode::new(
            Geometry::Model {
                name: "player-trim".into(),
                half_extents,
            },
            Some(MeshMaterial::flat(colors::GREEN)),
        ),
    };

    let mut model = VisualNode::new(
        Geometry::Model {
            name: "player".into(),
            half_extents,
        },
        Some(body_material),
    )
    .with_child(child);
    model.enable_shadows();
    model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsSettings;
    use crate::scene::HeadlessScene;
    use crate::utils::deg_to_rad;

    const MAX: f32 = 45.0;
    const STEP: f32 = 1.5;

    struct World {
        physics: PhysicsBinding,
        scene: HeadlessScene,
        player: Player,
    }

    fn world(settings: PlayerSettings) -> World {
        let mut scene = HeadlessScene::new();
        let mut physics = PhysicsBinding::new(PhysicsSettings::default());
        let player = Player::create(settings, &mut physics, &mut scene).unwrap();
        physics
            .create_rigid_body(
                RigidBodyOptions::new(
                    ShapeDef::cuboid(800.0, 800.0, 20.0),
                    0.0,
                    Vec3::new(0.0, 0.0, -20.0),
                ),
                &mut scene,
            )
            .unwrap();
        World {
            physics,
            scene,
            player,
        }
    }

    fn step(w: &mut World, input: &InputState) {
        w.physics.update_physics();
        w.player.post_step(&mut w.physics);
        w.player.update(input, &mut w.physics, &mut w.scene);
    }

    fn landed() -> World {
        let mut w = world(PlayerSettings::default());
        let idle = InputState::default();
        for _ in 0..60 {
            step(&mut w, &idle);
        }
        w
    }

    #[test]
    fn ramp_never_leaves_the_clamp() {
        let mut a = 0.0;
        for _ in 0..100 {
            a = ramp(a, STEP, MAX, Direction::Positive);
            assert!(a >= -MAX);
        }
        assert_eq!(a, -MAX);

        for _ in 0..100 {
            a = ramp(a, STEP, MAX, Direction::Negative);
            assert!(a <= MAX);
        }
        assert_eq!(a, MAX);

        // Step sizes that do not divide the clamp land exactly on it.
        let mut b = 0.0;
        for _ in 0..100 {
            b = ramp(b, 7.0, MAX, Direction::Positive);
        }
        assert_eq!(b, -MAX);
    }

    #[test]
    fn ramp_snaps_when_reversing_from_half_max() {
        assert_eq!(ramp(MAX / 2.0, STEP, MAX, Direction::Positive), -MAX / 4.0);
        assert_eq!(ramp(MAX, STEP, MAX, Direction::Positive), -MAX / 4.0);
        assert_eq!(ramp(-MAX / 2.0, STEP, MAX, Direction::Negative), MAX / 4.0);

        // Just below half: plain linear step.
        let below = MAX / 2.0 - 0.5;
        assert!((ramp(below, STEP, MAX, Direction::Positive) - (below - STEP)).abs() < 1.0e-6);
    }

    #[test]
    fn released_keys_damp_acceleration_geometrically() {
        let mut w = world(PlayerSettings::default());
        let idle = InputState::default();
        w.player.acceleration = 40.0;
        w.player.rotation_acceleration = 0.04;

        let mut previous = w.player.acceleration;
        for n in 1..=10 {
            w.player.accelerate(&idle, &mut w.physics);
            w.player.rotate(&idle, &mut w.physics);
            let a = w.player.acceleration;
            assert!(a.abs() < previous.abs() && a != 0.0);
            assert!((a - 40.0 * 0.9_f32.powi(n)).abs() < 1.0e-3);
            previous = a;
        }
        assert!((w.player.rotation_acceleration - 0.04 * 0.8_f32.powi(10)).abs() < 1.0e-6);
    }

    #[test]
    fn held_keys_do_not_damp() {
        let mut w = world(PlayerSettings::default());
        let forward = InputState::holding(&[Control::Forward]);
        w.player.acceleration = -10.0;
        w.player.accelerate(&forward, &mut w.physics);
        assert_eq!(w.player.acceleration, -10.0);
    }

    #[test]
    fn player_lands_and_becomes_grounded() {
        let w = landed();
        let position = w.player.position(&w.physics).unwrap();
        assert!((position.z - 8.0).abs() < 1.0, "player rests at {position}");
        assert!(w.player.is_grounded);
        assert!(w.player.collisions(&w.physics) > 0);
    }

    #[test]
    fn jump_needs_ground_and_contact() {
        let mut w = landed();
        let handle = w.player.handle();

        w.player.is_grounded = false;
        let vz = w.physics.linvel(handle).unwrap().z;
        assert!(!w.player.jump(&mut w.physics));
        assert_eq!(w.physics.linvel(handle).unwrap().z, vz);

        w.player.is_grounded = true;
        assert!(w.player.jump(&mut w.physics));
        assert_eq!(w.physics.linvel(handle).unwrap().z, 38.0);
        assert!(!w.player.is_grounded);

        // Holding jump does nothing more until grounded again.
        assert!(!w.player.jump(&mut w.physics));
    }

    #[test]
    fn jump_in_mid_air_is_ignored() {
        let mut w = world(PlayerSettings::default());
        w.player.is_grounded = true;
        assert!(!w.player.jump(&mut w.physics));
        assert!(w.player.is_grounded);
    }

    #[test]
    fn forward_moves_against_the_heading() {
        let mut w = landed();
        let forward = InputState::holding(&[Control::Forward]);
        for _ in 0..5 {
            step(&mut w, &forward);
        }
        assert!(w.player.acceleration < 0.0);
        let v = w.physics.linvel(w.player.handle()).unwrap();
        assert!(v.x < 0.0);

        // Landing can leave a sliver of yaw, and thrust follows whatever the heading is.
        let expected = polar_to_cartesian(w.player.acceleration, w.player.heading());
        assert!((v.xy() - expected).norm() < 1.0e-4, "velocity {v} for heading {}", w.player.heading());
    }

    #[test]
    fn vertical_spin_is_cancelled_after_every_step() {
        let mut w = world(PlayerSettings::default());
        let handle = w.player.handle();
        w.physics.set_angular_velocity_z(handle, 0.5);

        w.physics.update_physics();
        assert!(w.physics.angvel(handle).unwrap().z.abs() > 0.1);
        w.player.post_step(&mut w.physics);
        assert_eq!(w.physics.angvel(handle).unwrap().z, 0.0);
    }

    #[test]
    fn forward_in_mid_air_straightens_the_player() {
        let mut w = world(PlayerSettings::default());
        let handle = w.player.handle();
        let tumbled = yaw_rotation(0.3)
            * Quat::from_axis_angle(&Vec3::x_axis(), 0.4)
            * Quat::from_axis_angle(&Vec3::y_axis(), -0.2);
        w.physics.set_rotation(handle, tumbled);
        w.player.update_orientation(&mut w.physics);
        let heading = w.player.heading();
        assert_eq!(w.player.collisions(&w.physics), 0);

        let forward = InputState::holding(&[Control::Forward]);
        w.player.process_user_input(&forward, &mut w.physics);

        let e = euler_xyz(&w.physics.rotation(handle).unwrap());
        assert!(e.x.abs() < 1.0e-4 && e.y.abs() < 1.0e-4, "still tilted: {e}");
        assert!((e.z - heading).abs() < 1.0e-4);
    }

    #[test]
    fn touching_a_wall_is_not_ground() {
        let mut w = world(PlayerSettings::default());
        let half = w.player.settings().half_extents;
        let spawn = w.player.settings().spawn;
        // Overlaps the player's +x face slightly, nothing below it.
        w.physics
            .create_rigid_body(
                RigidBodyOptions::new(
                    ShapeDef::cuboid(5.0, 100.0, 100.0),
                    0.0,
                    Vec3::new(spawn[0] + half[0] + 5.0 - 0.005, spawn[1], spawn[2]),
                ),
                &mut w.scene,
            )
            .unwrap();

        w.physics.update_physics();
        w.player.post_step(&mut w.physics);

        assert!(w.player.collisions(&w.physics) > 0);
        assert!(!w.player.is_grounded);
    }

    #[test]
    fn grounded_player_on_its_back_is_turned_upright() {
        let mut w = landed();
        let handle = w.player.handle();
        let heading = 0.7;
        let upside_down =
            yaw_rotation(heading) * Quat::from_axis_angle(&Vec3::x_axis(), std::f32::consts::PI);
        w.physics.set_rotation(handle, upside_down);

        w.player.update_orientation(&mut w.physics);

        let upright = w.physics.rotation(handle).unwrap();
        let e = euler_xyz(&upright);
        assert!(e.x.abs() < 1.0e-4 && e.y.abs() < 1.0e-4);
        assert_eq!(w.physics.visual(handle).unwrap().orientation, upright);
    }

    #[test]
    fn camera_sits_behind_and_above() {
        let mut w = world(PlayerSettings::default());
        w.player.update_camera(&w.physics, &mut w.scene);

        let spawn = Vec3::new(0.0, 0.0, 50.0);
        assert_eq!(w.scene.camera.look_at, spawn);
        assert!((w.scene.camera.position - Vec3::new(240.0, 0.0, 190.0)).norm() < 1.0e-4);

        w.player.rotation_radians.z = std::f32::consts::FRAC_PI_2;
        let (camera, _) = w.player.camera_pose(spawn);
        assert!((camera - Vec3::new(0.0, 240.0, 190.0)).norm() < 1.0e-3);
    }

    #[test]
    fn tilt_leans_while_turning_and_relaxes_after() {
        let settings = PlayerSettings {
            tilt: Some(TiltSettings::default()),
            ..PlayerSettings::default()
        };
        let mut w = world(settings);
        let right = InputState::holding(&[Control::Right]);
        for _ in 0..10 {
            w.player.process_user_input(&right, &mut w.physics);
            w.player.update_tilt(&mut w.physics);
        }
        let tilt = w.player.tilt.unwrap();
        assert!((tilt.angle - deg_to_rad(80.0)).abs() < 1.0e-4);

        let model = &w.physics.visual(w.player.handle()).unwrap().root.children[0];
        assert!(model.orientation.angle() < deg_to_rad(90.0));

        w.player.clear_turning();
        for _ in 0..20 {
            w.player.update_tilt(&mut w.physics);
        }
        let angle = w.player.tilt.unwrap().angle;
        assert!(angle >= deg_to_rad(89.0) - 1.0e-4 && angle <= deg_to_rad(91.0) + 1.0e-4);
    }

    #[test]
    fn falling_below_threshold_is_game_over() {
        let mut w = world(PlayerSettings::default());
        assert!(!w.player.is_game_over(&w.physics, -800.0));
        w.physics.set_position(w.player.handle(), Vec3::new(0.0, 0.0, -801.0));
        assert!(w.player.is_game_over(&w.physics, -800.0));
    }
}
