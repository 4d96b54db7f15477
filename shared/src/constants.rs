//! Compile-time defaults for the simulation, the player and the course.
//!
//! Units are "course units" (the floor is 1600 units wide), time is in seconds and
//! the world is Z-up: gravity pulls along -Z and headings are rotations about +Z.

/// Gravity along the Z axis (approximation of 9.806).
pub const GRAVITY_Z: f32 = -10.0;

/// Fixed simulation step in seconds.
///
/// Every call to `PhysicsBinding::update_physics` advances the world by exactly this much,
/// no matter how long the frame took.
pub const TIMESTEP: f32 = 1.0 / 8.0;

/// Constraint solver iterations per step.
pub const SOLVER_ITERATIONS: usize = 5;

/// World-wide friction used when a contact material leaves it unspecified.
pub const DEFAULT_FRICTION: f32 = 0.0;

/// World-wide restitution used when a contact material leaves it unspecified.
pub const DEFAULT_RESTITUTION: f32 = 0.0;

/// Restitution of the solid material shared by every course object.
pub const SOLID_RESTITUTION: f32 = 0.1;

/// Falling below this Z coordinate resets the whole game.
pub const GAME_OVER_Z: f32 = -800.0;

/// Player body mass.
pub const PLAYER_MASS: f32 = 3.0;

/// Vertical velocity set on jump.
pub const JUMP_VELOCITY: f32 = 38.0;

/// Linear acceleration increment per tick.
pub const SPEED: f32 = 1.5;

/// Linear acceleration clamp.
pub const SPEED_MAX: f32 = 45.0;

/// Rotational acceleration increment per tick (radians).
pub const ROTATION_SPEED: f32 = 0.007;

/// Rotational acceleration clamp (radians per tick).
pub const ROTATION_SPEED_MAX: f32 = 0.04;

/// Linear acceleration decay factor when no forward/backward key is held.
/// Values between 0.8 and 0.98 feel reasonable.
pub const DAMPING: f32 = 0.9;

/// Rotational acceleration decay factor when no left/right key is held.
pub const ROTATION_DAMPING: f32 = 0.8;

/// Horizontal camera distance behind the player.
pub const CAMERA_OFFSET_H: f32 = 240.0;

/// Vertical camera offset above the player.
pub const CAMERA_OFFSET_V: f32 = 140.0;

/// Player spawn position.
pub const PLAYER_SPAWN: [f32; 3] = [0.0, 0.0, 50.0];

/// Half extents of the player's model bounding box after import scaling.
pub const PLAYER_HALF_EXTENTS: [f32; 3] = [12.0, 8.0, 8.0];

/// Resting tilt of the light-cycle model (radians, 90 degrees).
pub const TILT_REST: f32 = std::f32::consts::FRAC_PI_2;

/// Pitch or roll magnitude (degrees, rounded) at which a grounded player is put upright again.
pub const UPRIGHT_LIMIT_DEG: f32 = 90.0;

/// Number of vertices kept in the light trail.
pub const TRAIL_SIZE: usize = 10_000;

/// Z coordinate trail vertices start at.
pub const TRAIL_START_Z: f32 = 50.0;

/// Floor half width (the floor is a square).
pub const FLOOR_SIZE: f32 = 800.0;

/// Floor half height.
pub const FLOOR_HEIGHT: f32 = 20.0;

/// Palette shared by the course and the player model.
pub mod colors {
    pub const BLACK: u32 = 0x000000;
    pub const WHITE: u32 = 0xffffff;
    pub const GREEN: u32 = 0x0fdb8c;
    pub const CYAN: u32 = 0x38fdd9;
    pub const NEON_BLUE: u32 = 0x4d4dff;
}
