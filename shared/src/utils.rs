use crate::types::{Quat, Vec2, Vec3, up};
use rand::Rng;

/// Polar to Cartesian on the XY plane: `x = length * cos(direction)`, `y = length * sin(direction)`.
#[inline]
pub fn polar_to_cartesian(length: f32, direction: f32) -> Vec2 {
    Vec2::new(length * direction.cos(), length * direction.sin())
}

#[inline]
pub fn rad_to_deg(radians: f32) -> f32 {
    radians * (180.0 / std::f32::consts::PI)
}

#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Uniform float in `[min, min + max)`.
///
/// `max` is a span, not an upper bound.
pub fn random<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    rng.random::<f32>() * max + min
}

/// Integer variant of [`random`]: `floor(r * (max + 1)) + min` for `r` in `[0, 1)`.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    (rng.random::<f64>() * (f64::from(max) + 1.0)).floor() as i32 + min
}

/// Euler angles of `q` in X-Y-Z order (rotation matrix `Rx * Ry * Rz`).
///
/// `z` is the heading for a Z-up body. Near gimbal lock (`|m13| ~ 1`) `z` is reported as 0.
pub fn euler_xyz(q: &Quat) -> Vec3 {
    let m = q.to_rotation_matrix();
    let m = m.matrix();

    let m13 = m[(0, 2)].clamp(-1.0, 1.0);
    let y = m13.asin();

    if m13.abs() < 0.999_999_9 {
        let x = (-m[(1, 2)]).atan2(m[(2, 2)]);
        let z = (-m[(0, 1)]).atan2(m[(0, 0)]);
        Vec3::new(x, y, z)
    } else {
        let x = m[(2, 1)].atan2(m[(1, 1)]);
        Vec3::new(x, y, 0.0)
    }
}

/// Pure rotation about the world up axis.
#[inline]
pub fn yaw_rotation(heading: f32) -> Quat {
    Quat::from_axis_angle(&up(), heading)
}
