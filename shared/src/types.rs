/*!
Math aliases shared by every module.

The course is Z-up, matching the physics world: +Z is "up", headings are
rotations about +Z and the ground plane is XY.
*/

use nalgebra as na;

pub type Vec2 = na::Vector2<f32>;
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World up axis.
#[inline]
pub fn up() -> na::Unit<Vec3> {
    Vec3::z_axis()
}

/// Convert a config triple into a vector.
#[inline]
pub fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}
