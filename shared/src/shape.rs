use crate::error::{CourseError, Result};
use crate::types::{Iso, Quat, Vec3};
use nalgebra::Translation3;
use rapier3d::parry::shape::{Shape, TypedShape};
use rapier3d::prelude::*;

/// Collider shapes a course body can carry.
///
/// Every shape has a visual counterpart (see [`crate::visual::shape_to_mesh`]); the match
/// there is exhaustive so a new variant cannot be added without a mesh for it.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDef {
    /// Ball centered on the body origin.
    Sphere { radius: f32 },

    /// Infinite plane through the body origin with local normal +Z.
    Plane,

    /// Box with the given half-extents, centered on the body origin.
    Box { half_extents: Vec3 },

    /// Several shapes rigidly attached to the same body.
    Compound(Vec<ChildShape>),
}

/// A child of a compound shape, placed relative to its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildShape {
    pub shape: ShapeDef,
    pub offset: Vec3,
    pub orientation: Quat,
}

impl ChildShape {
    pub fn new(shape: ShapeDef, offset: Vec3, orientation: Quat) -> Self {
        Self {
            shape,
            offset,
            orientation,
        }
    }

    fn local_iso(&self) -> Iso {
        Iso::from_parts(Translation3::from(self.offset), self.orientation)
    }
}

impl ShapeDef {
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        ShapeDef::Box {
            half_extents: Vec3::new(hx, hy, hz),
        }
    }

    /// Short name of the variant, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ShapeDef::Sphere { .. } => "sphere",
            ShapeDef::Plane => "plane",
            ShapeDef::Box { .. } => "box",
            ShapeDef::Compound(_) => "compound",
        }
    }

    /// Build the rapier collider shape.
    ///
    /// Rapier compounds only hold leaf shapes, so nested compounds are flattened by composing
    /// each level's offset/orientation. Planes are infinite and rejected inside compounds.
    pub fn to_shared_shape(&self) -> Result<SharedShape> {
        match self {
            ShapeDef::Sphere { radius } => Ok(SharedShape::ball(*radius)),
            ShapeDef::Plane => Ok(SharedShape::halfspace(Vec3::z_axis())),
            ShapeDef::Box { half_extents } => Ok(SharedShape::cuboid(
                half_extents.x,
                half_extents.y,
                half_extents.z,
            )),
            ShapeDef::Compound(children) => {
                let mut parts = Vec::new();
                flatten_children(children, Iso::identity(), &mut parts)?;
                if parts.is_empty() {
                    return Err(CourseError::EmptyCompound);
                }
                Ok(SharedShape::compound(parts))
            }
        }
    }

    /// Read a rapier shape back into a `ShapeDef`.
    ///
    /// Fails loudly for shape kinds the course has no visual for.
    pub fn from_shape(shape: &dyn Shape) -> Result<Self> {
        match shape.as_typed_shape() {
            TypedShape::Ball(ball) => Ok(ShapeDef::Sphere {
                radius: ball.radius,
            }),
            TypedShape::HalfSpace(_) => Ok(ShapeDef::Plane),
            TypedShape::Cuboid(cuboid) => Ok(ShapeDef::Box {
                half_extents: cuboid.half_extents,
            }),
            TypedShape::Compound(compound) => {
                let children = compound
                    .shapes()
                    .iter()
                    .map(|(iso, child)| {
                        Ok(ChildShape {
                            shape: Self::from_shape(child.0.as_ref())?,
                            offset: iso.translation.vector,
                            orientation: iso.rotation,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ShapeDef::Compound(children))
            }
            _ => Err(CourseError::UnsupportedShape {
                kind: format!("{:?}", shape.shape_type()),
            }),
        }
    }
}

fn flatten_children(
    children: &[ChildShape],
    parent: Iso,
    out: &mut Vec<(Iso, SharedShape)>,
) -> Result<()> {
    for child in children {
        let iso = parent * child.local_iso();
        match &child.shape {
            ShapeDef::Plane => {
                return Err(CourseError::InvalidCompoundChild { kind: "plane" });
            }
            ShapeDef::Compound(grandchildren) => flatten_children(grandchildren, iso, out)?,
            leaf => out.push((iso, leaf.to_shared_shape()?)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_round_trips_through_rapier() {
        let def = ShapeDef::cuboid(30.0, 20.0, 10.0);
        let shared = def.to_shared_shape().unwrap();
        assert_eq!(ShapeDef::from_shape(shared.0.as_ref()).unwrap(), def);
    }

    #[test]
    fn nested_compounds_are_flattened_with_composed_offsets() {
        let inner = ShapeDef::Compound(vec![ChildShape::new(
            ShapeDef::Sphere { radius: 1.0 },
            Vec3::new(0.0, 0.0, 2.0),
            Quat::identity(),
        )]);
        let outer = ShapeDef::Compound(vec![
            ChildShape::new(ShapeDef::cuboid(1.0, 1.0, 1.0), Vec3::zeros(), Quat::identity()),
            ChildShape::new(inner, Vec3::new(5.0, 0.0, 0.0), Quat::identity()),
        ]);

        let shared = outer.to_shared_shape().unwrap();
        let compound = shared.as_compound().unwrap();
        assert_eq!(compound.shapes().len(), 2);

        let (iso, _) = &compound.shapes()[1];
        assert!((iso.translation.vector - Vec3::new(5.0, 0.0, 2.0)).norm() < 1.0e-6);
    }

    #[test]
    fn plane_inside_compound_is_rejected() {
        let def = ShapeDef::Compound(vec![ChildShape::new(
            ShapeDef::Plane,
            Vec3::zeros(),
            Quat::identity(),
        )]);
        assert!(matches!(
            def.to_shared_shape(),
            Err(CourseError::InvalidCompoundChild { kind: "plane" })
        ));
    }

    #[test]
    fn empty_compound_is_rejected() {
        assert!(matches!(
            ShapeDef::Compound(Vec::new()).to_shared_shape(),
            Err(CourseError::EmptyCompound)
        ));
    }

    #[test]
    fn unsupported_rapier_shapes_fail_loudly() {
        let capsule = SharedShape::capsule_z(1.0, 0.5);
        let err = ShapeDef::from_shape(capsule.0.as_ref()).unwrap_err();
        assert!(matches!(err, CourseError::UnsupportedShape { .. }));
    }
}
