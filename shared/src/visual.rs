//! Render-side mesh descriptions.
//!
//! Nothing here knows about a particular renderer. A [`VisualMesh`] is a small scene-graph
//! tree that a [`crate::scene::RenderScene`] turns into real meshes, and whose world pose
//! the physics binding keeps in step with its rigid body.

use crate::constants::colors;
use crate::shape::ShapeDef;
use crate::types::{Quat, Vec3};

/// Stable identity of a visual inside the render scene.
///
/// Unlike `VisualMesh::visual_id` (a registry index that shifts on removal) a key never
/// changes for the lifetime of the visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshKey(pub u64);

/// Hands out mesh keys, starting at 1. Each physics binding owns one.
#[derive(Debug, Default)]
pub struct MeshKeys {
    last: u64,
}

impl MeshKeys {
    pub fn allocate(&mut self) -> MeshKey {
        self.last += 1;
        MeshKey(self.last)
    }
}

/// Lambert-style surface description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshMaterial {
    /// 0xRRGGBB
    pub color: u32,
    pub opacity: f32,
    pub transparent: bool,
    pub flat_shading: bool,
}

impl MeshMaterial {
    pub fn lambert(color: u32) -> Self {
        Self {
            color,
            opacity: 1.0,
            transparent: false,
            flat_shading: false,
        }
    }

    pub fn flat(color: u32) -> Self {
        Self {
            flat_shading: true,
            ..Self::lambert(color)
        }
    }

    /// Split into linear-ish `[r, g, b]` in `0.0..=1.0`.
    pub fn rgb(&self) -> [f32; 3] {
        let r = ((self.color >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.color >> 8) & 0xff) as f32 / 255.0;
        let b = (self.color & 0xff) as f32 / 255.0;
        [r, g, b]
    }
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self::lambert(colors::WHITE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Transform-only node.
    Group,
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    /// Finite rectangle in the local XY plane.
    Plane { width: f32, height: f32 },
    /// Full extents (not half-extents).
    Cuboid { width: f32, height: f32, depth: f32 },
    /// Imported model, already parsed by the asset loader; only its bounds are known here.
    Model { name: String, half_extents: Vec3 },
    /// Line grid in the local XY plane, `size` is the full width.
    Grid { size: f32, divisions: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub geometry: Geometry,
    pub material: Option<MeshMaterial>,
    pub offset: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn new(geometry: Geometry, material: Option<MeshMaterial>) -> Self {
        Self {
            geometry,
            material,
            offset: Vec3::zeros(),
            orientation: Quat::identity(),
            scale: Vec3::repeat(1.0),
            cast_shadow: false,
            receive_shadow: false,
            children: Vec::new(),
        }
    }

    pub fn group(children: Vec<VisualNode>) -> Self {
        Self {
            children,
            ..Self::new(Geometry::Group, None)
        }
    }

    pub fn with_child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Cast and receive shadows on this node, its children and grandchildren.
    pub fn enable_shadows(&mut self) {
        self.cast_shadow = true;
        self.receive_shadow = true;
        for child in &mut self.children {
            child.cast_shadow = true;
            child.receive_shadow = true;
            for grandchild in &mut child.children {
                grandchild.cast_shadow = true;
                grandchild.receive_shadow = true;
            }
        }
    }

    /// Depth-first count of nodes in this tree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(VisualNode::node_count).sum::<usize>()
    }
}

/// A top-level scene object paired with at most one rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualMesh {
    pub key: MeshKey,
    /// Index of the paired body in the registry, `None` while unregistered.
    pub visual_id: Option<usize>,
    pub position: Vec3,
    pub orientation: Quat,
    pub root: VisualNode,
}

impl VisualMesh {
    pub fn new(key: MeshKey, root: VisualNode) -> Self {
        Self {
            key,
            visual_id: None,
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            root,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }
}

const SPHERE_WIDTH_SEGMENTS: u32 = 8;
const SPHERE_HEIGHT_SEGMENTS: u32 = 6;
const PLANE_GEOMETRY_SIZE: f32 = 100.0;
const PLANE_SCALE: f32 = 1000.0;

/// Convert a physics shape into its visual tree.
pub fn shape_to_mesh(shape: &ShapeDef, material: Option<MeshMaterial>) -> VisualNode {
    let mut node = match shape {
        ShapeDef::Sphere { radius } => VisualNode::new(
            Geometry::Sphere {
                radius: *radius,
                width_segments: SPHERE_WIDTH_SEGMENTS,
                height_segments: SPHERE_HEIGHT_SEGMENTS,
            },
            material,
        ),

        // Planes are infinite; draw a very large square two groups deep.
        ShapeDef::Plane => {
            let ground = VisualNode::new(
                Geometry::Plane {
                    width: PLANE_GEOMETRY_SIZE,
                    height: PLANE_GEOMETRY_SIZE,
                },
                material,
            )
            .with_scale(Vec3::repeat(PLANE_SCALE));
            VisualNode::group(vec![VisualNode::group(vec![ground])])
        }

        ShapeDef::Box { half_extents } => VisualNode::new(
            Geometry::Cuboid {
                width: half_extents.x * 2.0,
                height: half_extents.y * 2.0,
                depth: half_extents.z * 2.0,
            },
            material,
        ),

        // Children are converted without the parent's material.
        ShapeDef::Compound(children) => VisualNode::group(
            children
                .iter()
                .map(|child| {
                    shape_to_mesh(&child.shape, None)
                        .with_offset(child.offset)
                        .with_orientation(child.orientation)
                })
                .collect(),
        ),
    };

    node.enable_shadows();
    node
}
