//! Bevy side of the render scene.
//!
//! [`BevyScene`] is handed to the game as its `RenderScene`. It only queues work; the systems
//! in this module turn the queue into entities once per frame and mirror the latest visual
//! poses into `Transform`s.

use bevy::{
    light::{NotShadowCaster, NotShadowReceiver},
    platform::collections::HashMap,
    prelude::*,
};
use course_shared::{Geometry, MeshKey, MeshMaterial, RenderScene, VisualMesh, VisualNode};
use nalgebra::{UnitQuaternion, Vector3};

/// Colour of grid lines (no material is attached to grids).
const GRID_COLOR: Color = Color::srgb(0.53, 0.53, 0.53);

const POINT_LIGHT_Z: f32 = 500.0;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<BevyScene>();
    app.init_resource::<MeshEntities>();
    app.add_systems(Startup, spawn_point_light);
    app.add_systems(
        Update,
        (apply_scene_ops, sync_poses).chain().in_set(SceneSync),
    );
    app.add_systems(PostUpdate, draw_grids);
}

/// Systems that turn queued scene work into entities. Game logic runs before this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneSync;

enum SceneOp {
    Add(Box<VisualMesh>),
    Remove(MeshKey),
    Clear,
}

/// Where the game last asked the camera to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTarget {
    pub position: Vec3,
    pub look_at: Vec3,
}

#[derive(Resource, Default)]
pub struct BevyScene {
    ops: Vec<SceneOp>,
    poses: Vec<VisualMesh>,
    camera: Option<CameraTarget>,
    frames: u64,
}

impl BevyScene {
    fn take_ops(&mut self) -> Vec<SceneOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn camera(&self) -> Option<CameraTarget> {
        self.camera
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderScene for BevyScene {
    fn add(&mut self, mesh: &VisualMesh) {
        self.ops.push(SceneOp::Add(Box::new(mesh.clone())));
    }

    fn remove(&mut self, key: MeshKey) {
        self.ops.push(SceneOp::Remove(key));
    }

    fn clear(&mut self) {
        self.ops.push(SceneOp::Clear);
        self.poses.clear();
    }

    fn set_camera(&mut self, position: Vector3<f32>, look_at: Vector3<f32>) {
        self.camera = Some(CameraTarget {
            position: to_vec3(&position),
            look_at: to_vec3(&look_at),
        });
    }

    fn render(&mut self, visuals: &[VisualMesh]) {
        self.poses = visuals.to_vec();
        self.frames += 1;
    }
}

/// Live entity of every visual added to the scene.
#[derive(Resource, Default)]
pub struct MeshEntities(pub HashMap<MeshKey, Entity>);

/// Top-level entity of a visual. `children` are the entities of the root node's children,
/// whose orientation the game may change at runtime.
#[derive(Component, Debug)]
struct VisualRoot {
    children: Vec<Entity>,
}

#[derive(Component, Debug, Clone, Copy)]
struct GridLines {
    size: f32,
    divisions: u32,
}

pub fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_quat(q: &UnitQuaternion<f32>) -> Quat {
    let c = q.quaternion().coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

fn node_transform(node: &VisualNode) -> Transform {
    Transform {
        translation: to_vec3(&node.offset),
        rotation: to_quat(&node.orientation),
        scale: to_vec3(&node.scale),
    }
}

fn build_mesh(geometry: &Geometry, flat_shading: bool) -> Option<Mesh> {
    let mut mesh = match geometry {
        Geometry::Group | Geometry::Grid { .. } => return None,
        Geometry::Sphere {
            radius,
            width_segments,
            height_segments,
        } => Sphere::new(*radius)
            .mesh()
            .uv(*width_segments, *height_segments),
        Geometry::Plane { width, height } => Mesh::from(Plane3d::new(
            Vec3::Z,
            Vec2::new(width / 2.0, height / 2.0),
        )),
        Geometry::Cuboid {
            width,
            height,
            depth,
        } => Mesh::from(Cuboid::new(*width, *height, *depth)),
        // Imported models are stood in for by their bounds.
        Geometry::Model { half_extents, .. } => {
            Mesh::from(Cuboid::from_size(to_vec3(half_extents) * 2.0))
        }
    };
    if flat_shading {
        mesh.duplicate_vertices();
        mesh.compute_flat_normals();
    }
    Some(mesh)
}

fn standard_material(material: &MeshMaterial) -> StandardMaterial {
    let [r, g, b] = material.rgb();
    StandardMaterial {
        base_color: Color::srgba(r, g, b, material.opacity),
        alpha_mode: if material.transparent {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        perceptual_roughness: 1.0,
        metallic: 0.0,
        ..default()
    }
}

/// Spawn one node without its children. A node without a material uses `inherited`.
fn spawn_node(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    node: &VisualNode,
    inherited: Option<MeshMaterial>,
) -> Entity {
    let surface = node.material.or(inherited).unwrap_or_default();

    let mut entity = commands.spawn((node_transform(node), Visibility::default()));
    if let Some(mesh) = build_mesh(&node.geometry, surface.flat_shading) {
        entity.insert((
            Mesh3d(meshes.add(mesh)),
            MeshMaterial3d(materials.add(standard_material(&surface))),
        ));
    }
    match &node.geometry {
        Geometry::Model { name, .. } => {
            entity.insert(Name::new(name.clone()));
        }
        Geometry::Grid { size, divisions } => {
            entity.insert(GridLines {
                size: *size,
                divisions: *divisions,
            });
        }
        _ => {}
    }
    if !node.cast_shadow {
        entity.insert(NotShadowCaster);
    }
    if !node.receive_shadow {
        entity.insert(NotShadowReceiver);
    }
    entity.id()
}

fn spawn_tree(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    node: &VisualNode,
    inherited: Option<MeshMaterial>,
) -> Entity {
    let id = spawn_node(commands, meshes, materials, node, inherited);
    let material = node.material.or(inherited);
    for child in &node.children {
        let child = spawn_tree(commands, meshes, materials, child, material);
        commands.entity(id).add_child(child);
    }
    id
}

fn spawn_visual(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    visual: &VisualMesh,
) -> Entity {
    let root = spawn_node(commands, meshes, materials, &visual.root, None);
    let children = visual
        .root
        .children
        .iter()
        .map(|child| spawn_tree(commands, meshes, materials, child, visual.root.material))
        .collect::<Vec<_>>();
    commands.entity(root).add_children(&children);

    commands
        .spawn((
            Transform {
                translation: to_vec3(&visual.position),
                rotation: to_quat(&visual.orientation),
                ..default()
            },
            Visibility::default(),
            VisualRoot { children },
        ))
        .add_child(root)
        .id()
}

fn apply_scene_ops(
    mut commands: Commands,
    mut scene: ResMut<BevyScene>,
    mut entities: ResMut<MeshEntities>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for op in scene.take_ops() {
        match op {
            SceneOp::Add(visual) => {
                if let Some(stale) = entities.0.remove(&visual.key) {
                    commands.entity(stale).despawn();
                }
                let entity = spawn_visual(&mut commands, &mut meshes, &mut materials, &visual);
                entities.0.insert(visual.key, entity);
            }
            SceneOp::Remove(key) => {
                if let Some(entity) = entities.0.remove(&key) {
                    commands.entity(entity).despawn();
                }
            }
            SceneOp::Clear => {
                for (_, entity) in entities.0.drain() {
                    commands.entity(entity).despawn();
                }
            }
        }
    }
}

fn sync_poses(
    scene: Res<BevyScene>,
    entities: Res<MeshEntities>,
    roots: Query<&VisualRoot>,
    mut transforms: Query<&mut Transform>,
) {
    for visual in &scene.poses {
        let Some(&entity) = entities.0.get(&visual.key) else {
            continue;
        };
        if let Ok(mut transform) = transforms.get_mut(entity) {
            transform.translation = to_vec3(&visual.position);
            transform.rotation = to_quat(&visual.orientation);
        }
        let Ok(root) = roots.get(entity) else {
            continue;
        };
        for (child, node) in root.children.iter().zip(&visual.root.children) {
            if let Ok(mut transform) = transforms.get_mut(*child) {
                transform.rotation = to_quat(&node.orientation);
            }
        }
    }
}

fn draw_grids(mut gizmos: Gizmos, grids: Query<(&GlobalTransform, &GridLines)>) {
    for (transform, grid) in &grids {
        let divisions = grid.divisions.max(1);
        let spacing = grid.size / divisions as f32;
        gizmos.grid(
            Isometry3d::new(transform.translation(), transform.rotation()),
            UVec2::splat(divisions),
            Vec2::splat(spacing),
            GRID_COLOR,
        );
    }
}

fn spawn_point_light(mut commands: Commands) {
    commands.spawn((
        PointLight {
            intensity: 4.0e9,
            range: 5000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, POINT_LIGHT_Z),
    ));
}
