//! Obstacle courses.
//!
//! A course is static data: a floor, a list of blocks and a grid drawn on top of the floor.
//! Blocks with mass 0 are fixed, the rest can be pushed around.

use crate::config::{LevelKind, LevelSettings};
use crate::constants::{SOLID_RESTITUTION, colors};
use crate::error::{CourseError, Result};
use crate::physics::{PhysicsBinding, PhysicsMaterial, RigidBodyOptions};
use crate::scene::RenderScene;
use crate::shape::ShapeDef;
use crate::types::{Vec3, vec3};
use crate::visual::{Geometry, MeshKey, MeshMaterial, VisualMesh, VisualNode};
use rapier3d::prelude::RigidBodyHandle;

/// Grid height above the floor surface.
const GRID_Z: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    half_extents: [f32; 3],
    mass: f32,
    position: [f32; 3],
}

const fn block(half_extents: [f32; 3], mass: f32, position: [f32; 3]) -> Block {
    Block {
        half_extents,
        mass,
        position,
    }
}

const STAIRCASE: [Block; 5] = [
    block([30.0, 30.0, 30.0], 0.0, [-240.0, -200.0, 29.0]),
    block([30.0, 30.0, 30.0], 0.0, [-300.0, -260.0, 90.0]),
    block([30.0, 30.0, 30.0], 0.0, [-180.0, -200.0, 150.0]),
    block([30.0, 30.0, 30.0], 0.0, [-120.0, -140.0, 210.0]),
    block([30.0, 30.0, 30.0], 0.0, [-60.0, -80.0, 270.0]),
];

const MOVABLE: [Block; 8] = [
    block([20.0, 20.0, 20.0], 1.0, [-320.0, 0.0, 20.0]),
    block([20.0, 20.0, 20.0], 0.0, [-80.0, -180.0, 90.0]),
    block([100.0, 100.0, 2.0], 0.0, [140.0, -420.0, 175.0]),
    block([20.0, 20.0, 20.0], 1.0, [90.0, -420.0, 200.0]),
    block([45.0, 45.0, 5.0], 0.0, [400.0, -420.0, 285.0]),
    // Pillar standing on the ledge; knock it over to bridge the gap.
    block([10.0, 25.0, 230.0], 2.0, [402.0, -420.0, 520.0]),
    block([45.0, 45.0, 5.0], 0.0, [900.0, -420.0, 285.0]),
    block([30.0, 30.0, 30.0], 0.0, [900.0, -110.0, 285.0]),
];

fn blocks(kind: LevelKind) -> &'static [Block] {
    match kind {
        LevelKind::Staircase => &STAIRCASE,
        LevelKind::Movable => &MOVABLE,
    }
}

pub struct Level {
    settings: LevelSettings,
    solid_material: PhysicsMaterial,
    floor: RigidBodyHandle,
    blocks: Vec<RigidBodyHandle>,
    grid: MeshKey,
}

impl Level {
    pub fn create(
        settings: LevelSettings,
        physics: &mut PhysicsBinding,
        scene: &mut dyn RenderScene,
    ) -> Result<Self> {
        let solid = physics.new_material("solidMaterial");
        let solid_material =
            physics.create_physics_material(Some(solid), Some(0.0), Some(SOLID_RESTITUTION));

        let floor = physics
            .create_rigid_body(
                RigidBodyOptions::new(
                    ShapeDef::cuboid(
                        settings.floor_size,
                        settings.floor_size,
                        settings.floor_height,
                    ),
                    0.0,
                    Vec3::new(0.0, 0.0, -settings.floor_height),
                )
                .with_mesh_material(MeshMaterial::lambert(colors::BLACK))
                .with_physics_material(solid_material),
                scene,
            )?
            .ok_or(CourseError::NotRegistered("floor"))?
            .body;

        let mut handles = Vec::new();
        for b in blocks(settings.kind) {
            let created = physics
                .create_rigid_body(
                    RigidBodyOptions::new(
                        ShapeDef::Box {
                            half_extents: vec3(b.half_extents),
                        },
                        b.mass,
                        vec3(b.position),
                    )
                    .with_mesh_material(MeshMaterial::lambert(colors::CYAN))
                    .with_physics_material(solid_material),
                    scene,
                )?
                .ok_or(CourseError::NotRegistered("block"))?;
            handles.push(created.body);
        }

        let grid = VisualMesh::new(
            physics.next_mesh_key(),
            VisualNode::new(
                Geometry::Grid {
                    size: settings.floor_size,
                    divisions: settings.grid_divisions,
                },
                None,
            ),
        )
        .at(Vec3::new(0.0, 0.0, GRID_Z));
        scene.add(&grid);

        log::info!(
            "{:?} course built with {} blocks",
            settings.kind,
            handles.len()
        );

        Ok(Self {
            settings,
            solid_material,
            floor,
            blocks: handles,
            grid: grid.key,
        })
    }

    pub fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    pub fn solid_material(&self) -> PhysicsMaterial {
        self.solid_material
    }

    pub fn floor(&self) -> RigidBodyHandle {
        self.floor
    }

    pub fn blocks(&self) -> &[RigidBodyHandle] {
        &self.blocks
    }

    pub fn grid(&self) -> MeshKey {
        self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsSettings;
    use crate::scene::HeadlessScene;

    fn build(kind: LevelKind) -> (PhysicsBinding, HeadlessScene, Level) {
        let mut scene = HeadlessScene::new();
        let mut physics = PhysicsBinding::new(PhysicsSettings::default());
        let settings = LevelSettings {
            kind,
            ..LevelSettings::default()
        };
        let level = Level::create(settings, &mut physics, &mut scene).unwrap();
        (physics, scene, level)
    }

    #[test]
    fn staircase_is_all_static() {
        let (physics, scene, level) = build(LevelKind::Staircase);
        assert_eq!(physics.body_count(), 6);
        assert_eq!(level.blocks().len(), 5);
        assert!(
            physics
                .bodies()
                .iter()
                .all(|h| physics.rigid_body(*h).unwrap().is_fixed())
        );
        // Registered bodies plus the grid.
        assert_eq!(scene.len(), 7);
        assert!(scene.contains(level.grid()));
    }

    #[test]
    fn floor_top_is_at_zero() {
        let (physics, _, level) = build(LevelKind::Staircase);
        assert_eq!(
            physics.position(level.floor()),
            Some(Vec3::new(0.0, 0.0, -20.0))
        );
        let aabb = physics.aabbs()[0];
        assert!(aabb.maxs.z.abs() < 1.0e-3);
        assert!((aabb.extents().x - 1600.0).abs() < 1.0e-2);
    }

    #[test]
    fn movable_course_has_pushable_boxes() {
        let (physics, _, level) = build(LevelKind::Movable);
        let dynamic = level
            .blocks()
            .iter()
            .filter(|h| physics.rigid_body(**h).unwrap().is_dynamic())
            .count();
        assert_eq!(dynamic, 3);

        let pillar = level.blocks()[5];
        let mass = physics.collider(pillar).unwrap().mass();
        assert!((mass - 2.0).abs() < 1.0e-4);
    }

    #[test]
    fn solid_material_bounces_slightly() {
        let (physics, _, level) = build(LevelKind::Staircase);
        let contact = physics
            .materials()
            .contact(level.solid_material(), physics.player_material())
            .unwrap();
        assert_eq!(contact.restitution, SOLID_RESTITUTION);
        assert_eq!(contact.friction, 0.0);
    }
}
