//! Physics/visual binding layer.
//!
//! [`PhysicsBinding`] owns a rapier world together with a registry of body/visual pairs:
//! - `bodies[i]` and `visuals[i]` always describe the same entity.
//! - Each rigid body stores its registry index in `user_data`, each visual in `visual_id`.
//! - Removal compacts the registry and re-indexes every entity after the removed one.
//!
//! Every [`PhysicsBinding::update_physics`] call copies the visual pose into its body, steps
//! the world by one fixed timestep and writes the resulting body pose back to the visual.
//! Mutators that move a body through the binding update both sides, so the copy is a no-op
//! unless something moved a visual directly.

mod material;

pub use material::{ContactMaterial, MaterialTable, PhysicsMaterial};

use crate::config::PhysicsSettings;
use crate::error::Result;
use crate::scene::RenderScene;
use crate::shape::ShapeDef;
use crate::types::{Quat, Vec3};
use crate::visual::{MeshKey, MeshKeys, MeshMaterial, VisualMesh, VisualNode, shape_to_mesh};
use nalgebra::{Translation3, Unit};
use rapier3d::prelude::*;

/// Manifold points closer than this count as touching.
const CONTACT_TOLERANCE: f32 = 0.01;

/// Bounds beyond this are treated as unbounded (half-spaces report huge finite boxes).
const MAX_BOUNDS: f32 = 1.0e9;

/// Two registered bodies currently in contact, by registry index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPair {
    pub a: usize,
    pub b: usize,
}

impl ContactPair {
    pub fn involves(&self, index: usize) -> bool {
        self.a == index || self.b == index
    }

    /// The other side of the pair, if `index` is part of it.
    pub fn partner(&self, index: usize) -> Option<usize> {
        if self.a == index {
            Some(self.b)
        } else if self.b == index {
            Some(self.a)
        } else {
            None
        }
    }
}

/// A built but not yet registered body.
pub struct BodyDesc {
    pub body: RigidBody,
    pub collider: Option<Collider>,
}

/// Handles of a registered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyVisual {
    pub body: RigidBodyHandle,
    pub mesh: MeshKey,
}

/// World-space bounds of one registered body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyAabb {
    pub index: usize,
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl BodyAabb {
    pub fn center(&self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        self.maxs - self.mins
    }
}

/// Everything needed to create a registered body in one call.
#[derive(Debug, Clone)]
pub struct RigidBodyOptions {
    pub shape: ShapeDef,
    /// 0 makes the body static.
    pub mass: f32,
    pub position: Vec3,
    /// Axis-angle rotation applied at creation.
    pub rotation: Option<(Unit<Vec3>, f32)>,
    pub mesh_material: Option<MeshMaterial>,
    pub physics_material: Option<PhysicsMaterial>,
    /// Used instead of a mesh derived from `shape`.
    pub custom_mesh: Option<VisualNode>,
    pub can_sleep: bool,
}

impl RigidBodyOptions {
    pub fn new(shape: ShapeDef, mass: f32, position: Vec3) -> Self {
        Self {
            shape,
            mass,
            position,
            rotation: None,
            mesh_material: None,
            physics_material: None,
            custom_mesh: None,
            can_sleep: true,
        }
    }

    pub fn with_rotation(mut self, axis: Unit<Vec3>, radians: f32) -> Self {
        self.rotation = Some((axis, radians));
        self
    }

    pub fn with_mesh_material(mut self, material: MeshMaterial) -> Self {
        self.mesh_material = Some(material);
        self
    }

    pub fn with_physics_material(mut self, material: PhysicsMaterial) -> Self {
        self.physics_material = Some(material);
        self
    }

    pub fn with_custom_mesh(mut self, mesh: VisualNode) -> Self {
        self.custom_mesh = Some(mesh);
        self
    }

    pub fn never_sleeping(mut self) -> Self {
        self.can_sleep = false;
        self
    }
}

pub struct PhysicsBinding {
    settings: PhysicsSettings,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    bodies: Vec<RigidBodyHandle>,
    visuals: Vec<VisualMesh>,
    mesh_keys: MeshKeys,

    materials: MaterialTable,
    player_material: PhysicsMaterial,

    contacts: Vec<ContactPair>,
    simulated_time: f64,
    steps: u64,
}

impl PhysicsBinding {
    pub fn new(settings: PhysicsSettings) -> Self {
        let integration_parameters = IntegrationParameters {
            dt: settings.timestep,
            num_solver_iterations: settings.solver_iterations.max(1),
            ..IntegrationParameters::default()
        };

        let mut materials = MaterialTable::default();
        let player_material = materials.create("playerMaterial");

        log::debug!(
            "physics world ready: gravity z {}, dt {}, {} solver iterations",
            settings.gravity_z,
            settings.timestep,
            settings.solver_iterations
        );

        Self {
            settings,
            gravity: vector![0.0, 0.0, settings.gravity_z],
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            bodies: Vec::new(),
            visuals: Vec::new(),
            mesh_keys: MeshKeys::default(),
            materials,
            player_material,
            contacts: Vec::new(),
            simulated_time: 0.0,
            steps: 0,
        }
    }

    /// Replace the world with a fresh one and empty the registry.
    ///
    /// Meshes still in the scene are not touched; call [`PhysicsBinding::destroy`] first.
    pub fn setup(&mut self) {
        *self = Self::new(self.settings);
    }

    /// Remove every body from the world and every visual from the scene.
    pub fn destroy(&mut self, scene: &mut dyn RenderScene) {
        self.remove_all_visuals(scene);
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    // ---- registry ----

    /// Register `desc` together with a visual and add both to the world and the scene.
    ///
    /// The visual is `custom_mesh` if given, otherwise it is derived from the collider shape.
    /// Returns `Ok(None)` without registering anything when there is neither. A collider
    /// whose shape has no visual counterpart is an error and nothing is registered.
    pub fn add_visual(
        &mut self,
        desc: BodyDesc,
        material: Option<MeshMaterial>,
        custom_mesh: Option<VisualNode>,
        scene: &mut dyn RenderScene,
    ) -> Result<Option<BodyVisual>> {
        let root = match (custom_mesh, &desc.collider) {
            (Some(mesh), _) => mesh,
            (None, Some(collider)) => shape_to_mesh(&ShapeDef::from_shape(collider.shape())?, material),
            (None, None) => {
                log::debug!("body has neither collider nor mesh, not registered");
                return Ok(None);
            }
        };

        let BodyDesc { mut body, collider } = desc;
        let index = self.bodies.len();
        body.user_data = index as u128;

        let mut visual = VisualMesh::new(self.mesh_keys.allocate(), root).at(*body.translation());
        visual.orientation = *body.rotation();
        visual.visual_id = Some(index);

        let handle = self.rigid_body_set.insert(body);
        if let Some(collider) = collider {
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        }

        scene.add(&visual);
        let mesh = visual.key;
        self.bodies.push(handle);
        self.visuals.push(visual);

        log::debug!("registered body {handle:?} at index {index}");
        Ok(Some(BodyVisual { body: handle, mesh }))
    }

    /// Unregister `handle`, remove it from the world and its visual from the scene.
    ///
    /// Returns the detached visual. Bodies that are not registered are ignored.
    pub fn remove_visual(
        &mut self,
        handle: RigidBodyHandle,
        scene: &mut dyn RenderScene,
    ) -> Option<VisualMesh> {
        let Some(index) = self.index_of(handle) else {
            log::debug!("ignoring removal of unregistered body {handle:?}");
            return None;
        };

        self.bodies.remove(index);
        let mut visual = self.visuals.remove(index);
        visual.visual_id = None;
        self.reindex_from(index);

        self.contacts.retain_mut(|c| {
            if c.involves(index) {
                return false;
            }
            if c.a > index {
                c.a -= 1;
            }
            if c.b > index {
                c.b -= 1;
            }
            true
        });

        scene.remove(visual.key);
        self.remove_from_world(handle);

        log::debug!("removed body {handle:?} from index {index}");
        Some(visual)
    }

    pub fn remove_all_visuals(&mut self, scene: &mut dyn RenderScene) {
        let count = self.bodies.len();
        let bodies = std::mem::take(&mut self.bodies);
        let visuals = std::mem::take(&mut self.visuals);
        for (handle, visual) in bodies.into_iter().zip(visuals) {
            scene.remove(visual.key);
            self.remove_from_world(handle);
        }
        self.contacts.clear();
        log::debug!("removed all {count} bodies");
    }

    fn remove_from_world(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.islands,
            &mut self.collider_set,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    fn reindex_from(&mut self, start: usize) {
        for i in start..self.bodies.len() {
            self.visuals[i].visual_id = Some(i);
            if let Some(body) = self.rigid_body_set.get_mut(self.bodies[i]) {
                body.user_data = i as u128;
            }
        }
    }

    /// Registry index of `handle`, if it is registered.
    pub fn index_of(&self, handle: RigidBodyHandle) -> Option<usize> {
        let body = self.rigid_body_set.get(handle)?;
        let index = usize::try_from(body.user_data).ok()?;
        let paired = self.bodies.get(index) == Some(&handle)
            && self.visuals.get(index).and_then(|v| v.visual_id) == Some(index);
        paired.then_some(index)
    }

    pub fn handle_at(&self, index: usize) -> Option<RigidBodyHandle> {
        self.bodies.get(index).copied()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn bodies(&self) -> &[RigidBodyHandle] {
        &self.bodies
    }

    pub fn visuals(&self) -> &[VisualMesh] {
        &self.visuals
    }

    pub fn visual(&self, handle: RigidBodyHandle) -> Option<&VisualMesh> {
        self.index_of(handle).map(|i| &self.visuals[i])
    }

    /// Mutable access to a visual. Pose changes made here reach the body on the next step.
    pub fn visual_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut VisualMesh> {
        self.index_of(handle).map(|i| &mut self.visuals[i])
    }

    pub fn rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// First collider attached to `handle`.
    pub fn collider(&self, handle: RigidBodyHandle) -> Option<&Collider> {
        let body = self.rigid_body_set.get(handle)?;
        body.colliders()
            .first()
            .and_then(|c| self.collider_set.get(*c))
    }

    // ---- simulation ----

    /// Copy visual poses into bodies, advance the world by one fixed timestep and copy the
    /// new body poses back into the visuals.
    pub fn update_physics(&mut self) {
        for (handle, visual) in self.bodies.iter().zip(&self.visuals) {
            let Some(body) = self.rigid_body_set.get_mut(*handle) else {
                continue;
            };
            if *body.translation() != visual.position {
                body.set_translation(visual.position, true);
            }
            if *body.rotation() != visual.orientation {
                body.set_rotation(visual.orientation, true);
            }
        }

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        for (handle, visual) in self.bodies.iter().zip(self.visuals.iter_mut()) {
            if let Some(body) = self.rigid_body_set.get(*handle) {
                visual.position = *body.translation();
                visual.orientation = *body.rotation();
            }
        }

        self.contacts = self.collect_contacts();
        self.simulated_time += f64::from(self.integration_parameters.dt);
        self.steps += 1;
    }

    fn collect_contacts(&self) -> Vec<ContactPair> {
        self.narrow_phase
            .contact_pairs()
            .filter(|pair| {
                pair.manifolds
                    .iter()
                    .any(|m| m.points.iter().any(|p| p.dist <= CONTACT_TOLERANCE))
            })
            .filter_map(|pair| {
                Some(ContactPair {
                    a: self.collider_index(pair.collider1)?,
                    b: self.collider_index(pair.collider2)?,
                })
            })
            .collect()
    }

    fn collider_index(&self, handle: ColliderHandle) -> Option<usize> {
        let parent = self.collider_set.get(handle)?.parent()?;
        self.index_of(parent)
    }

    /// Seconds of simulation advanced so far; grows by exactly one timestep per update.
    pub fn simulated_time(&self) -> f64 {
        self.simulated_time
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Key for a scene object that has no body, such as the level grid.
    pub fn next_mesh_key(&mut self) -> MeshKey {
        self.mesh_keys.allocate()
    }

    // ---- contacts and queries ----

    /// Contact pairs recorded by the last step.
    pub fn contacts(&self) -> &[ContactPair] {
        &self.contacts
    }

    /// Number of recorded contact pairs that involve the body at `index`.
    pub fn get_collisions(&self, index: usize) -> usize {
        self.contacts.iter().filter(|c| c.involves(index)).count()
    }

    /// Registry indices of every body touching the body at `index`.
    pub fn contacts_with(&self, index: usize) -> Vec<usize> {
        self.contacts
            .iter()
            .filter_map(|c| c.partner(index))
            .collect()
    }

    /// Whether a ray cast straight down from `from` hits the body at `index`.
    pub fn ray_down_hits(&self, from: Vec3, index: usize) -> bool {
        let Some(body) = self
            .bodies
            .get(index)
            .and_then(|h| self.rigid_body_set.get(*h))
        else {
            return false;
        };

        let ray = Ray::new(point![from.x, from.y, from.z], vector![0.0, 0.0, -1.0]);
        body.colliders()
            .iter()
            .filter_map(|h| self.collider_set.get(*h))
            .any(|c| c.shape().intersects_ray(c.position(), &ray, Real::MAX))
    }

    /// Finite world bounds of every registered body. Infinite shapes (planes) are skipped.
    pub fn aabbs(&self) -> Vec<BodyAabb> {
        self.bodies
            .iter()
            .enumerate()
            .filter_map(|(index, handle)| {
                let body = self.rigid_body_set.get(*handle)?;
                let mut bounds: Option<(Vec3, Vec3)> = None;
                for collider in body.colliders().iter().filter_map(|h| self.collider_set.get(*h)) {
                    let aabb = collider.compute_aabb();
                    let (mins, maxs) = (aabb.mins.coords, aabb.maxs.coords);
                    bounds = Some(match bounds {
                        Some((lo, hi)) => (lo.inf(&mins), hi.sup(&maxs)),
                        None => (mins, maxs),
                    });
                }
                let (mins, maxs) = bounds?;
                let extents = maxs - mins;
                let usable = mins.iter().chain(maxs.iter()).all(|v| v.abs() < MAX_BOUNDS)
                    && extents.iter().all(|e| *e != 0.0);
                usable.then_some(BodyAabb { index, mins, maxs })
            })
            .collect()
    }

    // ---- creation ----

    /// Build a body from `options` and register it with [`PhysicsBinding::add_visual`].
    pub fn create_rigid_body(
        &mut self,
        options: RigidBodyOptions,
        scene: &mut dyn RenderScene,
    ) -> Result<Option<BodyVisual>> {
        let orientation = options
            .rotation
            .map(|(axis, angle)| Quat::from_axis_angle(&axis, angle))
            .unwrap_or_else(Quat::identity);
        let pose = Isometry::from_parts(Translation3::from(options.position), orientation);

        let builder = if options.mass > 0.0 {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder.pose(pose).can_sleep(options.can_sleep).build();

        let (friction, restitution) = self.coefficients(options.physics_material);
        let mut collider = ColliderBuilder::new(options.shape.to_shared_shape()?)
            .friction(friction)
            .restitution(restitution)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .restitution_combine_rule(CoefficientCombineRule::Max);
        if options.mass > 0.0 {
            collider = collider.mass(options.mass);
        }

        self.add_visual(
            BodyDesc {
                body,
                collider: Some(collider.build()),
            },
            options.mesh_material,
            options.custom_mesh,
            scene,
        )
    }

    /// Material every contact entry is paired with.
    pub fn player_material(&self) -> PhysicsMaterial {
        self.player_material
    }

    pub fn new_material(&mut self, name: &str) -> PhysicsMaterial {
        self.materials.create(name)
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Register how `material` behaves against the player material and return it.
    ///
    /// A fresh material is created when none is given. Zero or missing coefficients fall
    /// back to the world defaults.
    pub fn create_physics_material(
        &mut self,
        material: Option<PhysicsMaterial>,
        friction: Option<f32>,
        restitution: Option<f32>,
    ) -> PhysicsMaterial {
        let material = material.unwrap_or_else(|| self.materials.create("material"));
        let friction = friction
            .filter(|f| *f != 0.0)
            .unwrap_or(self.settings.friction);
        let restitution = restitution
            .filter(|r| *r != 0.0)
            .unwrap_or(self.settings.restitution);

        self.materials.add_contact(ContactMaterial {
            a: material,
            b: self.player_material,
            friction,
            restitution,
        });
        material
    }

    fn coefficients(&self, material: Option<PhysicsMaterial>) -> (f32, f32) {
        material
            .and_then(|m| self.materials.contact(m, self.player_material))
            .map(|c| (c.friction, c.restitution))
            .unwrap_or((self.settings.friction, self.settings.restitution))
    }

    // ---- body mutators (body and visual stay in step) ----

    pub fn position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|b| *b.translation())
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.rigid_body_set.get(handle).map(|b| *b.rotation())
    }

    pub fn linvel(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|b| *b.linvel())
    }

    pub fn angvel(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|b| *b.angvel())
    }

    pub fn set_position(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(position, true);
        }
        if let Some(visual) = self.visual_mut(handle) {
            visual.position = position;
        }
    }

    pub fn set_rotation(&mut self, handle: RigidBodyHandle, rotation: Quat) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_rotation(rotation, true);
        }
        if let Some(visual) = self.visual_mut(handle) {
            visual.orientation = rotation;
        }
    }

    /// Pre-multiply the body orientation by a rotation of `radians` about the world `axis`.
    pub fn rotate_on_axis(&mut self, handle: RigidBodyHandle, axis: &Unit<Vec3>, radians: f32) {
        if let Some(current) = self.rotation(handle) {
            self.set_rotation(handle, Quat::from_axis_angle(axis, radians) * current);
        }
    }

    pub fn set_linvel(&mut self, handle: RigidBodyHandle, linvel: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_linvel(linvel, true);
        }
    }

    pub fn set_vertical_velocity(&mut self, handle: RigidBodyHandle, vz: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let mut linvel = *body.linvel();
            linvel.z = vz;
            body.set_linvel(linvel, true);
        }
    }

    pub fn set_angular_velocity_z(&mut self, handle: RigidBodyHandle, wz: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let mut angvel = *body.angvel();
            angvel.z = wz;
            body.set_angvel(angvel, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::colors;
    use crate::error::CourseError;
    use crate::scene::HeadlessScene;
    use crate::types::up;
    use crate::utils::euler_xyz;

    fn binding() -> PhysicsBinding {
        PhysicsBinding::new(PhysicsSettings::default())
    }

    fn add_box(
        physics: &mut PhysicsBinding,
        scene: &mut HeadlessScene,
        mass: f32,
        position: Vec3,
    ) -> RigidBodyHandle {
        physics
            .create_rigid_body(
                RigidBodyOptions::new(ShapeDef::cuboid(10.0, 10.0, 10.0), mass, position)
                    .with_mesh_material(MeshMaterial::lambert(colors::CYAN)),
                scene,
            )
            .unwrap()
            .unwrap()
            .body
    }

    #[test]
    fn world_uses_configured_step_settings() {
        let settings = PhysicsSettings {
            solver_iterations: 9,
            ..PhysicsSettings::default()
        };
        let physics = PhysicsBinding::new(settings);
        assert_eq!(physics.integration_parameters.num_solver_iterations, 9);
        assert_eq!(physics.integration_parameters.dt, settings.timestep);
    }

    #[test]
    fn mesh_keys_belong_to_the_binding() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let a = add_box(&mut physics, &mut scene, 1.0, Vec3::zeros());
        let b = add_box(&mut physics, &mut scene, 1.0, Vec3::new(50.0, 0.0, 0.0));
        let keys = [
            physics.visual(a).unwrap().key,
            physics.visual(b).unwrap().key,
            physics.next_mesh_key(),
        ];
        assert_eq!(keys, [MeshKey(1), MeshKey(2), MeshKey(3)]);

        // A fresh binding starts over regardless of what other bindings handed out.
        assert_eq!(binding().next_mesh_key(), MeshKey(1));
    }

    fn add_floor(physics: &mut PhysicsBinding, scene: &mut HeadlessScene) -> RigidBodyHandle {
        physics
            .create_rigid_body(
                RigidBodyOptions::new(
                    ShapeDef::cuboid(800.0, 800.0, 20.0),
                    0.0,
                    Vec3::new(0.0, 0.0, -20.0),
                ),
                scene,
            )
            .unwrap()
            .unwrap()
            .body
    }

    fn assert_registry_paired(physics: &PhysicsBinding, scene: &HeadlessScene) {
        assert_eq!(physics.bodies().len(), physics.visuals().len());
        assert_eq!(scene.len(), physics.visuals().len());
        for (i, (handle, visual)) in physics.bodies().iter().zip(physics.visuals()).enumerate() {
            assert_eq!(visual.visual_id, Some(i));
            assert_eq!(physics.rigid_body(*handle).unwrap().user_data, i as u128);
            assert_eq!(physics.index_of(*handle), Some(i));
            assert!(scene.contains(visual.key));
        }
    }

    #[test]
    fn registry_stays_paired_through_adds_and_removes() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();

        let handles: Vec<_> = (0..6)
            .map(|i| add_box(&mut physics, &mut scene, 0.0, Vec3::new(i as f32 * 50.0, 0.0, 0.0)))
            .collect();
        assert_registry_paired(&physics, &scene);

        for handle in [handles[5], handles[0], handles[3]] {
            physics.remove_visual(handle, &mut scene).unwrap();
            assert_registry_paired(&physics, &scene);
        }

        add_box(&mut physics, &mut scene, 1.0, Vec3::new(0.0, 0.0, 100.0));
        assert_registry_paired(&physics, &scene);
        assert_eq!(physics.body_count(), 4);
    }

    #[test]
    fn removal_shifts_later_bodies_down() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let h: Vec<_> = (0..4)
            .map(|i| add_box(&mut physics, &mut scene, 0.0, Vec3::new(i as f32 * 50.0, 0.0, 0.0)))
            .collect();

        let removed = physics.remove_visual(h[1], &mut scene).unwrap();
        assert_eq!(removed.visual_id, None);
        assert!(!scene.contains(removed.key));

        assert_eq!(physics.bodies(), &[h[0], h[2], h[3]]);
        assert_eq!(physics.index_of(h[0]), Some(0));
        assert_eq!(physics.index_of(h[2]), Some(1));
        assert_eq!(physics.index_of(h[3]), Some(2));
        assert_eq!(physics.visuals()[2].position, Vec3::new(150.0, 0.0, 0.0));
        assert!(physics.rigid_body(h[1]).is_none());
    }

    #[test]
    fn removing_unregistered_bodies_is_a_no_op() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let a = add_box(&mut physics, &mut scene, 0.0, Vec3::zeros());
        add_box(&mut physics, &mut scene, 0.0, Vec3::new(50.0, 0.0, 0.0));

        assert!(physics.remove_visual(a, &mut scene).is_some());
        assert!(physics.remove_visual(a, &mut scene).is_none());
        assert!(
            physics
                .remove_visual(RigidBodyHandle::invalid(), &mut scene)
                .is_none()
        );
        assert_eq!(physics.body_count(), 1);
        assert_registry_paired(&physics, &scene);
    }

    #[test]
    fn remove_all_empties_world_and_scene() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let handles: Vec<_> = (0..3)
            .map(|i| add_box(&mut physics, &mut scene, 1.0, Vec3::new(i as f32 * 50.0, 0.0, 30.0)))
            .collect();

        physics.destroy(&mut scene);
        assert_eq!(physics.body_count(), 0);
        assert!(scene.is_empty());
        assert!(handles.iter().all(|h| physics.rigid_body(*h).is_none()));

        physics.setup();
        assert_eq!(physics.simulated_time(), 0.0);
        add_box(&mut physics, &mut scene, 0.0, Vec3::zeros());
        assert_registry_paired(&physics, &scene);
    }

    #[test]
    fn update_advances_by_the_fixed_timestep() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        add_box(&mut physics, &mut scene, 1.0, Vec3::new(0.0, 0.0, 100.0));

        for _ in 0..3 {
            physics.update_physics();
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
        physics.update_physics();

        assert_eq!(physics.steps(), 4);
        assert_eq!(physics.simulated_time(), 4.0 * f64::from(crate::constants::TIMESTEP));
    }

    #[test]
    fn falling_box_lands_and_reports_contact() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        add_floor(&mut physics, &mut scene);
        let body = add_box(&mut physics, &mut scene, 1.0, Vec3::new(0.0, 0.0, 50.0));

        for _ in 0..80 {
            physics.update_physics();
        }

        let position = physics.position(body).unwrap();
        assert!((position.z - 10.0).abs() < 1.0, "box rests at {position}");
        assert_eq!(physics.visual(body).unwrap().position, position);

        let index = physics.index_of(body).unwrap();
        assert!(physics.get_collisions(index) >= 1);
        assert_eq!(physics.contacts_with(index), vec![0]);
        assert!(physics.ray_down_hits(position, 0));
        assert!(!physics.ray_down_hits(position + Vec3::new(5000.0, 0.0, 0.0), 0));
    }

    #[test]
    fn moved_visual_drives_its_body() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let body = add_box(&mut physics, &mut scene, 0.0, Vec3::zeros());

        physics.visual_mut(body).unwrap().position = Vec3::new(10.0, 20.0, 30.0);
        physics.update_physics();

        assert_eq!(physics.position(body), Some(Vec3::new(10.0, 20.0, 30.0)));
    }

    #[test]
    fn rotate_on_axis_accumulates_world_rotation() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let body = add_box(&mut physics, &mut scene, 0.0, Vec3::zeros());

        physics.rotate_on_axis(body, &up(), 0.3);
        physics.rotate_on_axis(body, &up(), 0.3);

        let heading = euler_xyz(&physics.rotation(body).unwrap()).z;
        assert!((heading - 0.6).abs() < 1.0e-5);
        assert_eq!(
            physics.visual(body).unwrap().orientation,
            physics.rotation(body).unwrap()
        );
    }

    #[test]
    fn unsupported_collider_shape_is_rejected() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let desc = BodyDesc {
            body: RigidBodyBuilder::fixed().build(),
            collider: Some(ColliderBuilder::capsule_z(5.0, 2.0).build()),
        };

        let err = physics.add_visual(desc, None, None, &mut scene).unwrap_err();
        assert!(matches!(err, CourseError::UnsupportedShape { .. }));
        assert_eq!(physics.body_count(), 0);
        assert!(scene.is_empty());
    }

    #[test]
    fn body_without_collider_or_mesh_is_skipped() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let desc = BodyDesc {
            body: RigidBodyBuilder::dynamic().build(),
            collider: None,
        };

        assert_eq!(physics.add_visual(desc, None, None, &mut scene).unwrap(), None);
        assert_eq!(physics.body_count(), 0);

        let desc = BodyDesc {
            body: RigidBodyBuilder::dynamic().build(),
            collider: None,
        };
        let custom = VisualNode::group(Vec::new());
        assert!(
            physics
                .add_visual(desc, None, Some(custom), &mut scene)
                .unwrap()
                .is_some()
        );
        assert_registry_paired(&physics, &scene);
    }

    #[test]
    fn physics_material_falls_back_to_world_defaults() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        let solid = physics.new_material("solidMaterial");
        let solid = physics.create_physics_material(Some(solid), Some(0.0), Some(0.1));

        let contact = *physics
            .materials()
            .contact(solid, physics.player_material())
            .unwrap();
        assert_eq!(contact.friction, crate::constants::DEFAULT_FRICTION);
        assert_eq!(contact.restitution, 0.1);

        let body = physics
            .create_rigid_body(
                RigidBodyOptions::new(ShapeDef::cuboid(1.0, 1.0, 1.0), 0.0, Vec3::zeros())
                    .with_physics_material(solid),
                &mut scene,
            )
            .unwrap()
            .unwrap()
            .body;
        let collider = physics.rigid_body(body).unwrap().colliders()[0];
        assert_eq!(physics.collider_set[collider].restitution(), 0.1);

        let fresh = physics.create_physics_material(None, None, None);
        assert_ne!(fresh, solid);
    }

    #[test]
    fn aabbs_skip_infinite_planes() {
        let mut scene = HeadlessScene::new();
        let mut physics = binding();
        physics
            .create_rigid_body(RigidBodyOptions::new(ShapeDef::Plane, 0.0, Vec3::zeros()), &mut scene)
            .unwrap();
        add_box(&mut physics, &mut scene, 0.0, Vec3::new(0.0, 0.0, 50.0));

        let aabbs = physics.aabbs();
        assert_eq!(aabbs.len(), 1);
        assert_eq!(aabbs[0].index, 1);
        assert!((aabbs[0].center() - Vec3::new(0.0, 0.0, 50.0)).norm() < 1.0e-3);
        assert!((aabbs[0].extents() - Vec3::repeat(20.0)).norm() < 1.0e-3);
    }
}
