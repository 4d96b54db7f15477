use crate::types::Vec3;
use crate::visual::{MeshKey, VisualMesh};
use std::collections::BTreeMap;

/// The render scene the binding layer and game loop draw into.
///
/// Implemented by the bevy client; [`HeadlessScene`] stands in for tests and
/// headless runs.
pub trait RenderScene {
    /// Start drawing `mesh`. The scene may keep its own copy; later pose updates arrive
    /// through [`RenderScene::render`].
    fn add(&mut self, mesh: &VisualMesh);

    /// Stop drawing the mesh with `key`. Unknown keys are ignored.
    fn remove(&mut self, key: MeshKey);

    /// Drop every mesh and decoration.
    fn clear(&mut self);

    /// Place the camera at `position` looking at `look_at`, with +Z up.
    fn set_camera(&mut self, position: Vec3, look_at: Vec3);

    /// Present one frame with the current poses of `visuals`.
    fn render(&mut self, visuals: &[VisualMesh]);
}

/// Camera pose as last set on a scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
}

/// In-memory scene that records what it was asked to draw.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    pub meshes: BTreeMap<MeshKey, VisualMesh>,
    pub camera: CameraPose,
    pub renders: u64,
    pub clears: u64,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn contains(&self, key: MeshKey) -> bool {
        self.meshes.contains_key(&key)
    }
}

impl RenderScene for HeadlessScene {
    fn add(&mut self, mesh: &VisualMesh) {
        self.meshes.insert(mesh.key, mesh.clone());
    }

    fn remove(&mut self, key: MeshKey) {
        self.meshes.remove(&key);
    }

    fn clear(&mut self) {
        self.meshes.clear();
        self.clears += 1;
    }

    fn set_camera(&mut self, position: Vec3, look_at: Vec3) {
        self.camera = CameraPose { position, look_at };
    }

    fn render(&mut self, visuals: &[VisualMesh]) {
        for visual in visuals {
            if let Some(mesh) = self.meshes.get_mut(&visual.key) {
                mesh.position = visual.position;
                mesh.orientation = visual.orientation;
                mesh.root.clone_from(&visual.root);
            }
        }
        self.renders += 1;
    }
}
