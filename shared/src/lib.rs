pub mod config;
pub mod constants;
pub mod error;
pub mod game;
pub mod input;
pub mod level;
pub mod physics;
pub mod player;
pub mod scene;
pub mod shape;
pub mod trail;
pub mod types;
pub mod ui;
pub mod utils;
pub mod visual;

pub use config::{
    Demo, GameConfig, LevelKind, LevelSettings, PhysicsSettings, PlayerSettings, TiltSettings,
    TrailSettings,
};
pub use error::{CourseError, Result};
pub use game::{FrameLoop, FrameOutcome, Game, GameDefaults};
pub use input::{Control, InputState};
pub use level::Level;
pub use physics::{BodyAabb, ContactPair, PhysicsBinding, PhysicsMaterial, RigidBodyOptions};
pub use player::{Player, PlayerState, Tilt};
pub use scene::{HeadlessScene, RenderScene};
pub use shape::{ChildShape, ShapeDef};
pub use trail::LightTrail;
pub use types::{Quat, Vec2, Vec3};
pub use ui::UiState;
pub use visual::{Geometry, MeshKey, MeshKeys, MeshMaterial, VisualMesh, VisualNode};
