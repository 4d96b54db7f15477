use crate::constants::{self, colors};
use crate::error::{CourseError, Result};
use crate::utils::deg_to_rad;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The three bundled course setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Demo {
    /// Staircase course with the stock player.
    #[default]
    Basic,
    /// Heavier, faster player on a wide floor, with tilt and a light trail.
    LightCycle,
    /// Course with boxes the player can push around.
    Movable,
}

impl Demo {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Demo::Basic),
            "light-cycle" | "lightcycle" | "light_cycle" => Some(Demo::LightCycle),
            "movable" => Some(Demo::Movable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity_z: f32,
    pub timestep: f32,
    pub solver_iterations: usize,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity_z: constants::GRAVITY_Z,
            timestep: constants::TIMESTEP,
            solver_iterations: constants::SOLVER_ITERATIONS,
            friction: constants::DEFAULT_FRICTION,
            restitution: constants::DEFAULT_RESTITUTION,
        }
    }
}

/// Visual lean of the player model while turning. Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltSettings {
    pub rest: f32,
    /// Upper edge of the band tilt relaxes back into.
    pub left_limit: f32,
    /// Lower edge of the band tilt relaxes back into.
    pub right_limit: f32,
    pub max_left: f32,
    pub max_right: f32,
    pub step: f32,
}

impl Default for TiltSettings {
    fn default() -> Self {
        Self {
            rest: constants::TILT_REST,
            left_limit: deg_to_rad(91.0),
            right_limit: deg_to_rad(89.0),
            max_left: deg_to_rad(120.0),
            max_right: deg_to_rad(50.0),
            step: deg_to_rad(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailSettings {
    pub size: usize,
    pub color: u32,
    pub start_z: f32,
    /// Distance along the heading between the player origin and the newest vertex.
    pub offset: f32,
}

impl Default for TrailSettings {
    fn default() -> Self {
        Self {
            size: constants::TRAIL_SIZE,
            color: colors::NEON_BLUE,
            start_z: constants::TRAIL_START_Z,
            offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub mass: f32,
    pub jump_velocity: f32,
    pub speed: f32,
    pub speed_max: f32,
    pub rotation_speed: f32,
    pub rotation_speed_max: f32,
    pub damping: f32,
    pub rotation_damping: f32,
    pub camera_offset_h: f32,
    pub camera_offset_v: f32,
    pub half_extents: [f32; 3],
    pub spawn: [f32; 3],
    /// Model opacity; the light cycle hides the imported body and only shows its child.
    pub model_opacity: f32,
    pub tilt: Option<TiltSettings>,
    pub trail: Option<TrailSettings>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            mass: constants::PLAYER_MASS,
            jump_velocity: constants::JUMP_VELOCITY,
            speed: constants::SPEED,
            speed_max: constants::SPEED_MAX,
            rotation_speed: constants::ROTATION_SPEED,
            rotation_speed_max: constants::ROTATION_SPEED_MAX,
            damping: constants::DAMPING,
            rotation_damping: constants::ROTATION_DAMPING,
            camera_offset_h: constants::CAMERA_OFFSET_H,
            camera_offset_v: constants::CAMERA_OFFSET_V,
            half_extents: constants::PLAYER_HALF_EXTENTS,
            spawn: constants::PLAYER_SPAWN,
            model_opacity: 1.0,
            tilt: None,
            trail: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LevelKind {
    /// Five static cubes rising towards the origin.
    #[default]
    Staircase,
    /// Platforms with pushable boxes and a tall tipping pillar.
    Movable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    pub kind: LevelKind,
    /// Floor half width.
    pub floor_size: f32,
    /// Floor half height.
    pub floor_height: f32,
    pub grid_divisions: u32,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            kind: LevelKind::Staircase,
            floor_size: constants::FLOOR_SIZE,
            floor_height: constants::FLOOR_HEIGHT,
            grid_divisions: (constants::FLOOR_SIZE / 10.0) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Falling below this Z coordinate resets the game.
    pub game_over_z: f32,
    pub physics: PhysicsSettings,
    pub player: PlayerSettings,
    pub level: LevelSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::for_demo(Demo::Basic)
    }
}

impl GameConfig {
    pub fn for_demo(demo: Demo) -> Self {
        let physics = PhysicsSettings::default();
        let game_over_z = constants::GAME_OVER_Z;

        match demo {
            Demo::Basic => Self {
                physics,
                player: PlayerSettings::default(),
                level: LevelSettings::default(),
                game_over_z,
            },
            Demo::LightCycle => Self {
                physics,
                player: PlayerSettings {
                    mass: 10.0,
                    speed: 10.0,
                    speed_max: 145.0,
                    camera_offset_h: 140.0,
                    camera_offset_v: 60.0,
                    half_extents: [25.0, 16.5, 16.5],
                    model_opacity: 0.0,
                    tilt: Some(TiltSettings::default()),
                    trail: Some(TrailSettings::default()),
                    ..PlayerSettings::default()
                },
                level: LevelSettings {
                    floor_size: 2000.0,
                    grid_divisions: 50,
                    ..LevelSettings::default()
                },
                game_over_z,
            },
            Demo::Movable => Self {
                physics,
                player: PlayerSettings::default(),
                level: LevelSettings {
                    kind: LevelKind::Movable,
                    ..LevelSettings::default()
                },
                game_over_z,
            },
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: GameConfig =
            toml::from_str(s).map_err(|e| CourseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&data)?;
        log::info!("loaded course config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CourseError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.physics;
        if !(p.timestep > 0.0) {
            return Err(CourseError::Config(format!(
                "physics.timestep must be positive, got {}",
                p.timestep
            )));
        }
        if p.solver_iterations == 0 {
            return Err(CourseError::Config(
                "physics.solver_iterations must be at least 1".into(),
            ));
        }

        let pl = &self.player;
        for (name, value) in [
            ("player.speed_max", pl.speed_max),
            ("player.rotation_speed_max", pl.rotation_speed_max),
        ] {
            if !(value > 0.0) {
                return Err(CourseError::Config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("player.damping", pl.damping),
            ("player.rotation_damping", pl.rotation_damping),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(CourseError::Config(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        if pl.half_extents.iter().any(|h| !(*h > 0.0)) {
            return Err(CourseError::Config(
                "player.half_extents must all be positive".into(),
            ));
        }
        if pl.trail.is_some_and(|trail| trail.size == 0) {
            return Err(CourseError::Config(
                "player.trail.size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_preset_is_valid() {
        for demo in [Demo::Basic, Demo::LightCycle, Demo::Movable] {
            GameConfig::for_demo(demo).validate().unwrap();
        }
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = GameConfig::from_toml_str(
            r#"
            game_over_z = -500.0

            [player]
            speed_max = 60.0

            [level]
            kind = "movable"
            "#,
        )
        .unwrap();

        assert_eq!(config.game_over_z, -500.0);
        assert_eq!(config.player.speed_max, 60.0);
        assert_eq!(config.player.speed, constants::SPEED);
        assert_eq!(config.level.kind, LevelKind::Movable);
        assert_eq!(config.physics, PhysicsSettings::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = GameConfig::from_toml_str("[physics]\ntimestep = 0.0\n").unwrap_err();
        assert!(matches!(err, CourseError::Config(_)));

        let err = GameConfig::from_toml_str("[player]\ndamping = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("player.damping"));

        assert!(GameConfig::from_toml_str("[physics]\nsolver_iterations = 0\n").is_err());
        assert!(GameConfig::from_toml_str("not = [valid").is_err());
    }

    #[test]
    fn config_survives_toml_round_trip() {
        let config = GameConfig::for_demo(Demo::LightCycle);
        let text = config.to_toml_string().unwrap();
        assert_eq!(GameConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn demo_names_parse() {
        assert_eq!(Demo::from_name("light-cycle"), Some(Demo::LightCycle));
        assert_eq!(Demo::from_name(" Movable "), Some(Demo::Movable));
        assert_eq!(Demo::from_name("tron"), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::load("/nonexistent/course.toml").unwrap_err();
        assert!(matches!(err, CourseError::Io(_)));
    }
}
