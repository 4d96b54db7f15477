//! Game loop driver.
//!
//! One [`Game::frame`] call is one display refresh: physics step, player update, trail
//! update, render. Falling below the game-over threshold tears the whole world down and
//! rebuilds it from the defaults captured at start-up.

use crate::config::{GameConfig, LevelSettings, PlayerSettings};
use crate::error::Result;
use crate::input::{Control, InputState};
use crate::level::Level;
use crate::physics::PhysicsBinding;
use crate::player::Player;
use crate::scene::RenderScene;
use crate::trail::LightTrail;
use crate::ui::{INFOBOX_INTRO, UiState};

/// Stand-in for the display's frame callback: frames only run while armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameLoop {
    armed: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Consume the scheduled frame and schedule the next one.
    fn tick(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.frames += 1;
        true
    }
}

/// Values captured at start-up and restored on every reset.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDefaults {
    pub player: PlayerSettings,
    pub level: LevelSettings,
    pub game_over_z: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continued,
    /// The player fell out of the course and the game was rebuilt.
    Reset,
    /// The loop is cancelled; nothing ran.
    Idle,
}

pub struct Game {
    config: GameConfig,
    defaults: GameDefaults,
    physics: PhysicsBinding,
    player: Player,
    level: Level,
    trail: Option<LightTrail>,
    ui: UiState,
    frame_loop: FrameLoop,
    resets: u32,
}

impl Game {
    pub fn new(config: GameConfig, scene: &mut dyn RenderScene) -> Result<Self> {
        config.validate()?;

        let defaults = GameDefaults {
            player: config.player,
            level: config.level,
            game_over_z: config.game_over_z,
        };

        let mut physics = PhysicsBinding::new(config.physics);
        let player = Player::create(defaults.player, &mut physics, scene)?;
        let level = Level::create(defaults.level, &mut physics, scene)?;
        let trail = defaults.player.trail.map(LightTrail::new);

        let mut frame_loop = FrameLoop::default();
        frame_loop.arm();

        log::info!(
            "game started: {:?} course, {} bodies",
            defaults.level.kind,
            physics.body_count()
        );

        Ok(Self {
            config,
            defaults,
            physics,
            player,
            level,
            trail,
            ui: UiState::new(),
            frame_loop,
            resets: 0,
        })
    }

    /// Run one frame.
    pub fn frame(
        &mut self,
        input: &InputState,
        scene: &mut dyn RenderScene,
    ) -> Result<FrameOutcome> {
        if !self.frame_loop.tick() {
            return Ok(FrameOutcome::Idle);
        }

        self.physics.update_physics();
        self.player.post_step(&mut self.physics);
        self.player.update(input, &mut self.physics, scene);

        if self
            .player
            .is_game_over(&self.physics, self.defaults.game_over_z)
        {
            self.destroy_and_restart(scene)?;
            scene.render(self.physics.visuals());
            return Ok(FrameOutcome::Reset);
        }

        if let (Some(trail), Some(position)) =
            (self.trail.as_mut(), self.player.position(&self.physics))
        {
            trail.update(position, self.player.heading());
        }

        scene.render(self.physics.visuals());
        Ok(FrameOutcome::Continued)
    }

    /// Tear down the world and the scene and build everything again from the defaults.
    pub fn destroy_and_restart(&mut self, scene: &mut dyn RenderScene) -> Result<()> {
        self.frame_loop.cancel();

        self.physics.destroy(scene);
        self.physics.setup();
        scene.clear();

        let defaults = self.defaults.clone();
        self.player = Player::create(defaults.player, &mut self.physics, scene)?;
        self.level = Level::create(defaults.level, &mut self.physics, scene)?;
        self.trail = defaults.player.trail.map(LightTrail::new);

        self.frame_loop.arm();
        self.resets += 1;
        log::info!("game over, course rebuilt (reset #{})", self.resets);
        Ok(())
    }

    pub fn on_key_down(&mut self, control: Control) {
        log::debug!("key down: {control:?}");
        self.ui.fade_out(INFOBOX_INTRO);
    }

    pub fn on_key_up(&mut self, _control: Control) {
        self.player.clear_turning();
    }

    pub fn pause(&mut self) {
        self.frame_loop.cancel();
    }

    pub fn resume(&mut self) {
        self.frame_loop.arm();
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn defaults(&self) -> &GameDefaults {
        &self.defaults
    }

    pub fn physics(&self) -> &PhysicsBinding {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsBinding {
        &mut self.physics
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn trail(&self) -> Option<&LightTrail> {
        self.trail.as_ref()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn frame_loop(&self) -> &FrameLoop {
        &self.frame_loop
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }
}
