//! Game flow: title, playing, game over, mission complete
//!
//! The controller owns the simulation and the collaborators. While playing
//! it runs one tick per fixed step and turns simulation events into scene,
//! HUD and audio calls; player hits and mission completion change state
//! here.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::error::{SimError, check_field_size};
use crate::platform::{Audio, Color, EdgeTrigger, Hud, Input, Key, Scene};
use crate::settings::Settings;
use crate::sim::{GameState, SimEvent, Snapshot, TickInput, tick};

use glam::Vec2;

pub const TITLE_MESSAGE: &str = "PRESS ENTER TO START";
pub const GAME_OVER_MESSAGE: &str = "GAME OVER";
pub const MISSION_COMPLETE_MESSAGE: &str = "MISSION COMPLETE";

/// Which screen is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Waiting for confirm to start a run
    Title,
    /// Simulation ticking
    Playing,
    /// Out of lives; confirm returns to the title with a full reset
    GameOver,
    /// Swarm destroyed; confirm brings a fresh swarm, keeping the score
    MissionComplete,
}

/// Converts variable frame time into whole fixed ticks
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    /// Add frame time; returns how many `SIM_DT` ticks to run now.
    /// Non-finite frame times count as zero.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if frame_dt.is_finite() {
            self.accumulator += frame_dt.clamp(0.0, 0.1);
        }
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        // Spiral of death guard: drop whatever the cap left behind
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }
}

pub struct GameFlowController<S: Scene, H: Hud, A: Audio> {
    sim: GameState,
    state: FlowState,
    confirm: EdgeTrigger,
    difficulty: EdgeTrigger,
    clock: FixedStep,
    scene: S,
    hud: H,
    audio: A,
}

impl<S: Scene, H: Hud, A: Audio> GameFlowController<S, H, A> {
    /// Build the run against the scene's field size and show the title
    pub fn new(settings: Settings, scene: S, hud: H, audio: A) -> Result<Self, SimError> {
        let (width, height) = scene.current_field_size();
        check_field_size(width, height)?;
        let sim = GameState::new(settings, Vec2::new(width, height))?;
        log::info!("Field {}x{}, entering title", width, height);

        let mut controller = Self {
            sim,
            state: FlowState::Title,
            confirm: EdgeTrigger::default(),
            difficulty: EdgeTrigger::default(),
            clock: FixedStep::default(),
            scene,
            hud,
            audio,
        };
        controller.dispatch_events();
        controller.hud.show_message(TITLE_MESSAGE, Color::WHITE);
        Ok(controller)
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn sim(&self) -> &GameState {
        &self.sim
    }

    /// Mutable access for tools and scripted scenarios
    pub fn sim_mut(&mut self) -> &mut GameState {
        &mut self.sim
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sim.snapshot()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn hud(&self) -> &H {
        &self.hud
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Run as many fixed steps as `frame_dt` covers; returns the count
    pub fn frame(&mut self, input: &impl Input, frame_dt: f32) -> u32 {
        let steps = self.clock.advance(frame_dt);
        for _ in 0..steps {
            self.step(input, SIM_DT);
        }
        steps
    }

    /// One fixed step: sample input, then act according to the current state
    pub fn step(&mut self, input: &impl Input, dt: f32) {
        let confirmed = self.confirm.update(input.is_pressed(Key::Confirm));
        let bump = self.difficulty.update(input.is_pressed(Key::Difficulty));

        match self.state {
            FlowState::Title => {
                if confirmed {
                    self.start_playing();
                }
            }
            FlowState::Playing => {
                let tick_input = TickInput {
                    left: input.is_pressed(Key::Left),
                    right: input.is_pressed(Key::Right),
                    fire: input.is_pressed(Key::Fire),
                    bump_difficulty: bump,
                };
                tick(&mut self.sim, &tick_input, dt);
                self.dispatch_events();
            }
            FlowState::GameOver => {
                if confirmed {
                    self.return_to_title();
                }
            }
            FlowState::MissionComplete => {
                if confirmed {
                    self.continue_campaign();
                }
            }
        }
    }

    fn start_playing(&mut self) {
        log::info!("Run started");
        self.hud.hide_message();
        self.state = FlowState::Playing;
    }

    /// Full reset after a game over; the next confirm starts a new run
    fn return_to_title(&mut self) {
        self.sim.reset_run();
        self.dispatch_events();
        self.hud.show_message(TITLE_MESSAGE, Color::WHITE);
        self.state = FlowState::Title;
        log::info!("Back to title");
    }

    /// Fresh swarm after a cleared level; lives restored, score kept
    fn continue_campaign(&mut self) {
        self.sim.start_level();
        self.sim.reset_lives();
        self.sim.spawn_cannon();
        self.dispatch_events();
        self.hud.hide_message();
        self.state = FlowState::Playing;
        log::info!("New swarm, score {}", self.sim.player.score);
    }

    /// A hit on the last life ends the run even if the swarm was cleared in
    /// the same tick: game over replaces the mission complete message.
    fn player_hit(&mut self) {
        let lives = self.sim.lose_life();
        if lives == 0 {
            self.state = FlowState::GameOver;
            self.hud.show_message(GAME_OVER_MESSAGE, Color::RED);
            log::info!("Game over with score {}", self.sim.player.score);
        } else {
            self.sim.spawn_cannon();
            log::debug!("Cannon respawned, {} lives left", lives);
        }
    }

    /// Only reachable from Playing; a run that is already over stays over
    fn mission_complete(&mut self) {
        if self.state != FlowState::Playing {
            return;
        }
        self.state = FlowState::MissionComplete;
        self.hud.show_message(MISSION_COMPLETE_MESSAGE, Color::GREEN);
        log::info!("Mission complete with score {}", self.sim.player.score);
    }

    /// Forward queued simulation events until none are left (handling an
    /// event can queue more)
    fn dispatch_events(&mut self) {
        loop {
            let events = self.sim.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                match event {
                    SimEvent::Spawned { id, kind, shape } => self.scene.add_entity(id, kind, shape),
                    SimEvent::Removed { id } => self.scene.remove_entity(id),
                    SimEvent::Cue(cue) => self.audio.play_cue(cue),
                    SimEvent::ScoreChanged(score) => self.hud.set_score(score),
                    SimEvent::LivesChanged(lives) => self.hud.set_lives(lives),
                    SimEvent::LevelChanged(level) => self.hud.set_level(level),
                    SimEvent::PlayerHit => self.player_hit(),
                    SimEvent::MissionComplete => self.mission_complete(),
                }
            }
        }
    }
}
