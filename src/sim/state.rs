//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives here: the actor arena, the
//! swarm, the player's lives/score and the seeded RNG. Collaborators learn
//! about changes through the drained `SimEvent` queue.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ActorId, ActorKind, Actors};
use super::grid::SpatialIndex;
use super::shape::AabbShape;
use super::swarm::{Swarm, cannon_home};
use crate::audio::Cue;
use crate::error::{SimError, check_field_size};
use crate::settings::Settings;

/// Something collaborators need to hear about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Spawned { id: ActorId, kind: ActorKind, shape: AabbShape },
    Removed { id: ActorId },
    Cue(Cue),
    ScoreChanged(u64),
    LivesChanged(u32),
    LevelChanged(u32),
    /// The cannon was destroyed this tick
    PlayerHit,
    /// The swarm has no enemies left
    MissionComplete,
}

/// Lives, score and the displayed level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub lives: u32,
    pub score: u64,
    pub level: u32,
}

impl PlayerState {
    pub fn new(lives: u32) -> Self {
        Self {
            lives,
            score: 0,
            level: 1,
        }
    }

    /// Add points; true if the score crossed a multiple of `interval`
    pub fn award(&mut self, points: u32, interval: u64) -> bool {
        let prev_mod = self.score % interval;
        self.score += points as u64;
        let new_mod = self.score % interval;
        new_mod < prev_mod
    }
}

/// Serializable summary for HUDs, logs and tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    pub enemies: usize,
    pub columns: usize,
    pub enemy_shots: usize,
    pub player_shot: bool,
    pub cannon_x: Option<f32>,
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    /// Play-field size (validated positive)
    pub field: Vec2,
    pub rng: Pcg32,
    pub actors: Actors,
    pub index: SpatialIndex,
    pub swarm: Swarm,
    pub player: PlayerState,
    /// The cannon, while alive
    pub cannon: Option<ActorId>,
    /// The single player projectile, while in flight
    pub player_shot: Option<ActorId>,
    /// Simulation tick counter
    pub time_ticks: u64,
    events: Vec<SimEvent>,
    next_id: u32,
}

impl GameState {
    /// Fresh run: cannon plus a full swarm. Fails on a degenerate field or
    /// settings that break swarm invariants.
    pub fn new(settings: Settings, field: Vec2) -> Result<Self, SimError> {
        check_field_size(field.x, field.y)?;
        settings.validate()?;

        let mut state = Self {
            rng: Pcg32::seed_from_u64(settings.seed),
            index: SpatialIndex::new(field, settings.cell_size),
            swarm: Swarm::new(&settings),
            player: PlayerState::new(settings.lives),
            actors: Actors::new(),
            cannon: None,
            player_shot: None,
            time_ticks: 0,
            events: Vec::new(),
            next_id: 1,
            settings,
            field,
        };
        state.start_level();
        state.spawn_cannon();
        state.events.push(SimEvent::ScoreChanged(0));
        state.events.push(SimEvent::LivesChanged(state.player.lives));
        Ok(state)
    }

    /// Allocate a new actor id
    pub fn next_entity_id(&mut self) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Add an actor to the live set
    pub fn spawn(&mut self, actor: Actor) -> ActorId {
        let id = actor.id;
        log::debug!("Spawn {} {:?} at {:?}", actor.kind.label(), id, actor.pos());
        self.events.push(SimEvent::Spawned {
            id,
            kind: actor.kind,
            shape: actor.shape,
        });
        self.actors.insert(id, actor);
        id
    }

    /// Spawn the cannon at its start position if it is not alive
    pub fn spawn_cannon(&mut self) {
        if self.cannon.is_some() {
            return;
        }
        let id = self.next_entity_id();
        let pos = cannon_home(&self.settings, self.field);
        self.cannon = Some(self.spawn(Actor::cannon(id, pos, self.settings.cannon_speed)));
    }

    /// Spawn the player projectile and take the singleton handle
    pub fn spawn_player_shot(&mut self, at: Vec2) -> Option<ActorId> {
        if self.player_shot.is_some() {
            return None;
        }
        let id = self.next_entity_id();
        self.player_shot = Some(self.spawn(Actor::player_shot(id, at, self.settings.player_shot_speed)));
        self.events.push(SimEvent::Cue(Cue::Shoot));
        self.player_shot
    }

    pub fn spawn_enemy_shot(&mut self, at: Vec2) -> ActorId {
        let id = self.next_entity_id();
        self.spawn(Actor::enemy_shot(id, at, self.settings.enemy_shot_speed))
    }

    /// Mark an actor for removal at the end of the tick
    pub fn mark_dead(&mut self, id: ActorId) {
        match self.actors.get_mut(&id) {
            Some(actor) => actor.dead = true,
            None => {
                debug_assert!(false, "mark_dead on removed actor {:?}", id);
                log::warn!("mark_dead on removed actor {:?}", id);
            }
        }
    }

    /// Remove an actor now and run its cleanup (column membership, handles)
    pub fn remove(&mut self, id: ActorId) {
        let Some(actor) = self.actors.remove(&id) else {
            return;
        };
        match actor.kind {
            ActorKind::Enemy { column, .. } => self.swarm.remove_enemy(column, id),
            ActorKind::PlayerProjectile => {
                if self.player_shot == Some(id) {
                    self.player_shot = None;
                }
            }
            ActorKind::PlayerCannon => {
                if self.cannon == Some(id) {
                    self.cannon = None;
                }
            }
            ActorKind::EnemyProjectile => {}
        }
        log::debug!("Remove {} {:?}", actor.kind.label(), id);
        self.events.push(SimEvent::Removed { id });
    }

    /// Remove every actor marked dead this tick
    pub fn remove_dead(&mut self) {
        let dead: Vec<ActorId> = self.actors.values().filter(|a| a.dead).map(|a| a.id).collect();
        for id in dead {
            self.remove(id);
        }
    }

    /// Award points; a crossed bonus threshold bumps the swarm difficulty
    pub fn award_points(&mut self, points: u32) {
        let crossed = self.player.award(points, self.settings.bonus_score_interval);
        self.events.push(SimEvent::ScoreChanged(self.player.score));
        if crossed {
            log::debug!("Score {} crossed a bonus threshold", self.player.score);
            if let Some(level) = self.swarm.increase_difficulty() {
                self.set_level(level);
            }
        }
    }

    pub(crate) fn set_level(&mut self, level: u32) {
        self.player.level = level;
        self.events.push(SimEvent::LevelChanged(level));
    }

    /// Take one life; returns how many remain
    pub fn lose_life(&mut self) -> u32 {
        self.player.lives = self.player.lives.saturating_sub(1);
        self.events.push(SimEvent::LivesChanged(self.player.lives));
        self.player.lives
    }

    /// Restore lives to the configured count, keeping the score
    pub fn reset_lives(&mut self) {
        self.player.lives = self.settings.lives;
        self.events.push(SimEvent::LivesChanged(self.player.lives));
    }

    /// Clear projectiles and leftover enemies, then spawn a fresh swarm at level 1
    pub fn start_level(&mut self) {
        let stale: Vec<ActorId> = self
            .actors
            .values()
            .filter(|a| a.kind != ActorKind::PlayerCannon)
            .map(|a| a.id)
            .collect();
        for id in stale {
            self.remove(id);
        }

        let field = self.field;
        let mut next_id = self.next_id;
        let (swarm, enemies) = Swarm::spawn(&self.settings, field, || {
            let id = ActorId(next_id);
            next_id += 1;
            id
        });
        self.next_id = next_id;
        self.swarm = swarm;
        for enemy in enemies {
            self.spawn(enemy);
        }
        self.set_level(self.swarm.level);
        log::info!("Swarm spawned: {} enemies", self.swarm.enemy_count());
    }

    /// Full restart: score and lives back to start, new swarm, cannon respawned
    pub fn reset_run(&mut self) {
        self.player = PlayerState::new(self.settings.lives);
        self.rng = Pcg32::seed_from_u64(self.settings.seed);
        self.start_level();
        self.spawn_cannon();
        self.events.push(SimEvent::ScoreChanged(0));
        self.events.push(SimEvent::LivesChanged(self.player.lives));
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.time_ticks,
            score: self.player.score,
            lives: self.player.lives,
            level: self.player.level,
            enemies: self.swarm.enemy_count(),
            columns: self.swarm.columns.len(),
            enemy_shots: self
                .actors
                .values()
                .filter(|a| a.kind == ActorKind::EnemyProjectile)
                .count(),
            player_shot: self.player_shot.is_some(),
            cannon_x: self.cannon.and_then(|id| self.actors.get(&id)).map(|a| a.pos().x),
        }
    }
}
