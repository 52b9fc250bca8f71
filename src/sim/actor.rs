//! Actors: every movable object in the simulation
//!
//! One closed enum of kinds with a single `match` per behavior. `update`
//! never looks at other actors; `on_collide` only describes what should
//! happen and the tick applies it, so nothing is mutated mid-query.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::Cue;
use crate::consts::*;
use crate::half_extents;

use super::shape::AabbShape;
use super::swarm::ColumnId;

/// Stable actor handle, never reused within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Live actor arena, iterated in id order for determinism
pub type Actors = BTreeMap<ActorId, Actor>;

/// Enemy variants, top row to bottom row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Squid,
    Crab,
    Octopus,
}

impl EnemyKind {
    /// Score awarded for destroying this enemy
    pub fn points(&self) -> u32 {
        match self {
            EnemyKind::Squid => 40,
            EnemyKind::Crab => 20,
            EnemyKind::Octopus => 10,
        }
    }

    /// Variant for a row index counted from the top of a column
    pub fn for_row(row: usize) -> Self {
        match row {
            0 => EnemyKind::Squid,
            1 | 2 => EnemyKind::Crab,
            _ => EnemyKind::Octopus,
        }
    }
}

/// Actor kind tag with kind-specific data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActorKind {
    PlayerCannon,
    PlayerProjectile,
    Enemy { kind: EnemyKind, column: ColumnId },
    EnemyProjectile,
}

impl ActorKind {
    pub fn is_enemy(&self) -> bool {
        matches!(self, ActorKind::Enemy { .. })
    }

    /// Short label for logs and scene notifications
    pub fn label(&self) -> &'static str {
        match self {
            ActorKind::PlayerCannon => "cannon",
            ActorKind::PlayerProjectile => "player-shot",
            ActorKind::Enemy { .. } => "enemy",
            ActorKind::EnemyProjectile => "enemy-shot",
        }
    }
}

/// Input the cannon samples during its update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CannonInput {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

/// Read-only context handed to `Actor::update`
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext {
    pub input: CannonInput,
    pub field: Vec2,
    /// Whether the single player projectile is currently in flight
    pub player_shot_alive: bool,
}

/// Spawn requests produced by an update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnRequest {
    PlayerShot { at: Vec2 },
}

/// Effects of one actor reacting to another
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionOutcome {
    pub kill_self: bool,
    pub kill_other: bool,
    pub points: u32,
    pub player_hit: bool,
    pub cue: Option<Cue>,
}

/// A movable simulation object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub shape: AabbShape,
    /// Horizontal speed for the cannon, signed vertical speed for projectiles
    pub speed: f32,
    /// Marked for removal at the end of the tick
    pub dead: bool,
}

impl Actor {
    fn new(id: ActorId, kind: ActorKind, pos: Vec2, size: (f32, f32), speed: f32) -> Self {
        Self {
            id,
            kind,
            shape: AabbShape::new(pos, half_extents(size)),
            speed,
            dead: false,
        }
    }

    pub fn cannon(id: ActorId, pos: Vec2, speed: f32) -> Self {
        Self::new(id, ActorKind::PlayerCannon, pos, CANNON_SIZE, speed)
    }

    pub fn player_shot(id: ActorId, pos: Vec2, speed: f32) -> Self {
        Self::new(id, ActorKind::PlayerProjectile, pos, PLAYER_SHOT_SIZE, speed.abs())
    }

    pub fn enemy(id: ActorId, pos: Vec2, kind: EnemyKind, column: ColumnId) -> Self {
        Self::new(id, ActorKind::Enemy { kind, column }, pos, ENEMY_SIZE, 0.0)
    }

    pub fn enemy_shot(id: ActorId, pos: Vec2, speed: f32) -> Self {
        Self::new(id, ActorKind::EnemyProjectile, pos, ENEMY_SHOT_SIZE, -speed.abs())
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.shape.center
    }

    /// Move position and bounding box together
    #[inline]
    pub fn translate(&mut self, offset: Vec2) {
        self.shape.translate(offset);
    }

    /// Point value if this actor is an enemy
    pub fn point_value(&self) -> Option<u32> {
        match self.kind {
            ActorKind::Enemy { kind, .. } => Some(kind.points()),
            _ => None,
        }
    }

    /// Advance this actor alone by `dt`
    pub fn update(&mut self, dt: f32, ctx: &UpdateContext) -> Option<SpawnRequest> {
        match self.kind {
            ActorKind::PlayerCannon => self.update_cannon(dt, ctx),
            ActorKind::PlayerProjectile | ActorKind::EnemyProjectile => {
                self.translate(Vec2::new(0.0, self.speed * dt));
                None
            }
            // Driven by the swarm
            ActorKind::Enemy { .. } => None,
        }
    }

    fn update_cannon(&mut self, dt: f32, ctx: &UpdateContext) -> Option<SpawnRequest> {
        let direction = ctx.input.right as i32 - ctx.input.left as i32;
        if direction != 0 {
            let half_w = self.shape.half.x;
            let lo = half_w;
            let hi = (ctx.field.x - half_w).max(lo);
            let target = self.pos().x + direction as f32 * self.speed * dt;
            let x = target.clamp(lo, hi);
            self.translate(Vec2::new(x - self.pos().x, 0.0));
        }

        if ctx.input.fire && !ctx.player_shot_alive {
            let above = self.shape.half.y + PLAYER_SHOT_SIZE.1 * 0.5 + 1.0;
            return Some(SpawnRequest::PlayerShot {
                at: self.pos() + Vec2::new(0.0, above),
            });
        }
        None
    }

    /// Reaction of this actor to touching `other`
    pub fn on_collide(&self, other: &Actor) -> CollisionOutcome {
        match self.kind {
            ActorKind::PlayerCannon => match other.kind {
                ActorKind::Enemy { .. } | ActorKind::EnemyProjectile => CollisionOutcome {
                    kill_self: true,
                    kill_other: true,
                    player_hit: true,
                    cue: Some(Cue::Death),
                    ..Default::default()
                },
                _ => CollisionOutcome::default(),
            },
            ActorKind::PlayerProjectile => match other.point_value() {
                Some(points) => CollisionOutcome {
                    kill_self: true,
                    kill_other: true,
                    points,
                    cue: Some(Cue::Kill),
                    ..Default::default()
                },
                None => CollisionOutcome::default(),
            },
            ActorKind::Enemy { .. } => CollisionOutcome {
                kill_self: true,
                ..Default::default()
            },
            ActorKind::EnemyProjectile => CollisionOutcome::default(),
        }
    }
}
