//! Gap Occupiers - a column-swarm arcade shooter simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (actors, swarm, collisions, tick)
//! - `flow`: Title / playing / game over / mission complete state machine
//! - `platform`: Input, scene, HUD and audio collaborator surfaces
//! - `settings`: Data-driven game balance
//! - `audio`: Cue identifiers and mute gating

pub mod audio;
pub mod error;
pub mod flow;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use flow::{FixedStep, FlowState, GameFlowController};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one enemy-fire roll per column per tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Nominal sprite size the collision grid is tuned for
    pub const NOMINAL_SPRITE_SIZE: f32 = 50.0;
    /// Broad-phase cell size (125% of the nominal sprite)
    pub const GRID_CELL_SIZE: f32 = 1.25 * NOMINAL_SPRITE_SIZE;

    /// Sprite sizes (width, height)
    pub const CANNON_SIZE: (f32, f32) = (50.0, 30.0);
    pub const ENEMY_SIZE: (f32, f32) = (40.0, 30.0);
    pub const PLAYER_SHOT_SIZE: (f32, f32) = (4.0, 14.0);
    pub const ENEMY_SHOT_SIZE: (f32, f32) = (4.0, 14.0);

    /// Vertical gap kept between the cannon and the lowest spawned enemy
    pub const SPAWN_CLEARANCE: f32 = 2.0;
    /// Smallest field that holds the cannon with one enemy row above it
    pub const MIN_FIELD_WIDTH: f32 = CANNON_SIZE.0;
    pub const MIN_FIELD_HEIGHT: f32 = CANNON_SIZE.1 + SPAWN_CLEARANCE + ENEMY_SIZE.1;

    /// Hard cap on swarm difficulty
    pub const MAX_LEVEL: u32 = 15;
    /// Maximum enemies stacked in one column
    pub const MAX_COLUMN_HEIGHT: usize = 5;
}

/// Half extents from a (width, height) sprite size
#[inline]
pub fn half_extents(size: (f32, f32)) -> Vec2 {
    Vec2::new(size.0 * 0.5, size.1 * 0.5)
}
