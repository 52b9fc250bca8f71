//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by actor/column ID)
//! - No rendering, audio or input device dependencies

pub mod actor;
pub mod grid;
pub mod shape;
pub mod state;
pub mod swarm;
pub mod tick;

pub use actor::{Actor, ActorId, ActorKind, Actors, CollisionOutcome, EnemyKind};
pub use grid::SpatialIndex;
pub use shape::AabbShape;
pub use state::{GameState, PlayerState, SimEvent, Snapshot};
pub use swarm::{Column, ColumnId, Formation, Swarm, SwarmReport, cannon_home};
pub use tick::{TickInput, tick};
