//! The enemy formation: columns, cadence stepping and difficulty
//!
//! The swarm owns column membership only; enemy actors live in the tick's
//! actor arena and are moved through it. A column lists its enemies front
//! first (the lowest one, nearest the cannon), and that front enemy is the
//! one that fires and the one checked against the field edges.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ActorId, Actors, EnemyKind};
use crate::consts::{CANNON_SIZE, ENEMY_SIZE, MAX_COLUMN_HEIGHT, MAX_LEVEL, SPAWN_CLEARANCE};
use crate::half_extents;
use crate::settings::Settings;

/// Enemy projectiles spawn this far below the front enemy
pub const FIRE_OFFSET: f32 = 50.0;

/// Stable column handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId(pub u32);

/// A vertical stack of enemies sharing an x position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    /// Front (lowest) enemy first
    pub enemies: Vec<ActorId>,
}

impl Column {
    /// The enemy that fires and leads edge checks
    pub fn lead(&self) -> Option<ActorId> {
        self.enemies.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    /// Whether the lead enemy is within `margin` of the edge it is heading for
    fn should_turn(&self, actors: &Actors, direction: f32, field_width: f32, margin: f32) -> bool {
        let Some(lead) = self.lead().and_then(|id| actors.get(&id)) else {
            return false;
        };
        let x = lead.pos().x;
        (direction > 0.0 && x >= field_width - margin) || (direction < 0.0 && x <= margin)
    }
}

/// Difficulty steps and floors, copied from settings at spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyCurve {
    pub level_period: f32,
    pub modifier_step: f32,
    pub modifier_floor: f32,
    pub period_step: f32,
    pub period_floor: f32,
    pub shoot_probability_step: f64,
}

impl DifficultyCurve {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            level_period: settings.level_period,
            modifier_step: settings.modifier_step,
            modifier_floor: settings.modifier_floor,
            period_step: settings.period_step,
            period_floor: settings.period_floor,
            shoot_probability_step: settings.shoot_probability_step,
        }
    }
}

/// Cannon start position: horizontally centred, at the configured height
/// unless that would leave no room for an enemy row above it
pub fn cannon_home(settings: &Settings, field: Vec2) -> Vec2 {
    let half = half_extents(CANNON_SIZE).y;
    let highest = field.y - ENEMY_SIZE.1 - SPAWN_CLEARANCE - half;
    Vec2::new(field.x * 0.5, settings.cannon_y.min(highest).max(half))
}

/// Spawn grid for one swarm, squeezed to fit the field.
///
/// Every enemy box lies inside the field and above the cannon's start box.
/// On fields smaller than the configured layout, spacings shrink (enemies
/// may overlap each other) but the column and row counts are kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formation {
    pub columns: usize,
    pub rows: usize,
    pub start_x: f32,
    pub column_spacing: f32,
    pub top_y: f32,
    pub row_spacing: f32,
    /// Lowest enemy center that stays clear of the cannon
    pub floor_y: f32,
}

impl Formation {
    pub fn fit(settings: &Settings, field: Vec2) -> Self {
        let enemy = half_extents(ENEMY_SIZE);
        let columns = settings.columns;
        let rows = settings.enemies_per_column.min(MAX_COLUMN_HEIGHT);

        // Leave room to march one step before the edge check turns the swarm
        let side = (settings.edge_margin + settings.base_speed).max(enemy.x);
        let usable_w = (field.x - 2.0 * side).max(0.0);
        let column_spacing = match columns {
            0 | 1 => 0.0,
            n => settings.column_spacing.min(usable_w / (n - 1) as f32),
        };
        let span = columns.saturating_sub(1) as f32 * column_spacing;
        let start_x = (field.x - span) * 0.5;

        let cannon_top = cannon_home(settings, field).y + half_extents(CANNON_SIZE).y;
        let lowest = cannon_top + SPAWN_CLEARANCE + enemy.y;
        let highest = (field.y - enemy.y).max(lowest);
        let top_y = (field.y - settings.top_margin).min(highest).max(lowest);
        let row_spacing = match rows {
            0 | 1 => 0.0,
            n => settings.row_spacing.min((top_y - lowest) / (n - 1) as f32),
        };

        let formation = Self {
            columns,
            rows,
            start_x,
            column_spacing,
            top_y,
            row_spacing,
            floor_y: lowest,
        };
        if column_spacing < settings.column_spacing || row_spacing < settings.row_spacing {
            log::debug!("Formation squeezed to fit {}x{}: {:?}", field.x, field.y, formation);
        }
        formation
    }

    /// Center of the enemy at `column`, `row` (row 0 is the top row)
    pub fn position(&self, column: usize, row: usize) -> Vec2 {
        let x = self.start_x + column as f32 * self.column_spacing;
        let y = (self.top_y - row as f32 * self.row_spacing).max(self.floor_y);
        Vec2::new(x, y)
    }
}

/// What a swarm update produced for the tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwarmReport {
    /// No enemies left; nothing was moved
    pub mission_complete: bool,
    /// Every level reached during this update, in order
    pub new_levels: Vec<u32>,
}

/// The enemy formation plus its cadence and difficulty state
#[derive(Debug, Clone)]
pub struct Swarm {
    pub columns: BTreeMap<ColumnId, Column>,
    pub elapsed: f32,
    pub period: f32,
    /// +1 right, -1 left
    pub direction: f32,
    pub base_speed: f32,
    pub level_modifier: f32,
    pub speed: f32,
    pub level: u32,
    pub level_elapsed: f32,
    pub shoot_probability: f64,
    pub edge_margin: f32,
    pub drop_distance: f32,
    pub curve: DifficultyCurve,
}

impl Swarm {
    /// Empty formation at level 1 with the settings' cadence
    pub fn new(settings: &Settings) -> Self {
        Self {
            columns: BTreeMap::new(),
            elapsed: 0.0,
            period: settings.period,
            direction: 1.0,
            base_speed: settings.base_speed,
            level_modifier: 1.0,
            speed: settings.base_speed,
            level: 1,
            level_elapsed: 0.0,
            shoot_probability: settings.shoot_probability,
            edge_margin: settings.edge_margin,
            drop_distance: settings.drop_distance,
            curve: DifficultyCurve::from_settings(settings),
        }
    }

    /// Build the full formation centred in the field. Enemy actors are
    /// returned for the caller to add to its arena.
    pub fn spawn(
        settings: &Settings,
        field: Vec2,
        mut next_id: impl FnMut() -> ActorId,
    ) -> (Self, Vec<Actor>) {
        let mut swarm = Self::new(settings);
        let layout = Formation::fit(settings, field);

        let mut actors = Vec::with_capacity(layout.columns * layout.rows);
        for c in 0..layout.columns {
            let column_id = ColumnId(c as u32);
            let mut column = Column {
                id: column_id,
                enemies: Vec::with_capacity(layout.rows),
            };
            // Front first: walk rows bottom-up
            for row in (0..layout.rows).rev() {
                let at = layout.position(c, row);
                let enemy = Actor::enemy(next_id(), at, EnemyKind::for_row(row), column_id);
                column.enemies.push(enemy.id);
                actors.push(enemy);
            }
            swarm.columns.insert(column_id, column);
        }
        (swarm, actors)
    }

    /// Total enemies across all columns
    pub fn enemy_count(&self) -> usize {
        self.columns.values().map(|c| c.enemies.len()).sum()
    }

    /// Detach a destroyed enemy from its column, pruning the column if empty
    pub fn remove_enemy(&mut self, column: ColumnId, enemy: ActorId) {
        let Some(col) = self.columns.get_mut(&column) else {
            debug_assert!(false, "enemy {:?} references missing column {:?}", enemy, column);
            log::warn!("Enemy {:?} references missing column {:?}", enemy, column);
            return;
        };
        col.enemies.retain(|&id| id != enemy);
        if col.is_empty() {
            self.columns.remove(&column);
            log::debug!("Column {:?} emptied and pruned", column);
        }
    }

    /// True if any column's lead enemy is near the edge it is heading for
    pub fn side_reached(&self, actors: &Actors, field_width: f32) -> bool {
        self.columns
            .values()
            .any(|c| c.should_turn(actors, self.direction, field_width, self.edge_margin))
    }

    /// Advance cadence and difficulty timers
    pub fn update(&mut self, dt: f32, manual_bump: bool, actors: &mut Actors, field_width: f32) -> SwarmReport {
        let mut report = SwarmReport::default();
        if self.enemy_count() == 0 {
            report.mission_complete = true;
            return report;
        }

        self.elapsed += dt;
        while self.elapsed >= self.period {
            self.elapsed -= self.period;
            let mut movement = Vec2::new(self.direction * self.speed, 0.0);
            if self.side_reached(actors, field_width) {
                self.direction = -self.direction;
                movement = Vec2::new(0.0, -self.drop_distance);
            }
            self.move_enemies(actors, movement);
        }

        self.level_elapsed += dt;
        while self.level_elapsed >= self.curve.level_period {
            self.level_elapsed -= self.curve.level_period;
            report.new_levels.extend(self.increase_difficulty());
        }

        if manual_bump {
            report.new_levels.extend(self.increase_difficulty());
        }

        report
    }

    fn move_enemies(&self, actors: &mut Actors, movement: Vec2) {
        for id in self.columns.values().flat_map(|c| c.enemies.iter()) {
            match actors.get_mut(id) {
                Some(enemy) => enemy.translate(movement),
                None => {
                    debug_assert!(false, "column references removed enemy {:?}", id);
                    log::warn!("Column references removed enemy {:?}", id);
                }
            }
        }
    }

    /// Raise the level by one. Returns the new level, or `None` at the cap
    /// (in which case nothing changes).
    pub fn increase_difficulty(&mut self) -> Option<u32> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        self.level += 1;
        self.level_modifier = (self.level_modifier - self.curve.modifier_step).max(self.curve.modifier_floor);
        self.period = (self.period - self.curve.period_step).max(self.curve.period_floor);
        self.shoot_probability = (self.shoot_probability + self.curve.shoot_probability_step).min(1.0);
        self.speed = self.base_speed * self.level_modifier;
        log::info!(
            "Swarm level {} (period {:.2}s, step {:.2}px, fire {:.4})",
            self.level,
            self.period,
            self.speed,
            self.shoot_probability
        );
        Some(self.level)
    }

    /// Roll each column's fire chance; returns spawn points below the
    /// firing columns' lead enemies, in column order
    pub fn roll_fire<R: Rng>(&self, rng: &mut R, actors: &Actors) -> Vec<Vec2> {
        let p = self.shoot_probability.clamp(0.0, 1.0);
        self.columns
            .values()
            .filter_map(|column| {
                // Roll every column so the RNG stream does not depend on layout
                let fires = rng.random_bool(p);
                let lead = column.lead().and_then(|id| actors.get(&id))?;
                fires.then(|| lead.pos() - Vec2::new(0.0, FIRE_OFFSET))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MIN_FIELD_HEIGHT, MIN_FIELD_WIDTH};
    use crate::sim::shape::AabbShape;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const FIELD: Vec2 = Vec2::new(800.0, 650.0);

    fn spawn(settings: &Settings) -> (Swarm, Actors) {
        let mut next = 0;
        let (swarm, list) = Swarm::spawn(settings, FIELD, || {
            next += 1;
            ActorId(next)
        });
        let actors = list.into_iter().map(|a| (a.id, a)).collect();
        (swarm, actors)
    }

    fn single_column_at(x: f32) -> (Swarm, Actors) {
        let settings = Settings {
            columns: 1,
            ..Settings::default()
        };
        let (swarm, mut actors) = spawn(&settings);
        for actor in actors.values_mut() {
            let dx = x - actor.pos().x;
            actor.translate(Vec2::new(dx, 0.0));
        }
        (swarm, actors)
    }

    #[test]
    fn test_spawn_layout() {
        let settings = Settings::default();
        let (swarm, actors) = spawn(&settings);
        assert_eq!(swarm.columns.len(), 10);
        assert_eq!(swarm.enemy_count(), 50);
        assert_eq!(actors.len(), 50);

        let column = &swarm.columns[&ColumnId(0)];
        let lead = &actors[&column.lead().unwrap()];
        let back = &actors[column.enemies.last().unwrap()];
        assert!(lead.pos().y < back.pos().y, "front enemy is the lowest");
        assert_eq!(lead.point_value(), Some(10));
        assert_eq!(back.point_value(), Some(40));
        // Columns share x
        assert!(column.enemies.iter().all(|id| actors[id].pos().x == lead.pos().x));
    }

    #[test]
    fn test_side_reached_then_drop_and_reverse() {
        let (mut swarm, mut actors) = single_column_at(FIELD.x - 10.0);
        assert_eq!(swarm.columns[&ColumnId(0)].enemies.len(), 5);
        assert_eq!(swarm.direction, 1.0);
        assert!(swarm.side_reached(&actors, FIELD.x));

        let before: Vec<Vec2> = actors.values().map(|a| a.pos()).collect();
        swarm.update(swarm.period, false, &mut actors, FIELD.x);
        let after: Vec<Vec2> = actors.values().map(|a| a.pos()).collect();

        assert_eq!(swarm.direction, -1.0);
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(*a - *b, Vec2::new(0.0, -10.0));
        }
    }

    #[test]
    fn test_horizontal_step_when_clear_of_edges() {
        let (mut swarm, mut actors) = single_column_at(400.0);
        swarm.update(0.5, false, &mut actors, FIELD.x);
        assert!(actors.values().all(|a| a.pos().x == 400.0), "no step before the period");
        swarm.update(0.5, false, &mut actors, FIELD.x);
        assert!(actors.values().all(|a| a.pos().x == 410.0));
    }

    #[test]
    fn test_catch_up_over_multiple_periods() {
        let (mut swarm, mut actors) = single_column_at(400.0);
        swarm.update(3.5, false, &mut actors, FIELD.x);
        assert!(actors.values().all(|a| (a.pos().x - 430.0).abs() < 1e-4));
        assert!((swarm.elapsed - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_left_edge_reverses() {
        let (mut swarm, actors) = single_column_at(40.0);
        swarm.direction = -1.0;
        assert!(swarm.side_reached(&actors, FIELD.x));
        swarm.direction = 1.0;
        assert!(!swarm.side_reached(&actors, FIELD.x));
    }

    #[test]
    fn test_remove_enemy_prunes_column() {
        let (mut swarm, _actors) = single_column_at(400.0);
        let ids = swarm.columns[&ColumnId(0)].enemies.clone();
        for id in &ids[..4] {
            swarm.remove_enemy(ColumnId(0), *id);
        }
        assert_eq!(swarm.columns[&ColumnId(0)].lead(), Some(ids[4]));
        swarm.remove_enemy(ColumnId(0), ids[4]);
        assert!(swarm.columns.is_empty());
        assert_eq!(swarm.enemy_count(), 0);
    }

    #[test]
    fn test_mission_complete_before_moving() {
        let (mut swarm, mut actors) = single_column_at(400.0);
        for id in swarm.columns[&ColumnId(0)].enemies.clone() {
            swarm.remove_enemy(ColumnId(0), id);
        }
        let report = swarm.update(10.0, true, &mut actors, FIELD.x);
        assert!(report.mission_complete);
        assert!(report.new_levels.is_empty());
        assert_eq!(swarm.elapsed, 0.0);
        assert_eq!(swarm.level, 1);
    }

    #[test]
    fn test_level_timer_and_manual_bump() {
        let (mut swarm, mut actors) = single_column_at(400.0);
        let report = swarm.update(20.0, false, &mut actors, FIELD.x);
        assert_eq!(report.new_levels, vec![2]);
        let report = swarm.update(0.0, true, &mut actors, FIELD.x);
        assert_eq!(report.new_levels, vec![3]);
    }

    #[test]
    fn test_increase_difficulty_adjusts_cadence() {
        let mut swarm = Swarm::new(&Settings::default());
        assert_eq!(swarm.increase_difficulty(), Some(2));
        assert!((swarm.level_modifier - 0.95).abs() < 1e-6);
        assert!((swarm.period - 0.94).abs() < 1e-6);
        assert!((swarm.shoot_probability - 0.0015).abs() < 1e-9);
        assert!((swarm.speed - 9.5).abs() < 1e-5);
    }

    #[test]
    fn test_difficulty_capped_and_idempotent() {
        let mut swarm = Swarm::new(&Settings::default());
        while swarm.increase_difficulty().is_some() {}
        assert_eq!(swarm.level, MAX_LEVEL);

        let snapshot = (swarm.level, swarm.level_modifier, swarm.period, swarm.shoot_probability, swarm.speed);
        assert_eq!(swarm.increase_difficulty(), None);
        assert_eq!(
            snapshot,
            (swarm.level, swarm.level_modifier, swarm.period, swarm.shoot_probability, swarm.speed)
        );
    }

    #[test]
    fn test_roll_fire_certain_and_never() {
        let (mut swarm, actors) = spawn(&Settings::default());
        let mut rng = Pcg32::seed_from_u64(1);

        swarm.shoot_probability = 1.0;
        let shots = swarm.roll_fire(&mut rng, &actors);
        assert_eq!(shots.len(), 10);
        let lead = &actors[&swarm.columns[&ColumnId(0)].lead().unwrap()];
        assert_eq!(shots[0], lead.pos() - Vec2::new(0.0, FIRE_OFFSET));

        swarm.shoot_probability = 0.0;
        assert!(swarm.roll_fire(&mut rng, &actors).is_empty());
    }

    proptest! {
        #[test]
        fn prop_difficulty_monotonic(
            bumps in 0usize..40,
            modifier_step in 0.0f32..0.3,
            period_step in 0.0f32..0.3,
        ) {
            let settings = Settings { modifier_step, period_step, ..Settings::default() };
            let mut swarm = Swarm::new(&settings);
            for _ in 0..bumps {
                let (m, p, s) = (swarm.level_modifier, swarm.period, swarm.shoot_probability);
                swarm.increase_difficulty();
                prop_assert!(swarm.level_modifier <= m);
                prop_assert!(swarm.period <= p);
                prop_assert!(swarm.shoot_probability >= s);
                prop_assert!(swarm.level_modifier >= settings.modifier_floor);
                prop_assert!(swarm.period >= settings.period_floor);
                prop_assert!(swarm.level <= MAX_LEVEL);
                prop_assert!((swarm.speed - swarm.base_speed * swarm.level_modifier).abs() < 1e-4);
            }
        }

        #[test]
        fn prop_formation_fits_any_field(
            width in MIN_FIELD_WIDTH..2000.0f32,
            height in MIN_FIELD_HEIGHT..2000.0f32,
        ) {
            let field = Vec2::new(width, height);
            let settings = Settings::default();
            let mut next = 0;
            let (swarm, enemies) = Swarm::spawn(&settings, field, || {
                next += 1;
                ActorId(next)
            });
            prop_assert_eq!(swarm.enemy_count(), 50);

            let cannon = AabbShape::new(cannon_home(&settings, field), half_extents(CANNON_SIZE));
            prop_assert!(inside(&cannon, field));
            for enemy in &enemies {
                prop_assert!(inside(&enemy.shape, field), "{:?} outside {:?}", enemy.shape, field);
                prop_assert!(!enemy.shape.overlaps(&cannon));
            }
        }
    }

    fn inside(shape: &AabbShape, field: Vec2) -> bool {
        let eps = 1e-3;
        shape.min().x >= -eps && shape.min().y >= -eps && shape.max().x <= field.x + eps && shape.max().y <= field.y + eps
    }

    #[test]
    fn test_default_field_keeps_configured_layout() {
        let layout = Formation::fit(&Settings::default(), FIELD);
        assert_eq!(layout.start_x, 130.0);
        assert_eq!(layout.column_spacing, 60.0);
        assert_eq!(layout.top_y, 550.0);
        assert_eq!(layout.row_spacing, 45.0);
        assert_eq!(cannon_home(&Settings::default(), FIELD), Vec2::new(400.0, 50.0));
    }

    #[test]
    fn test_narrow_field_squeezes_columns() {
        let field = Vec2::new(300.0, 650.0);
        let layout = Formation::fit(&Settings::default(), field);
        assert!(layout.column_spacing < 60.0);
        assert_eq!(layout.columns, 10);
        // Room to march before the edge margin turns the swarm
        let last = layout.position(9, 0).x;
        assert!(last < field.x - Settings::default().edge_margin);
        assert!(layout.position(0, 0).x > Settings::default().edge_margin);
    }

    #[test]
    fn test_short_field_lowers_cannon_and_stacks_rows() {
        let settings = Settings::default();
        let field = Vec2::new(800.0, MIN_FIELD_HEIGHT);
        let home = cannon_home(&settings, field);
        assert_eq!(home.y, CANNON_SIZE.1 * 0.5);
        let layout = Formation::fit(&settings, field);
        assert_eq!(layout.row_spacing, 0.0);
        assert_eq!(layout.position(0, 4).y, field.y - ENEMY_SIZE.1 * 0.5);
    }
}
