//! Game settings and balance tuning
//!
//! Loaded from an optional JSON file; every missing key falls back to the
//! default. `validate` is the single gate that keeps the swarm invariants
//! (positive floors, probabilities in range) intact.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{GRID_CELL_SIZE, MAX_COLUMN_HEIGHT};
use crate::error::{SimError, check_field_size};

/// Game settings/tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Field ===
    /// Play-field width for hosts without a scene of their own (the native
    /// runner); at least 50
    pub field_width: f32,
    /// Play-field height for hosts without a scene of their own; at least 60
    pub field_height: f32,
    /// Broad-phase grid cell edge
    pub cell_size: f32,
    /// RNG seed for enemy fire
    pub seed: u64,

    // === Player ===
    pub lives: u32,
    /// Cannon horizontal speed (px/s)
    pub cannon_speed: f32,
    /// Cannon spawn height (center), lowered on fields too short for it
    pub cannon_y: f32,
    pub player_shot_speed: f32,
    pub enemy_shot_speed: f32,

    // === Swarm layout ===
    pub columns: usize,
    pub column_spacing: f32,
    /// Enemies per column (at most 5)
    pub enemies_per_column: usize,
    pub row_spacing: f32,
    /// Distance from the top edge to the top row; spacings and margins
    /// shrink to fit fields smaller than this layout
    pub top_margin: f32,

    // === Swarm movement ===
    /// Horizontal travel per step before the level modifier
    pub base_speed: f32,
    /// Seconds between swarm steps
    pub period: f32,
    /// Lead enemy distance from an edge that triggers a reversal
    pub edge_margin: f32,
    /// Downward travel on a reversal step
    pub drop_distance: f32,

    // === Difficulty ===
    /// Seconds between automatic difficulty bumps
    pub level_period: f32,
    pub modifier_step: f32,
    pub modifier_floor: f32,
    pub period_step: f32,
    pub period_floor: f32,
    /// Per-column, per-tick enemy fire chance at level 1
    pub shoot_probability: f64,
    pub shoot_probability_step: f64,
    /// Every time the score crosses a multiple of this, difficulty goes up
    pub bonus_score_interval: u64,

    // === Audio ===
    /// Drop every sound cue
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 650.0,
            cell_size: GRID_CELL_SIZE,
            seed: 0x5eed,

            lives: 3,
            cannon_speed: 200.0,
            cannon_y: 50.0,
            player_shot_speed: 400.0,
            enemy_shot_speed: 400.0,

            columns: 10,
            column_spacing: 60.0,
            enemies_per_column: MAX_COLUMN_HEIGHT,
            row_spacing: 45.0,
            top_margin: 100.0,

            base_speed: 10.0,
            period: 1.0,
            edge_margin: 50.0,
            drop_distance: 10.0,

            level_period: 20.0,
            modifier_step: 0.05,
            modifier_floor: 0.25,
            period_step: 0.06,
            period_floor: 0.1,
            shoot_probability: 0.001,
            shoot_probability_step: 0.0005,
            bonus_score_interval: 150,

            muted: false,
        }
    }
}

impl Settings {
    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| SimError::SettingsParse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SimError::SettingsParse(format!("{}: {}", path.display(), e)))?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path).unwrap_or_else(|err| {
                log::warn!("{}; using default settings", err);
                Self::default()
            }),
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Serialize for writing a template settings file
    pub fn to_json(&self) -> String {
        // Plain data with no maps keyed by non-strings; serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject values that would produce degenerate geometry or break the
    /// monotonic difficulty curve
    pub fn validate(&self) -> Result<(), SimError> {
        check_field_size(self.field_width, self.field_height)?;

        let fail = |msg: &str| Err(SimError::InvalidSettings(msg.to_string()));
        let positive = |v: f32| v.is_finite() && v > 0.0;

        if !positive(self.cell_size) {
            return fail("cell_size must be positive");
        }
        if self.lives == 0 {
            return fail("lives must be at least 1");
        }
        if !positive(self.cannon_speed)
            || !positive(self.player_shot_speed)
            || !positive(self.enemy_shot_speed)
        {
            return fail("speeds must be positive");
        }
        if self.column_spacing < 0.0 || self.row_spacing < 0.0 {
            return fail("column_spacing and row_spacing must not be negative");
        }
        if self.columns == 0 {
            return fail("swarm needs at least one column");
        }
        if self.enemies_per_column == 0 || self.enemies_per_column > MAX_COLUMN_HEIGHT {
            return fail("enemies_per_column must be in 1..=5");
        }
        if !positive(self.base_speed) || !positive(self.period) || !positive(self.level_period) {
            return fail("base_speed, period and level_period must be positive");
        }
        if !positive(self.modifier_floor) || self.modifier_floor > 1.0 {
            return fail("modifier_floor must be in (0, 1]");
        }
        if !positive(self.period_floor) || self.period_floor > self.period {
            return fail("period_floor must be positive and not above period");
        }
        if self.modifier_step < 0.0 || self.period_step < 0.0 {
            return fail("difficulty steps must not be negative");
        }
        if !(0.0..=1.0).contains(&self.shoot_probability) || self.shoot_probability_step < 0.0 {
            return fail("shoot_probability must be in [0, 1] with a non-negative step");
        }
        if self.bonus_score_interval == 0 {
            return fail("bonus_score_interval must be positive");
        }
        Ok(())
    }
}
