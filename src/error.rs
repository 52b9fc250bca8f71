//! Errors surfaced when building a simulation
//!
//! The tick itself never fails; everything here is rejected up front.

use std::fmt;

use crate::consts::{MIN_FIELD_HEIGHT, MIN_FIELD_WIDTH};

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Field size from the scene collaborator is not finite, or too small to
    /// hold the cannon below one enemy row
    InvalidFieldSize { width: f32, height: f32 },
    /// A tuning value would break a simulation invariant
    InvalidSettings(String),
    /// Settings JSON could not be read or parsed
    SettingsParse(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidFieldSize { width, height } => {
                write!(f, "invalid field size {}x{}", width, height)
            }
            SimError::InvalidSettings(reason) => write!(f, "invalid settings: {}", reason),
            SimError::SettingsParse(reason) => write!(f, "could not parse settings: {}", reason),
        }
    }
}

impl std::error::Error for SimError {}

/// Reject degenerate play-fields before any geometry is derived from them
pub fn check_field_size(width: f32, height: f32) -> Result<(), SimError> {
    let valid = |v: f32, min: f32| v.is_finite() && v >= min;
    if valid(width, MIN_FIELD_WIDTH) && valid(height, MIN_FIELD_HEIGHT) {
        Ok(())
    } else {
        Err(SimError::InvalidFieldSize { width, height })
    }
}
