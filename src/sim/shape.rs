//! Axis-aligned bounding boxes for actors
//!
//! A box is a center plus half extents. Overlap is strict: boxes that only
//! share an edge do not collide.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle around an actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AabbShape {
    pub center: Vec2,
    pub half: Vec2,
}

impl AabbShape {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Strict overlap test
    pub fn overlaps(&self, other: &AabbShape) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    /// True if any part of the box lies inside `[0, size.x] x [0, size.y]`
    pub fn intersects_field(&self, size: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        max.x >= 0.0 && max.y >= 0.0 && min.x <= size.x && min.y <= size.y
    }

    /// Shift the box by an offset
    #[inline]
    pub fn translate(&mut self, offset: Vec2) {
        self.center += offset;
    }
}
