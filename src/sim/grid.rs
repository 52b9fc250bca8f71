//! Uniform grid broad phase over the play-field
//!
//! Rebuilt from scratch every tick. Each actor is bucketed into every cell
//! its box overlaps, clamped to the field; an actor whose box misses the
//! field entirely lands in no cell and is reported as not contained, which
//! is how off-field actors are detected.
//!
//! With a cell edge of 1.25x the nominal sprite, any sprite spans at most
//! 2x2 cells, so a query (its cells plus one surrounding ring) touches a
//! constant number of buckets regardless of how many actors are alive.

use std::collections::HashSet;

use glam::Vec2;

use super::actor::ActorId;
use super::shape::AabbShape;

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    field: Vec2,
    cols: usize,
    rows: usize,
    /// Row-major buckets of actor ids
    cells: Vec<Vec<ActorId>>,
    known: HashSet<ActorId>,
}

impl SpatialIndex {
    /// Grid covering `[0, field.x] x [0, field.y]`. Callers validate the
    /// field size and cell edge beforehand.
    pub fn new(field: Vec2, cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0 && field.x > 0.0 && field.y > 0.0);
        let cols = ((field.x / cell_size).ceil() as usize).max(1);
        let rows = ((field.y / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            field,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            known: HashSet::new(),
        }
    }

    /// Grid dimensions in cells (columns, rows)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Empty every bucket, keeping allocations
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.known.clear();
    }

    /// Bucket an actor into the cells its box overlaps
    pub fn insert(&mut self, id: ActorId, shape: &AabbShape) {
        let Some((c0, r0, c1, r1)) = self.cell_range(shape) else {
            return;
        };
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.cells[row * self.cols + col].push(id);
            }
        }
        self.known.insert(id);
    }

    /// Whether the actor landed in at least one cell at the last insert
    pub fn contains(&self, id: ActorId) -> bool {
        self.known.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Ids of indexed actors (other than `id`) whose current box overlaps
    /// `shape`, in ascending id order.
    ///
    /// `current_shape` resolves an id to the actor's box as of now; returning
    /// `None` drops the candidate (removed or already dead this tick).
    pub fn query_colliding<F>(&self, id: ActorId, shape: &AabbShape, current_shape: F) -> Vec<ActorId>
    where
        F: Fn(ActorId) -> Option<AabbShape>,
    {
        let Some((c0, r0, c1, r1)) = self.cell_range(shape) else {
            return Vec::new();
        };
        // One extra ring catches actors that moved less than a cell since the rebuild
        let (c0, r0) = (c0.saturating_sub(1), r0.saturating_sub(1));
        let (c1, r1) = ((c1 + 1).min(self.cols - 1), (r1 + 1).min(self.rows - 1));

        let mut hits = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                for &other in &self.cells[row * self.cols + col] {
                    if other == id {
                        continue;
                    }
                    if let Some(other_shape) = current_shape(other) {
                        if shape.overlaps(&other_shape) {
                            hits.push(other);
                        }
                    }
                }
            }
        }
        hits.sort_unstable();
        hits.dedup();
        hits
    }

    /// Inclusive cell range overlapped by a box, or `None` if it misses the field
    fn cell_range(&self, shape: &AabbShape) -> Option<(usize, usize, usize, usize)> {
        if !shape.intersects_field(self.field) {
            return None;
        }
        let (min, max) = (shape.min(), shape.max());
        let to_col = |x: f32| ((x / self.cell_size).floor().max(0.0) as usize).min(self.cols - 1);
        let to_row = |y: f32| ((y / self.cell_size).floor().max(0.0) as usize).min(self.rows - 1);
        Some((to_col(min.x), to_row(min.y), to_col(max.x), to_row(max.y)))
    }
}
