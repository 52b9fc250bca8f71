//! Platform abstraction layer
//!
//! The simulation consumes these collaborator surfaces and never implements
//! them itself:
//! - Input: level-triggered key polling
//! - Scene: actor add/remove notifications and the field size
//! - Audio: fire-and-forget cues
//! - HUD: score/lives/level and a single centred message

pub mod input;

use std::collections::HashSet;

use crate::audio::Cue;
use crate::sim::{AabbShape, ActorId, ActorKind};

pub use input::EdgeTrigger;

/// Logical keys the game polls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Fire,
    /// Enter/Space on title and end screens
    Confirm,
    /// Manual difficulty bump
    Difficulty,
}

/// Message colour (RGBA)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(220, 40, 40);
    pub const GREEN: Color = Color::rgb(60, 220, 90);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

pub trait Input {
    fn is_pressed(&self, key: Key) -> bool;
}

pub trait Scene {
    fn add_entity(&mut self, id: ActorId, kind: ActorKind, shape: AabbShape);
    fn remove_entity(&mut self, id: ActorId);
    fn current_field_size(&self) -> (f32, f32);
}

pub trait Audio {
    fn play_cue(&mut self, cue: Cue);
}

pub trait Hud {
    fn set_score(&mut self, score: u64);
    fn set_lives(&mut self, lives: u32);
    fn set_level(&mut self, level: u32);
    fn show_message(&mut self, text: &str, color: Color);
    fn hide_message(&mut self);
}

/// Plain held-key set, for scripted input and tests
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    pressed: HashSet<Key>,
}

impl KeyState {
    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn press(&mut self, key: Key) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.set(key, false);
    }

    pub fn release_all(&mut self) {
        self.pressed.clear();
    }
}

impl Input for KeyState {
    fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }
}
