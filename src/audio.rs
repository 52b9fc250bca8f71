//! Sound cues
//!
//! The simulation only names cues; playback belongs to whatever implements
//! `platform::Audio`. `AudioManager` sits in front of that backend and
//! applies the mute setting.

use serde::{Deserialize, Serialize};

use crate::platform::Audio;
use crate::settings::Settings;

/// Sound cue identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Player projectile launched
    Shoot,
    /// Enemy destroyed
    Kill,
    /// Cannon destroyed
    Death,
}

impl Cue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cue::Shoot => "shoot",
            Cue::Kill => "kill",
            Cue::Death => "death",
        }
    }
}

/// Mute switch in front of an audio backend
pub struct AudioManager<A: Audio> {
    backend: A,
    muted: bool,
}

impl<A: Audio> AudioManager<A> {
    pub fn new(backend: A, settings: &Settings) -> Self {
        if settings.muted {
            log::info!("Audio muted");
        }
        Self {
            backend,
            muted: settings.muted,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }
}

impl<A: Audio> Audio for AudioManager<A> {
    /// Forward a cue unless muted
    fn play_cue(&mut self, cue: Cue) {
        if !self.muted {
            self.backend.play_cue(cue);
        }
    }
}
