//! Edge detection over polled key state

/// Fires once when a key goes down and then comes back up.
///
/// Holds the previous and current samples explicitly; call `update` exactly
/// once per tick with the polled state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeTrigger {
    prev: bool,
    current: bool,
}

impl EdgeTrigger {
    /// Record this tick's sample; true on the release following a press
    pub fn update(&mut self, pressed: bool) -> bool {
        self.prev = self.current;
        self.current = pressed;
        self.prev && !self.current
    }

    pub fn is_held(&self) -> bool {
        self.current
    }

    /// Forget any press in progress (a held key must be released and pressed again)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
