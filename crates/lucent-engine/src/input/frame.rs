use std::collections::HashSet;

use super::types::Key;

/// Per-frame input deltas.
///
/// `InputState` holds what is currently down; `InputFrame` holds what
/// changed since the last presented frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Keys pressed this frame (auto-repeat excluded).
    pub keys_pressed: HashSet<Key>,

    /// Pointer motion this frame, in physical pixels.
    pub pointer_delta: (f32, f32),

    /// Accumulated wheel motion, in lines.
    pub wheel_lines: f32,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.keys_pressed.clear();
        self.pointer_delta = (0.0, 0.0);
        self.wheel_lines = 0.0;
    }

    #[inline]
    pub fn pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}
