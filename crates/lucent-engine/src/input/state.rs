use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{ButtonState, InputEvent, Key, MouseButton};

/// Current input state for the window.
#[derive(Debug, Default)]
pub struct InputState {
    pub focused: bool,

    /// Pointer position in physical pixels, `None` when outside the window.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,

    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    #[inline]
    pub fn is_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    #[inline]
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Applies an event to the held state and records transitions into `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Releases are not delivered while unfocused.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                if let Some((px, py)) = self.pointer_pos {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((x, y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state, repeat } => match state {
                ButtonState::Pressed => {
                    if self.keys_down.insert(key) && !repeat {
                        frame.keys_pressed.insert(key);
                    }
                }
                ButtonState::Released => {
                    self.keys_down.remove(&key);
                }
            },

            InputEvent::PointerButton { button, state } => match state {
                ButtonState::Pressed => {
                    self.buttons_down.insert(button);
                }
                ButtonState::Released => {
                    self.buttons_down.remove(&button);
                }
            },

            InputEvent::Wheel { lines } => {
                frame.wheel_lines += lines;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: ButtonState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn press_is_recorded_once_until_release() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::G, ButtonState::Pressed));
        assert!(frame.pressed(Key::G));
        assert!(state.is_down(Key::G));

        frame.clear();
        state.apply_event(&mut frame, InputEvent::Key { key: Key::G, state: ButtonState::Pressed, repeat: true });
        assert!(!frame.pressed(Key::G));

        state.apply_event(&mut frame, key(Key::G, ButtonState::Released));
        assert!(!state.is_down(Key::G));
    }

    #[test]
    fn pointer_delta_accumulates_after_first_sample() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        assert_eq!(frame.pointer_delta, (0.0, 0.0));

        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 13.0, y: 8.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 15.0, y: 8.0 });
        assert_eq!(frame.pointer_delta, (5.0, -2.0));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, key(Key::ArrowLeft, ButtonState::Pressed));
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton { button: MouseButton::Left, state: ButtonState::Pressed },
        );

        state.apply_event(&mut frame, InputEvent::Focused(false));
        assert!(state.keys_down.is_empty());
        assert!(!state.is_button_down(MouseButton::Left));
    }

    #[test]
    fn wheel_sums_within_frame() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::Wheel { lines: 1.0 });
        state.apply_event(&mut frame, InputEvent::Wheel { lines: -0.5 });
        assert_eq!(frame.wheel_lines, 0.5);
        frame.clear();
        assert_eq!(frame.wheel_lines, 0.0);
    }
}
