//! Input system for keyboard and cursor state
//!
//! Tracks which keys are held and where the cursor is inside the client area,
//! and turns fresh key presses into [`DemoKey`] actions for the active demo.

use std::collections::HashSet;
use winit::event::ElementState;
use winit::keyboard::KeyCode;
use tracing::trace;

use crate::teapot::DemoKey;

/// InputSystem manages keyboard and cursor state
#[derive(Debug, Default)]
pub struct InputSystem {
    pressed_keys: HashSet<KeyCode>,
    cursor_position: (f64, f64),
}

impl InputSystem {
    /// Create a new InputSystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Process keyboard input event.
    ///
    /// Returns the demo action for a key that just went down. Auto-repeat
    /// while the key is held does not fire again.
    pub fn on_keyboard_input(&mut self, keycode: KeyCode, state: ElementState) -> Option<DemoKey> {
        match state {
            ElementState::Pressed => {
                if !self.pressed_keys.insert(keycode) {
                    return None;
                }
                let action = Self::map_key(keycode);
                if let Some(action) = action {
                    trace!(?keycode, ?action, "Demo key pressed");
                }
                action
            }
            ElementState::Released => {
                self.pressed_keys.remove(&keycode);
                None
            }
        }
    }

    /// Process cursor movement, in physical client coordinates
    pub fn on_mouse_move(&mut self, position: (f64, f64)) {
        self.cursor_position = position;
    }

    /// Forget held keys (useful when window loses focus)
    pub fn reset_keys(&mut self) {
        self.pressed_keys.clear();
    }

    /// Current cursor position in client coordinates
    pub fn cursor_position(&self) -> (f64, f64) {
        self.cursor_position
    }

    /// Check if a specific key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    fn map_key(keycode: KeyCode) -> Option<DemoKey> {
        match keycode {
            KeyCode::Digit1 | KeyCode::Numpad1 => Some(DemoKey::DecreaseTessellation),
            KeyCode::Digit2 | KeyCode::Numpad2 => Some(DemoKey::IncreaseTessellation),
            KeyCode::Digit3 | KeyCode::Numpad3 => Some(DemoKey::Wireframe),
            KeyCode::Digit4 | KeyCode::Numpad4 => Some(DemoKey::Solid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_keys_map_to_actions() {
        let mut input = InputSystem::new();
        assert_eq!(
            input.on_keyboard_input(KeyCode::Digit2, ElementState::Pressed),
            Some(DemoKey::IncreaseTessellation)
        );
        assert!(input.is_key_pressed(KeyCode::Digit2));
        assert_eq!(input.on_keyboard_input(KeyCode::Digit2, ElementState::Released), None);
        assert!(!input.is_key_pressed(KeyCode::Digit2));

        assert_eq!(
            input.on_keyboard_input(KeyCode::Digit4, ElementState::Pressed),
            Some(DemoKey::Solid)
        );
        assert_eq!(input.on_keyboard_input(KeyCode::KeyW, ElementState::Pressed), None);
    }

    #[test]
    fn test_held_key_fires_once() {
        let mut input = InputSystem::new();
        assert!(input.on_keyboard_input(KeyCode::Digit1, ElementState::Pressed).is_some());
        assert!(input.on_keyboard_input(KeyCode::Digit1, ElementState::Pressed).is_none());

        input.reset_keys();
        assert!(input.on_keyboard_input(KeyCode::Digit1, ElementState::Pressed).is_some());
    }

    #[test]
    fn test_cursor_tracking() {
        let mut input = InputSystem::new();
        assert_eq!(input.cursor_position(), (0.0, 0.0));
        input.on_mouse_move((120.5, 42.0));
        assert_eq!(input.cursor_position(), (120.5, 42.0));
    }
}
