use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::window::Window;

/// Receives the input events a [`Window`] dispatches.
///
/// Events arrive unmodified, in the order the platform delivered them.
pub trait InputHandler {
    /// Called once when the handler is installed on an initialized window.
    fn init(&mut self, _window: &Window) {}

    fn on_key(&mut self, key: KeyCode, state: ElementState, repeat: bool);

    fn on_mouse_button(&mut self, button: MouseButton, state: ElementState);

    /// Scroll amount in lines.
    fn on_scroll(&mut self, delta: Vec2);

    fn on_cursor_move(&mut self, position: Vec2);

    /// Called by the runner after each frame.
    fn end_frame(&mut self) {}
}

/// Tracks input state for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_buttons_pressed: HashSet<MouseButton>,
    mouse_buttons_released: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.mouse_buttons_released.contains(&button)
    }

    /// Current mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement delta this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame (in "lines").
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

impl InputHandler for Input {
    fn on_key(&mut self, key: KeyCode, state: ElementState, _repeat: bool) {
        match state {
            ElementState::Pressed => {
                if !self.keys_down.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_down.insert(key);
            }
            ElementState::Released => {
                self.keys_down.remove(&key);
                self.keys_released.insert(key);
            }
        }
    }

    fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_buttons_down.contains(&button) {
                    self.mouse_buttons_pressed.insert(button);
                }
                self.mouse_buttons_down.insert(button);
            }
            ElementState::Released => {
                self.mouse_buttons_down.remove(&button);
                self.mouse_buttons_released.insert(button);
            }
        }
    }

    fn on_scroll(&mut self, delta: Vec2) {
        self.scroll_delta += delta;
    }

    fn on_cursor_move(&mut self, position: Vec2) {
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
    }

    /// Resets per-frame state.
    fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_buttons_pressed.clear();
        self.mouse_buttons_released.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_is_reported_for_one_frame() {
        let mut input = Input::new();
        input.on_key(KeyCode::Space, ElementState::Pressed, false);
        input.on_key(KeyCode::Space, ElementState::Pressed, true);
        assert!(input.key_pressed(KeyCode::Space));
        assert!(input.key_down(KeyCode::Space));

        input.end_frame();
        assert!(!input.key_pressed(KeyCode::Space));
        assert!(input.key_down(KeyCode::Space));

        input.on_key(KeyCode::Space, ElementState::Released, false);
        assert!(input.key_released(KeyCode::Space));
        assert!(!input.key_down(KeyCode::Space));
    }

    #[test]
    fn cursor_and_scroll_accumulate() {
        let mut input = Input::new();
        input.on_cursor_move(Vec2::new(10.0, 5.0));
        input.on_cursor_move(Vec2::new(12.0, 9.0));
        input.on_scroll(Vec2::new(0.0, 1.0));
        input.on_scroll(Vec2::new(0.0, 2.0));

        assert_eq!(input.mouse_position(), Vec2::new(12.0, 9.0));
        assert_eq!(input.mouse_delta(), Vec2::new(12.0, 9.0));
        assert_eq!(input.scroll_delta(), Vec2::new(0.0, 3.0));

        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.mouse_position(), Vec2::new(12.0, 9.0));
    }
}
