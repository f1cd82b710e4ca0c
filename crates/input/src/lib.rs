//! Input handling for keyboard and mouse.

use glam::Vec2;
use std::collections::HashSet;

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,

    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,

    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Accumulated mouse delta until the next frame.
    accumulated_delta: Vec2,

    /// Whether the cursor is captured/locked.
    cursor_locked: bool,

    /// Wheel notches this frame, positive away from the user.
    scroll: f32,
    accumulated_scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
        self.scroll = self.accumulated_scroll;
        self.accumulated_scroll = 0.0;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    /// Process mouse movement.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.accumulated_delta.x += delta.0 as f32;
        self.accumulated_delta.y += delta.1 as f32;
    }

    /// Process wheel movement in notches.
    pub fn process_scroll(&mut self, notches: f32) {
        self.accumulated_scroll += notches;
    }

    // Query methods

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a mouse button is held.
    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Check if a mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Pointer movement while the left button is held and the cursor is free.
    pub fn drag_delta(&self) -> Vec2 {
        if !self.cursor_locked && self.is_mouse_held(MouseButton::Left) {
            self.mouse_delta
        } else {
            Vec2::ZERO
        }
    }

    /// Wheel notches scrolled this frame.
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Check if the cursor is locked.
    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    /// Set cursor lock state.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        if self.cursor_locked != locked {
            log::debug!("Cursor {}", if locked { "locked" } else { "released" });
        }
        self.cursor_locked = locked;
    }

    /// Get movement input as a normalized vector (WASD).
    pub fn get_movement_input(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;

        if self.is_key_held(KeyCode::KeyW) {
            movement.y += 1.0;
        }
        if self.is_key_held(KeyCode::KeyS) {
            movement.y -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyA) {
            movement.x -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyD) {
            movement.x += 1.0;
        }

        if movement.length_squared() > 0.0 {
            movement = movement.normalize();
        }

        movement
    }

    /// Check if sprint is held (Shift).
    pub fn is_sprinting(&self) -> bool {
        self.is_key_held(KeyCode::ShiftLeft) || self.is_key_held(KeyCode::ShiftRight)
    }

    /// Check if jump was pressed (Space).
    pub fn is_jump_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::Space)
    }

    /// Check if a swing was clicked this frame (Left mouse button, one-shot per click).
    pub fn is_swing_pressed(&self) -> bool {
        self.is_mouse_pressed(MouseButton::Left)
    }

    /// Check if the cursor release key was pressed (Escape).
    pub fn is_release_pressed(&self) -> bool {
        self.is_key_pressed(KeyCode::Escape)
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
