//! Keyboard input seam
//!
//! The simulation only ever asks "is this key held?". Key identifiers are
//! `KeyboardEvent.code` strings so the browser shell can forward them as-is.

use std::collections::HashSet;

/// Source of held-key state, polled once per tick
pub trait InputSource {
    fn is_pressed(&self, key: &str) -> bool;
}

/// Key bindings for each gameplay intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub left: [&'static str; 2],
    pub right: [&'static str; 2],
    pub fire: &'static str,
    pub camera_up: &'static str,
    pub camera_down: &'static str,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: ["ArrowLeft", "KeyA"],
            right: ["ArrowRight", "KeyD"],
            fire: "Space",
            camera_up: "ArrowUp",
            camera_down: "ArrowDown",
        }
    }
}

/// Movement and firing intent resolved from one input poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub camera_up: bool,
    pub camera_down: bool,
}

impl Intent {
    /// Poll every binding once
    pub fn poll(input: &(impl InputSource + ?Sized), keys: &KeyBindings) -> Self {
        Self {
            left: keys.left.iter().any(|k| input.is_pressed(k)),
            right: keys.right.iter().any(|k| input.is_pressed(k)),
            fire: input.is_pressed(keys.fire),
            camera_up: input.is_pressed(keys.camera_up),
            camera_down: input.is_pressed(keys.camera_down),
        }
    }

    /// -1, 0 or +1 along x
    pub fn horizontal(&self) -> f32 {
        (self.right as i32 - self.left as i32) as f32
    }

    /// -1, 0 or +1 for the camera offset
    pub fn vertical(&self) -> f32 {
        (self.camera_up as i32 - self.camera_down as i32) as f32
    }
}

/// Set of currently held keys
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: HashSet<String>,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: &str) {
        self.held.insert(key.to_owned());
    }

    pub fn release(&mut self, key: &str) {
        self.held.remove(key);
    }

    /// Drop every held key (window lost focus, keyup events will not arrive)
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl InputSource for KeyState {
    fn is_pressed(&self, key: &str) -> bool {
        self.held.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_either_binding_triggers_intent() {
        let keys = KeyBindings::default();
        let mut state = KeyState::new();

        state.press("KeyA");
        assert_eq!(Intent::poll(&state, &keys).horizontal(), -1.0);

        state.release("KeyA");
        state.press("ArrowLeft");
        assert!(Intent::poll(&state, &keys).left);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let keys = KeyBindings::default();
        let mut state = KeyState::new();
        state.press("ArrowLeft");
        state.press("KeyD");

        let intent = Intent::poll(&state, &keys);
        assert!(intent.left && intent.right);
        assert_eq!(intent.horizontal(), 0.0);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut state = KeyState::new();
        state.press("Space");
        state.press("ArrowUp");
        state.clear();
        assert!(!state.is_pressed("Space"));
        assert!(!state.is_pressed("ArrowUp"));
    }
}
