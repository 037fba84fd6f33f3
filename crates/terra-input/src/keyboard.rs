//! Keyboard polling. Physical key codes keep the movement keys in place on
//! every layout.

use std::collections::{HashMap, HashSet};

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// The parts of a winit key event the input layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub key: PhysicalKey,
    pub state: ElementState,
    pub repeat: bool,
}

impl RawKeyEvent {
    pub fn pressed(code: KeyCode) -> Self {
        Self {
            key: PhysicalKey::Code(code),
            state: ElementState::Pressed,
            repeat: false,
        }
    }

    pub fn released(code: KeyCode) -> Self {
        Self {
            key: PhysicalKey::Code(code),
            state: ElementState::Released,
            repeat: false,
        }
    }
}

impl From<&KeyEvent> for RawKeyEvent {
    fn from(event: &KeyEvent) -> Self {
        Self {
            key: event.physical_key,
            state: event.state,
            repeat: event.repeat,
        }
    }
}

/// Key-state table polled once per frame.
///
/// Events arriving between frames update the held set and record at most one
/// edge per key; [`clear_transients`](Self::clear_transients) drops the
/// edges once the frame has consumed them. Keys without a [`KeyCode`] are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<KeyCode>,
    edges: HashMap<KeyCode, ElementState>,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_event(&mut self, event: &KeyEvent) {
        self.process_raw(RawKeyEvent::from(event));
    }

    /// Auto-repeat is dropped, so toggles fire once per physical press.
    pub fn process_raw(&mut self, event: RawKeyEvent) {
        let PhysicalKey::Code(code) = event.key else {
            return;
        };
        if event.repeat {
            return;
        }
        let changed = match event.state {
            ElementState::Pressed => self.held.insert(code),
            ElementState::Released => self.held.remove(&code),
        };
        if changed {
            self.edges.insert(code, event.state);
        }
    }

    #[must_use]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    #[must_use]
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.edges.get(&key) == Some(&ElementState::Pressed)
    }

    #[must_use]
    pub fn just_released(&self, key: KeyCode) -> bool {
        self.edges.get(&key) == Some(&ElementState::Released)
    }

    pub fn clear_transients(&mut self) {
        self.edges.clear();
    }

    /// Release everything, e.g. on focus loss when the matching release
    /// events will never arrive.
    pub fn release_all(&mut self) {
        self.edges.clear();
        for code in self.held.drain() {
            self.edges.insert(code, ElementState::Released);
        }
    }
}
