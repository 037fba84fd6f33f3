//! Fixed key table.
//!
//! Toggles fire on the press edge; movement repeats every frame the key is
//! held. Resolution is a pure function of the keyboard state.

use terra_camera::MoveDirection;
use winit::keyboard::KeyCode;

use crate::keyboard::KeyboardState;

/// Action requested by the user for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Show the cursor (and enable tuning keys) or capture it for looking.
    ToggleCursor,
    ToggleWireframe,
    ToggleCullFace,
    Move(MoveDirection),
}

#[derive(Debug, Clone)]
pub struct Bindings {
    toggles: Vec<(KeyCode, Command)>,
    movement: Vec<(KeyCode, MoveDirection)>,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            toggles: vec![
                (KeyCode::Escape, Command::Quit),
                (KeyCode::Tab, Command::ToggleCursor),
                (KeyCode::KeyZ, Command::ToggleWireframe),
                (KeyCode::KeyC, Command::ToggleCullFace),
            ],
            movement: vec![
                (KeyCode::KeyW, MoveDirection::Forward),
                (KeyCode::KeyS, MoveDirection::Backward),
                (KeyCode::KeyA, MoveDirection::Left),
                (KeyCode::KeyD, MoveDirection::Right),
                (KeyCode::Space, MoveDirection::Up),
                (KeyCode::ShiftLeft, MoveDirection::Down),
            ],
        }
    }
}

impl Bindings {
    /// Commands for this frame: toggles first, then movement, each in table
    /// order.
    pub fn resolve(&self, keyboard: &KeyboardState) -> Vec<Command> {
        let toggles = self
            .toggles
            .iter()
            .filter(|(key, _)| keyboard.just_pressed(*key))
            .map(|&(_, command)| command);
        let moves = self
            .movement
            .iter()
            .filter(|(key, _)| keyboard.is_pressed(*key))
            .map(|&(_, direction)| Command::Move(direction));
        toggles.chain(moves).collect()
    }

    /// Key bound to `command`, if any.
    pub fn key_for(&self, command: Command) -> Option<KeyCode> {
        match command {
            Command::Move(direction) => self
                .movement
                .iter()
                .find(|(_, d)| *d == direction)
                .map(|&(key, _)| key),
            other => self
                .toggles
                .iter()
                .find(|(_, c)| *c == other)
                .map(|&(key, _)| key),
        }
    }
}
