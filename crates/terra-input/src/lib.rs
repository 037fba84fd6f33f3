//! Keyboard and mouse state polled once per frame, and the fixed key table
//! that turns it into explorer commands.

pub mod bindings;
pub mod keyboard;
pub mod mouse;

pub use bindings::{Bindings, Command};
pub use keyboard::{KeyboardState, RawKeyEvent};
pub use mouse::MouseState;
