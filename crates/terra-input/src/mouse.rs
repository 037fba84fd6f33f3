//! Mouse look input.
//!
//! Captured cursor: look deltas are raw device motion. Free cursor: deltas
//! are differences between successive cursor positions.

use glam::Vec2;
use winit::window::{CursorGrabMode, Window};

#[derive(Debug, Clone, Default)]
pub struct MouseState {
    /// Last cursor position, `None` until the first `CursorMoved`.
    cursor: Option<Vec2>,
    look: Vec2,
    captured: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if let Some(last) = self.cursor.replace(position)
            && !self.captured
        {
            self.look += position - last;
        }
    }

    /// Raw `DeviceEvent::MouseMotion`; ignored unless captured.
    pub fn on_raw_motion(&mut self, dx: f64, dy: f64) {
        if self.captured {
            self.look += Vec2::new(dx as f32, dy as f32);
        }
    }

    /// Capture (hide and lock) or release the cursor on `window`.
    pub fn set_captured(&mut self, window: &Window, captured: bool) {
        self.set_captured_flag(captured);
        grab_cursor(window, captured);
    }

    /// Switch capture mode without a window. Motion gathered in the old mode
    /// is dropped so the camera doesn't jump.
    pub fn set_captured_flag(&mut self, captured: bool) {
        self.captured = captured;
        self.look = Vec2::ZERO;
    }

    pub fn clear_transients(&mut self) {
        self.look = Vec2::ZERO;
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.cursor.unwrap_or_default()
    }

    /// Look motion since the last [`clear_transients`](Self::clear_transients).
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.look
    }

    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured
    }
}

fn grab_cursor(window: &Window, captured: bool) {
    window.set_cursor_visible(!captured);
    if !captured {
        if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("cursor release failed: {err}");
        }
        return;
    }
    // Locked is unsupported on some platforms (X11, Windows); fall back.
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        tracing::warn!("cursor grab unavailable: {err}");
    }
}
