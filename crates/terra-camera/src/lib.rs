//! First-person fly camera and reverse-Z perspective projection.

mod camera;
mod projection;

pub use camera::{Camera, MoveDirection};
pub use projection::Projection;
