//! Terrain and water explorer: a first-person camera over a chunked
//! procedural landscape.

pub mod assets;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod passes;
pub mod platform;
pub mod renderer;
pub mod scene;
pub mod window;

pub use assets::AssetPaths;
pub use error::{AppError, PlatformError};
pub use frame::{FramePhase, FramePlan, FrameToggles};
pub use overlay::{FrameStats, Overlay, TuningOverlay};
pub use platform::PlatformDirs;
pub use scene::{Scene, WindowEvents};
pub use window::{App, run};
