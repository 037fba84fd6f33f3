//! Debug and tuning overlay.
//!
//! An overlay never touches the scene directly. Each frame it reads a
//! [`SceneParams`] snapshot and returns patches, which the scene applies
//! before the next frame.

use glam::Vec3;
use terra_config::WaterMode;
use terra_input::RawKeyEvent;
use terra_terrain::{ChunkCoord, ParamPatch, SceneParams, params::MAX_OCTAVES};
use tracing::info;
use winit::{event::ElementState, keyboard::KeyCode, keyboard::PhysicalKey};

/// Numbers shown by the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub dt: f64,
    pub elapsed: f64,
    pub position: Vec3,
    pub chunk: ChunkCoord,
    pub camera_speed: f32,
    pub draws: usize,
}

pub trait Overlay {
    /// Key event received while the cursor is visible.
    fn handle_key(&mut self, _event: RawKeyEvent) {}

    /// Patches to apply before the next frame.
    fn frame(&mut self, snapshot: &SceneParams, stats: &FrameStats) -> Vec<ParamPatch>;

    /// New window title, if it changed since the last call.
    fn take_title(&mut self) -> Option<String> {
        None
    }
}

/// One adjustment requested from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Tune {
    CameraSpeed(f32),
    Amplitude(f32),
    ChunkCount(i32),
    WaterLevel(f32),
    ToggleFog,
    ToggleWaterMode,
    NextSeed,
    Octaves(i32),
    SelectStop(usize),
    StopWeight(f32),
}

fn tune_for(key: KeyCode) -> Option<Tune> {
    let tune = match key {
        KeyCode::ArrowUp => Tune::CameraSpeed(1.0),
        KeyCode::ArrowDown => Tune::CameraSpeed(-1.0),
        KeyCode::BracketRight => Tune::Amplitude(5.0),
        KeyCode::BracketLeft => Tune::Amplitude(-5.0),
        KeyCode::Equal => Tune::ChunkCount(8),
        KeyCode::Minus => Tune::ChunkCount(-8),
        KeyCode::PageUp => Tune::WaterLevel(1.0),
        KeyCode::PageDown => Tune::WaterLevel(-1.0),
        KeyCode::KeyF => Tune::ToggleFog,
        KeyCode::KeyM => Tune::ToggleWaterMode,
        KeyCode::KeyN => Tune::NextSeed,
        KeyCode::KeyO => Tune::Octaves(-1),
        KeyCode::KeyP => Tune::Octaves(1),
        KeyCode::Digit1 => Tune::SelectStop(0),
        KeyCode::Digit2 => Tune::SelectStop(1),
        KeyCode::Digit3 => Tune::SelectStop(2),
        KeyCode::Digit4 => Tune::SelectStop(3),
        KeyCode::ArrowRight => Tune::StopWeight(0.05),
        KeyCode::ArrowLeft => Tune::StopWeight(-0.05),
        _ => return None,
    };
    Some(tune)
}

/// Keyboard tuning plus periodic frame statistics in the log and the window
/// title.
#[derive(Debug)]
pub struct TuningOverlay {
    title: String,
    stats_interval: f64,
    pending: Vec<Tune>,
    selected_stop: usize,
    window_frames: u32,
    window_time: f64,
    new_title: Option<String>,
}

impl TuningOverlay {
    /// `stats_interval` in seconds; zero or less disables the reports.
    pub fn new(title: impl Into<String>, stats_interval: f64) -> Self {
        Self {
            title: title.into(),
            stats_interval,
            pending: Vec::new(),
            selected_stop: 0,
            window_frames: 0,
            window_time: 0.0,
            new_title: None,
        }
    }

    fn patch_for(&mut self, tune: Tune, snapshot: &SceneParams) -> Option<ParamPatch> {
        let patch = match tune {
            Tune::CameraSpeed(step) => ParamPatch::CameraSpeed(snapshot.camera_speed() + step),
            Tune::Amplitude(step) => ParamPatch::NoiseAmplitude(snapshot.noise().amplitude + step),
            Tune::ChunkCount(step) => {
                ParamPatch::ChunkCount(snapshot.chunk_count().saturating_add(step).max(0))
            }
            Tune::WaterLevel(step) => ParamPatch::WaterLevel(snapshot.water().level + step),
            Tune::ToggleFog => ParamPatch::Fog(!snapshot.fog()),
            Tune::ToggleWaterMode => ParamPatch::WaterMode(match snapshot.water().mode {
                WaterMode::Chunked => WaterMode::ScreenSpace,
                WaterMode::ScreenSpace => WaterMode::Chunked,
            }),
            Tune::NextSeed => ParamPatch::NoiseSeed(snapshot.noise().seed.wrapping_add(1)),
            Tune::Octaves(step) => ParamPatch::NoiseOctaves(
                snapshot
                    .noise()
                    .octaves
                    .saturating_add_signed(step)
                    .clamp(1, MAX_OCTAVES),
            ),
            Tune::SelectStop(index) => {
                self.selected_stop = index;
                return None;
            }
            Tune::StopWeight(step) => ParamPatch::GradientWeight {
                index: self.selected_stop,
                weight: snapshot.gradient().weights()[self.selected_stop] + step,
            },
        };
        Some(patch)
    }

    fn record_stats(&mut self, stats: &FrameStats) {
        if self.stats_interval <= 0.0 {
            return;
        }
        self.window_frames += 1;
        self.window_time += stats.dt;
        if self.window_time < self.stats_interval {
            return;
        }

        let frame_time = self.window_time / f64::from(self.window_frames);
        let fps = if frame_time > 0.0 { 1.0 / frame_time } else { 0.0 };
        info!(
            fps = fps.round(),
            ms_per_frame = %format!("{:.2}", frame_time * 1000.0),
            time = %format!("{:.4}", stats.elapsed),
            position = %format!(
                "({:.2} ; {:.2} ; {:.2})",
                stats.position.x, stats.position.y, stats.position.z
            ),
            chunk = %format!("({} ; {})", stats.chunk.x, stats.chunk.z),
            camera_speed = stats.camera_speed,
            draws = stats.draws,
            "frame stats"
        );
        self.new_title = Some(format!(
            "{} | {:.0} FPS | {:.2} ms | chunk ({}, {})",
            self.title,
            fps,
            frame_time * 1000.0,
            stats.chunk.x,
            stats.chunk.z
        ));
        self.window_frames = 0;
        self.window_time = 0.0;
    }
}

impl Overlay for TuningOverlay {
    fn handle_key(&mut self, event: RawKeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        if let PhysicalKey::Code(code) = event.key
            && let Some(tune) = tune_for(code)
        {
            self.pending.push(tune);
        }
    }

    fn frame(&mut self, snapshot: &SceneParams, stats: &FrameStats) -> Vec<ParamPatch> {
        self.record_stats(stats);

        // Later tunes of the same frame must see earlier ones.
        let mut view = snapshot.clone();
        let mut patches = Vec::new();
        for tune in std::mem::take(&mut self.pending) {
            if let Some(patch) = self.patch_for(tune, &view) {
                view.apply(patch);
                patches.push(patch);
            }
        }
        patches
    }

    fn take_title(&mut self) -> Option<String> {
        self.new_title.take()
    }
}
