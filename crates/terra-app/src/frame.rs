//! Frame sequencing.
//!
//! A frame walks a fixed cycle of phases. The draw phases and the pipeline
//! state each one runs with are resolved up front into a [`FramePlan`], which
//! the renderer then executes in order.

use std::time::Instant;

use terra_config::WaterMode;
use terra_render::{BlendMode, FillMode, PipelineState};
use tracing::warn;

/// Longest frame time fed to the simulation. Longer stalls (window drags,
/// breakpoints) are clamped so the camera doesn't jump.
pub const MAX_FRAME_TIME: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    PollInput,
    UpdateTimeAndCamera,
    ClearBuffers,
    DrawSky,
    DrawTerrain,
    DrawWater,
    DrawClouds,
    DrawOverlay,
    Present,
    Closed,
}

impl FramePhase {
    /// The phase after `self`. `close_requested` is checked at the top of
    /// the cycle only.
    pub fn next(self, close_requested: bool) -> Self {
        match self {
            Self::Present | Self::PollInput if close_requested => Self::Closed,
            Self::PollInput => Self::UpdateTimeAndCamera,
            Self::UpdateTimeAndCamera => Self::ClearBuffers,
            Self::ClearBuffers => Self::DrawSky,
            Self::DrawSky => Self::DrawTerrain,
            Self::DrawTerrain => Self::DrawWater,
            Self::DrawWater => Self::DrawClouds,
            Self::DrawClouds => Self::DrawOverlay,
            Self::DrawOverlay => Self::Present,
            Self::Present => Self::PollInput,
            Self::Closed => Self::Closed,
        }
    }
}

/// Walk one frame from `PollInput` through `Present`, calling `run` at each
/// phase. `run` reports whether a close has been requested. Returns false
/// when the walk ends in `Closed`.
pub fn run_frame(mut run: impl FnMut(FramePhase) -> bool) -> bool {
    let mut phase = FramePhase::PollInput;
    loop {
        let close_requested = run(phase);
        match phase.next(close_requested) {
            FramePhase::Closed => return false,
            FramePhase::PollInput => return true,
            next => phase = next,
        }
    }
}

/// Global render toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameToggles {
    pub wireframe: bool,
    pub cull_face: bool,
    pub water_mode: WaterMode,
}

impl Default for FrameToggles {
    fn default() -> Self {
        Self {
            wireframe: false,
            cull_face: true,
            water_mode: WaterMode::Chunked,
        }
    }
}

/// What a draw phase renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Sky,
    Terrain,
    ChunkedWater,
    ScreenWater,
    Clouds,
}

impl DrawKind {
    /// Drawn once per chunk of the window rather than once per frame.
    pub fn is_chunked(self) -> bool {
        matches!(self, Self::Terrain | Self::ChunkedWater)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStep {
    pub phase: FramePhase,
    pub kind: DrawKind,
    pub state: PipelineState,
}

/// Ordered draw steps of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    steps: Vec<DrawStep>,
}

impl FramePlan {
    pub fn build(toggles: FrameToggles) -> Self {
        let fill = if toggles.wireframe {
            FillMode::Wireframe
        } else {
            FillMode::Fill
        };

        let backdrop = PipelineState::BACKDROP;
        let terrain = PipelineState::OPAQUE
            .with_cull(toggles.cull_face)
            .with_fill(fill);
        let water = match toggles.water_mode {
            WaterMode::Chunked => DrawStep {
                phase: FramePhase::DrawWater,
                kind: DrawKind::ChunkedWater,
                state: PipelineState::OPAQUE
                    .with_depth(true, false)
                    .with_blend(BlendMode::Alpha)
                    .with_cull(false)
                    .with_fill(fill),
            },
            WaterMode::ScreenSpace => DrawStep {
                phase: FramePhase::DrawWater,
                kind: DrawKind::ScreenWater,
                state: PipelineState::OPAQUE
                    .with_depth(true, false)
                    .with_blend(BlendMode::Alpha)
                    .with_cull(false),
            },
        };

        Self {
            steps: vec![
                DrawStep {
                    phase: FramePhase::DrawSky,
                    kind: DrawKind::Sky,
                    state: backdrop,
                },
                DrawStep {
                    phase: FramePhase::DrawTerrain,
                    kind: DrawKind::Terrain,
                    state: terrain,
                },
                water,
                // The cloud quad sits on the far plane, so the depth test
                // keeps it to pixels nothing else has covered.
                DrawStep {
                    phase: FramePhase::DrawClouds,
                    kind: DrawKind::Clouds,
                    state: backdrop
                        .with_depth(true, false)
                        .with_blend(BlendMode::Alpha),
                },
            ],
        }
    }

    pub fn steps(&self) -> &[DrawStep] {
        &self.steps
    }

    pub fn step(&self, kind: DrawKind) -> Option<&DrawStep> {
        self.steps.iter().find(|step| step.kind == kind)
    }
}

/// Per-frame timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous frame, clamped to [`MAX_FRAME_TIME`].
    pub dt: f64,
    /// Seconds since the clock started, summed from clamped frame times.
    pub elapsed: f64,
    pub frame: u64,
}

/// Variable-timestep frame clock.
#[derive(Debug, Clone)]
pub struct FrameClock {
    previous: Instant,
    elapsed: f64,
    frame: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            previous: Instant::now(),
            elapsed: 0.0,
            frame: 0,
        }
    }

    /// Measure the time since the last tick and advance.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.advance(frame_time)
    }

    /// Advance by an explicit frame time.
    pub fn advance(&mut self, frame_time: f64) -> FrameTime {
        let mut dt = frame_time.max(0.0);
        if dt > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                dt * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            dt = MAX_FRAME_TIME;
        }
        self.elapsed += dt;
        self.frame += 1;
        FrameTime {
            dt,
            elapsed: self.elapsed,
            frame: self.frame,
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(plan: &FramePlan) -> Vec<DrawKind> {
        plan.steps().iter().map(|step| step.kind).collect()
    }

    #[test]
    fn test_run_frame_visits_every_phase_once() {
        let mut seen = Vec::new();
        let running = run_frame(|phase| {
            seen.push(phase);
            false
        });
        assert!(running);
        assert_eq!(seen.len(), 9);
        assert_eq!(seen.first(), Some(&FramePhase::PollInput));
        assert_eq!(seen.last(), Some(&FramePhase::Present));
        assert!(!seen.contains(&FramePhase::Closed));
    }

    #[test]
    fn test_run_frame_stops_before_drawing_when_closing() {
        let mut seen = Vec::new();
        let running = run_frame(|phase| {
            seen.push(phase);
            true
        });
        assert!(!running);
        assert_eq!(seen, [FramePhase::PollInput]);
    }

    #[test]
    fn test_run_frame_finishes_a_frame_closed_mid_way() {
        let mut seen = Vec::new();
        let running = run_frame(|phase| {
            seen.push(phase);
            seen.contains(&FramePhase::DrawTerrain)
        });
        assert!(!running);
        assert_eq!(seen.last(), Some(&FramePhase::Present));
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn test_phase_cycle() {
        let mut phase = FramePhase::PollInput;
        let mut seen = vec![phase];
        for _ in 0..9 {
            phase = phase.next(false);
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                FramePhase::PollInput,
                FramePhase::UpdateTimeAndCamera,
                FramePhase::ClearBuffers,
                FramePhase::DrawSky,
                FramePhase::DrawTerrain,
                FramePhase::DrawWater,
                FramePhase::DrawClouds,
                FramePhase::DrawOverlay,
                FramePhase::Present,
                FramePhase::PollInput,
            ]
        );
    }

    #[test]
    fn test_close_is_checked_at_top_of_cycle() {
        assert_eq!(FramePhase::PollInput.next(true), FramePhase::Closed);
        assert_eq!(FramePhase::Present.next(true), FramePhase::Closed);
        assert_eq!(FramePhase::DrawTerrain.next(true), FramePhase::DrawWater);
        assert_eq!(FramePhase::Closed.next(false), FramePhase::Closed);
    }

    #[test]
    fn test_default_plan_order() {
        let plan = FramePlan::build(FrameToggles::default());
        assert_eq!(
            kinds(&plan),
            vec![
                DrawKind::Sky,
                DrawKind::Terrain,
                DrawKind::ChunkedWater,
                DrawKind::Clouds
            ]
        );
        let phases: Vec<_> = plan.steps().iter().map(|step| step.phase).collect();
        assert!(phases.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_backdrop_passes_ignore_wireframe() {
        let plan = FramePlan::build(FrameToggles {
            wireframe: true,
            ..Default::default()
        });
        for kind in [DrawKind::Sky, DrawKind::Clouds] {
            let state = plan.step(kind).unwrap().state;
            assert!(!state.depth_write);
            assert_eq!(state.fill, FillMode::Fill);
        }
        assert!(!plan.step(DrawKind::Sky).unwrap().state.depth_test);
    }

    #[test]
    fn test_clouds_stay_behind_terrain() {
        let plan = FramePlan::build(FrameToggles::default());
        let clouds = plan.step(DrawKind::Clouds).unwrap().state;
        assert!(clouds.depth_test);
        assert_eq!(clouds.blend, BlendMode::Alpha);

        // Reverse-Z: the cloud quad is at depth 0, the clear value. Only
        // uncovered pixels pass.
        let compare = clouds.depth_stencil().depth_compare;
        assert_eq!(compare, wgpu::CompareFunction::GreaterEqual);
        assert_eq!(terra_render::DepthBuffer::CLEAR_VALUE, 0.0);
    }

    #[test]
    fn test_terrain_honours_toggles() {
        let plan = FramePlan::build(FrameToggles {
            wireframe: true,
            cull_face: false,
            water_mode: WaterMode::Chunked,
        });
        let terrain = plan.step(DrawKind::Terrain).unwrap().state;
        assert!(terrain.depth_test && terrain.depth_write);
        assert!(!terrain.cull);
        assert_eq!(terrain.fill, FillMode::Wireframe);

        let water = plan.step(DrawKind::ChunkedWater).unwrap().state;
        assert_eq!(water.fill, FillMode::Wireframe);
        assert_eq!(water.blend, BlendMode::Alpha);
        assert!(!water.depth_write);
    }

    #[test]
    fn test_screen_water_forces_fill() {
        let plan = FramePlan::build(FrameToggles {
            wireframe: true,
            cull_face: true,
            water_mode: WaterMode::ScreenSpace,
        });
        assert!(plan.step(DrawKind::ChunkedWater).is_none());
        let water = plan.step(DrawKind::ScreenWater).unwrap();
        assert_eq!(water.phase, FramePhase::DrawWater);
        assert_eq!(water.state.fill, FillMode::Fill);
        assert_eq!(water.state.blend, BlendMode::Alpha);
    }

    #[test]
    fn test_chunked_kinds() {
        assert!(DrawKind::Terrain.is_chunked());
        assert!(DrawKind::ChunkedWater.is_chunked());
        assert!(!DrawKind::ScreenWater.is_chunked());
        assert!(!DrawKind::Sky.is_chunked());
    }

    #[test]
    fn test_clock_accumulates() {
        let mut clock = FrameClock::new();
        let first = clock.advance(0.016);
        let second = clock.advance(0.020);
        assert_eq!(first.frame, 1);
        assert_eq!(second.frame, 2);
        assert!((second.elapsed - 0.036).abs() < 1e-12);
        assert!((second.dt - 0.020).abs() < 1e-12);
    }

    #[test]
    fn test_clock_clamps_long_frames() {
        let mut clock = FrameClock::new();
        let time = clock.advance(2.0);
        assert_eq!(time.dt, MAX_FRAME_TIME);
        assert_eq!(clock.elapsed(), MAX_FRAME_TIME);
    }

    #[test]
    fn test_clock_ignores_negative_time() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(-1.0).dt, 0.0);
        assert_eq!(clock.frame_count(), 1);
    }
}
