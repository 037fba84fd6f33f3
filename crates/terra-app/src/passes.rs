//! Per-pass uniform layouts and values, and chunk draw recording.
//!
//! Each program's layout and the values written into it live side by side
//! here so the two can't disagree.

use glam::{IVec2, Mat4, Vec2, Vec3, Vec4};
use terra_render::{UniformKind, UniformLayout, UniformValue};
use terra_terrain::{ChunkCoord, ChunkSink, LodSelector, SceneParams};

use crate::scene::Scene;

/// Uniform values shared by every pass of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view_proj: Mat4,
    /// View-projection without the camera translation.
    pub sky_view_proj: Mat4,
    pub camera_pos: Vec3,
    pub camera_front: Vec3,
    pub camera_right: Vec3,
    pub camera_up: Vec3,
    pub camera_chunk: IVec2,
    pub tan_half_fov: f32,
    pub aspect: f32,
    pub resolution: Vec2,
    pub time: f32,
}

impl FrameUniforms {
    pub fn new(scene: &Scene, width: u32, height: u32) -> Self {
        let camera = scene.camera();
        let projection = scene.projection();
        let mut rotation = camera.view();
        rotation.w_axis = Vec4::W;

        Self {
            view_proj: camera.view_projection(projection),
            sky_view_proj: projection.matrix() * rotation,
            camera_pos: camera.position(),
            camera_front: camera.front(),
            camera_right: camera.right(),
            camera_up: camera.up(),
            camera_chunk: scene.camera_chunk().as_ivec2(),
            tan_half_fov: (projection.fov_y() * 0.5).tan(),
            aspect: projection.aspect(),
            resolution: Vec2::new(width as f32, height as f32),
            time: scene.time().elapsed as f32,
        }
    }
}

pub type UniformList = Vec<(&'static str, UniformValue)>;

pub fn sky_layout() -> UniformLayout {
    UniformLayout::new()
        .field("sky_view_proj", UniformKind::Mat4)
        .field("light_direction", UniformKind::Vec3)
}

pub fn sky_uniforms(frame: &FrameUniforms, params: &SceneParams) -> UniformList {
    vec![
        ("sky_view_proj", frame.sky_view_proj.into()),
        ("light_direction", params.light_direction().into()),
    ]
}

pub fn terrain_layout() -> UniformLayout {
    UniformLayout::new()
        .field("view_proj", UniformKind::Mat4)
        .field("camera_pos", UniformKind::Vec3)
        .field("chunk_size", UniformKind::F32)
        .field("light_direction", UniformKind::Vec3)
        .field("fog_distance", UniformKind::F32)
        .field("camera_chunk", UniformKind::IVec2)
        .field("noise_frequency", UniformKind::F32)
        .field("noise_amplitude", UniformKind::F32)
        .field("noise_octaves", UniformKind::U32)
        .field("noise_seed", UniformKind::U32)
        .field("fog", UniformKind::Bool)
        .field("gradient_weights", UniformKind::Vec4)
        .field("color0", UniformKind::Vec3)
        .field("color1", UniformKind::Vec3)
        .field("color2", UniformKind::Vec3)
        .field("color3", UniformKind::Vec3)
}

/// Half the width of the chunk window; fog reaches full strength there.
fn fog_distance(params: &SceneParams) -> f32 {
    (params.chunk_count().max(1) as f32 * params.chunk_size() * 0.5).max(params.chunk_size())
}

pub fn terrain_uniforms(frame: &FrameUniforms, params: &SceneParams) -> UniformList {
    let noise = params.noise();
    let gradient = params.gradient();
    let [c0, c1, c2, c3] = *gradient.colors();
    vec![
        ("view_proj", frame.view_proj.into()),
        ("camera_pos", frame.camera_pos.into()),
        ("chunk_size", params.chunk_size().into()),
        ("light_direction", params.light_direction().into()),
        ("fog_distance", fog_distance(params).into()),
        ("camera_chunk", frame.camera_chunk.into()),
        ("noise_frequency", noise.frequency.into()),
        ("noise_amplitude", noise.amplitude.into()),
        ("noise_octaves", noise.octaves.into()),
        ("noise_seed", noise.seed.into()),
        ("fog", params.fog().into()),
        ("gradient_weights", Vec4::from_array(*gradient.weights()).into()),
        ("color0", c0.into()),
        ("color1", c1.into()),
        ("color2", c2.into()),
        ("color3", c3.into()),
    ]
}

pub fn water_layout() -> UniformLayout {
    UniformLayout::new()
        .field("view_proj", UniformKind::Mat4)
        .field("camera_pos", UniformKind::Vec3)
        .field("chunk_size", UniformKind::F32)
        .field("light_direction", UniformKind::Vec3)
        .field("fog_distance", UniformKind::F32)
        .field("shallow_color", UniformKind::Vec3)
        .field("alpha", UniformKind::F32)
        .field("deep_color", UniformKind::Vec3)
        .field("time", UniformKind::F32)
        .field("level", UniformKind::F32)
        .field("wave_speed", UniformKind::F32)
        .field("wave_amplitude", UniformKind::F32)
        .field("fog", UniformKind::Bool)
        .field("noise_frequency", UniformKind::F32)
        .field("noise_amplitude", UniformKind::F32)
        .field("noise_octaves", UniformKind::U32)
        .field("noise_seed", UniformKind::U32)
}

pub fn water_uniforms(frame: &FrameUniforms, params: &SceneParams) -> UniformList {
    let water = params.water();
    let noise = params.noise();
    vec![
        ("view_proj", frame.view_proj.into()),
        ("camera_pos", frame.camera_pos.into()),
        ("chunk_size", params.chunk_size().into()),
        ("light_direction", params.light_direction().into()),
        ("fog_distance", fog_distance(params).into()),
        ("shallow_color", water.shallow_color.into()),
        ("alpha", water.alpha.into()),
        ("deep_color", water.deep_color.into()),
        ("time", frame.time.into()),
        ("level", water.level.into()),
        ("wave_speed", water.wave_speed.into()),
        ("wave_amplitude", water.wave_amplitude.into()),
        ("fog", params.fog().into()),
        ("noise_frequency", noise.frequency.into()),
        ("noise_amplitude", noise.amplitude.into()),
        ("noise_octaves", noise.octaves.into()),
        ("noise_seed", noise.seed.into()),
    ]
}

/// Camera basis fields shared by the full-screen passes.
fn screen_layout() -> UniformLayout {
    UniformLayout::new()
        .field("view_proj", UniformKind::Mat4)
        .field("camera_pos", UniformKind::Vec3)
        .field("tan_half_fov", UniformKind::F32)
        .field("camera_front", UniformKind::Vec3)
        .field("aspect", UniformKind::F32)
        .field("camera_right", UniformKind::Vec3)
        .field("time", UniformKind::F32)
        .field("camera_up", UniformKind::Vec3)
        .field("resolution", UniformKind::Vec2)
        .field("light_direction", UniformKind::Vec3)
}

fn screen_uniforms(frame: &FrameUniforms, params: &SceneParams) -> UniformList {
    vec![
        ("view_proj", frame.view_proj.into()),
        ("camera_pos", frame.camera_pos.into()),
        ("tan_half_fov", frame.tan_half_fov.into()),
        ("camera_front", frame.camera_front.into()),
        ("aspect", frame.aspect.into()),
        ("camera_right", frame.camera_right.into()),
        ("time", frame.time.into()),
        ("camera_up", frame.camera_up.into()),
        ("resolution", frame.resolution.into()),
        ("light_direction", params.light_direction().into()),
    ]
}

pub fn screen_water_layout() -> UniformLayout {
    screen_layout()
        .field("shallow_color", UniformKind::Vec3)
        .field("level", UniformKind::F32)
        .field("deep_color", UniformKind::Vec3)
        .field("alpha", UniformKind::F32)
        .field("wave_speed", UniformKind::F32)
        .field("wave_amplitude", UniformKind::F32)
}

pub fn screen_water_uniforms(frame: &FrameUniforms, params: &SceneParams) -> UniformList {
    let water = params.water();
    let mut list = screen_uniforms(frame, params);
    list.extend([
        ("shallow_color", water.shallow_color.into()),
        ("level", water.level.into()),
        ("deep_color", water.deep_color.into()),
        ("alpha", water.alpha.into()),
        ("wave_speed", water.wave_speed.into()),
        ("wave_amplitude", water.wave_amplitude.into()),
    ]);
    list
}

pub fn clouds_layout() -> UniformLayout {
    screen_layout()
}

pub fn clouds_uniforms(frame: &FrameUniforms, params: &SceneParams) -> UniformList {
    screen_uniforms(frame, params)
}

/// One chunk draw: which chunk, at which detail level, from which uniform
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDraw {
    pub chunk: ChunkCoord,
    pub level: usize,
    pub slot: u32,
}

/// [`ChunkSink`] that records draws with their detail level. Slots are
/// assigned when the draws are uploaded.
pub struct ChunkRecorder<'a> {
    lod: &'a LodSelector,
    camera_chunk: ChunkCoord,
    current: Option<ChunkCoord>,
    draws: &'a mut Vec<ChunkDraw>,
}

impl<'a> ChunkRecorder<'a> {
    pub fn new(lod: &'a LodSelector, camera_chunk: ChunkCoord, draws: &'a mut Vec<ChunkDraw>) -> Self {
        Self {
            lod,
            camera_chunk,
            current: None,
            draws,
        }
    }
}

impl ChunkSink for ChunkRecorder<'_> {
    fn set_chunk(&mut self, chunk: ChunkCoord) {
        self.current = Some(chunk);
    }

    fn draw_patch(&mut self) {
        if let Some(chunk) = self.current.take() {
            self.draws.push(ChunkDraw {
                chunk,
                level: self.lod.select(chunk, self.camera_chunk),
                slot: 0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::TuningOverlay;
    use terra_config::Config;
    use terra_render::UniformBlock;
    use terra_terrain::{LodRings, dispatch_chunks};

    fn scene() -> Scene {
        Scene::new(
            &Config::default(),
            1600,
            800,
            Box::new(TuningOverlay::new("Terra", 0.0)),
        )
    }

    fn assert_matches(layout: UniformLayout, values: UniformList) {
        let names: Vec<_> = layout.fields().iter().map(|f| f.name.clone()).collect();
        let mut block = UniformBlock::new(layout);
        for (name, value) in &values {
            assert!(block.set(name, *value).is_ok(), "rejected uniform {name}");
        }
        for name in names {
            assert!(
                values.iter().any(|(n, _)| *n == name),
                "uniform {name} is never written"
            );
        }
    }

    #[test]
    fn test_every_layout_matches_its_values() {
        let scene = scene();
        let frame = FrameUniforms::new(&scene, 1600, 800);
        let params = scene.params();
        assert_matches(sky_layout(), sky_uniforms(&frame, params));
        assert_matches(terrain_layout(), terrain_uniforms(&frame, params));
        assert_matches(water_layout(), water_uniforms(&frame, params));
        assert_matches(screen_water_layout(), screen_water_uniforms(&frame, params));
        assert_matches(clouds_layout(), clouds_uniforms(&frame, params));
    }

    #[test]
    fn test_frame_uniforms_from_scene() {
        let scene = scene();
        let frame = FrameUniforms::new(&scene, 1600, 800);
        assert_eq!(frame.camera_pos, Vec3::new(0.0, 20.0, 0.0));
        assert_eq!(frame.camera_chunk, IVec2::ZERO);
        assert_eq!(frame.resolution, Vec2::new(1600.0, 800.0));
        assert!((frame.tan_half_fov - (std::f32::consts::FRAC_PI_8).tan()).abs() < 1e-6);
        // The sky matrix ignores the camera position.
        assert_eq!(frame.sky_view_proj.w_axis, scene.projection().matrix().w_axis);
    }

    #[test]
    fn test_fog_distance_is_half_the_window() {
        let params = SceneParams::default();
        assert_eq!(fog_distance(&params), 128.0 * 32.0 * 0.5);
    }

    #[test]
    fn test_recorder_assigns_detail_levels() {
        let lod = LodSelector::new(LodRings::new(vec![0, 1]), 8);
        let mut draws = Vec::new();
        let center = ChunkCoord::new(3, -2);
        let count = dispatch_chunks(center, 4, &mut ChunkRecorder::new(&lod, center, &mut draws));

        assert_eq!(count, 25);
        assert_eq!(draws.len(), 25);
        let level_of = |x, z| {
            draws
                .iter()
                .find(|d| d.chunk == ChunkCoord::new(x, z))
                .map(|d| d.level)
        };
        assert_eq!(level_of(3, -2), Some(0));
        assert_eq!(level_of(4, -1), Some(1));
        assert_eq!(level_of(5, 0), Some(2));
        assert_eq!(level_of(1, -4), Some(2));
    }

    #[test]
    fn test_recorder_ignores_draw_without_chunk() {
        let lod = LodSelector::new(LodRings::new(vec![]), 1);
        let mut draws = Vec::new();
        let mut recorder = ChunkRecorder::new(&lod, ChunkCoord::new(0, 0), &mut draws);
        recorder.draw_patch();
        recorder.set_chunk(ChunkCoord::new(1, 1));
        recorder.draw_patch();
        recorder.draw_patch();
        assert_eq!(draws.len(), 1);
    }
}
