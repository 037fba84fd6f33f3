//! Tunable scene parameters.
//!
//! [`SceneParams`] is seeded from configuration and afterwards only changed
//! through [`ParamPatch`]es. Patches are sanitized on application, so the
//! gradient weights stay in `[0, 1]` and non-decreasing whatever the overlay
//! submits.

use glam::Vec3;
use terra_config::{Config, NoiseConfig, WaterConfig, WaterMode};

/// Maximum fractal octaves the terrain shader evaluates.
pub const MAX_OCTAVES: u32 = 12;

/// Smallest accepted chunk edge length.
pub const MIN_CHUNK_SIZE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    pub frequency: f32,
    pub amplitude: f32,
    pub octaves: u32,
    pub seed: u32,
}

impl From<&NoiseConfig> for NoiseParams {
    fn from(config: &NoiseConfig) -> Self {
        Self {
            frequency: config.frequency.max(0.0),
            amplitude: config.amplitude,
            octaves: config.octaves.clamp(1, MAX_OCTAVES),
            seed: config.seed,
        }
    }
}

/// Four colour stops placed at ordered normalized heights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    colors: [Vec3; 4],
    weights: [f32; 4],
}

impl Gradient {
    /// Weights are clamped to `[0, 1]` and forced non-decreasing.
    pub fn new(colors: [Vec3; 4], weights: [f32; 4]) -> Self {
        let mut sorted = [0.0; 4];
        let mut floor = 0.0_f32;
        for (slot, weight) in sorted.iter_mut().zip(weights) {
            *slot = sanitize_unit(weight).max(floor);
            floor = *slot;
        }
        Self {
            colors: colors.map(clamp_color),
            weights: sorted,
        }
    }

    pub fn colors(&self) -> &[Vec3; 4] {
        &self.colors
    }

    pub fn weights(&self) -> &[f32; 4] {
        &self.weights
    }

    /// Set weight `index`, clamped between its neighbours.
    fn set_weight(&mut self, index: usize, weight: f32) {
        let low = if index == 0 { 0.0 } else { self.weights[index - 1] };
        let high = self.weights.get(index + 1).copied().unwrap_or(1.0);
        self.weights[index] = sanitize_unit(weight).clamp(low, high);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterParams {
    pub mode: WaterMode,
    pub level: f32,
    pub chunk_count: i32,
    pub shallow_color: Vec3,
    pub deep_color: Vec3,
    pub wave_speed: f32,
    pub wave_amplitude: f32,
    pub alpha: f32,
}

impl From<&WaterConfig> for WaterParams {
    fn from(config: &WaterConfig) -> Self {
        Self {
            mode: config.mode,
            level: config.level,
            chunk_count: config.chunk_count,
            shallow_color: clamp_color(Vec3::from_array(config.shallow_color)),
            deep_color: clamp_color(Vec3::from_array(config.deep_color)),
            wave_speed: config.wave_speed,
            wave_amplitude: config.wave_amplitude.max(0.0),
            alpha: sanitize_unit(config.alpha),
        }
    }
}

/// One edit submitted by the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamPatch {
    ChunkSize(f32),
    ChunkCount(i32),
    NoiseFrequency(f32),
    NoiseAmplitude(f32),
    NoiseOctaves(u32),
    NoiseSeed(u32),
    GradientColor { index: usize, color: Vec3 },
    GradientWeight { index: usize, weight: f32 },
    Fog(bool),
    WaterMode(WaterMode),
    WaterLevel(f32),
    WaterChunkCount(i32),
    WaterShallowColor(Vec3),
    WaterDeepColor(Vec3),
    WaveSpeed(f32),
    WaveAmplitude(f32),
    WaterAlpha(f32),
    CameraSpeed(f32),
}

/// Everything the overlay may tune.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneParams {
    chunk_size: f32,
    chunk_count: i32,
    noise: NoiseParams,
    gradient: Gradient,
    fog: bool,
    water: WaterParams,
    light_direction: Vec3,
    camera_speed: f32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SceneParams {
    pub fn from_config(config: &Config) -> Self {
        let terrain = &config.terrain;
        let colors = terrain.gradient_colors.map(Vec3::from_array);
        Self {
            chunk_size: terrain.chunk_size.max(MIN_CHUNK_SIZE),
            chunk_count: terrain.chunk_count,
            noise: NoiseParams::from(&terrain.noise),
            gradient: Gradient::new(colors, terrain.gradient_weights),
            fog: terrain.fog,
            water: WaterParams::from(&config.water),
            light_direction: Vec3::new(2.0, 2.0, 0.0).normalize(),
            camera_speed: config.camera.speed.max(0.0),
        }
    }

    pub fn chunk_size(&self) -> f32 {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> i32 {
        self.chunk_count
    }

    pub fn noise(&self) -> &NoiseParams {
        &self.noise
    }

    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    pub fn fog(&self) -> bool {
        self.fog
    }

    pub fn water(&self) -> &WaterParams {
        &self.water
    }

    /// Unit vector pointing towards the light.
    pub fn light_direction(&self) -> Vec3 {
        self.light_direction
    }

    pub fn camera_speed(&self) -> f32 {
        self.camera_speed
    }

    /// Apply one patch. Out-of-range values are clamped; patches addressing
    /// a colour stop that does not exist are dropped with a warning.
    pub fn apply(&mut self, patch: ParamPatch) {
        match patch {
            ParamPatch::ChunkSize(size) => {
                if size.is_finite() {
                    self.chunk_size = size.max(MIN_CHUNK_SIZE);
                }
            }
            ParamPatch::ChunkCount(count) => self.chunk_count = count,
            ParamPatch::NoiseFrequency(frequency) => {
                self.noise.frequency = finite_or(frequency, self.noise.frequency).max(0.0);
            }
            ParamPatch::NoiseAmplitude(amplitude) => {
                self.noise.amplitude = finite_or(amplitude, self.noise.amplitude);
            }
            ParamPatch::NoiseOctaves(octaves) => {
                self.noise.octaves = octaves.clamp(1, MAX_OCTAVES);
            }
            ParamPatch::NoiseSeed(seed) => self.noise.seed = seed,
            ParamPatch::GradientColor { index, color } => match self.gradient.colors.get_mut(index) {
                Some(slot) => *slot = clamp_color(color),
                None => tracing::warn!(index, "ignoring patch for unknown gradient colour"),
            },
            ParamPatch::GradientWeight { index, weight } => {
                if index < self.gradient.weights.len() {
                    self.gradient.set_weight(index, weight);
                } else {
                    tracing::warn!(index, "ignoring patch for unknown gradient weight");
                }
            }
            ParamPatch::Fog(enabled) => self.fog = enabled,
            ParamPatch::WaterMode(mode) => self.water.mode = mode,
            ParamPatch::WaterLevel(level) => {
                self.water.level = finite_or(level, self.water.level);
            }
            ParamPatch::WaterChunkCount(count) => self.water.chunk_count = count,
            ParamPatch::WaterShallowColor(color) => self.water.shallow_color = clamp_color(color),
            ParamPatch::WaterDeepColor(color) => self.water.deep_color = clamp_color(color),
            ParamPatch::WaveSpeed(speed) => {
                self.water.wave_speed = finite_or(speed, self.water.wave_speed);
            }
            ParamPatch::WaveAmplitude(amplitude) => {
                self.water.wave_amplitude = finite_or(amplitude, self.water.wave_amplitude).max(0.0);
            }
            ParamPatch::WaterAlpha(alpha) => self.water.alpha = sanitize_unit(alpha),
            ParamPatch::CameraSpeed(speed) => {
                self.camera_speed = finite_or(speed, self.camera_speed).max(0.0);
            }
        }
    }

    pub fn apply_all(&mut self, patches: impl IntoIterator<Item = ParamPatch>) {
        for patch in patches {
            self.apply(patch);
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn sanitize_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

fn clamp_color(color: Vec3) -> Vec3 {
    Vec3::new(
        sanitize_unit(color.x),
        sanitize_unit(color.y),
        sanitize_unit(color.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights_ordered(params: &SceneParams) -> bool {
        let w = params.gradient().weights();
        w.windows(2).all(|pair| pair[0] <= pair[1]) && w.iter().all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn test_defaults_from_config() {
        let params = SceneParams::default();
        assert_eq!(params.chunk_size(), 32.0);
        assert_eq!(params.chunk_count(), 128);
        assert_eq!(params.camera_speed(), 5.0);
        assert!((params.light_direction() - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
        assert!(weights_ordered(&params));
    }

    #[test]
    fn test_inverted_config_weights_are_sorted() {
        let mut config = Config::default();
        config.terrain.gradient_weights = [0.9, 0.2, 0.5, 1.7];
        let params = SceneParams::from_config(&config);
        assert_eq!(params.gradient().weights(), &[0.9, 0.9, 0.9, 1.0]);
    }

    #[test]
    fn test_weight_clamped_against_neighbours() {
        let mut params = SceneParams::default();
        let before = *params.gradient().weights();

        params.apply(ParamPatch::GradientWeight {
            index: 1,
            weight: 0.99,
        });
        assert_eq!(params.gradient().weights()[1], before[2]);

        params.apply(ParamPatch::GradientWeight {
            index: 2,
            weight: -3.0,
        });
        assert_eq!(params.gradient().weights()[2], params.gradient().weights()[1]);
        assert!(weights_ordered(&params));
    }

    #[test]
    fn test_weights_stay_ordered_after_patch_sequence() {
        let mut params = SceneParams::default();
        let values = [0.7, 0.1, 1.5, -0.2, 0.33, f32::NAN, 0.5, 0.95];
        for (step, &weight) in values.iter().cycle().take(64).enumerate() {
            params.apply(ParamPatch::GradientWeight {
                index: step % 4,
                weight,
            });
            assert!(weights_ordered(&params), "after step {step}");
            let w = params.gradient().weights();
            assert!(w[1] <= w[2]);
        }
    }

    #[test]
    fn test_unknown_gradient_index_ignored() {
        let mut params = SceneParams::default();
        let before = params.clone();
        params.apply(ParamPatch::GradientWeight {
            index: 4,
            weight: 0.5,
        });
        params.apply(ParamPatch::GradientColor {
            index: 9,
            color: Vec3::ONE,
        });
        assert_eq!(params, before);
    }

    #[test]
    fn test_chunk_patches() {
        let mut params = SceneParams::default();
        params.apply_all([
            ParamPatch::ChunkCount(-4),
            ParamPatch::ChunkSize(0.0),
            ParamPatch::WaterChunkCount(16),
        ]);
        assert_eq!(params.chunk_count(), -4);
        assert_eq!(params.chunk_size(), MIN_CHUNK_SIZE);
        assert_eq!(params.water().chunk_count, 16);

        params.apply(ParamPatch::ChunkSize(f32::INFINITY));
        assert_eq!(params.chunk_size(), MIN_CHUNK_SIZE);
    }

    #[test]
    fn test_value_sanitizing() {
        let mut params = SceneParams::default();
        params.apply_all([
            ParamPatch::NoiseOctaves(0),
            ParamPatch::WaterAlpha(3.0),
            ParamPatch::CameraSpeed(-10.0),
            ParamPatch::WaterShallowColor(Vec3::new(2.0, -1.0, 0.5)),
            ParamPatch::WaterLevel(f32::NAN),
        ]);
        assert_eq!(params.noise().octaves, 1);
        assert_eq!(params.water().alpha, 1.0);
        assert_eq!(params.camera_speed(), 0.0);
        assert_eq!(params.water().shallow_color, Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(params.water().level, 0.0);

        params.apply(ParamPatch::NoiseOctaves(99));
        assert_eq!(params.noise().octaves, MAX_OCTAVES);
    }

    #[test]
    fn test_toggles_and_modes() {
        let mut params = SceneParams::default();
        params.apply_all([
            ParamPatch::Fog(false),
            ParamPatch::WaterMode(WaterMode::ScreenSpace),
            ParamPatch::NoiseSeed(42),
        ]);
        assert!(!params.fog());
        assert_eq!(params.water().mode, WaterMode::ScreenSpace);
        assert_eq!(params.noise().seed, 42);
    }
}
