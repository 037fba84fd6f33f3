use std::f32::consts::FRAC_PI_4;

use glam::Mat4;
use terra_config::CameraConfig;

/// Perspective projection with reverse-Z depth: the near plane maps to 1.0
/// and the far plane to 0.0.
///
/// The far plane covers the whole chunk window, `2 * chunk_size * count`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Projection {
    pub const DEFAULT_FOV_Y: f32 = FRAC_PI_4;
    pub const DEFAULT_NEAR: f32 = 0.1;

    pub fn new(aspect: f32, chunk_size: f32, chunk_count: i32) -> Self {
        let mut projection = Self {
            fov_y: Self::DEFAULT_FOV_Y,
            aspect: 1.0,
            near: Self::DEFAULT_NEAR,
            far: 1.0,
        };
        projection.set_aspect_ratio(aspect);
        projection.set_chunk_extent(chunk_size, chunk_count);
        projection
    }

    pub fn from_config(
        config: &CameraConfig,
        aspect: f32,
        chunk_size: f32,
        chunk_count: i32,
    ) -> Self {
        let mut projection = Self::new(aspect, chunk_size, chunk_count);
        projection.fov_y = config.fov_degrees.to_radians();
        projection.near = config.near.max(f32::EPSILON);
        projection.set_chunk_extent(chunk_size, chunk_count);
        projection
    }

    /// Recompute the far plane after chunk parameters change. Degenerate
    /// windows still keep `far > near`.
    pub fn set_chunk_extent(&mut self, chunk_size: f32, chunk_count: i32) {
        let extent = 2.0 * chunk_size * chunk_count as f32;
        self.far = extent.max(self.near * 2.0);
    }

    /// Update the aspect ratio from framebuffer dimensions. A zero height
    /// (minimized window) is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.set_aspect_ratio(width as f32 / height as f32);
        }
    }

    fn set_aspect_ratio(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        // Swapping near and far yields reverse-Z.
        Mat4::perspective_rh(self.fov_y, self.aspect, self.far, self.near)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }
}
