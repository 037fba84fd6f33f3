use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Vec2, Vec3, Vec4};
use terra_config::CameraConfig;

use crate::projection::Projection;

/// Direction of a single movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Yaw/pitch fly camera.
///
/// The view matrix is kept in sync with position and orientation: looking
/// rebuilds it entirely, moving only rewrites the translation column.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    yaw: f32,
    pitch: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    view: Mat4,
    /// World units per second.
    speed: f32,
    /// Degrees per pixel of mouse motion.
    sensitivity: f32,
}

impl Camera {
    pub const WORLD_UP: Vec3 = Vec3::Y;
    pub const DEFAULT_SPEED: f32 = 5.0;
    pub const DEFAULT_SENSITIVITY: f32 = 0.1;
    /// Distance kept between pitch and the poles.
    pub const PITCH_EPSILON: f32 = 1e-5;

    /// Place a camera at `position`, facing the world origin.
    pub fn new(position: Vec3) -> Self {
        let (yaw, pitch) = match (-position).try_normalize() {
            Some(direction) => {
                let pitch = direction.y.clamp(-1.0, 1.0).asin();
                let yaw = if direction.x == 0.0 && direction.z == 0.0 {
                    0.0
                } else {
                    direction.z.atan2(direction.x)
                };
                (yaw, pitch)
            }
            None => (-FRAC_PI_2, 0.0),
        };

        let mut camera = Self {
            position,
            yaw,
            pitch,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            view: Mat4::IDENTITY,
            speed: Self::DEFAULT_SPEED,
            sensitivity: Self::DEFAULT_SENSITIVITY,
        };
        camera.look(Vec2::ZERO);
        camera
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self::new(Vec3::from_array(config.start_position));
        camera.speed = config.speed;
        camera.sensitivity = config.sensitivity;
        camera
    }

    /// Translate by `speed * dt` along `direction`.
    pub fn move_in(&mut self, direction: MoveDirection, dt: f32) {
        let distance = self.speed * dt;
        let strafe = self.front.cross(Self::WORLD_UP).normalize_or_zero();

        match direction {
            MoveDirection::Forward => self.position += self.front * distance,
            MoveDirection::Backward => self.position -= self.front * distance,
            MoveDirection::Left => self.position -= strafe * distance,
            MoveDirection::Right => self.position += strafe * distance,
            MoveDirection::Up => self.position.y += distance,
            MoveDirection::Down => self.position.y -= distance,
        }

        self.view.w_axis = self.translation();
    }

    /// Rotate by a mouse delta in pixels. Positive `x` turns right, positive
    /// `y` looks down.
    pub fn look(&mut self, delta: Vec2) {
        let delta = delta * self.sensitivity;

        self.yaw += delta.x.to_radians();
        if self.yaw > TAU {
            self.yaw -= TAU;
        } else if self.yaw < -TAU {
            self.yaw += TAU;
        }

        let limit = FRAC_PI_2 - Self::PITCH_EPSILON;
        self.pitch = (self.pitch - delta.y.to_radians()).clamp(-limit, limit);

        self.front = Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        );
        self.right = self.front.cross(Self::WORLD_UP).normalize();
        self.up = self.right.cross(self.front).normalize();

        // Rows are right, up and -front.
        self.view = Mat4::from_cols(
            Vec4::new(self.right.x, self.up.x, -self.front.x, 0.0),
            Vec4::new(self.right.y, self.up.y, -self.front.y, 0.0),
            Vec4::new(self.right.z, self.up.z, -self.front.z, 0.0),
            self.translation(),
        );
    }

    fn translation(&self) -> Vec4 {
        Vec4::new(
            -self.right.dot(self.position),
            -self.up.dot(self.position),
            self.front.dot(self.position),
            1.0,
        )
    }

    /// `projection * view`, computed on every call.
    pub fn view_projection(&self, projection: &Projection) -> Mat4 {
        projection.matrix() * self.view
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Negative speeds are clamped to zero.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }
}
