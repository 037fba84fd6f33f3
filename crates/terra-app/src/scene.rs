//! Frame state that does not depend on the GPU: camera, input, tunable
//! parameters and render toggles.

use glam::Vec2;
use terra_camera::{Camera, Projection};
use terra_config::Config;
use terra_input::{Bindings, Command, KeyboardState, MouseState, RawKeyEvent};
use terra_terrain::{ChunkCoord, SceneParams};
use tracing::{debug, info};

use crate::{
    frame::{FrameClock, FramePlan, FrameTime, FrameToggles},
    overlay::{FrameStats, Overlay},
};

/// Window callbacks the scene reacts to.
pub trait WindowEvents {
    fn on_resize(&mut self, width: u32, height: u32);
    fn on_key(&mut self, event: RawKeyEvent);
    fn on_cursor_move(&mut self, x: f64, y: f64);
    /// Raw device motion, used while the cursor is captured.
    fn on_mouse_motion(&mut self, _dx: f64, _dy: f64) {}
}

/// Side effects of [`Scene::update`] the window has to carry out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    pub time: FrameTime,
    pub cursor_toggled: bool,
}

pub struct Scene {
    camera: Camera,
    projection: Projection,
    params: SceneParams,
    wireframe: bool,
    cull_face: bool,
    keyboard: KeyboardState,
    mouse: MouseState,
    bindings: Bindings,
    clock: FrameClock,
    overlay: Box<dyn Overlay>,
    cursor_visible: bool,
    close_requested: bool,
    camera_chunk: ChunkCoord,
    time: FrameTime,
}

impl Scene {
    pub fn new(config: &Config, width: u32, height: u32, overlay: Box<dyn Overlay>) -> Self {
        let params = SceneParams::from_config(config);
        let camera = Camera::from_config(&config.camera);
        let mut projection = Projection::from_config(
            &config.camera,
            1.0,
            params.chunk_size(),
            params.chunk_count(),
        );
        projection.resize(width, height);

        let mut mouse = MouseState::new();
        mouse.set_captured_flag(true);

        let camera_chunk = ChunkCoord::from_position(camera.position(), params.chunk_size());
        Self {
            camera,
            projection,
            params,
            wireframe: config.debug.wireframe,
            cull_face: config.debug.cull_face,
            keyboard: KeyboardState::new(),
            mouse,
            bindings: Bindings::default(),
            clock: FrameClock::new(),
            overlay,
            cursor_visible: false,
            close_requested: false,
            camera_chunk,
            time: FrameTime {
                dt: 0.0,
                elapsed: 0.0,
                frame: 0,
            },
        }
    }

    /// Poll input and advance time and camera using the wall clock.
    pub fn update(&mut self) -> FrameUpdate {
        let time = self.clock.tick();
        self.update_with(time)
    }

    /// Poll input and advance time and camera by `time`.
    pub fn update_with(&mut self, time: FrameTime) -> FrameUpdate {
        self.time = time;
        let dt = time.dt as f32;
        let mut cursor_toggled = false;

        for command in self.bindings.resolve(&self.keyboard) {
            match command {
                Command::Quit => self.request_close(),
                Command::ToggleCursor => {
                    self.cursor_visible = !self.cursor_visible;
                    self.mouse.set_captured_flag(!self.cursor_visible);
                    cursor_toggled = true;
                    debug!(visible = self.cursor_visible, "cursor toggled");
                }
                Command::ToggleWireframe => {
                    self.wireframe = !self.wireframe;
                    info!(enabled = self.wireframe, "wireframe");
                }
                Command::ToggleCullFace => {
                    self.cull_face = !self.cull_face;
                    info!(enabled = self.cull_face, "face culling");
                }
                Command::Move(direction) => self.camera.move_in(direction, dt),
            }
        }

        if !self.cursor_visible {
            let delta = self.mouse.delta();
            if delta != Vec2::ZERO {
                self.camera.look(delta);
            }
        }
        self.mouse.clear_transients();
        self.keyboard.clear_transients();

        self.camera_chunk =
            ChunkCoord::from_position(self.camera.position(), self.params.chunk_size());

        FrameUpdate {
            time,
            cursor_toggled,
        }
    }

    /// Run the overlay for the frame that was just drawn and apply its
    /// patches.
    pub fn finish_frame(&mut self, draws: usize) {
        let stats = FrameStats {
            dt: self.time.dt,
            elapsed: self.time.elapsed,
            position: self.camera.position(),
            chunk: self.camera_chunk,
            camera_speed: self.camera.speed(),
            draws,
        };
        let patches = self.overlay.frame(&self.params, &stats);
        if patches.is_empty() {
            return;
        }
        debug!(count = patches.len(), "applying overlay patches");
        self.params.apply_all(patches);
        self.camera.set_speed(self.params.camera_speed());
        self.projection
            .set_chunk_extent(self.params.chunk_size(), self.params.chunk_count());
    }

    pub fn take_title(&mut self) -> Option<String> {
        self.overlay.take_title()
    }

    pub fn request_close(&mut self) {
        if !self.close_requested {
            info!("Close requested, shutting down");
        }
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub fn toggles(&self) -> FrameToggles {
        FrameToggles {
            wireframe: self.wireframe,
            cull_face: self.cull_face,
            water_mode: self.params.water().mode,
        }
    }

    pub fn plan(&self) -> FramePlan {
        FramePlan::build(self.toggles())
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    pub fn camera_chunk(&self) -> ChunkCoord {
        self.camera_chunk
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn mouse_mut(&mut self) -> &mut MouseState {
        &mut self.mouse
    }

    /// Forget held keys after focus loss.
    pub fn release_keys(&mut self) {
        self.keyboard.release_all();
    }
}

impl WindowEvents for Scene {
    fn on_resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    fn on_key(&mut self, event: RawKeyEvent) {
        self.keyboard.process_raw(event);
        if self.cursor_visible {
            self.overlay.handle_key(event);
        }
    }

    fn on_cursor_move(&mut self, x: f64, y: f64) {
        self.mouse.on_cursor_moved(x, y);
    }

    fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse.on_raw_motion(dx, dy);
    }
}
