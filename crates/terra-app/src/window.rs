//! winit integration: [`App`] implements [`ApplicationHandler`] and forwards
//! window callbacks to the [`Scene`] through [`WindowEvents`].

use std::sync::Arc;

use terra_config::Config;
use terra_input::{Bindings, Command, RawKeyEvent};
use terra_render::{RenderContext, SurfaceError, init_render_context_blocking};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::AssetPaths,
    error::AppError,
    frame::{FramePhase, run_frame},
    overlay::TuningOverlay,
    renderer::Renderer,
    scene::{Scene, WindowEvents},
};

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(LogicalSize::new(
            f64::from(config.window.width),
            f64::from(config.window.height),
        ))
}

/// Application state driven by the winit event loop.
pub struct App {
    // Drop order: renderer, then GPU context, then the window it renders to.
    renderer: Option<Renderer>,
    gpu: Option<RenderContext>,
    window: Option<Arc<Window>>,
    scene: Scene,
    config: Config,
    assets: AssetPaths,
    fatal: Option<AppError>,
}

impl App {
    pub fn new(config: Config, assets: AssetPaths) -> Self {
        let overlay = TuningOverlay::new(
            config.window.title.clone(),
            f64::from(config.debug.stats_interval_secs),
        );
        let scene = Scene::new(
            &config,
            config.window.width,
            config.window.height,
            Box::new(overlay),
        );
        Self {
            renderer: None,
            gpu: None,
            window: None,
            scene,
            config,
            assets,
            fatal: None,
        }
    }

    /// Fatal error that stopped the event loop, if any.
    pub fn take_fatal(&mut self) -> Option<AppError> {
        self.fatal.take()
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let size = window.inner_size();
        info!(width = size.width, height = size.height, "Window created");

        let gpu = init_render_context_blocking(window.clone(), self.config.window.vsync)?;
        let renderer = Renderer::new(&gpu, &self.assets, &self.config)?;

        let (width, height) = gpu.size();
        self.scene.on_resize(width, height);
        let captured = !self.scene.cursor_visible();
        self.scene.mouse_mut().set_captured(&window, captured);
        log_controls();

        self.renderer = Some(renderer);
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: AppError) {
        error!("{err}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(&gpu.device, width, height);
            }
        }
        self.scene.on_resize(width, height);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let mut draws = 0;
        let running = run_frame(|phase| {
            match phase {
                FramePhase::PollInput => self.poll_input(),
                // The renderer records the clear and every draw phase into
                // one pass and presents it on submit.
                FramePhase::ClearBuffers => draws = self.render(),
                FramePhase::DrawOverlay => self.finish_frame(draws),
                _ => {}
            }
            self.scene.close_requested()
        });
        if !running {
            event_loop.exit();
        }
    }

    /// Poll input and advance time and camera.
    fn poll_input(&mut self) {
        let update = self.scene.update();
        if update.cursor_toggled
            && let Some(window) = &self.window
        {
            let captured = !self.scene.cursor_visible();
            self.scene.mouse_mut().set_captured(window, captured);
        }
    }

    fn render(&mut self) -> usize {
        let (Some(renderer), Some(gpu)) = (&mut self.renderer, &self.gpu) else {
            return 0;
        };
        match renderer.render(gpu, &self.scene) {
            Ok(draws) => draws,
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, skipping frame");
                0
            }
            Err(err) => {
                warn!("Frame skipped: {err}");
                0
            }
        }
    }

    /// Run the overlay. Its patches land before the next frame.
    fn finish_frame(&mut self, draws: usize) {
        self.scene.finish_frame(draws);
        if let Some(title) = self.scene.take_title()
            && let Some(window) = &self.window
        {
            window.set_title(&title);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.initialize(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.scene.request_close();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } => {
                self.scene.on_key(RawKeyEvent::from(&event));
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.scene.on_cursor_move(position.x, position.y);
            }
            WindowEvent::Focused(false) => self.scene.release_keys(),
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.scene.on_mouse_motion(delta.0, delta.1);
        }
    }
}

fn log_controls() {
    let bindings = Bindings::default();
    let key = |command| {
        bindings
            .key_for(command)
            .map_or_else(|| "unbound".to_string(), |key| format!("{key:?}"))
    };
    info!(
        quit = %key(Command::Quit),
        cursor = %key(Command::ToggleCursor),
        wireframe = %key(Command::ToggleWireframe),
        cull_face = %key(Command::ToggleCullFace),
        "Controls"
    );
}

/// Run the explorer until the window closes.
pub fn run(config: Config, assets: AssetPaths) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config, assets);
    event_loop.run_app(&mut app)?;
    match app.take_fatal() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
