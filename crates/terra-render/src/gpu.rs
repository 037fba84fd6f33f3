//! Device creation and the window surface.

use std::sync::Arc;

use winit::window::Window;

/// Render context initialization failures. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum RenderContextError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Frame acquisition failures. The frame is skipped and the loop continues.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface lost")]
    Lost,

    #[error("out of memory")]
    OutOfMemory,

    #[error("timeout")]
    Timeout,
}

/// Device, queue and the window surface they present to.
pub struct RenderContext {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    wireframe_supported: bool,
}

impl RenderContext {
    pub async fn new(window: Arc<Window>, vsync: bool) -> Result<Self, RenderContextError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            })
            .await
            .map_err(|_| RenderContextError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("GPU: {} on {:?} ({:?})", info.name, info.backend, info.device_type);

        let required_features = required_features(adapter.features());
        let wireframe_supported = required_features.contains(wgpu::Features::POLYGON_MODE_LINE);
        if !wireframe_supported {
            log::warn!("Line polygon mode unavailable, wireframe toggle will draw filled");
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("terra"),
                required_features,
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let config = surface_configuration(
            &surface.get_capabilities(&adapter),
            (size.width, size.height),
            vsync,
        )?;
        log::info!(
            "Surface {:?} {}x{}, {:?}",
            config.format,
            config.width,
            config.height,
            config.present_mode
        );
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            surface_format: config.format,
            config,
            device,
            queue,
            wireframe_supported,
        })
    }

    /// Whether the device was created with line polygon mode.
    pub fn wireframe_supported(&self) -> bool {
        self.wireframe_supported
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface for a new window size. Zero extents clamp
    /// to 1.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    /// Next swapchain image. A lost or outdated surface is reconfigured and
    /// retried once.
    pub fn get_current_texture(&self) -> Result<wgpu::SurfaceTexture, SurfaceError> {
        let first = match self.surface.get_current_texture() {
            Ok(frame) => return Ok(frame),
            Err(err) => err,
        };
        match first {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                log::warn!("Surface {first}, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.surface
                    .get_current_texture()
                    .map_err(|_| SurfaceError::Lost)
            }
            wgpu::SurfaceError::OutOfMemory => Err(SurfaceError::OutOfMemory),
            wgpu::SurfaceError::Timeout => Err(SurfaceError::Timeout),
            wgpu::SurfaceError::Other => {
                log::error!("Surface acquisition failed: {first}");
                Err(SurfaceError::Lost)
            }
        }
    }
}

/// Optional features the renderer asks for when the adapter has them.
pub fn required_features(available: wgpu::Features) -> wgpu::Features {
    available & wgpu::Features::POLYGON_MODE_LINE
}

fn surface_configuration(
    caps: &wgpu::SurfaceCapabilities,
    (width, height): (u32, u32),
    vsync: bool,
) -> Result<wgpu::SurfaceConfiguration, RenderContextError> {
    let format = select_preferred_srgb_format(&caps.formats).ok_or(RenderContextError::NoSurfaceFormat)?;
    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: select_present_mode(&caps.present_modes, vsync),
        desired_maximum_frame_latency: 2,
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: Vec::new(),
    })
}

/// Initialize the GPU synchronously using `pollster`.
pub fn init_render_context_blocking(
    window: Arc<Window>,
    vsync: bool,
) -> Result<RenderContext, RenderContextError> {
    pollster::block_on(RenderContext::new(window, vsync))
}

/// Prefer Bgra8UnormSrgb, then Rgba8UnormSrgb, then any sRGB format, then
/// whatever comes first.
pub fn select_preferred_srgb_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ]
    .into_iter()
    .find(|f| formats.contains(f))
    .or_else(|| formats.iter().copied().find(|f| f.is_srgb()))
    .or_else(|| formats.first().copied())
}

/// `Immediate` when vsync is off and the surface offers it, otherwise `Fifo`,
/// which every surface supports.
pub fn select_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if !vsync && available.contains(&wgpu::PresentMode::Immediate) {
        wgpu::PresentMode::Immediate
    } else {
        wgpu::PresentMode::Fifo
    }
}
