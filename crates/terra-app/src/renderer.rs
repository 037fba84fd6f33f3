//! GPU side of a frame: programs, meshes and the chunk uniform ring.

use terra_config::Config;
use terra_mesh::{chunk_patch, screen_quad, skybox_cube};
use terra_render::{
    BufferAllocator, ChunkUniform, ChunkUniformRing, DepthBuffer, FrameEncoder, GpuMesh,
    ProgramDescriptor, RenderContext, RenderPassBuilder, ShaderError, ShaderProgram,
    SurfaceError, UniformLayout,
};
use terra_terrain::{ChunkCoord, LodSelector, dispatch_chunks};
use tracing::{debug, info};

use crate::{
    assets::AssetPaths,
    frame::{DrawKind, FramePlan},
    passes::{self, ChunkDraw, ChunkRecorder, FrameUniforms, UniformList},
    scene::Scene,
};

/// Shader file and uniform layout of each draw kind.
struct ProgramSource {
    label: &'static str,
    file: &'static str,
    layout: UniformLayout,
    chunked: bool,
}

impl ProgramSource {
    fn of(kind: DrawKind) -> Self {
        let (label, file, layout) = match kind {
            DrawKind::Sky => ("sky", "sky.wgsl", passes::sky_layout()),
            DrawKind::Terrain => ("terrain", "terrain.wgsl", passes::terrain_layout()),
            DrawKind::ChunkedWater => ("water", "water.wgsl", passes::water_layout()),
            DrawKind::ScreenWater => (
                "screen-water",
                "water_screen.wgsl",
                passes::screen_water_layout(),
            ),
            DrawKind::Clouds => ("clouds", "clouds.wgsl", passes::clouds_layout()),
        };
        Self {
            label,
            file,
            layout,
            chunked: kind.is_chunked(),
        }
    }
}

pub struct Renderer {
    // Fields drop top to bottom, the reverse of the order `new` creates them.
    clouds: ShaderProgram,
    screen_water: ShaderProgram,
    water: ShaderProgram,
    terrain: ShaderProgram,
    sky: ShaderProgram,
    chunk_ring: ChunkUniformRing,
    lod_meshes: Vec<GpuMesh>,
    sky_cube: GpuMesh,
    screen: GpuMesh,
    depth: DepthBuffer,
    lod: LodSelector,
    terrain_draws: Vec<ChunkDraw>,
    water_draws: Vec<ChunkDraw>,
}

impl Renderer {
    pub fn new(ctx: &RenderContext, assets: &AssetPaths, config: &Config) -> Result<Self, ShaderError> {
        let (width, height) = ctx.size();
        let lod = LodSelector::from_config(&config.terrain);
        let depth = DepthBuffer::new(&ctx.device, width, height);

        let allocator = BufferAllocator::new(&ctx.device);
        let screen = allocator.upload("screen-quad", &screen_quad());
        let sky_cube = allocator.upload("skybox", &skybox_cube());
        let patch = chunk_patch();
        let lod_meshes: Vec<GpuMesh> = lod
            .levels()
            .build_meshes(&patch)
            .iter()
            .enumerate()
            .map(|(level, mesh)| allocator.upload(&format!("chunk-lod{level}"), mesh))
            .collect();
        info!(
            levels = lod_meshes.len(),
            rings = ?lod.rings().rings(),
            "Chunk detail levels ready"
        );

        let chunk_ring = ChunkUniformRing::new(&ctx.device);

        let program = |kind: DrawKind| {
            let source = ProgramSource::of(kind);
            let sources = assets.program(source.file);
            ShaderProgram::new(
                &ctx.device,
                ProgramDescriptor {
                    label: source.label,
                    sources: &sources,
                    uniforms: source.layout,
                    chunk_layout: source.chunked.then(|| chunk_ring.layout()),
                    color_format: ctx.surface_format,
                    wireframe_supported: ctx.wireframe_supported(),
                },
            )
        };
        let sky = program(DrawKind::Sky)?;
        let terrain = program(DrawKind::Terrain)?;
        let water = program(DrawKind::ChunkedWater)?;
        let screen_water = program(DrawKind::ScreenWater)?;
        let clouds = program(DrawKind::Clouds)?;

        Ok(Self {
            clouds,
            screen_water,
            water,
            terrain,
            sky,
            chunk_ring,
            lod_meshes,
            sky_cube,
            screen,
            depth,
            lod,
            terrain_draws: Vec::new(),
            water_draws: Vec::new(),
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
    }

    fn program(&self, kind: DrawKind) -> &ShaderProgram {
        match kind {
            DrawKind::Sky => &self.sky,
            DrawKind::Terrain => &self.terrain,
            DrawKind::ChunkedWater => &self.water,
            DrawKind::ScreenWater => &self.screen_water,
            DrawKind::Clouds => &self.clouds,
        }
    }

    fn program_mut(&mut self, kind: DrawKind) -> &mut ShaderProgram {
        match kind {
            DrawKind::Sky => &mut self.sky,
            DrawKind::Terrain => &mut self.terrain,
            DrawKind::ChunkedWater => &mut self.water,
            DrawKind::ScreenWater => &mut self.screen_water,
            DrawKind::Clouds => &mut self.clouds,
        }
    }

    /// Record the chunk windows of `plan` and stage their uniforms.
    fn record_chunks(&mut self, plan: &FramePlan, scene: &Scene) {
        let params = scene.params();
        let camera_chunk = scene.camera_chunk();
        self.terrain_draws.clear();
        self.water_draws.clear();
        self.chunk_ring.clear();

        for step in plan.steps() {
            let (count, draws) = match step.kind {
                DrawKind::Terrain => (params.chunk_count(), &mut self.terrain_draws),
                DrawKind::ChunkedWater => (params.water().chunk_count, &mut self.water_draws),
                _ => continue,
            };
            dispatch_chunks(
                camera_chunk,
                count,
                &mut ChunkRecorder::new(&self.lod, camera_chunk, draws),
            );
            let ring = &mut self.chunk_ring;
            draws.retain_mut(|draw| {
                let ChunkCoord { x, z } = draw.chunk;
                match ring.push(ChunkUniform::new([x, z], draw.level as u32)) {
                    Some(slot) => {
                        draw.slot = slot;
                        true
                    }
                    None => false,
                }
            });
        }
    }

    /// Draw one frame. Returns the number of draw calls.
    pub fn render(&mut self, ctx: &RenderContext, scene: &Scene) -> Result<usize, SurfaceError> {
        let plan = scene.plan();
        let (width, height) = ctx.size();
        let frame = FrameUniforms::new(scene, width, height);

        self.record_chunks(&plan, scene);
        self.chunk_ring.upload(&ctx.device, &ctx.queue);

        for step in plan.steps() {
            let uniforms = uniforms_for(step.kind, &frame, scene);
            let program = self.program_mut(step.kind);
            for (name, value) in uniforms {
                // Rejected writes are logged by the program and leave it unchanged.
                let _ = program.set_uniform(name, value);
            }
            program.prepare(&ctx.device, step.state);
            program.flush(&ctx.queue);
        }

        let surface_texture = ctx.get_current_texture()?;
        let mut encoder = FrameEncoder::new(&ctx.device, &ctx.queue, surface_texture);
        let builder = RenderPassBuilder::new().depth(&self.depth).label("frame");
        let mut draw_calls = 0;
        {
            let mut pass = encoder.begin_render_pass(&builder);
            for step in plan.steps() {
                if !self.program(step.kind).bind(&mut pass, step.state) {
                    continue;
                }
                draw_calls += match step.kind {
                    DrawKind::Sky => draw_mesh(&mut pass, &self.sky_cube),
                    DrawKind::ScreenWater | DrawKind::Clouds => draw_mesh(&mut pass, &self.screen),
                    DrawKind::Terrain => self.draw_chunks(&mut pass, &self.terrain_draws),
                    DrawKind::ChunkedWater => self.draw_chunks(&mut pass, &self.water_draws),
                };
            }
        }
        encoder.submit();
        debug!(draw_calls, "frame submitted");
        Ok(draw_calls)
    }

    fn draw_chunks(&self, pass: &mut wgpu::RenderPass<'_>, draws: &[ChunkDraw]) -> usize {
        let mut bound_level = None;
        let mut issued = 0;
        for draw in drawable(draws, self.lod_meshes.len()) {
            let mesh = &self.lod_meshes[draw.level];
            if bound_level != Some(draw.level) {
                mesh.bind(pass);
                bound_level = Some(draw.level);
            }
            self.chunk_ring.bind(pass, draw.slot);
            mesh.draw(pass);
            issued += 1;
        }
        issued
    }
}

/// Draws whose detail level has a mesh.
fn drawable(draws: &[ChunkDraw], levels: usize) -> impl Iterator<Item = &ChunkDraw> {
    draws.iter().filter(move |draw| draw.level < levels)
}

fn draw_mesh(pass: &mut wgpu::RenderPass<'_>, mesh: &GpuMesh) -> usize {
    mesh.bind(pass);
    mesh.draw(pass);
    1
}

fn uniforms_for(kind: DrawKind, frame: &FrameUniforms, scene: &Scene) -> UniformList {
    let params = scene.params();
    match kind {
        DrawKind::Sky => passes::sky_uniforms(frame, params),
        DrawKind::Terrain => passes::terrain_uniforms(frame, params),
        DrawKind::ChunkedWater => passes::water_uniforms(frame, params),
        DrawKind::ScreenWater => passes::screen_water_uniforms(frame, params),
        DrawKind::Clouds => passes::clouds_uniforms(frame, params),
    }
}
