//! Shader programs: WGSL sources, a typed uniform block and lazily built
//! pipeline variants.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

use terra_mesh::Vertex;

use crate::{
    chunk_ring::ChunkUniform,
    pipeline::PipelineState,
    uniform::{UniformBlock, UniformError, UniformLayout, UniformValue},
};

/// Name of the generated uniform struct and its variable in WGSL.
pub const UNIFORM_STRUCT: &str = "Uniforms";
pub const UNIFORM_VAR: &str = "u";
/// Variable the per-chunk uniform is bound to in WGSL.
pub const CHUNK_VAR: &str = "chunk";

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to compile: {message}")]
    CompilationFailed { name: String, message: String },

    #[error("shader file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{name}' has no {stage} stage")]
    MissingStage { name: String, stage: &'static str },

    #[error("shader '{name}' does not define entry point '{entry}'")]
    MissingEntryPoint { name: String, entry: &'static str },
}

/// Stage files of a program. Empty paths are skipped.
#[derive(Debug, Clone, Default)]
pub struct ShaderSources {
    pub vertex: PathBuf,
    pub fragment: Option<PathBuf>,
    /// Shared code prepended before the stages, in order.
    pub includes: Vec<PathBuf>,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            ..Default::default()
        }
    }

    pub fn with_fragment(mut self, path: impl Into<PathBuf>) -> Self {
        self.fragment = Some(path.into());
        self
    }

    pub fn with_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.includes.push(path.into());
        self
    }

    fn fragment_path(&self) -> Option<&Path> {
        self.fragment
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Read every file and concatenate them: includes, vertex, then the
    /// fragment stage unless it is the same file as the vertex stage.
    pub fn read(&self, name: &str) -> Result<String, ShaderError> {
        if self.vertex.as_os_str().is_empty() {
            return Err(ShaderError::MissingStage {
                name: name.to_string(),
                stage: "vertex",
            });
        }

        let mut files: Vec<&Path> = self
            .includes
            .iter()
            .map(PathBuf::as_path)
            .filter(|path| !path.as_os_str().is_empty())
            .collect();
        files.push(&self.vertex);
        if let Some(fragment) = self.fragment_path()
            && fragment != self.vertex
        {
            files.push(fragment);
        }

        let mut source = String::new();
        for path in files {
            source.push_str(&read_source(path)?);
            source.push('\n');
        }
        Ok(source)
    }

    /// Final WGSL: the generated uniform declarations followed by the files.
    pub fn compose(
        &self,
        name: &str,
        layout: &UniformLayout,
        per_chunk: bool,
    ) -> Result<String, ShaderError> {
        let body = self.read(name)?;
        let source = compose_source(layout, per_chunk, &body);
        check_entry_point(name, &source, VERTEX_ENTRY)?;
        if self.fragment_path().is_some() {
            check_entry_point(name, &source, FRAGMENT_ENTRY)?;
        }
        Ok(source)
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    if !path.exists() {
        return Err(ShaderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    debug!("Reading shader source {}", path.display());
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Prepend the uniform declarations to `body`.
pub fn compose_source(layout: &UniformLayout, per_chunk: bool, body: &str) -> String {
    let mut source = layout.wgsl(UNIFORM_STRUCT, UNIFORM_VAR, 0);
    if per_chunk {
        source.push_str(&ChunkUniform::wgsl(CHUNK_VAR));
    }
    source.push('\n');
    source.push_str(body);
    source
}

fn check_entry_point(name: &str, source: &str, entry: &'static str) -> Result<(), ShaderError> {
    let declared = source.match_indices(entry).any(|(at, _)| {
        let before = source[..at].trim_end();
        let after = &source[at + entry.len()..];
        before.ends_with("fn") && after.trim_start().starts_with('(')
    });
    if declared {
        Ok(())
    } else {
        Err(ShaderError::MissingEntryPoint {
            name: name.to_string(),
            entry,
        })
    }
}

/// Everything needed to build a [`ShaderProgram`].
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    pub sources: &'a ShaderSources,
    pub uniforms: UniformLayout,
    /// Layout of the per-chunk uniform when the program draws chunks.
    pub chunk_layout: Option<&'a wgpu::BindGroupLayout>,
    pub color_format: wgpu::TextureFormat,
    pub wireframe_supported: bool,
}

/// A compiled WGSL module with its uniform block and pipeline variants.
pub struct ShaderProgram {
    label: String,
    module: wgpu::ShaderModule,
    has_fragment: bool,
    color_format: wgpu::TextureFormat,
    wireframe_supported: bool,
    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineState, wgpu::RenderPipeline>,
    wireframe_warned: bool,
}

impl ShaderProgram {
    /// Read, compose and compile the program. Compilation errors are
    /// captured with a validation error scope and returned.
    pub fn new(device: &wgpu::Device, desc: ProgramDescriptor<'_>) -> Result<Self, ShaderError> {
        let source = desc
            .sources
            .compose(desc.label, &desc.uniforms, desc.chunk_layout.is_some())?;

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(desc.label),
            source: ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(ShaderError::CompilationFailed {
                name: desc.label.to_string(),
                message: error.to_string(),
            });
        }

        let uniforms = UniformBlock::new(desc.uniforms);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{}-uniforms", desc.label)),
            size: u64::from(uniforms.layout().size()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{}-uniform-layout", desc.label)),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(u64::from(uniforms.layout().size())),
                },
                count: None,
            }],
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}-uniform-bind-group", desc.label)),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut bind_group_layouts = vec![&uniform_layout];
        bind_group_layouts.extend(desc.chunk_layout);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}-pipeline-layout", desc.label)),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        info!("Compiled shader program '{}'", desc.label);

        Ok(Self {
            label: desc.label.to_string(),
            module,
            has_fragment: desc.sources.fragment_path().is_some(),
            color_format: desc.color_format,
            wireframe_supported: desc.wireframe_supported,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            pipeline_layout,
            pipelines: HashMap::new(),
            wireframe_warned: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stage a uniform write. Unknown names and kind mismatches are logged
    /// on every call and leave the block untouched.
    pub fn set_uniform(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), UniformError> {
        stage_uniform(&self.label, &mut self.uniforms, name, value)
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    /// Upload staged uniforms if any changed.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if let Some(bytes) = self.uniforms.take_dirty() {
            queue.write_buffer(&self.uniform_buffer, 0, bytes);
        }
    }

    /// Build the pipeline variant for `state` if it doesn't exist yet.
    /// Returns the state actually used, which differs from `state` when
    /// wireframe is unavailable.
    pub fn prepare(&mut self, device: &wgpu::Device, state: PipelineState) -> PipelineState {
        let resolved = state.supported(self.wireframe_supported);
        if resolved != state && !self.wireframe_warned {
            warn!(
                "{}: wireframe is not supported by this adapter, drawing filled",
                self.label
            );
            self.wireframe_warned = true;
        }
        if !self.pipelines.contains_key(&resolved) {
            debug!("{}: creating pipeline variant {}", self.label, resolved.label());
            let pipeline = self.create_pipeline(device, resolved);
            self.pipelines.insert(resolved, pipeline);
        }
        resolved
    }

    /// Number of pipeline variants built so far.
    pub fn variant_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Set the pipeline for a prepared state and the uniform bind group.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>, state: PipelineState) -> bool {
        let resolved = state.supported(self.wireframe_supported);
        let Some(pipeline) = self.pipelines.get(&resolved) else {
            warn!("{}: pipeline variant {} was not prepared", self.label, resolved.label());
            return false;
        };
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        true
    }

    fn create_pipeline(&self, device: &wgpu::Device, state: PipelineState) -> wgpu::RenderPipeline {
        let targets = [Some(wgpu::ColorTargetState {
            format: self.color_format,
            blend: state.blend_state(),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let label = format!("{}-{}", self.label, state.label());

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some(VERTEX_ENTRY),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: state.primitive(wgpu::PrimitiveTopology::TriangleList),
            depth_stencil: Some(state.depth_stencil()),
            multisample: wgpu::MultisampleState::default(),
            fragment: self.has_fragment.then(|| wgpu::FragmentState {
                module: &self.module,
                entry_point: Some(FRAGMENT_ENTRY),
                targets: &targets,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        })
    }
}

fn stage_uniform(
    label: &str,
    uniforms: &mut UniformBlock,
    name: &str,
    value: impl Into<UniformValue>,
) -> Result<(), UniformError> {
    uniforms.set(name, value).inspect_err(|error| warn!("{label}: {error}"))
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("label", &self.label)
            .field("variants", &self.pipelines.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{BlendMode, FillMode};
    use crate::test_support::create_test_device;
    use crate::uniform::UniformKind;
    use glam::Mat4;
    use std::fs;

    const VALID_SHADER: &str = r#"
struct VsOut {
    @builtin(position) clip: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.clip = u.mvp * vec4<f32>(position, 1.0);
    return out;
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.tint, 1.0);
}
"#;

    fn layout() -> UniformLayout {
        UniformLayout::new()
            .field("mvp", UniformKind::Mat4)
            .field("tint", UniformKind::Vec3)
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_compose_prepends_uniform_struct() {
        let source = compose_source(&layout(), false, "// body");
        assert!(source.starts_with("struct Uniforms {"));
        assert!(source.contains("mvp: mat4x4<f32>,"));
        assert!(source.contains("@group(0) @binding(0) var<uniform> u: Uniforms;"));
        assert!(!source.contains("ChunkUniform"));
        assert!(source.ends_with("// body"));

        let chunked = compose_source(&layout(), true, "");
        assert!(chunked.contains("var<uniform> chunk: ChunkUniform;"));
    }

    #[test]
    fn test_entry_point_detection() {
        assert!(check_entry_point("p", "fn vs_main() {}", VERTEX_ENTRY).is_ok());
        assert!(check_entry_point("p", "@vertex\nfn  vs_main (x: f32)", VERTEX_ENTRY).is_ok());
        assert!(check_entry_point("p", "// vs_main\nfn other() {}", VERTEX_ENTRY).is_err());
        assert!(check_entry_point("p", "fn vs_main_2() {}", VERTEX_ENTRY).is_err());
    }

    #[test]
    fn test_read_concatenates_includes_and_stages() {
        let dir = tempfile::tempdir().unwrap();
        let common = write(dir.path(), "common.wgsl", "// common");
        let vertex = write(dir.path(), "vert.wgsl", "fn vs_main() {}");
        let fragment = write(dir.path(), "frag.wgsl", "fn fs_main() {}");

        let sources = ShaderSources::new(&vertex)
            .with_fragment(&fragment)
            .with_include(&common)
            .with_include("");
        let source = sources.read("test").unwrap();
        let common_at = source.find("// common").unwrap();
        let vertex_at = source.find("vs_main").unwrap();
        let fragment_at = source.find("fs_main").unwrap();
        assert!(common_at < vertex_at && vertex_at < fragment_at);
    }

    #[test]
    fn test_shared_stage_file_is_read_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "both.wgsl", VALID_SHADER);
        let source = ShaderSources::new(&path)
            .with_fragment(&path)
            .read("both")
            .unwrap();
        assert_eq!(source.matches("fn vs_main").count(), 1);
    }

    #[test]
    fn test_missing_vertex_stage() {
        let err = ShaderSources::default().read("empty").unwrap_err();
        assert!(matches!(err, ShaderError::MissingStage { stage: "vertex", .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ShaderSources::new("/nonexistent/terra/vert.wgsl")
            .read("missing")
            .unwrap_err();
        assert!(matches!(err, ShaderError::FileNotFound { .. }));
    }

    #[test]
    fn test_missing_fragment_entry_point() {
        let dir = tempfile::tempdir().unwrap();
        let vertex = write(dir.path(), "vert.wgsl", "fn vs_main() {}");
        let fragment = write(dir.path(), "frag.wgsl", "fn main() {}");
        let err = ShaderSources::new(&vertex)
            .with_fragment(&fragment)
            .compose("frag", &layout(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            ShaderError::MissingEntryPoint {
                entry: FRAGMENT_ENTRY,
                ..
            }
        ));
    }

    fn program(device: &wgpu::Device, dir: &Path, body: &str) -> Result<ShaderProgram, ShaderError> {
        let path = write(dir, "program.wgsl", body);
        let sources = ShaderSources::new(&path).with_fragment(&path);
        ShaderProgram::new(
            device,
            ProgramDescriptor {
                label: "test",
                sources: &sources,
                uniforms: layout(),
                chunk_layout: None,
                color_format: wgpu::TextureFormat::Rgba8UnormSrgb,
                wireframe_supported: false,
            },
        )
    }

    #[test]
    fn test_program_compiles_and_caches_variants() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(&device, dir.path(), VALID_SHADER).unwrap();

        let opaque = program.prepare(&device, PipelineState::OPAQUE);
        assert_eq!(opaque, PipelineState::OPAQUE);
        program.prepare(&device, PipelineState::OPAQUE);
        assert_eq!(program.variant_count(), 1);

        program.prepare(&device, PipelineState::OPAQUE.with_blend(BlendMode::Alpha));
        assert_eq!(program.variant_count(), 2);

        let wire = program.prepare(&device, PipelineState::OPAQUE.with_fill(FillMode::Wireframe));
        assert_eq!(wire, PipelineState::OPAQUE);
        assert_eq!(program.variant_count(), 2);

        program.set_uniform("mvp", Mat4::IDENTITY).unwrap();
        program.flush(&queue);
        assert!(!program.uniforms().is_dirty());
    }

    #[test]
    fn test_unknown_uniform_changes_nothing() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let mut program = program(&device, dir.path(), VALID_SHADER).unwrap();
        let before = program.uniforms().bytes().to_vec();

        assert!(program.set_uniform("fooBar", 1.0f32).is_err());
        assert!(program.set_uniform("tint", 2.0f32).is_err());
        assert_eq!(program.uniforms().bytes(), &before[..]);

        program.set_uniform("tint", glam::Vec3::ONE).unwrap();
        assert_ne!(program.uniforms().bytes(), &before[..]);
    }

    #[test]
    fn test_rejected_uniform_is_reported_on_every_call() {
        let mut block = UniformBlock::new(layout());
        let before = block.bytes().to_vec();

        for _ in 0..3 {
            let err = stage_uniform("test", &mut block, "fooBar", 1.0f32).unwrap_err();
            assert!(matches!(err, UniformError::Unknown { ref name } if name == "fooBar"));
        }
        for _ in 0..2 {
            let err = stage_uniform("test", &mut block, "tint", 2.0f32).unwrap_err();
            assert!(matches!(err, UniformError::KindMismatch { .. }));
        }
        assert_eq!(block.bytes(), &before[..]);

        stage_uniform("test", &mut block, "tint", glam::Vec3::ONE).unwrap();
        assert_ne!(block.bytes(), &before[..]);
    }

    #[test]
    fn test_invalid_wgsl_is_a_compilation_error() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let broken = "fn vs_main() -> @builtin(position) vec4<f32> { return undeclared; }\n\
                      fn fs_main() {}";
        let err = program(&device, dir.path(), broken).unwrap_err();
        assert!(matches!(err, ShaderError::CompilationFailed { .. }));
    }
}
