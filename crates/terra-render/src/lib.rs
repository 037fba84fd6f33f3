//! wgpu rendering for the terrain explorer: device and surface, reverse-Z
//! depth, typed uniforms, shader programs and their pipeline variants.

pub mod buffer;
pub mod chunk_ring;
pub mod depth;
pub mod gpu;
pub mod pass;
pub mod pipeline;
pub mod shader;
pub mod uniform;

#[cfg(test)]
mod test_support;

pub use buffer::{BufferAllocator, GpuMesh};
pub use chunk_ring::{CHUNK_GROUP, ChunkUniform, ChunkUniformRing};
pub use depth::DepthBuffer;
pub use gpu::{
    RenderContext, RenderContextError, SurfaceError, init_render_context_blocking, required_features,
    select_present_mode, select_preferred_srgb_format,
};
pub use pass::{BACKGROUND, FrameEncoder, RenderPassBuilder};
pub use pipeline::{BlendMode, FillMode, PipelineState};
pub use shader::{ProgramDescriptor, ShaderError, ShaderProgram, ShaderSources};
pub use uniform::{UniformBlock, UniformError, UniformKind, UniformLayout, UniformValue};
