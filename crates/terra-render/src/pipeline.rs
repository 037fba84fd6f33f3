//! Fixed-function state a draw phase runs with.
//!
//! wgpu bakes depth, blend, cull and polygon mode into the pipeline, so each
//! distinct [`PipelineState`] becomes its own cached pipeline variant.

use crate::depth::DepthBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    /// Straight alpha: `src * a + dst * (1 - a)`.
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Fill,
    Wireframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend: BlendMode,
    /// Cull back faces.
    pub cull: bool,
    pub fill: FillMode,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl PipelineState {
    /// Depth-tested, depth-writing, opaque, culled, filled.
    pub const OPAQUE: Self = Self {
        depth_test: true,
        depth_write: true,
        blend: BlendMode::Opaque,
        cull: true,
        fill: FillMode::Fill,
    };

    /// No depth interaction and no culling: drawn wherever it lands.
    pub const BACKDROP: Self = Self {
        depth_test: false,
        depth_write: false,
        blend: BlendMode::Opaque,
        cull: false,
        fill: FillMode::Fill,
    };

    pub fn with_blend(self, blend: BlendMode) -> Self {
        Self { blend, ..self }
    }

    pub fn with_cull(self, cull: bool) -> Self {
        Self { cull, ..self }
    }

    pub fn with_fill(self, fill: FillMode) -> Self {
        Self { fill, ..self }
    }

    pub fn with_depth(self, test: bool, write: bool) -> Self {
        Self {
            depth_test: test,
            depth_write: write,
            ..self
        }
    }

    /// Replace wireframe with fill when the device cannot draw lines.
    pub fn supported(self, wireframe_supported: bool) -> Self {
        if self.fill == FillMode::Wireframe && !wireframe_supported {
            self.with_fill(FillMode::Fill)
        } else {
            self
        }
    }

    /// A disabled depth test is expressed as `Always`; the depth attachment
    /// stays bound for the whole frame.
    pub fn depth_stencil(&self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: self.depth_write,
            depth_compare: if self.depth_test {
                DepthBuffer::COMPARE_FUNCTION
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    pub fn primitive(&self, topology: wgpu::PrimitiveTopology) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: self.cull.then_some(wgpu::Face::Back),
            unclipped_depth: false,
            polygon_mode: match self.fill {
                FillMode::Fill => wgpu::PolygonMode::Fill,
                FillMode::Wireframe => wgpu::PolygonMode::Line,
            },
            conservative: false,
        }
    }

    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        match self.blend {
            BlendMode::Opaque => None,
            BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        }
    }

    /// Short label for pipeline debugging.
    pub fn label(&self) -> String {
        format!(
            "{}{}{}-{:?}-{:?}",
            if self.depth_test { "t" } else { "-" },
            if self.depth_write { "w" } else { "-" },
            if self.cull { "c" } else { "-" },
            self.blend,
            self.fill,
        )
        .to_lowercase()
    }
}
