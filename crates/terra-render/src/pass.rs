//! The frame's single render pass and the encoder that owns the swapchain
//! image while it is recorded.

use crate::depth::DepthBuffer;

/// Clear colour: the dark grey seen wherever no phase draws.
pub const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Clear values and attachments for the frame pass.
#[derive(Debug, Clone)]
pub struct RenderPassBuilder {
    label: &'static str,
    clear_color: wgpu::Color,
    depth_view: Option<wgpu::TextureView>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self {
            label: "frame",
            clear_color: BACKGROUND,
            depth_view: None,
        }
    }

    pub fn clear_color(self, clear_color: wgpu::Color) -> Self {
        Self {
            clear_color,
            ..self
        }
    }

    /// Depth is cleared to [`DepthBuffer::CLEAR_VALUE`].
    pub fn depth(self, depth: &DepthBuffer) -> Self {
        Self {
            depth_view: Some(depth.view().clone()),
            ..self
        }
    }

    pub fn label(self, label: &'static str) -> Self {
        Self { label, ..self }
    }

    pub fn has_depth(&self) -> bool {
        self.depth_view.is_some()
    }

    fn begin<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        target: &'e wgpu::TextureView,
    ) -> wgpu::RenderPass<'e> {
        let depth_stencil_attachment =
            self.depth_view
                .as_ref()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Commands for one frame. [`FrameEncoder::submit`] presents the image;
/// dropping the encoder instead discards the frame.
pub struct FrameEncoder {
    commands: wgpu::CommandEncoder,
    queue: wgpu::Queue,
    frame: wgpu::SurfaceTexture,
    target: wgpu::TextureView,
}

impl FrameEncoder {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, frame: wgpu::SurfaceTexture) -> Self {
        let target = frame.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("frame-target"),
            ..Default::default()
        });
        let commands = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-commands"),
        });
        Self {
            commands,
            queue: queue.clone(),
            frame,
            target,
        }
    }

    pub fn begin_render_pass<'a>(&'a mut self, builder: &RenderPassBuilder) -> wgpu::RenderPass<'a> {
        builder.begin(&mut self.commands, &self.target)
    }

    pub fn submit(self) {
        self.queue.submit(std::iter::once(self.commands.finish()));
        self.frame.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_device;

    #[test]
    fn test_defaults_clear_to_background() {
        let builder = RenderPassBuilder::default();
        assert_eq!(builder.clear_color, BACKGROUND);
        assert_eq!(builder.label, "frame");
        assert!(!builder.has_depth());
        assert_eq!((BACKGROUND.r, BACKGROUND.g, BACKGROUND.b), (0.1, 0.1, 0.1));
    }

    #[test]
    fn test_builder_overrides() {
        let builder = RenderPassBuilder::new()
            .clear_color(wgpu::Color::BLACK)
            .label("offscreen");
        assert_eq!(builder.clear_color, wgpu::Color::BLACK);
        assert_eq!(builder.label, "offscreen");
    }

    #[test]
    fn test_depth_attachment_follows_buffer() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let depth = DepthBuffer::new(&device, 4, 4);
        assert!(RenderPassBuilder::new().depth(&depth).has_depth());
    }
}
