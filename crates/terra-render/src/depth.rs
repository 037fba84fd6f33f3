//! Reverse-Z depth attachment. Near maps to 1.0 and far to 0.0, so depth
//! precision is spent on the distant edge of the chunk window.

pub struct DepthBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

impl DepthBuffer {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// The far plane.
    pub const CLEAR_VALUE: f32 = 0.0;
    pub const COMPARE_FUNCTION: wgpu::CompareFunction = wgpu::CompareFunction::GreaterEqual;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = clamp_size(width, height);
        let texture = device.create_texture(&descriptor(size));
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("depth-view"),
            ..Default::default()
        });
        log::debug!("Depth buffer {}x{}", size.0, size.1);
        Self {
            texture,
            view,
            size,
        }
    }

    /// Reallocate when the surface size changed; a no-op otherwise.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if clamp_size(width, height) != self.size {
            *self = Self::new(device, width, height);
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

fn clamp_size(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

fn descriptor((width, height): (u32, u32)) -> wgpu::TextureDescriptor<'static> {
    wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DepthBuffer::FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_device;

    #[test]
    fn test_descriptor_is_single_sample_attachment() {
        let desc = descriptor((640, 480));
        assert_eq!(desc.format, wgpu::TextureFormat::Depth32Float);
        assert_eq!(desc.size.width, 640);
        assert_eq!(desc.size.height, 480);
        assert_eq!(desc.sample_count, 1);
        assert_eq!(desc.usage, wgpu::TextureUsages::RENDER_ATTACHMENT);
    }

    #[test]
    fn test_zero_extent_clamps_to_one() {
        assert_eq!(clamp_size(0, 0), (1, 1));
        assert_eq!(clamp_size(1600, 0), (1600, 1));
    }

    #[test]
    fn test_far_plane_clears_to_zero() {
        assert_eq!(DepthBuffer::CLEAR_VALUE, 0.0);
        assert_eq!(
            DepthBuffer::COMPARE_FUNCTION,
            wgpu::CompareFunction::GreaterEqual
        );
    }

    #[test]
    fn test_resize_reallocates_on_change_only() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut depth = DepthBuffer::new(&device, 800, 600);
        depth.resize(&device, 800, 600);
        assert_eq!(depth.size(), (800, 600));
        depth.resize(&device, 1600, 800);
        assert_eq!(depth.size(), (1600, 800));
        assert_eq!(depth.texture().width(), 1600);
    }
}
