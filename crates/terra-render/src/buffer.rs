//! Vertex and index buffer upload.

use terra_mesh::{Mesh, Topology};
use wgpu::util::DeviceExt;

/// A mesh resident on the GPU.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub topology: wgpu::PrimitiveTopology,
}

impl GpuMesh {
    /// Bind vertex and index buffers to a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Creates GPU buffers from [`Mesh`] values.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Upload `mesh`. Patch meshes are expanded to two triangles per patch;
    /// tessellate them beforehand for finer grids.
    pub fn upload(&self, label: &str, mesh: &Mesh) -> GpuMesh {
        let tessellated;
        let mesh = if mesh.topology() == Topology::Patches {
            log::debug!("Mesh '{label}' uploaded as untessellated patches");
            tessellated = mesh.tessellate(1);
            &tessellated
        } else {
            mesh
        };

        GpuMesh {
            vertex_buffer: self.create_buffer(
                &format!("{label}-vertices"),
                bytemuck::cast_slice(mesh.vertices()),
                wgpu::BufferUsages::VERTEX,
            ),
            index_buffer: self.create_buffer(
                &format!("{label}-indices"),
                bytemuck::cast_slice(mesh.indices()),
                wgpu::BufferUsages::INDEX,
            ),
            index_count: mesh.index_count() as u32,
            topology: mesh
                .topology()
                .to_wgpu()
                .unwrap_or(wgpu::PrimitiveTopology::TriangleList),
        }
    }

    fn create_buffer(&self, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_device;
    use terra_mesh::{chunk_patch, skybox_cube};

    #[test]
    fn test_upload_triangle_mesh() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mesh = BufferAllocator::new(&device).upload("sky", &skybox_cube());
        assert_eq!(mesh.index_count, 36);
        assert_eq!(mesh.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(mesh.vertex_buffer.size(), 24 * 32);
    }

    #[test]
    fn test_upload_patch_mesh_is_triangulated() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mesh = BufferAllocator::new(&device).upload("chunk", &chunk_patch());
        assert_eq!(mesh.index_count, 6);
    }
}
