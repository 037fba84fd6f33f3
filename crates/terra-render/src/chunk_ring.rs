//! Per-chunk uniforms delivered through dynamic offsets.
//!
//! Every chunk draw of a frame gets its own slot in one uniform buffer. The
//! slots are written with a single `write_buffer` before the render pass and
//! each draw binds its slot with a dynamic offset at group 1.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// Bind group index the chunk uniform lives at.
pub const CHUNK_GROUP: u32 = 1;

const MIN_CAPACITY: usize = 64;

/// Per-draw data: the chunk offset in chunk units and its LOD level.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ChunkUniform {
    pub offset: [i32; 2],
    pub lod: u32,
    pub _pad: u32,
}

const_assert_eq!(std::mem::size_of::<ChunkUniform>(), 16);

impl ChunkUniform {
    pub fn new(offset: [i32; 2], lod: u32) -> Self {
        Self {
            offset,
            lod,
            _pad: 0,
        }
    }

    /// WGSL declaration matching this struct, bound at [`CHUNK_GROUP`].
    pub fn wgsl(var_name: &str) -> String {
        format!(
            "struct ChunkUniform {{\n    offset: vec2<i32>,\n    lod: u32,\n}};\n\
             @group({CHUNK_GROUP}) @binding(0) var<uniform> {var_name}: ChunkUniform;\n"
        )
    }
}

/// Slot count to allocate for `len` slots: the next power of two, at least
/// [`MIN_CAPACITY`] and at most `max_slots`.
pub fn ring_capacity(len: usize, max_slots: usize) -> usize {
    len.max(MIN_CAPACITY).next_power_of_two().min(max_slots)
}

/// Distance between slots for the device's offset alignment.
pub fn slot_stride(min_offset_alignment: u32) -> u32 {
    (std::mem::size_of::<ChunkUniform>() as u32).next_multiple_of(min_offset_alignment.max(1))
}

/// Most slots a buffer of `max_buffer_size` bytes holds.
pub fn max_slots(max_buffer_size: u64, stride: u32) -> usize {
    usize::try_from(max_buffer_size / u64::from(stride.max(1))).unwrap_or(usize::MAX)
}

/// CPU copy of a frame's slots. Pushes past `max_slots` are counted and
/// refused.
#[derive(Debug)]
struct SlotStaging {
    bytes: Vec<u8>,
    stride: u32,
    max_slots: usize,
    len: usize,
    dropped: usize,
}

impl SlotStaging {
    fn new(stride: u32, max_slots: usize) -> Self {
        Self {
            bytes: Vec::new(),
            stride,
            max_slots,
            len: 0,
            dropped: 0,
        }
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.len = 0;
        self.dropped = 0;
    }

    fn push(&mut self, uniform: ChunkUniform) -> Option<u32> {
        if self.len >= self.max_slots {
            self.dropped += 1;
            return None;
        }
        let slot = self.len as u32;
        self.bytes.extend_from_slice(bytemuck::bytes_of(&uniform));
        self.bytes
            .resize(self.bytes.len() + self.stride as usize - std::mem::size_of::<ChunkUniform>(), 0);
        self.len += 1;
        Some(slot)
    }
}

/// Dynamic-offset uniform buffer holding one [`ChunkUniform`] per draw.
pub struct ChunkUniformRing {
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
    staging: SlotStaging,
    reported_dropped: usize,
}

impl ChunkUniformRing {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("chunk-uniform-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ChunkUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let limits = device.limits();
        let stride = slot_stride(limits.min_uniform_buffer_offset_alignment);
        let max_slots = max_slots(limits.max_buffer_size, stride);
        let capacity = ring_capacity(0, max_slots);
        let (buffer, bind_group) = Self::allocate(device, &layout, stride, capacity);

        Self {
            layout,
            buffer,
            bind_group,
            capacity,
            staging: SlotStaging::new(stride, max_slots),
            reported_dropped: 0,
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u32,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("chunk-uniform-ring"),
            size: u64::from(stride) * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("chunk-uniform-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ChunkUniform>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Layout programs drawing chunks put at [`CHUNK_GROUP`].
    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Forget this frame's slots.
    pub fn clear(&mut self) {
        self.staging.clear();
    }

    /// Stage a uniform and return its slot, or `None` once the ring is at
    /// the device's buffer size limit.
    pub fn push(&mut self, uniform: ChunkUniform) -> Option<u32> {
        self.staging.push(uniform)
    }

    pub fn len(&self) -> usize {
        self.staging.len
    }

    pub fn is_empty(&self) -> bool {
        self.staging.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_slots(&self) -> usize {
        self.staging.max_slots
    }

    /// Pushes refused since the last [`clear`](Self::clear).
    pub fn dropped(&self) -> usize {
        self.staging.dropped
    }

    pub fn offset_of(&self, slot: u32) -> u32 {
        slot * self.staging.stride
    }

    /// Upload the staged slots, growing the buffer first if they don't fit.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let len = self.staging.len;
        if len > self.capacity {
            let capacity = ring_capacity(len, self.staging.max_slots);
            log::debug!(
                "Growing chunk uniform ring from {} to {} slots",
                self.capacity,
                capacity
            );
            let (buffer, bind_group) =
                Self::allocate(device, &self.layout, self.staging.stride, capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }
        if self.staging.dropped != self.reported_dropped {
            if self.staging.dropped > 0 {
                log::warn!(
                    "Chunk uniform ring is full at {} slots, skipping {} chunk draws",
                    self.staging.max_slots,
                    self.staging.dropped
                );
            }
            self.reported_dropped = self.staging.dropped;
        }
        if !self.staging.bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging.bytes);
        }
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>, slot: u32) {
        render_pass.set_bind_group(CHUNK_GROUP, &self.bind_group, &[self.offset_of(slot)]);
    }
}
