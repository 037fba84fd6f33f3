use glam::{Vec2, Vec3};

use crate::vertex::Vertex;

/// How the index list of a [`Mesh`] is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Three indices per triangle.
    Triangles,
    /// Two indices per segment.
    Lines,
    /// Four indices per quad patch, expanded by [`Mesh::tessellate`].
    Patches,
}

impl Topology {
    /// Indices consumed by one primitive.
    pub fn indices_per_primitive(self) -> usize {
        match self {
            Topology::Triangles => 3,
            Topology::Lines => 2,
            Topology::Patches => 4,
        }
    }

    /// Equivalent wgpu topology. Patches have no GPU counterpart and must be
    /// tessellated first.
    pub fn to_wgpu(self) -> Option<wgpu::PrimitiveTopology> {
        match self {
            Topology::Triangles => Some(wgpu::PrimitiveTopology::TriangleList),
            Topology::Lines => Some(wgpu::PrimitiveTopology::LineList),
            Topology::Patches => None,
        }
    }
}

/// Immutable vertex and index data.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    topology: Topology,
}

impl Mesh {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of triangles, segments or patches.
    pub fn primitive_count(&self) -> usize {
        self.indices.len() / self.topology.indices_per_primitive()
    }
}

/// Incremental construction of a [`Mesh`].
#[derive(Debug)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    topology: Topology,
}

impl MeshBuilder {
    pub fn new(topology: Topology) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology,
        }
    }

    pub fn with_capacity(topology: Topology, vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            topology,
        }
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_position(&mut self, position: Vec3) -> u32 {
        self.add_vertex(Vertex::at(position))
    }

    pub fn add_full(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        self.add_vertex(Vertex::new(position, normal, uv))
    }

    /// Index the next added vertex will receive.
    pub fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn add_index(&mut self, index: u32) {
        self.indices.push(index);
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append a quad. Triangle meshes receive `(a, b, c)` and `(a, c, d)`;
    /// patch meshes keep the four corners as one patch.
    pub fn add_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        match self.topology {
            Topology::Patches => self.indices.extend_from_slice(&[a, b, c, d]),
            Topology::Triangles => self.indices.extend_from_slice(&[a, b, c, a, c, d]),
            Topology::Lines => self.indices.extend_from_slice(&[a, b, b, c, c, d, d, a]),
        }
    }

    pub fn build(self) -> Mesh {
        Mesh {
            vertices: self.vertices,
            indices: self.indices,
            topology: self.topology,
        }
    }
}
