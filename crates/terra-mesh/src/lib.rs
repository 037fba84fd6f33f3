//! Procedural mesh templates: chunk patches, tessellation grids, the
//! full-screen quad, the skybox cube and a UV sphere.
//!
//! Every builder returns an immutable [`Mesh`]. Patch meshes carry four
//! indices per quad and are expanded to triangles by [`Mesh::tessellate`]
//! before upload.

pub mod builders;
mod mesh;
mod tessellate;
mod vertex;

pub use builders::{chunk_patch, plane_grid, screen_quad, skybox_cube, tess_grid, uv_sphere};
pub use mesh::{Mesh, MeshBuilder, Topology};
pub use vertex::{VERTEX_ATTRIBUTES, Vertex};
