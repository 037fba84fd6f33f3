//! CPU subdivision of quad patches.
//!
//! Each patch `(a, b, c, d)` is sampled on a `level x level` bilinear grid
//! with `u` running from `a` to `b` and `v` from `a` to `d`, so the
//! resulting triangles keep the patch's winding.

use glam::{Vec2, Vec3};

use crate::mesh::{Mesh, MeshBuilder, Topology};
use crate::vertex::Vertex;

impl Mesh {
    /// Expand a patch mesh into triangles with `level` subdivisions per patch
    /// edge. Non-patch meshes are returned unchanged.
    pub fn tessellate(&self, level: u32) -> Mesh {
        if self.topology() != Topology::Patches {
            return self.clone();
        }

        let level = level.max(1);
        let side = level + 1;
        let patches = self.primitive_count();
        let mut out = MeshBuilder::with_capacity(
            Topology::Triangles,
            patches * (side * side) as usize,
            patches * (level * level) as usize * 6,
        );

        for patch in self.indices().chunks_exact(4) {
            let corners = [
                self.vertices()[patch[0] as usize],
                self.vertices()[patch[1] as usize],
                self.vertices()[patch[2] as usize],
                self.vertices()[patch[3] as usize],
            ];

            let base = out.next_index();
            for j in 0..side {
                let v = j as f32 / level as f32;
                for i in 0..side {
                    let u = i as f32 / level as f32;
                    out.add_vertex(bilinear(&corners, u, v));
                }
            }

            let index = |i: u32, j: u32| base + i + j * side;
            for j in 0..level {
                for i in 0..level {
                    out.add_quad(
                        index(i, j),
                        index(i + 1, j),
                        index(i + 1, j + 1),
                        index(i, j + 1),
                    );
                }
            }
        }

        out.build()
    }
}

fn bilinear(corners: &[Vertex; 4], u: f32, v: f32) -> Vertex {
    let [a, b, c, d] = corners;
    let mix3 = |f: fn(&Vertex) -> Vec3| f(a).lerp(f(b), u).lerp(f(d).lerp(f(c), u), v);
    let mix2 = |f: fn(&Vertex) -> Vec2| f(a).lerp(f(b), u).lerp(f(d).lerp(f(c), u), v);

    let normal = mix3(Vertex::normal).normalize_or_zero();
    Vertex::new(mix3(Vertex::position), normal, mix2(Vertex::uv))
}
