//! Procedural mesh templates.
//!
//! Grids lie in the XZ plane with +Y up. Front faces wind counter-clockwise
//! when seen from above, except the skybox which faces inward.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};

use crate::mesh::{Mesh, MeshBuilder, Topology};

/// Unit quad patch spanning `-0.5..0.5` on X and Z.
///
/// This is the shared template every chunk is drawn from; the chunk offset
/// and size are applied in the vertex stage.
pub fn chunk_patch() -> Mesh {
    let mut mesh = MeshBuilder::with_capacity(Topology::Patches, 4, 4);
    let corners = [
        Vec3::new(-0.5, 0.0, 0.5),
        Vec3::new(0.5, 0.0, 0.5),
        Vec3::new(0.5, 0.0, -0.5),
        Vec3::new(-0.5, 0.0, -0.5),
    ];
    for corner in corners {
        mesh.add_full(corner, Vec3::Y, Vec2::new(corner.x + 0.5, corner.z + 0.5));
    }
    mesh.add_quad(0, 1, 2, 3);
    mesh.build()
}

/// `size` x `size` grid of `divisions^2` patches, row-major along X.
pub fn tess_grid(size: f32, divisions: u32) -> Mesh {
    let divisions = divisions.max(1);
    let mut mesh = grid_vertices(Topology::Patches, size, divisions);
    grid_quads(&mut mesh, divisions);
    mesh.build()
}

/// Triangulated flat grid with up-facing normals.
pub fn plane_grid(size: f32, divisions: u32) -> Mesh {
    let divisions = divisions.max(1);
    let mut mesh = grid_vertices(Topology::Triangles, size, divisions);
    grid_quads(&mut mesh, divisions);
    mesh.build()
}

fn grid_vertices(topology: Topology, size: f32, divisions: u32) -> MeshBuilder {
    let side = (divisions + 1) as usize;
    let quads = (divisions * divisions) as usize;
    let mut mesh = MeshBuilder::with_capacity(topology, side * side, quads * 6);

    let half = size / 2.0;
    let step = size / divisions as f32;
    for row in 0..=divisions {
        for col in 0..=divisions {
            let x = -half + col as f32 * step;
            let z = -half + row as f32 * step;
            let uv = Vec2::new(col as f32, row as f32) / divisions as f32;
            mesh.add_full(Vec3::new(x, 0.0, z), Vec3::Y, uv);
        }
    }
    mesh
}

fn grid_quads(mesh: &mut MeshBuilder, divisions: u32) {
    let index = |x: u32, z: u32| x + z * (divisions + 1);
    for i in 0..divisions {
        for j in 0..divisions {
            mesh.add_quad(
                index(i, j),
                index(i, j + 1),
                index(i + 1, j + 1),
                index(i + 1, j),
            );
        }
    }
}

/// Full-screen quad in normalized device coordinates.
pub fn screen_quad() -> Mesh {
    let mut mesh = MeshBuilder::with_capacity(Topology::Triangles, 4, 6);
    mesh.add_full(Vec3::new(-1.0, 1.0, 0.0), Vec3::Z, Vec2::new(0.0, 0.0));
    mesh.add_full(Vec3::new(-1.0, -1.0, 0.0), Vec3::Z, Vec2::new(0.0, 1.0));
    mesh.add_full(Vec3::new(1.0, -1.0, 0.0), Vec3::Z, Vec2::new(1.0, 1.0));
    mesh.add_full(Vec3::new(1.0, 1.0, 0.0), Vec3::Z, Vec2::new(1.0, 0.0));
    mesh.add_quad(0, 1, 2, 3);
    mesh.build()
}

/// Cube spanning `-1..1` whose faces point inward, for drawing the sky from
/// inside.
pub fn skybox_cube() -> Mesh {
    //  0---1      top ring (y = +1)
    //  |   |
    //  3---2
    //  4---5      bottom ring (y = -1)
    //  |   |
    //  7---6
    const CORNERS: [[f32; 3]; 8] = [
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [-1.0, -1.0, 1.0],
    ];
    const FACES: [[usize; 4]; 6] = [
        [1, 2, 3, 0],
        [3, 7, 4, 0],
        [2, 6, 7, 3],
        [1, 5, 6, 2],
        [0, 4, 5, 1],
        [6, 5, 4, 7],
    ];

    let mut mesh = MeshBuilder::with_capacity(Topology::Triangles, 24, 36);
    for face in FACES {
        let base = mesh.add_position(Vec3::from_array(CORNERS[face[0]]));
        for &corner in &face[1..] {
            mesh.add_position(Vec3::from_array(CORNERS[corner]));
        }
        mesh.add_quad(base, base + 1, base + 2, base + 3);
    }
    mesh.build()
}

/// Unit sphere with `div_theta` latitude bands and `div_phi` longitude
/// segments. The two poles are single vertices joined to the outermost rings
/// by triangle fans.
pub fn uv_sphere(div_theta: u32, div_phi: u32) -> Mesh {
    let div_theta = div_theta.max(2);
    let div_phi = div_phi.max(3);
    let rings = div_theta - 1;

    let mut mesh = MeshBuilder::with_capacity(
        Topology::Triangles,
        (rings * div_phi + 2) as usize,
        (div_theta * div_phi * 6) as usize,
    );

    let theta_step = PI / div_theta as f32;
    let phi_step = 2.0 * PI / div_phi as f32;
    for ring in 0..rings {
        let theta = -FRAC_PI_2 + theta_step * (ring + 1) as f32;
        for segment in 0..div_phi {
            let phi = phi_step * segment as f32;
            let point = Vec3::new(theta.cos() * phi.cos(), theta.sin(), theta.cos() * phi.sin());
            let uv = Vec2::new(segment as f32 / div_phi as f32, 0.5 + point.y / 2.0);
            mesh.add_full(point, point, uv);
        }
    }

    let index = |ring: u32, segment: u32| segment % div_phi + ring * div_phi;
    for ring in 0..rings.saturating_sub(1) {
        for segment in 0..div_phi {
            mesh.add_quad(
                index(ring, segment),
                index(ring + 1, segment),
                index(ring + 1, segment + 1),
                index(ring, segment + 1),
            );
        }
    }

    let south = mesh.add_full(Vec3::NEG_Y, Vec3::NEG_Y, Vec2::new(0.5, 0.0));
    let north = mesh.add_full(Vec3::Y, Vec3::Y, Vec2::new(0.5, 1.0));
    let top = rings - 1;
    for segment in 0..div_phi {
        mesh.add_triangle(south, index(0, segment), index(0, segment + 1));
        mesh.add_triangle(index(top, segment), north, index(top, segment + 1));
    }

    mesh.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &Mesh, tri: usize) -> Vec3 {
        let i = &mesh.indices()[tri * 3..tri * 3 + 3];
        let p = |k: usize| mesh.vertices()[i[k] as usize].position();
        (p(1) - p(0)).cross(p(2) - p(0))
    }

    #[test]
    fn test_chunk_patch_is_single_unit_patch() {
        let mesh = chunk_patch();
        assert_eq!(mesh.topology(), Topology::Patches);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[0, 1, 2, 3]);
        for v in mesh.vertices() {
            assert_eq!(v.position[0].abs(), 0.5);
            assert_eq!(v.position[2].abs(), 0.5);
            assert_eq!(v.position[1], 0.0);
        }
    }

    #[test]
    fn test_tess_grid_counts_and_order() {
        let mesh = tess_grid(2.0, 4);
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.index_count(), 4 * 16);
        // first patch: (0,0) (0,1) (1,1) (1,0) in (x, z) grid terms
        assert_eq!(&mesh.indices()[..4], &[0, 5, 6, 1]);
        // row-major: the second patch advances along z
        assert_eq!(&mesh.indices()[4..8], &[5, 10, 11, 6]);
        assert_eq!(mesh.vertices()[0].position, [-1.0, 0.0, -1.0]);
        assert_eq!(mesh.vertices()[24].position, [1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_zero_divisions_clamped_to_one() {
        let mesh = tess_grid(1.0, 0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.primitive_count(), 1);
    }

    #[test]
    fn test_plane_grid_faces_up() {
        let mesh = plane_grid(10.0, 3);
        assert_eq!(mesh.topology(), Topology::Triangles);
        assert_eq!(mesh.primitive_count(), 18);
        for tri in 0..mesh.primitive_count() {
            assert!(face_normal(&mesh, tri).y > 0.0);
        }
    }

    #[test]
    fn test_screen_quad_covers_ndc_front_facing() {
        let mesh = screen_quad();
        assert_eq!(mesh.primitive_count(), 2);
        for tri in 0..2 {
            assert!(face_normal(&mesh, tri).z > 0.0);
        }
        let min = mesh
            .vertices()
            .iter()
            .fold(Vec3::splat(f32::MAX), |m, v| m.min(v.position()));
        assert_eq!(min.truncate(), Vec2::splat(-1.0));
    }

    #[test]
    fn test_skybox_faces_point_inward() {
        let mesh = skybox_cube();
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.primitive_count(), 12);
        for tri in 0..mesh.primitive_count() {
            let i = &mesh.indices()[tri * 3..tri * 3 + 3];
            let centroid = i
                .iter()
                .map(|&k| mesh.vertices()[k as usize].position())
                .sum::<Vec3>()
                / 3.0;
            assert!(face_normal(&mesh, tri).dot(centroid) < 0.0);
        }
    }

    #[test]
    fn test_uv_sphere_counts() {
        let (theta, phi) = (8, 12);
        let mesh = uv_sphere(theta, phi);
        assert_eq!(mesh.vertex_count() as u32, (theta - 1) * phi + 2);
        assert_eq!(mesh.primitive_count() as u32, 2 * (theta - 2) * phi + 2 * phi);
    }

    #[test]
    fn test_uv_sphere_points_on_unit_sphere_facing_out() {
        let mesh = uv_sphere(6, 8);
        for v in mesh.vertices() {
            assert!((v.position().length() - 1.0).abs() < 1e-5);
        }
        for tri in 0..mesh.primitive_count() {
            let i = &mesh.indices()[tri * 3..tri * 3 + 3];
            let centroid = i
                .iter()
                .map(|&k| mesh.vertices()[k as usize].position())
                .sum::<Vec3>();
            assert!(face_normal(&mesh, tri).dot(centroid) > 0.0);
        }
        assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }
}
