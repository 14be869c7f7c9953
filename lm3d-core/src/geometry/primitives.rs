//! Procedural primitive generators.
//!
//! Every generator returns counter-clockwise front faces and calls
//! [`MeshData::calculate_tangents`](super::MeshData::calculate_tangents) before returning.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use super::MeshData;
use crate::vertex::Vertex3D;

const FACE_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// Pushes one rectangular face spanned by `u` and `v` around `center`.
/// `u × v` must point along `normal` for the face to wind counter-clockwise.
fn push_face(
    vertices: &mut Vec<Vertex3D>,
    indices: &mut Vec<u32>,
    center: Vec3,
    normal: Vec3,
    u: Vec3,
    v: Vec3,
) {
    let base = vertices.len() as u32;
    let corners = [center - u - v, center + u - v, center + u + v, center - u + v];
    vertices.extend(
        corners
            .into_iter()
            .zip(FACE_UVS)
            .map(|(p, uv)| Vertex3D::new(p, normal, uv)),
    );
    indices.extend([0, 1, 2, 2, 3, 0].map(|i| base + i));
}

fn finish<M>(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> MeshData<M> {
    let mut mesh = MeshData::new(vertices, indices);
    mesh.calculate_tangents();
    mesh
}

/// Axis-aligned cube with edge length `size`, centered at the origin. 24 vertices, 36 indices.
pub fn cube<M>(size: f32) -> MeshData<M> {
    let h = size * 0.5;
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        push_face(&mut vertices, &mut indices, normal * h, normal, u * h, v * h);
    }
    finish(vertices, indices)
}

/// UV sphere of the given radius. `segments` is used for both rings and slices.
pub fn sphere<M>(radius: f32, segments: u32) -> MeshData<M> {
    let segments = segments.max(3);
    let row = segments + 1;

    let mut vertices = Vec::with_capacity((row * row) as usize);
    for lat in 0..=segments {
        let theta = lat as f32 * PI / segments as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for lon in 0..=segments {
            let phi = lon as f32 * 2.0 * PI / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi);
            let uv = Vec2::new(lon as f32 / segments as f32, lat as f32 / segments as f32);
            vertices.push(Vertex3D::new(normal * radius, normal, uv));
        }
    }

    let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
    for lat in 0..segments {
        for lon in 0..segments {
            let first = lat * row + lon;
            let second = first + row;
            indices.extend([first, first + 1, second, second, first + 1, second + 1]);
        }
    }
    finish(vertices, indices)
}

/// Plane on the XZ axes facing +Y.
pub fn plane<M>(width: f32, depth: f32) -> MeshData<M> {
    let mut vertices = Vec::with_capacity(4);
    let mut indices = Vec::with_capacity(6);
    push_face(
        &mut vertices,
        &mut indices,
        Vec3::ZERO,
        Vec3::Y,
        Vec3::X * (width * 0.5),
        Vec3::NEG_Z * (depth * 0.5),
    );
    finish(vertices, indices)
}

/// Screen-space quad covering `[-1, 1]` on X and Y, facing +Z.
pub fn quad<M>() -> MeshData<M> {
    let mut vertices = Vec::with_capacity(4);
    let mut indices = Vec::with_capacity(6);
    push_face(&mut vertices, &mut indices, Vec3::ZERO, Vec3::Z, Vec3::X, Vec3::Y);
    finish(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every non-degenerate triangle must face the same way as its vertex normals.
    fn assert_outward(mesh: &MeshData) {
        let v = mesh.vertices();
        for tri in mesh.indices().chunks_exact(3) {
            let (a, b, c) = (&v[tri[0] as usize], &v[tri[1] as usize], &v[tri[2] as usize]);
            let face = (b.position - a.position).cross(c.position - a.position);
            if face.length_squared() < 1e-10 {
                continue;
            }
            assert!(face.dot(a.normal) > 0.0, "triangle {tri:?} winds inward");
        }
    }

    #[test]
    fn cube_shape() {
        let mesh: MeshData = cube(2.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert!(mesh.is_valid());
        assert_outward(&mesh);

        let bounds = mesh.calculate_bounding_box();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
    }

    #[test]
    fn sphere_shape() {
        let mesh: MeshData = sphere(0.5, 16);
        assert_eq!(mesh.vertex_count(), 17 * 17);
        assert_eq!(mesh.index_count(), 16 * 16 * 6);
        assert!(mesh.is_valid());
        assert_outward(&mesh);
        for v in mesh.vertices() {
            assert!((v.position.length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_and_quad() {
        let plane: MeshData = plane(4.0, 2.0);
        assert!(plane.is_valid());
        assert_outward(&plane);
        let bounds = plane.calculate_bounding_box();
        assert_eq!(bounds.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 0.0, 1.0));

        let quad: MeshData = quad();
        assert!(quad.is_valid());
        assert_outward(&quad);
        assert_eq!(quad.vertices()[0].position, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(quad.vertices()[2].tex_coords, Vec2::ONE);
    }

    #[test]
    fn generated_tangents_are_orthogonal() {
        let mesh: MeshData = cube(1.0);
        for v in mesh.vertices() {
            assert!(v.tangent.dot(v.normal).abs() < 1e-5);
            assert!((v.tangent.length() - 1.0).abs() < 1e-5);
        }
    }
}
