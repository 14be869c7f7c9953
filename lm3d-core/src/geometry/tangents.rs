//! Tangent space generation.

use glam::Vec3;

use super::MeshData;

impl<M> MeshData<M> {
    /// Computes per-vertex tangents and bitangents from the UV gradients of each triangle.
    ///
    /// Returns `false` without touching the vertices if there are no vertices or indices.
    /// Triangles referencing missing vertices are skipped.
    pub fn calculate_tangents(&mut self) -> bool {
        if self.vertices.is_empty() || self.indices.is_empty() {
            log::warn!("Cannot calculate tangents without vertices and indices");
            return false;
        }

        let count = self.vertices.len();
        let mut tangents = vec![Vec3::ZERO; count];
        let mut bitangents = vec![Vec3::ZERO; count];
        let mut skipped = 0usize;

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if i0 >= count || i1 >= count || i2 >= count {
                skipped += 1;
                continue;
            }

            let (v0, v1, v2) = (&self.vertices[i0], &self.vertices[i1], &self.vertices[i2]);
            let edge1 = v1.position - v0.position;
            let edge2 = v2.position - v0.position;
            let duv1 = v1.tex_coords - v0.tex_coords;
            let duv2 = v2.tex_coords - v0.tex_coords;

            let mut f = 1.0 / (duv1.x * duv2.y - duv2.x * duv1.y);
            if !f.is_finite() {
                f = 0.0;
            }

            let tangent = f * (duv2.y * edge1 - duv1.y * edge2);
            let bitangent = f * (-duv2.x * edge1 + duv1.x * edge2);

            for i in [i0, i1, i2] {
                tangents[i] += tangent;
                bitangents[i] += bitangent;
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} triangle(s) with out-of-range indices");
        }

        for (vertex, (t, b)) in self
            .vertices
            .iter_mut()
            .zip(tangents.into_iter().zip(bitangents))
        {
            let n = vertex.normal;

            let tangent = match t.try_normalize() {
                Some(t) => {
                    let ortho = (t - n * n.dot(t)).try_normalize().unwrap_or(Vec3::X);
                    if n.cross(ortho).dot(b) < 0.0 {
                        -ortho
                    } else {
                        ortho
                    }
                }
                None => Vec3::X,
            };

            vertex.tangent = tangent;
            vertex.bitangent = b.try_normalize().unwrap_or_else(|| n.cross(tangent));
        }

        log::debug!("Calculated tangents for {count} vertices");
        true
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use crate::{geometry::MeshData, vertex::Vertex3D};

    const EPSILON: f32 = 1e-5;

    fn quad(normal: Vec3, a: Vec3, b: Vec3) -> MeshData {
        let corners = [Vec3::ZERO, a, a + b, b];
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let vertices = corners
            .iter()
            .zip(uvs)
            .map(|(&p, uv)| Vertex3D::new(p, normal, uv))
            .collect();
        MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn tangents_are_unit_and_orthogonal() {
        let normal = Vec3::new(0.0, 0.3, 1.0).normalize();
        let mut mesh = quad(normal, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, -0.3));
        assert!(mesh.calculate_tangents());

        for v in mesh.vertices() {
            assert!((v.tangent.length() - 1.0).abs() < EPSILON);
            assert!(v.tangent.dot(v.normal).abs() < EPSILON);
            assert!((v.bitangent.length() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn tangent_follows_u_direction() {
        let mut mesh = quad(Vec3::Z, Vec3::X, Vec3::Y);
        assert!(mesh.calculate_tangents());
        for v in mesh.vertices() {
            assert!(v.tangent.abs_diff_eq(Vec3::X, EPSILON));
            assert!(v.bitangent.abs_diff_eq(Vec3::Y, EPSILON));
        }
    }

    #[test]
    fn mirrored_uvs_keep_right_handed_frame() {
        let mut mesh = quad(Vec3::Z, Vec3::X, Vec3::Y);
        let mut vertices = mesh.vertices().to_vec();
        for v in &mut vertices {
            v.tex_coords.x = 1.0 - v.tex_coords.x;
        }
        mesh.set_vertices(vertices);
        assert!(mesh.calculate_tangents());
        for v in mesh.vertices() {
            assert!(v.tangent.abs_diff_eq(Vec3::X, EPSILON));
            assert!(v.normal.cross(v.tangent).dot(v.bitangent) > 0.0);
        }
    }

    #[test]
    fn degenerate_uvs_fall_back_to_canonical_frame() {
        let mut mesh = quad(Vec3::Z, Vec3::X, Vec3::Y);
        let mut vertices = mesh.vertices().to_vec();
        for v in &mut vertices {
            v.tex_coords = Vec2::ZERO;
        }
        mesh.set_vertices(vertices);
        assert!(mesh.calculate_tangents());
        for v in mesh.vertices() {
            assert_eq!(v.tangent, Vec3::X);
            assert!(v.bitangent.abs_diff_eq(Vec3::Y, EPSILON));
        }
    }

    #[test]
    fn out_of_range_triangles_are_skipped() {
        let mut mesh = quad(Vec3::Z, Vec3::X, Vec3::Y);
        mesh.set_indices(vec![0, 1, 2, 0, 2, 9]);
        assert!(mesh.calculate_tangents());
        assert!(mesh.vertices()[0].tangent.abs_diff_eq(Vec3::X, EPSILON));
    }

    #[test]
    fn requires_geometry() {
        let mut mesh: MeshData = MeshData::new(vec![Vertex3D::default()], Vec::new());
        assert!(!mesh.calculate_tangents());
    }
}
