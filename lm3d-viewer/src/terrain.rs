//! Procedural height-field terrain.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use glam::{Vec2, Vec3};
use lm3d_core::{MeshData, Vertex3D};
use rayon::prelude::*;

use crate::config::TerrainConfig;

/// Texture repeats across the whole terrain.
const UV_REPEAT: f32 = 16.0;

fn noise(config: &TerrainConfig, seed: i32) -> FastNoiseLite {
    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(seed));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(config.frequency));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(config.octaves));
    noise
}

/// Samples a `resolution` by `resolution` height grid, row by row in parallel.
pub fn heights(config: &TerrainConfig, seed: i32) -> Vec<f32> {
    let noise = noise(config, seed);
    let n = config.resolution.max(2) as usize;
    let step = config.size / (n - 1) as f32;
    let half = config.size / 2.0;

    (0..n)
        .into_par_iter()
        .flat_map_iter(|row| {
            let noise = &noise;
            (0..n).map(move |col| {
                let x = col as f32 * step - half;
                let z = row as f32 * step - half;
                noise.get_noise_2d(x, z) * config.height_scale
            })
        })
        .collect()
}

/// Builds a terrain mesh centered on the origin, facing +Y.
pub fn generate<M>(config: &TerrainConfig, seed: i32) -> MeshData<M> {
    let n = config.resolution.max(2) as usize;
    let heights = heights(config, seed);
    let step = config.size / (n - 1) as f32;
    let half = config.size / 2.0;

    let height = |col: usize, row: usize| heights[row * n + col];

    let vertices: Vec<Vertex3D> = (0..n * n)
        .into_par_iter()
        .map(|i| {
            let (row, col) = (i / n, i % n);
            let position = Vec3::new(col as f32 * step - half, height(col, row), row as f32 * step - half);

            let left = height(col.saturating_sub(1), row);
            let right = height((col + 1).min(n - 1), row);
            let back = height(col, row.saturating_sub(1));
            let front = height(col, (row + 1).min(n - 1));
            let normal = Vec3::new(left - right, 2.0 * step, back - front).normalize();

            let uv = Vec2::new(col as f32, row as f32) / (n - 1) as f32 * UV_REPEAT;
            Vertex3D::new(position, normal, uv)
        })
        .collect();

    let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
    for row in 0..n - 1 {
        for col in 0..n - 1 {
            let top_left = (row * n + col) as u32;
            let top_right = top_left + 1;
            let bottom_left = top_left + n as u32;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    let mut data = MeshData::new(vertices, indices);
    data.calculate_tangents();
    log::debug!(
        "Generated terrain with {} vertices from seed {seed}",
        data.vertex_count()
    );
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(resolution: u32) -> TerrainConfig {
        TerrainConfig {
            resolution,
            size: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn grid_has_expected_counts() {
        let data: MeshData = generate(&config(5), 7);
        assert_eq!(data.vertex_count(), 25);
        assert_eq!(data.index_count(), 4 * 4 * 6);
        assert!(data.is_valid());

        let bounds = data.bounding_box();
        assert_eq!(bounds.min.x, -5.0);
        assert_eq!(bounds.max.z, 5.0);
    }

    #[test]
    fn same_seed_gives_same_heights() {
        let a = heights(&config(8), 1234);
        let b = heights(&config(8), 1234);
        assert_eq!(a, b);
        assert!(a.iter().all(|h| h.abs() <= TerrainConfig::default().height_scale));
    }

    #[test]
    fn triangles_face_up() {
        let mut flat = config(3);
        flat.height_scale = 0.0;
        let data: MeshData = generate(&flat, 1);
        for tri in data.indices().chunks_exact(3) {
            let p = |i: u32| data.vertices()[i as usize].position;
            let normal = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(normal.y > 0.0);
        }
        assert!(data.vertices().iter().all(|v| v.normal == Vec3::Y));
    }

    #[test]
    fn degenerate_resolution_is_raised() {
        let data: MeshData = generate(&config(0), 3);
        assert_eq!(data.vertex_count(), 4);
        assert_eq!(data.index_count(), 6);
    }
}
