//! CPU-side mesh geometry.
//!
//! [`MeshData`] holds the vertex and index lists of a mesh together with its submesh
//! ranges and a lazily recomputed bounding box. It is generic over the material handle
//! stored in each [`Submesh`], so the renderer can attach its own shared material type
//! while this crate stays free of GPU state.

mod primitives;
mod tangents;

use std::cell::Cell;

use glam::Vec3;

use crate::vertex::Vertex3D;

pub use primitives::*;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Computes the box enclosing all `points`. No points gives a zero-sized box at the origin.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::default();
        };
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Self { min, max }
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A contiguous index range drawn with one material.
#[derive(Clone, Debug, PartialEq)]
pub struct Submesh<M> {
    pub index_offset: u32,
    pub index_count: u32,
    pub material: Option<M>,
    pub name: Option<String>,
}

impl<M> Submesh<M> {
    /// One past the last index covered by this submesh.
    pub fn end(&self) -> u64 {
        self.index_offset as u64 + self.index_count as u64
    }
}

/// Vertices, indices and submeshes of one mesh.
#[derive(Clone, Debug)]
pub struct MeshData<M = ()> {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    submeshes: Vec<Submesh<M>>,
    bounds: Cell<Option<BoundingBox>>,
}

impl<M> Default for MeshData<M> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            submeshes: Vec::new(),
            bounds: Cell::new(None),
        }
    }
}

impl<M> MeshData<M> {
    /// Creates mesh data from vertices and (possibly empty) indices.
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            ..Default::default()
        }
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn submeshes(&self) -> &[Submesh<M>] {
        &self.submeshes
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    pub fn has_indices(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Replaces the vertex list.
    pub fn set_vertices(&mut self, vertices: Vec<Vertex3D>) {
        self.vertices = vertices;
        self.bounds.set(None);
    }

    /// Replaces the index list. Submeshes whose range no longer fits are dropped.
    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
        self.bounds.set(None);

        let total = self.indices.len() as u64;
        let before = self.submeshes.len();
        self.submeshes.retain(|s| s.end() <= total);
        let dropped = before - self.submeshes.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} submesh(es) that no longer fit in {total} indices");
        }
    }

    /// Replaces both lists at once.
    pub fn set_vertices_and_indices(&mut self, vertices: Vec<Vertex3D>, indices: Vec<u32>) {
        self.set_vertices(vertices);
        self.set_indices(indices);
    }

    /// Adds a submesh covering `index_count` indices starting at `index_offset`.
    ///
    /// Returns `false` and leaves the submesh list untouched if the range exceeds the
    /// current index count.
    pub fn add_submesh(
        &mut self,
        index_offset: u32,
        index_count: u32,
        material: Option<M>,
        name: Option<String>,
    ) -> bool {
        let submesh = Submesh {
            index_offset,
            index_count,
            material,
            name,
        };
        if submesh.end() > self.indices.len() as u64 {
            log::error!(
                "Submesh range {}..{} exceeds index count {}",
                index_offset,
                submesh.end(),
                self.indices.len()
            );
            return false;
        }
        self.submeshes.push(submesh);
        true
    }

    pub fn clear_submeshes(&mut self) {
        self.submeshes.clear();
    }

    /// Mutable access to the submesh materials. Ranges cannot be altered through this.
    pub fn submesh_materials_mut(&mut self) -> impl Iterator<Item = &mut Option<M>> {
        self.submeshes.iter_mut().map(|s| &mut s.material)
    }

    /// Recomputes the bounding box from the current vertex positions.
    pub fn calculate_bounding_box(&self) -> BoundingBox {
        let bounds = BoundingBox::from_points(self.vertices.iter().map(|v| v.position));
        self.bounds.set(Some(bounds));
        bounds
    }

    /// Returns the cached bounding box, recomputing it if the geometry changed.
    pub fn bounding_box(&self) -> BoundingBox {
        match self.bounds.get() {
            Some(bounds) => bounds,
            None => self.calculate_bounding_box(),
        }
    }

    /// Checks that the mesh has vertices, every index names a vertex and every submesh
    /// range is inside the index list.
    pub fn is_valid(&self) -> bool {
        if self.vertices.is_empty() {
            log::warn!("Mesh has no vertices");
            return false;
        }

        let vertex_count = self.vertices.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            log::warn!("Mesh index {bad} out of range for {vertex_count} vertices");
            return false;
        }

        if self.indices.len() % 3 != 0 {
            log::warn!(
                "Mesh index count {} is not a multiple of 3",
                self.indices.len()
            );
        }

        let total = self.indices.len() as u64;
        if let Some(s) = self.submeshes.iter().find(|s| s.end() > total) {
            log::warn!("Submesh range ends at {} past {total} indices", s.end());
            return false;
        }

        true
    }

    /// Converts the material handle type, keeping geometry and ranges. A submesh whose handle
    /// maps to `None` is left without a material.
    pub fn map_materials<N>(self, mut f: impl FnMut(M) -> Option<N>) -> MeshData<N> {
        MeshData {
            vertices: self.vertices,
            indices: self.indices,
            submeshes: self
                .submeshes
                .into_iter()
                .map(|s| Submesh {
                    index_offset: s.index_offset,
                    index_count: s.index_count,
                    material: s.material.and_then(&mut f),
                    name: s.name,
                })
                .collect(),
            bounds: self.bounds,
        }
    }
}
