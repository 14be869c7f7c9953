//! GPU meshes.
//!
//! A [`Mesh`] keeps its [`MeshData`] on the CPU side and mirrors it into a vertex and an index
//! buffer. Geometry edits go through the mesh so the buffers are refreshed right away.

use std::sync::Arc;

use glow::HasContext;
use lm3d_core::{BoundingBox, MeshData, Submesh, Vertex, Vertex3D, geometry};

use crate::{
    abs::{BufferKind, BufferUsage, GpuBuffer, RenderContext, VertexArray},
    error::Result,
    render::SharedMaterial,
};

/// One draw call worth of geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawCall {
    /// Indexed draw of `count` indices starting `byte_offset` bytes into the index buffer.
    Elements { count: i32, byte_offset: i32 },
    /// Non-indexed draw of `count` vertices starting at `first`.
    Arrays { first: i32, count: i32 },
}

/// A draw call and the submesh material it should use, if the submesh names one.
#[derive(Debug)]
pub struct DrawRange<'a, M> {
    pub material: Option<&'a M>,
    pub call: DrawCall,
}

/// Splits mesh data into draw calls: one over the whole mesh when there are no submeshes,
/// otherwise one per non-empty submesh.
pub fn draw_ranges<M>(data: &MeshData<M>) -> Vec<DrawRange<'_, M>> {
    if data.submeshes().is_empty() {
        let call = if data.has_indices() {
            DrawCall::Elements {
                count: data.index_count() as i32,
                byte_offset: 0,
            }
        } else {
            DrawCall::Arrays {
                first: 0,
                count: data.vertex_count() as i32,
            }
        };
        return vec![DrawRange {
            material: None,
            call,
        }];
    }

    data.submeshes()
        .iter()
        .filter(|s| s.index_count > 0)
        .map(|s| DrawRange {
            material: s.material.as_ref(),
            call: submesh_call(s, data.has_indices()),
        })
        .collect()
}

fn submesh_call<M>(submesh: &Submesh<M>, indexed: bool) -> DrawCall {
    if indexed {
        DrawCall::Elements {
            count: submesh.index_count as i32,
            byte_offset: (submesh.index_offset as usize * size_of::<u32>()) as i32,
        }
    } else {
        DrawCall::Arrays {
            first: submesh.index_offset as i32,
            count: submesh.index_count as i32,
        }
    }
}

/// Whether `required` bytes no longer fit a buffer of `capacity` bytes. A reallocated vertex
/// buffer needs its layout applied again.
fn needs_realloc(required: usize, capacity: usize) -> bool {
    required > capacity
}

/// Mesh geometry with its GPU buffers and materials.
pub struct Mesh {
    gl: Arc<glow::Context>,
    data: MeshData<SharedMaterial>,
    vertex_array: VertexArray,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    default_material: Option<SharedMaterial>,
}

impl Mesh {
    /// Uploads `data` into new GPU buffers.
    pub fn new(ctx: &RenderContext, data: MeshData<SharedMaterial>) -> Result<Self> {
        let vertex_array = VertexArray::new(ctx, Vertex3D::layout())?;
        let vertex_buffer = GpuBuffer::with_data(
            ctx,
            BufferKind::Vertex,
            bytemuck::cast_slice(data.vertices()),
            BufferUsage::Dynamic,
        )?;
        let index_buffer = GpuBuffer::with_data(
            ctx,
            BufferKind::Index,
            bytemuck::cast_slice(data.indices()),
            BufferUsage::Dynamic,
        )?;

        vertex_array.apply_layout(&vertex_buffer, 0, 0);
        vertex_array.set_index_buffer(Some(&index_buffer));

        log::trace!(
            "Created mesh with {} vertices, {} indices and {} submeshes",
            data.vertex_count(),
            data.index_count(),
            data.submesh_count()
        );

        Ok(Self {
            gl: Arc::clone(ctx.gl()),
            data,
            vertex_array,
            vertex_buffer,
            index_buffer,
            default_material: None,
        })
    }

    /// A cube with edge length `size`.
    pub fn cube(ctx: &RenderContext, size: f32) -> Result<Self> {
        Self::new(ctx, geometry::cube(size))
    }

    /// A UV sphere.
    pub fn sphere(ctx: &RenderContext, radius: f32, segments: u32) -> Result<Self> {
        Self::new(ctx, geometry::sphere(radius, segments))
    }

    /// A plane on XZ facing +Y.
    pub fn plane(ctx: &RenderContext, width: f32, depth: f32) -> Result<Self> {
        Self::new(ctx, geometry::plane(width, depth))
    }

    /// A quad covering clip space, for fullscreen passes.
    pub fn quad(ctx: &RenderContext) -> Result<Self> {
        Self::new(ctx, geometry::quad())
    }

    fn upload_vertices(&mut self) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(self.data.vertices());
        if !needs_realloc(bytes.len(), self.vertex_buffer.size()) {
            self.vertex_buffer.update(bytes, 0)?;
        } else {
            self.vertex_buffer.reallocate(bytes)?;
            self.vertex_array.apply_layout(&self.vertex_buffer, 0, 0);
        }
        Ok(())
    }

    fn upload_indices(&mut self) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(self.data.indices());
        if !needs_realloc(bytes.len(), self.index_buffer.size()) {
            self.index_buffer.update(bytes, 0)?;
        } else {
            self.index_buffer.reallocate(bytes)?;
            self.vertex_array.set_index_buffer(Some(&self.index_buffer));
        }
        Ok(())
    }

    /// Replaces the vertices. The buffer is updated in place when it is large enough.
    pub fn set_vertices(&mut self, vertices: Vec<Vertex3D>) -> Result<()> {
        self.data.set_vertices(vertices);
        self.upload_vertices()
    }

    /// Replaces the indices, dropping submeshes that no longer fit.
    pub fn set_indices(&mut self, indices: Vec<u32>) -> Result<()> {
        self.data.set_indices(indices);
        self.upload_indices()
    }

    pub fn set_vertices_and_indices(
        &mut self,
        vertices: Vec<Vertex3D>,
        indices: Vec<u32>,
    ) -> Result<()> {
        self.data.set_vertices_and_indices(vertices, indices);
        self.upload_vertices()?;
        self.upload_indices()
    }

    /// Adds a submesh. Out-of-range requests are logged and rejected.
    pub fn add_submesh(
        &mut self,
        index_offset: u32,
        index_count: u32,
        material: Option<SharedMaterial>,
        name: Option<String>,
    ) -> bool {
        self.data
            .add_submesh(index_offset, index_count, material, name)
    }

    pub fn clear_submeshes(&mut self) {
        self.data.clear_submeshes();
    }

    /// Recomputes tangents and bitangents and uploads the changed vertices.
    pub fn calculate_tangents(&mut self) -> Result<bool> {
        if !self.data.calculate_tangents() {
            return Ok(false);
        }
        self.upload_vertices()?;
        Ok(true)
    }

    pub fn calculate_bounding_box(&self) -> BoundingBox {
        self.data.calculate_bounding_box()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.data.bounding_box()
    }

    pub fn bounding_box_center(&self) -> glam::Vec3 {
        self.data.bounding_box().center()
    }

    pub fn bounding_box_size(&self) -> glam::Vec3 {
        self.data.bounding_box().size()
    }

    pub fn is_valid(&self) -> bool {
        self.data.is_valid()
    }

    pub fn data(&self) -> &MeshData<SharedMaterial> {
        &self.data
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        self.data.vertices()
    }

    pub fn indices(&self) -> &[u32] {
        self.data.indices()
    }

    pub fn submeshes(&self) -> &[Submesh<SharedMaterial>] {
        self.data.submeshes()
    }

    pub fn submesh_materials_mut(&mut self) -> impl Iterator<Item = &mut Option<SharedMaterial>> {
        self.data.submesh_materials_mut()
    }

    pub fn vertex_count(&self) -> usize {
        self.data.vertex_count()
    }

    pub fn index_count(&self) -> usize {
        self.data.index_count()
    }

    pub fn submesh_count(&self) -> usize {
        self.data.submesh_count()
    }

    pub fn default_material(&self) -> Option<&SharedMaterial> {
        self.default_material.as_ref()
    }

    pub fn set_default_material(&mut self, material: Option<SharedMaterial>) {
        self.default_material = material;
    }

    /// Draws the whole mesh, or each submesh with its own material falling back to the
    /// default one. Empty meshes are skipped with a warning.
    pub fn draw(&self) {
        if self.data.vertices().is_empty() {
            log::warn!("Skipping draw of a mesh without vertices");
            return;
        }

        self.vertex_array.bind();
        for range in draw_ranges(&self.data) {
            if let Some(material) = range.material.or(self.default_material.as_ref()) {
                material.borrow().bind();
            }
            unsafe {
                match range.call {
                    DrawCall::Elements { count, byte_offset } => self.gl.draw_elements(
                        glow::TRIANGLES,
                        count,
                        glow::UNSIGNED_INT,
                        byte_offset,
                    ),
                    DrawCall::Arrays { first, count } => {
                        self.gl.draw_arrays(glow::TRIANGLES, first, count)
                    }
                }
            }
        }
        self.vertex_array.unbind();
    }
}
