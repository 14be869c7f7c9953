//! Vertex array objects.
//!
//! A [`VertexArray`] holds a [`VertexLayout`] and points shader inputs at a vertex buffer
//! binding slot using separate attribute formats, so swapping the buffer behind a slot does
//! not require declaring the attributes again.

use std::sync::Arc;

use glow::HasContext;
use lm3d_core::VertexLayout;

use crate::{
    abs::{GlEnum, GpuBuffer, RenderContext},
    error::{Error, Result},
};

/// The GL vertex attribute format call for one attribute of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeFormat {
    pub location: u32,
    pub components: i32,
    pub data_type: u32,
    pub normalized: bool,
    pub relative_offset: u32,
    /// Uses the integer attribute path, so values reach the shader unconverted.
    pub integer: bool,
}

/// Format calls for every attribute of `layout`, in declaration order.
pub fn attribute_formats(layout: &VertexLayout) -> Vec<AttributeFormat> {
    layout
        .attributes
        .iter()
        .map(|attribute| AttributeFormat {
            location: attribute.location,
            components: attribute.components as i32,
            data_type: attribute.kind.gl_enum(),
            normalized: attribute.normalized,
            relative_offset: attribute.offset,
            integer: attribute.kind.is_integer() && !attribute.normalized,
        })
        .collect()
}

/// Vertex input state for draw calls.
pub struct VertexArray {
    gl: Arc<glow::Context>,
    id: glow::VertexArray,
    layout: VertexLayout,
}

impl VertexArray {
    pub fn new(ctx: &RenderContext, layout: VertexLayout) -> Result<Self> {
        if !layout.fits_stride() {
            log::warn!("Vertex layout has attributes past its stride of {}", layout.stride);
        }
        let gl = ctx.gl();
        let id = unsafe { gl.create_vertex_array().map_err(Error::Device)? };
        Ok(Self {
            gl: Arc::clone(gl),
            id,
            layout,
        })
    }

    /// Binds `buffer` to `binding_index` at the layout's stride and formats every attribute
    /// of the layout against that slot.
    pub fn apply_layout(&self, buffer: &GpuBuffer, binding_index: u32, offset: i32) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.id));
            self.gl.bind_vertex_buffer(
                binding_index,
                Some(buffer.id()),
                offset,
                self.layout.stride as i32,
            );
            for format in attribute_formats(&self.layout) {
                self.gl.enable_vertex_attrib_array(format.location);
                if format.integer {
                    self.gl.vertex_attrib_format_i32(
                        format.location,
                        format.components,
                        format.data_type,
                        format.relative_offset,
                    );
                } else {
                    self.gl.vertex_attrib_format_f32(
                        format.location,
                        format.components,
                        format.data_type,
                        format.normalized,
                        format.relative_offset,
                    );
                }
                self.gl.vertex_attrib_binding(format.location, binding_index);
            }
            self.gl.bind_vertex_array(None);
        }
    }

    /// Attaches an index buffer, or detaches it with `None`.
    pub fn set_index_buffer(&self, buffer: Option<&GpuBuffer>) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.id));
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, buffer.map(GpuBuffer::id));
            self.gl.bind_vertex_array(None);
        }
    }

    /// Makes this the active vertex input state.
    pub fn bind(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.id));
        }
    }

    pub fn unbind(&self) {
        unsafe {
            self.gl.bind_vertex_array(None);
        }
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use lm3d_core::{
        Vertex, Vertex3D,
        vertex::{AttributeType, PositionVertex, VertexAttribute},
    };

    use super::*;

    #[test]
    fn vertex3d_formats_every_attribute_as_float() {
        let layout = Vertex3D::layout();
        assert_eq!(layout.stride as usize, size_of::<Vertex3D>());

        let formats = attribute_formats(&layout);
        let summary: Vec<_> = formats
            .iter()
            .map(|f| (f.location, f.components, f.relative_offset))
            .collect();
        assert_eq!(
            summary,
            vec![(0, 3, 0), (1, 3, 12), (2, 2, 24), (3, 3, 32), (4, 3, 44)]
        );
        assert!(formats.iter().all(|f| f.data_type == glow::FLOAT && !f.integer));
    }

    #[test]
    fn position_vertex_has_a_single_attribute() {
        let layout = PositionVertex::layout();
        assert_eq!(layout.stride as usize, size_of::<PositionVertex>());
        assert_eq!(
            attribute_formats(&layout),
            vec![AttributeFormat {
                location: 0,
                components: 3,
                data_type: glow::FLOAT,
                normalized: false,
                relative_offset: 0,
                integer: false,
            }]
        );
    }

    #[test]
    fn integer_attributes_use_the_integer_path_unless_normalized() {
        let layout = VertexLayout::new(8)
            .with(VertexAttribute {
                location: 0,
                components: 1,
                kind: AttributeType::UnsignedInt,
                normalized: false,
                offset: 0,
            })
            .with(VertexAttribute {
                location: 1,
                components: 4,
                kind: AttributeType::UnsignedByte,
                normalized: true,
                offset: 4,
            });

        let formats = attribute_formats(&layout);
        assert!(formats[0].integer);
        assert_eq!(formats[0].data_type, glow::UNSIGNED_INT);
        assert!(!formats[1].integer);
        assert!(formats[1].normalized);
        assert_eq!(formats[1].relative_offset, 4);
    }
}
