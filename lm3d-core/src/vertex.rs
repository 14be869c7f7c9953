//! Vertex formats and their attribute layouts.
//!
//! A [`VertexLayout`] is a pure description of how the bytes of one vertex map to shader
//! input locations. It owns no GPU state; the renderer applies it to a buffer binding.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Component type of a single vertex attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Float,
    Int,
    UnsignedInt,
    UnsignedByte,
}

impl AttributeType {
    /// Size of one component in bytes.
    pub fn size(self) -> u32 {
        match self {
            AttributeType::Float | AttributeType::Int | AttributeType::UnsignedInt => 4,
            AttributeType::UnsignedByte => 1,
        }
    }

    /// Whether the attribute is read through the integer attribute path when not normalized.
    pub fn is_integer(self) -> bool {
        !matches!(self, AttributeType::Float)
    }
}

/// One shader input inside a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: u32,
    pub kind: AttributeType,
    pub offset: u32,
    pub normalized: bool,
}

impl VertexAttribute {
    /// A float attribute with the given number of components.
    pub const fn float(location: u32, components: u32, offset: u32) -> Self {
        Self {
            location,
            components,
            kind: AttributeType::Float,
            offset,
            normalized: false,
        }
    }

    /// Byte size of this attribute.
    pub fn size(&self) -> u32 {
        self.components * self.kind.size()
    }
}

/// Stride plus an ordered list of attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Creates an empty layout with the given stride.
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
        }
    }

    /// Appends an attribute and returns the layout.
    pub fn with(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Returns `true` if every attribute fits inside the stride.
    pub fn fits_stride(&self) -> bool {
        self.attributes
            .iter()
            .all(|a| a.offset + a.size() <= self.stride)
    }
}

/// Trait implemented by every vertex type that can be uploaded to a vertex buffer.
pub trait Vertex: Pod {
    /// Describes the attribute layout of the vertex.
    fn layout() -> VertexLayout;
}

/// The engine's standard lit vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex3D {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex3D {
    /// Creates a vertex with the default tangent frame.
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            ..Default::default()
        }
    }
}

impl Default for Vertex3D {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::Z,
            tex_coords: Vec2::ZERO,
            tangent: Vec3::X,
            bitangent: Vec3::Y,
        }
    }
}

impl Vertex for Vertex3D {
    fn layout() -> VertexLayout {
        VertexLayout::new(std::mem::size_of::<Self>() as u32)
            .with(VertexAttribute::float(0, 3, 0))
            .with(VertexAttribute::float(1, 3, 12))
            .with(VertexAttribute::float(2, 2, 24))
            .with(VertexAttribute::float(3, 3, 32))
            .with(VertexAttribute::float(4, 3, 44))
    }
}

/// Position-only vertex, used for skyboxes and debug geometry.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: Vec3,
}

impl Vertex for PositionVertex {
    fn layout() -> VertexLayout {
        VertexLayout::new(std::mem::size_of::<Self>() as u32).with(VertexAttribute::float(0, 3, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex3d_layout_matches_struct() {
        let layout = Vertex3D::layout();
        assert_eq!(layout.stride, 56);
        assert_eq!(layout.attributes.len(), 5);
        assert!(layout.fits_stride());

        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.location).collect();
        assert_eq!(locations, vec![0, 1, 2, 3, 4]);
        assert_eq!(
            layout.attributes[2].offset as usize,
            std::mem::offset_of!(Vertex3D, tex_coords)
        );
        assert_eq!(
            layout.attributes[4].offset as usize,
            std::mem::offset_of!(Vertex3D, bitangent)
        );
    }

    #[test]
    fn default_vertex_frame() {
        let v = Vertex3D::default();
        assert_eq!(v.normal, Vec3::Z);
        assert_eq!(v.tangent, Vec3::X);
        assert_eq!(v.bitangent, Vec3::Y);
    }

    #[test]
    fn attribute_sizes() {
        let attr = VertexAttribute {
            location: 5,
            components: 4,
            kind: AttributeType::UnsignedByte,
            offset: 0,
            normalized: true,
        };
        assert_eq!(attr.size(), 4);
        assert!(AttributeType::Int.is_integer());
        assert!(!AttributeType::Float.is_integer());
        assert!(!VertexLayout::new(2).with(attr).fits_stride());
    }
}
