//! Thin owning wrappers around OpenGL objects.
//!
//! Every type here holds an `Arc<glow::Context>` and deletes its GL object on drop. The
//! [`RenderContext`] is the entry point: every constructor takes it.

pub mod buffer;
pub mod context;
pub mod framebuffer;
pub mod shader;
pub mod texture;
pub mod vertex_array;

pub use buffer::*;
pub use context::*;
pub use framebuffer::*;
pub use shader::*;
pub use texture::*;
pub use vertex_array::*;

use lm3d_core::{
    InternalFormat, PixelFormat, TextureAccess, TextureFilter, TextureKind, TextureWrap,
    vertex::AttributeType,
};

/// Maps an engine-side enum to its OpenGL constant.
pub trait GlEnum {
    fn gl_enum(self) -> u32;
}

impl GlEnum for TextureKind {
    fn gl_enum(self) -> u32 {
        match self {
            TextureKind::Texture2D => glow::TEXTURE_2D,
            TextureKind::Texture3D => glow::TEXTURE_3D,
            TextureKind::CubeMap => glow::TEXTURE_CUBE_MAP,
        }
    }
}

impl GlEnum for PixelFormat {
    fn gl_enum(self) -> u32 {
        match self {
            PixelFormat::Red => glow::RED,
            PixelFormat::Rg => glow::RG,
            PixelFormat::Rgb => glow::RGB,
            PixelFormat::Rgba => glow::RGBA,
            PixelFormat::Depth => glow::DEPTH_COMPONENT,
            PixelFormat::DepthStencil => glow::DEPTH_STENCIL,
        }
    }
}

impl GlEnum for InternalFormat {
    fn gl_enum(self) -> u32 {
        match self {
            InternalFormat::R8 => glow::R8,
            InternalFormat::Rg8 => glow::RG8,
            InternalFormat::Rgb8 => glow::RGB8,
            InternalFormat::Rgba8 => glow::RGBA8,
            InternalFormat::Rgba16F => glow::RGBA16F,
            InternalFormat::Rgba32F => glow::RGBA32F,
            InternalFormat::R32F => glow::R32F,
            InternalFormat::Depth24 => glow::DEPTH_COMPONENT24,
            InternalFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
        }
    }
}

impl GlEnum for TextureFilter {
    fn gl_enum(self) -> u32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
            TextureFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            TextureFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
            TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl GlEnum for TextureWrap {
    fn gl_enum(self) -> u32 {
        match self {
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            TextureWrap::ClampToBorder => glow::CLAMP_TO_BORDER,
        }
    }
}

impl GlEnum for TextureAccess {
    fn gl_enum(self) -> u32 {
        match self {
            TextureAccess::Read => glow::READ_ONLY,
            TextureAccess::Write => glow::WRITE_ONLY,
            TextureAccess::ReadWrite => glow::READ_WRITE,
        }
    }
}

impl GlEnum for AttributeType {
    fn gl_enum(self) -> u32 {
        match self {
            AttributeType::Float => glow::FLOAT,
            AttributeType::Int => glow::INT,
            AttributeType::UnsignedInt => glow::UNSIGNED_INT,
            AttributeType::UnsignedByte => glow::UNSIGNED_BYTE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_enums_map_to_gl() {
        assert_eq!(TextureKind::CubeMap.gl_enum(), glow::TEXTURE_CUBE_MAP);
        assert_eq!(PixelFormat::Rgb.gl_enum(), glow::RGB);
        assert_eq!(InternalFormat::Depth24Stencil8.gl_enum(), glow::DEPTH24_STENCIL8);
        assert_eq!(TextureFilter::LinearMipmapLinear.gl_enum(), glow::LINEAR_MIPMAP_LINEAR);
        assert_eq!(TextureWrap::MirroredRepeat.gl_enum(), glow::MIRRORED_REPEAT);
        assert_eq!(TextureAccess::Write.gl_enum(), glow::WRITE_ONLY);
        assert_eq!(AttributeType::UnsignedByte.gl_enum(), glow::UNSIGNED_BYTE);
    }
}
