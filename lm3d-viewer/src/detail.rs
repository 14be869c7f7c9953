//! Ground detail texture written by a compute pass.

use glam::{UVec3, Vec3};
use lm3d_core::{
    InternalFormat, PixelFormat, SamplerParams, TextureAccess, TextureDescriptor, TextureKind,
    TextureWrap,
};
use lumen3d::{
    Result,
    abs::{RenderContext, Texture},
};

use crate::shaders;

/// Work group edge length declared by the detail compute shader.
const LOCAL_SIZE: u32 = 8;

/// Work groups needed to cover a `size` by `size` image.
pub fn dispatch_groups(size: u32) -> UVec3 {
    let groups = size.div_ceil(LOCAL_SIZE);
    UVec3::new(groups, groups, 1)
}

/// Creates a tileable `size` by `size` ground texture on the GPU.
pub fn generate(ctx: &RenderContext, size: u32) -> Result<Texture> {
    let descriptor = TextureDescriptor::new(TextureKind::Texture2D, PixelFormat::Rgba)
        .with_internal_format(InternalFormat::Rgba8)
        .with_sampler(SamplerParams::default().with_wrap(TextureWrap::Repeat));
    let texture = Texture::empty(ctx, size, size, 1, descriptor)?;

    let program = shaders::compute(ctx, "detail", dispatch_groups(size))?;
    program.set_uniform("u_lowColor", Vec3::new(0.22, 0.34, 0.16));
    program.set_uniform("u_highColor", Vec3::new(0.45, 0.52, 0.30));
    program.set_uniform("u_cells", 32.0f32);

    texture.bind_for_image_access(0, TextureAccess::Write, InternalFormat::Rgba8, 0, false, 0);
    program.dispatch();
    program.memory_barrier(glow::SHADER_IMAGE_ACCESS_BARRIER_BIT | glow::TEXTURE_FETCH_BARRIER_BIT);

    log::debug!("Generated {size}x{size} detail texture");
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_cover_partial_tiles() {
        assert_eq!(dispatch_groups(256), UVec3::new(32, 32, 1));
        assert_eq!(dispatch_groups(250), UVec3::new(32, 32, 1));
        assert_eq!(dispatch_groups(1), UVec3::new(1, 1, 1));
    }
}
