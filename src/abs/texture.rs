//! GPU textures.
//!
//! A [`Texture`] owns one GL texture object which can be 2D, 3D or a cubemap. Storage is
//! allocated immutably with every mip level the sampler needs, then filled from a decoded
//! image file, from raw pixel data, or left uninitialized for render or compute targets.

use std::{path::Path, sync::Arc};

use glow::HasContext;
use image::DynamicImage;
use lm3d_core::{
    InternalFormat, PixelFormat, SamplerParams, TextureAccess, TextureDescriptor, TextureKind,
    scene::ImageAsset,
};

use crate::{
    abs::{GlEnum, RenderContext},
    error::{Error, Result},
};

/// GL pixel type of client data in `format`.
fn pixel_type(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Depth => glow::UNSIGNED_INT,
        PixelFormat::DepthStencil => glow::UNSIGNED_INT_24_8,
        _ => glow::UNSIGNED_BYTE,
    }
}

/// Converts a decoded image to tightly packed 8-bit pixels in `format`.
fn image_pixels(image: DynamicImage, format: PixelFormat) -> Option<Vec<u8>> {
    match format {
        PixelFormat::Red => Some(image.into_luma8().into_raw()),
        PixelFormat::Rg => Some(image.into_luma_alpha8().into_raw()),
        PixelFormat::Rgb => Some(image.into_rgb8().into_raw()),
        PixelFormat::Rgba => Some(image.into_rgba8().into_raw()),
        PixelFormat::Depth | PixelFormat::DepthStencil => None,
    }
}

/// One GL texture object and the descriptor it was allocated with.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: glow::Texture,
    width: u32,
    height: u32,
    depth: u32,
    descriptor: TextureDescriptor,
}

impl Texture {
    /// Allocates storage for a texture without filling it.
    pub fn empty(
        ctx: &RenderContext,
        width: u32,
        height: u32,
        depth: u32,
        descriptor: TextureDescriptor,
    ) -> Result<Self> {
        let texture = Self::allocate(ctx, width, height, depth, descriptor)?;
        texture.apply_parameters();
        log::trace!("Allocated {:?} texture {width}x{height}x{depth}", descriptor.kind);
        Ok(texture)
    }

    /// Uploads raw pixel data. Cubemap data holds six same-size faces back to back in the
    /// order +X, -X, +Y, -Y, +Z, -Z.
    pub fn from_data(
        ctx: &RenderContext,
        width: u32,
        height: u32,
        depth: u32,
        data: &[u8],
        descriptor: TextureDescriptor,
    ) -> Result<Self> {
        let expected = descriptor.data_len(width, height, depth);
        if data.len() != expected {
            return Err(Error::TextureDataSize {
                expected,
                actual: data.len(),
            });
        }

        let texture = Self::allocate(ctx, width, height, depth, descriptor)?;
        texture.upload(data);
        texture.apply_parameters();
        Ok(texture)
    }

    /// Uploads an image imported with a scene.
    pub fn from_image(
        ctx: &RenderContext,
        image: &ImageAsset,
        sampler: SamplerParams,
    ) -> Result<Self> {
        let descriptor =
            TextureDescriptor::new(TextureKind::Texture2D, image.format).with_sampler(sampler);
        Self::from_data(ctx, image.width, image.height, 1, &image.pixels, descriptor)
    }

    /// Decodes a single image file into a 2D (or single-slice 3D) texture. The image is
    /// flipped vertically so that the first row is the bottom one.
    pub fn from_file(
        ctx: &RenderContext,
        path: impl AsRef<Path>,
        descriptor: TextureDescriptor,
    ) -> Result<Self> {
        Self::from_files(ctx, &[path.as_ref()], descriptor)
    }

    /// Decodes image files into a texture. A cubemap takes exactly six face paths in the
    /// order +X, -X, +Y, -Y, +Z, -Z, which are not flipped; other kinds take one path.
    pub fn from_files<P: AsRef<Path>>(
        ctx: &RenderContext,
        paths: &[P],
        descriptor: TextureDescriptor,
    ) -> Result<Self> {
        let faces = descriptor.kind.faces();
        if paths.len() != faces {
            return Err(match descriptor.kind {
                TextureKind::CubeMap => Error::CubemapFaces(paths.len()),
                _ => Error::TextureLoad {
                    path: paths
                        .first()
                        .map(|p| p.as_ref().to_owned())
                        .unwrap_or_default(),
                    reason: format!("expected 1 image path, got {}", paths.len()),
                },
            });
        }

        let flip = descriptor.kind != TextureKind::CubeMap;
        let mut size = None;
        let mut data = Vec::new();
        for (face, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let load_error = |reason: String| Error::TextureLoad {
                path: path.to_owned(),
                reason,
            };

            let image = image::open(path).map_err(|e| load_error(e.to_string()))?;
            let image = if flip { image.flipv() } else { image };
            let dimensions = (image.width(), image.height());
            match size {
                None => size = Some(dimensions),
                Some(expected) if expected != dimensions => {
                    return Err(Error::CubemapFaceSize {
                        face,
                        expected,
                        actual: dimensions,
                    });
                }
                Some(_) => {}
            }

            let pixels = image_pixels(image, descriptor.format).ok_or_else(|| {
                load_error(format!("cannot decode into {:?} pixels", descriptor.format))
            })?;
            data.extend_from_slice(&pixels);
        }

        let (width, height) = size.unwrap_or_default();
        let texture = Self::from_data(ctx, width, height, 1, &data, descriptor)?;
        log::info!(
            "Loaded {:?} texture {width}x{height} from {}",
            descriptor.kind,
            paths[0].as_ref().display()
        );
        Ok(texture)
    }

    fn allocate(
        ctx: &RenderContext,
        width: u32,
        height: u32,
        depth: u32,
        descriptor: TextureDescriptor,
    ) -> Result<Self> {
        let gl = ctx.gl();
        let id = unsafe { gl.create_texture().map_err(Error::Device)? };
        let texture = Self {
            gl: Arc::clone(gl),
            id,
            width,
            height,
            depth: depth.max(1),
            descriptor,
        };

        let target = descriptor.kind.gl_enum();
        let levels = descriptor.mip_levels(width, height) as i32;
        let internal = descriptor.internal_format.gl_enum();
        unsafe {
            gl.bind_texture(target, Some(id));
            match descriptor.kind {
                TextureKind::Texture2D | TextureKind::CubeMap => {
                    gl.tex_storage_2d(target, levels, internal, width as i32, height as i32)
                }
                TextureKind::Texture3D => gl.tex_storage_3d(
                    target,
                    levels,
                    internal,
                    width as i32,
                    height as i32,
                    texture.depth as i32,
                ),
            }
            gl.bind_texture(target, None);
        }
        Ok(texture)
    }

    /// Writes level 0 from `data`, whose length has already been validated.
    fn upload(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let kind = self.descriptor.kind;
        let target = kind.gl_enum();
        let format = self.descriptor.format.gl_enum();
        let ty = pixel_type(self.descriptor.format);
        let (w, h) = (self.width as i32, self.height as i32);

        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.bind_texture(target, Some(self.id));
            match kind {
                TextureKind::Texture2D => self.gl.tex_sub_image_2d(
                    target,
                    0,
                    0,
                    0,
                    w,
                    h,
                    format,
                    ty,
                    glow::PixelUnpackData::Slice(Some(data)),
                ),
                TextureKind::Texture3D => self.gl.tex_sub_image_3d(
                    target,
                    0,
                    0,
                    0,
                    0,
                    w,
                    h,
                    self.depth as i32,
                    format,
                    ty,
                    glow::PixelUnpackData::Slice(Some(data)),
                ),
                TextureKind::CubeMap => {
                    let face_len = data.len() / 6;
                    for (face, pixels) in data.chunks_exact(face_len).enumerate() {
                        self.gl.tex_sub_image_2d(
                            glow::TEXTURE_CUBE_MAP_POSITIVE_X + face as u32,
                            0,
                            0,
                            0,
                            w,
                            h,
                            format,
                            ty,
                            glow::PixelUnpackData::Slice(Some(pixels)),
                        );
                    }
                }
            }
            self.gl.bind_texture(target, None);
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
        }
    }

    /// Pushes the sampler state to the texture and regenerates mipmaps if the minification
    /// filter uses them.
    fn apply_parameters(&self) {
        let target = self.descriptor.kind.gl_enum();
        let sampler = self.descriptor.sampler;
        unsafe {
            self.gl.bind_texture(target, Some(self.id));
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MIN_FILTER,
                sampler.min_filter.gl_enum() as i32,
            );
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MAG_FILTER,
                sampler.mag_filter.magnification().gl_enum() as i32,
            );
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, sampler.wrap_s.gl_enum() as i32);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, sampler.wrap_t.gl_enum() as i32);
            if self.descriptor.kind != TextureKind::Texture2D {
                self.gl.tex_parameter_i32(
                    target,
                    glow::TEXTURE_WRAP_R,
                    sampler.wrap_r.gl_enum() as i32,
                );
            }
            if sampler.min_filter.uses_mipmaps() {
                self.gl.generate_mipmap(target);
            }
            self.gl.bind_texture(target, None);
        }
    }

    /// Replaces the filter and wrap state.
    ///
    /// Switching to a mipmapped filter on a texture allocated without mip levels only samples
    /// level 0.
    pub fn set_sampler(&mut self, sampler: SamplerParams) {
        self.descriptor.sampler = sampler;
        self.apply_parameters();
    }

    /// Binds the texture to the given texture unit for sampling.
    pub fn bind_for_sampling(&self, unit: u32) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl
                .bind_texture(self.descriptor.kind.gl_enum(), Some(self.id));
        }
    }

    /// Binds one mip level to an image unit for shader load/store.
    pub fn bind_for_image_access(
        &self,
        binding: u32,
        access: TextureAccess,
        format: InternalFormat,
        mip_level: u32,
        layered: bool,
        layer: u32,
    ) {
        unsafe {
            self.gl.bind_image_texture(
                binding,
                Some(self.id),
                mip_level as i32,
                layered,
                layer as i32,
                access.gl_enum(),
                format.gl_enum(),
            );
        }
    }

    pub fn id(&self) -> glow::Texture {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn kind(&self) -> TextureKind {
        self.descriptor.kind
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, RgbaImage};

    use super::*;

    #[test]
    fn decoded_images_are_converted_to_the_requested_format() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_raw(1, 1, vec![10, 20, 30, 40]).unwrap());
        assert_eq!(image_pixels(image.clone(), PixelFormat::Rgb), Some(vec![10, 20, 30]));
        assert_eq!(image_pixels(image.clone(), PixelFormat::Rgba), Some(vec![10, 20, 30, 40]));
        assert!(image_pixels(image, PixelFormat::Depth).is_none());

        let gray = DynamicImage::ImageLuma8(GrayImage::from_raw(2, 1, vec![7, 9]).unwrap());
        assert_eq!(image_pixels(gray, PixelFormat::Rgba), Some(vec![7, 7, 7, 255, 9, 9, 9, 255]));
    }

    #[test]
    fn depth_formats_use_integer_pixel_types() {
        assert_eq!(pixel_type(PixelFormat::Depth), glow::UNSIGNED_INT);
        assert_eq!(pixel_type(PixelFormat::DepthStencil), glow::UNSIGNED_INT_24_8);
        assert_eq!(pixel_type(PixelFormat::Rg), glow::UNSIGNED_BYTE);
    }
}
