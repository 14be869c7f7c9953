//! Texture and sampler descriptors.
//!
//! These types describe a texture without owning one. The renderer maps them onto graphics
//! API enums.

/// Dimensionality of a texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureKind {
    #[default]
    Texture2D,
    Texture3D,
    CubeMap,
}

impl TextureKind {
    /// Number of image layers each mip level holds.
    pub fn faces(self) -> usize {
        match self {
            TextureKind::CubeMap => 6,
            _ => 1,
        }
    }
}

/// Layout of client-side pixel data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Red,
    Rg,
    Rgb,
    #[default]
    Rgba,
    Depth,
    DepthStencil,
}

impl PixelFormat {
    /// Bytes per pixel of 8-bit client data in this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rg => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba | PixelFormat::Depth | PixelFormat::DepthStencil => 4,
        }
    }

    /// Pixel format for 8-bit data with the given channel count.
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(PixelFormat::Red),
            2 => Some(PixelFormat::Rg),
            3 => Some(PixelFormat::Rgb),
            4 => Some(PixelFormat::Rgba),
            _ => None,
        }
    }

    /// A sized storage format that fits this pixel format.
    pub fn default_internal(self) -> InternalFormat {
        match self {
            PixelFormat::Red => InternalFormat::R8,
            PixelFormat::Rg => InternalFormat::Rg8,
            PixelFormat::Rgb => InternalFormat::Rgb8,
            PixelFormat::Rgba => InternalFormat::Rgba8,
            PixelFormat::Depth => InternalFormat::Depth24,
            PixelFormat::DepthStencil => InternalFormat::Depth24Stencil8,
        }
    }
}

/// GPU-side storage format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InternalFormat {
    R8,
    Rg8,
    Rgb8,
    #[default]
    Rgba8,
    Rgba16F,
    Rgba32F,
    R32F,
    Depth24,
    Depth24Stencil8,
}

/// Minification and magnification filters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl TextureFilter {
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, TextureFilter::Nearest | TextureFilter::Linear)
    }

    /// The non-mipmapped filter to use for magnification.
    pub fn magnification(self) -> Self {
        match self {
            TextureFilter::Nearest
            | TextureFilter::NearestMipmapNearest
            | TextureFilter::NearestMipmapLinear => TextureFilter::Nearest,
            _ => TextureFilter::Linear,
        }
    }
}

/// Coordinate wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Access mode for image load/store bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureAccess {
    Read,
    Write,
    ReadWrite,
}

/// Filter and wrap state of a texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SamplerParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub wrap_r: TextureWrap,
}

impl SamplerParams {
    /// Linear filtering with every axis clamped to the edge.
    pub fn clamped() -> Self {
        Self {
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            wrap_r: TextureWrap::ClampToEdge,
            ..Default::default()
        }
    }

    /// Sets the same wrap mode on every axis.
    pub fn with_wrap(mut self, wrap: TextureWrap) -> Self {
        self.wrap_s = wrap;
        self.wrap_t = wrap;
        self.wrap_r = wrap;
        self
    }

    /// Sets the filters.
    pub fn with_filter(mut self, min: TextureFilter, mag: TextureFilter) -> Self {
        self.min_filter = min;
        self.mag_filter = mag.magnification();
        self
    }
}

/// Everything needed to allocate a texture apart from its size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub kind: TextureKind,
    pub format: PixelFormat,
    pub internal_format: InternalFormat,
    pub sampler: SamplerParams,
}

impl TextureDescriptor {
    /// A descriptor whose storage format follows `format`.
    pub fn new(kind: TextureKind, format: PixelFormat) -> Self {
        Self {
            kind,
            format,
            internal_format: format.default_internal(),
            sampler: SamplerParams::default(),
        }
    }

    pub fn with_internal_format(mut self, internal_format: InternalFormat) -> Self {
        self.internal_format = internal_format;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerParams) -> Self {
        self.sampler = sampler;
        self
    }

    /// Number of mip levels to allocate for a `width` by `height` image.
    pub fn mip_levels(&self, width: u32, height: u32) -> u32 {
        if self.sampler.min_filter.uses_mipmaps() {
            32 - width.max(height).max(1).leading_zeros()
        } else {
            1
        }
    }

    /// Byte length that pixel data of the given size must have.
    pub fn data_len(&self, width: u32, height: u32, depth: u32) -> usize {
        let depth = match self.kind {
            TextureKind::Texture3D => depth.max(1),
            _ => 1,
        };
        width as usize
            * height as usize
            * depth as usize
            * self.kind.faces()
            * self.format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_levels_follow_filter() {
        let plain = TextureDescriptor::new(TextureKind::Texture2D, PixelFormat::Rgba);
        assert_eq!(plain.mip_levels(256, 256), 1);

        let mipped = plain.with_sampler(
            SamplerParams::default()
                .with_filter(TextureFilter::LinearMipmapLinear, TextureFilter::Linear),
        );
        assert_eq!(mipped.mip_levels(256, 256), 9);
        assert_eq!(mipped.mip_levels(300, 17), 9);
        assert_eq!(mipped.mip_levels(1, 1), 1);
        assert_eq!(mipped.mip_levels(0, 0), 1);
    }

    #[test]
    fn data_len_accounts_for_faces_and_depth() {
        let cube = TextureDescriptor::new(TextureKind::CubeMap, PixelFormat::Rgb);
        assert_eq!(cube.data_len(4, 4, 1), 4 * 4 * 6 * 3);

        let volume = TextureDescriptor::new(TextureKind::Texture3D, PixelFormat::Red);
        assert_eq!(volume.data_len(8, 8, 8), 512);

        let flat = TextureDescriptor::new(TextureKind::Texture2D, PixelFormat::Rgba);
        assert_eq!(flat.data_len(2, 3, 9), 24);
    }

    #[test]
    fn magnification_drops_mipmaps() {
        let sampler = SamplerParams::clamped()
            .with_filter(TextureFilter::NearestMipmapLinear, TextureFilter::NearestMipmapLinear);
        assert_eq!(sampler.mag_filter, TextureFilter::Nearest);
        assert_eq!(sampler.wrap_r, TextureWrap::ClampToEdge);
    }

    #[test]
    fn formats() {
        assert_eq!(PixelFormat::from_channels(3), Some(PixelFormat::Rgb));
        assert_eq!(PixelFormat::from_channels(5), None);
        assert_eq!(PixelFormat::DepthStencil.default_internal(), InternalFormat::Depth24Stencil8);
    }
}
