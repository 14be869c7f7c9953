//! Framebuffer capture to an image file.

use std::path::Path;

use glow::HasContext;
use image::{ImageFormat, RgbaImage};

/// File written by the screenshot key.
pub const SCREENSHOT_PATH: &str = "Screenshot.bmp";

/// Reverses the row order of a tightly packed RGBA buffer in place.
pub fn flip_rows(pixels: &mut [u8], width: usize, height: usize) {
    let stride = width * 4;
    for y in 0..height / 2 {
        let (top, rest) = pixels.split_at_mut((height - 1 - y) * stride);
        top[y * stride..(y + 1) * stride].swap_with_slice(&mut rest[..stride]);
    }
}

/// Reads the current framebuffer into an image, top row first.
pub fn capture(gl: &glow::Context, width: u32, height: u32) -> Option<RgbaImage> {
    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    unsafe {
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        gl.read_pixels(
            0,
            0,
            width as i32,
            height as i32,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            glow::PixelPackData::Slice(Some(&mut pixels)),
        );
    }
    flip_rows(&mut pixels, width as usize, height as usize);
    RgbaImage::from_raw(width, height, pixels)
}

/// Captures the framebuffer and writes it as an uncompressed bitmap.
pub fn save(gl: &glow::Context, width: u32, height: u32, path: impl AsRef<Path>) {
    let path = path.as_ref();
    let Some(image) = capture(gl, width, height) else {
        log::error!("Screenshot buffer does not match {width}x{height}");
        return;
    };
    match image.save_with_format(path, ImageFormat::Bmp) {
        Ok(()) => log::info!("Saved screenshot to {}", path.display()),
        Err(err) => log::error!("Failed to save screenshot to {}: {err}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_reversed() {
        let mut pixels: Vec<u8> = (0..3).flat_map(|row| [row; 8]).collect();
        flip_rows(&mut pixels, 2, 3);
        let rows: Vec<u8> = pixels.chunks_exact(8).map(|r| r[0]).collect();
        assert_eq!(rows, vec![2, 1, 0]);
    }

    #[test]
    fn even_heights_swap_every_row() {
        let mut pixels: Vec<u8> = (0..4).flat_map(|row| [row; 4]).collect();
        flip_rows(&mut pixels, 1, 4);
        assert_eq!(pixels.chunks_exact(4).map(|r| r[0]).collect::<Vec<_>>(), vec![3, 2, 1, 0]);
    }
}
