//! Off-screen render targets.
//!
//! A [`Framebuffer`] is an off-screen render target the size of the window. Unbinding it
//! draws its color attachment onto the screen through a fullscreen quad.

use std::{rc::Rc, sync::Arc};

use glam::UVec2;
use glow::HasContext;
use lm3d_core::{PixelFormat, SamplerParams, TextureDescriptor, TextureKind};

use crate::{
    abs::{BoundTarget, RenderContext, ShaderProgram, Texture},
    error::{Error, Result},
    render::{Material, Mesh},
};

/// Sampler uniform the blit shader reads the color attachment from.
pub const SCREEN_TEXTURE: &str = "screenTexture";

/// The state a GL capability must be switched to, or `None` if it already is `wanted`.
fn capability_change(enabled: bool, wanted: bool) -> Option<bool> {
    (enabled != wanted).then_some(wanted)
}

fn set_capability(gl: &glow::Context, capability: u32, enabled: bool) {
    unsafe {
        if enabled {
            gl.enable(capability);
        } else {
            gl.disable(capability);
        }
    }
}

fn color_texture(ctx: &RenderContext, size: UVec2) -> Result<Rc<Texture>> {
    let descriptor = TextureDescriptor::new(TextureKind::Texture2D, PixelFormat::Rgba)
        .with_sampler(SamplerParams::clamped());
    Ok(Rc::new(Texture::empty(ctx, size.x, size.y, 1, descriptor)?))
}

/// Represents an OpenGL framebuffer with a color texture and a depth renderbuffer.
pub struct Framebuffer {
    gl: Arc<glow::Context>,
    id: glow::Framebuffer,
    depth: glow::Renderbuffer,
    color: Rc<Texture>,
    quad: Mesh,
    size: UVec2,
    bound: Rc<BoundTarget<glow::Framebuffer>>,
}

impl Framebuffer {
    /// Creates a framebuffer sized to the drawable area. `blit` samples
    /// [`SCREEN_TEXTURE`] to draw the result on screen.
    pub fn new(ctx: &RenderContext, blit: Rc<ShaderProgram>) -> Result<Self> {
        let gl = ctx.gl();
        let size = ctx.drawable_size();
        let color = color_texture(ctx, size)?;

        let mut material = Material::with_shader("FramebufferBlit", blit);
        material.set_texture(SCREEN_TEXTURE, Some(Rc::clone(&color)));
        let mut quad = Mesh::quad(ctx)?;
        quad.set_default_material(Some(material.shared()));

        let id = unsafe { gl.create_framebuffer().map_err(Error::Device)? };
        let depth = match unsafe { gl.create_renderbuffer() } {
            Ok(depth) => depth,
            Err(err) => {
                unsafe { gl.delete_framebuffer(id) };
                return Err(Error::Device(err));
            }
        };

        let framebuffer = Self {
            gl: Arc::clone(gl),
            id,
            depth,
            color,
            quad,
            size,
            bound: Rc::clone(ctx.bound_target()),
        };
        framebuffer.attach()?;

        log::debug!("Created {}x{} framebuffer", size.x, size.y);
        Ok(framebuffer)
    }

    /// Allocates depth storage at the current size and attaches both targets.
    fn attach(&self) -> Result<()> {
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.id));
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(self.color.id()),
                0,
            );

            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(self.depth));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH_COMPONENT24,
                self.size.x as i32,
                self.size.y as i32,
            );
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(self.depth),
            );
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            if status != glow::FRAMEBUFFER_COMPLETE {
                log::error!("Framebuffer incomplete: 0x{status:X}");
                return Err(Error::FramebufferIncomplete(status));
            }
        }
        Ok(())
    }

    /// Reallocates the attachments if the drawable size changed.
    pub fn resize(&mut self, ctx: &RenderContext) -> Result<()> {
        let size = ctx.drawable_size();
        if size == self.size || size.x == 0 || size.y == 0 {
            return Ok(());
        }

        let color = color_texture(ctx, size)?;
        if let Some(material) = self.quad.default_material() {
            material
                .borrow_mut()
                .set_texture(SCREEN_TEXTURE, Some(Rc::clone(&color)));
        }
        self.color = color;
        self.size = size;
        self.attach()?;

        log::debug!("Resized framebuffer to {}x{}", size.x, size.y);
        Ok(())
    }

    /// Makes this the render target and clears it. Replaces any other bound framebuffer.
    pub fn bind(&self, ctx: &RenderContext) {
        ctx.bound_target().bind(self.id);
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.id));
        }
        ctx.reset_viewport();
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    /// Restores the screen as render target and draws the color attachment onto it. Does
    /// nothing unless this framebuffer is the bound one. Depth testing is off for the blit and
    /// left as it was found.
    pub fn unbind(&self, ctx: &RenderContext) {
        if !ctx.bound_target().release(self.id) {
            log::warn!("Unbind of a framebuffer that is not bound");
            return;
        }
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
        ctx.reset_viewport();

        let depth_test = unsafe { self.gl.is_enabled(glow::DEPTH_TEST) };
        if let Some(state) = capability_change(depth_test, false) {
            set_capability(&self.gl, glow::DEPTH_TEST, state);
        }
        self.quad.draw();
        if let Some(state) = capability_change(false, depth_test) {
            set_capability(&self.gl, glow::DEPTH_TEST, state);
        }
    }

    pub fn id(&self) -> glow::Framebuffer {
        self.id
    }

    /// The color attachment.
    pub fn texture(&self) -> &Rc<Texture> {
        &self.color
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            if self.bound.release(self.id) {
                self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            }
            self.gl.delete_renderbuffer(self.depth);
            self.gl.delete_framebuffer(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_restores_depth_test_only_if_it_was_on() {
        assert_eq!(capability_change(true, false), Some(false));
        assert_eq!(capability_change(false, true), Some(true));

        // Caller had depth testing off: nothing to disable, nothing to restore.
        assert_eq!(capability_change(false, false), None);
        assert_eq!(capability_change(true, true), None);
    }
}
