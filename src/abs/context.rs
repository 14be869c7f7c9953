//! Render context and global pipeline state.
//!
//! The [`RenderContext`] replaces process-wide window state: it carries the GL context, the
//! current drawable size and which off-screen target is bound. It is created by the
//! application once a GL context exists and is passed by reference to every constructor.

use std::{cell::Cell, rc::Rc, sync::Arc};

use glam::{UVec2, Vec4};
use glow::HasContext;
use serde::Deserialize;

/// Depth comparison function.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DepthFunc {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl DepthFunc {
    pub fn gl_enum(self) -> u32 {
        match self {
            DepthFunc::Never => glow::NEVER,
            DepthFunc::Less => glow::LESS,
            DepthFunc::Equal => glow::EQUAL,
            DepthFunc::LessEqual => glow::LEQUAL,
            DepthFunc::Greater => glow::GREATER,
            DepthFunc::NotEqual => glow::NOTEQUAL,
            DepthFunc::GreaterEqual => glow::GEQUAL,
            DepthFunc::Always => glow::ALWAYS,
        }
    }
}

/// Which faces get culled.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CullMode {
    #[default]
    Back,
    Front,
    FrontAndBack,
}

impl CullMode {
    pub fn gl_enum(self) -> u32 {
        match self {
            CullMode::Back => glow::BACK,
            CullMode::Front => glow::FRONT,
            CullMode::FrontAndBack => glow::FRONT_AND_BACK,
        }
    }
}

/// Fixed-function pipeline toggles, applied with [`RenderContext::apply_settings`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub depth_test: bool,
    pub depth_func: DepthFunc,
    pub face_culling: bool,
    pub cull_mode: CullMode,
    pub blending: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_func: DepthFunc::Less,
            face_culling: true,
            cull_mode: CullMode::Back,
            blending: true,
        }
    }
}

/// Tracks the single bound target of a bind/unbind pair.
#[derive(Debug)]
pub struct BoundTarget<H: Copy + PartialEq> {
    current: Cell<Option<H>>,
}

impl<H: Copy + PartialEq> Default for BoundTarget<H> {
    fn default() -> Self {
        Self {
            current: Cell::new(None),
        }
    }
}

impl<H: Copy + PartialEq> BoundTarget<H> {
    /// Records `handle` as bound, replacing whatever was bound before.
    pub fn bind(&self, handle: H) {
        self.current.set(Some(handle));
    }

    /// Clears the binding if `handle` is the bound one. Returns whether it was.
    pub fn release(&self, handle: H) -> bool {
        if self.current.get() == Some(handle) {
            self.current.set(None);
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<H> {
        self.current.get()
    }
}

/// Shared state every GPU resource is created against.
pub struct RenderContext {
    gl: Arc<glow::Context>,
    drawable_size: Cell<UVec2>,
    bound_target: Rc<BoundTarget<glow::Framebuffer>>,
}

impl RenderContext {
    /// Wraps a GL context whose default framebuffer is `width` by `height` pixels.
    pub fn new(gl: Arc<glow::Context>, width: u32, height: u32) -> Self {
        Self {
            gl,
            drawable_size: Cell::new(UVec2::new(width, height)),
            bound_target: Rc::default(),
        }
    }

    pub fn gl(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// Size of the window's drawable area in pixels.
    pub fn drawable_size(&self) -> UVec2 {
        self.drawable_size.get()
    }

    /// Updates the drawable size, typically from a window resize event.
    pub fn set_drawable_size(&self, width: u32, height: u32) {
        self.drawable_size.set(UVec2::new(width, height));
        self.reset_viewport();
    }

    /// Width over height, or 1 for a degenerate size.
    pub fn aspect_ratio(&self) -> f32 {
        let size = self.drawable_size.get();
        if size.y == 0 {
            1.0
        } else {
            size.x as f32 / size.y as f32
        }
    }

    /// Sets the viewport to cover the whole drawable area.
    pub fn reset_viewport(&self) {
        let size = self.drawable_size.get();
        unsafe {
            self.gl.viewport(0, 0, size.x as i32, size.y as i32);
        }
    }

    pub fn apply_settings(&self, settings: &RenderSettings) {
        unsafe {
            if settings.depth_test {
                self.gl.enable(glow::DEPTH_TEST);
                self.gl.depth_func(settings.depth_func.gl_enum());
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }

            if settings.face_culling {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(settings.cull_mode.gl_enum());
                self.gl.front_face(glow::CCW);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }

            if settings.blending {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
        log::debug!("Applied render settings {settings:?}");
    }

    /// Resets the viewport and clears color, depth and stencil of the current target.
    pub fn begin_frame(&self, clear_color: Vec4) {
        self.reset_viewport();
        unsafe {
            self.gl
                .clear_color(clear_color.x, clear_color.y, clear_color.z, clear_color.w);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT);
        }
    }

    /// The off-screen target bound through [`Framebuffer::bind`](crate::abs::Framebuffer::bind).
    pub fn bound_framebuffer(&self) -> Option<glow::Framebuffer> {
        self.bound_target.current()
    }

    pub(crate) fn bound_target(&self) -> &Rc<BoundTarget<glow::Framebuffer>> {
        &self.bound_target
    }
}
