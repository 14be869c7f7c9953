//! SDL2 window with an OpenGL 4.6 core context.

use std::sync::Arc;

use sdl2::video::{FullscreenType, SwapInterval};

use crate::config::{WindowConfig, WindowMode};

/// The SDL subsystems, the window and the GL context created for it.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Opens the window described by `config` and makes its GL context current.
    pub fn new(config: &WindowConfig) -> Result<Self, String> {
        let sdl = sdl2::init()?;
        let video_subsystem = sdl.video()?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(4, 6);
        gl_attr.set_double_buffer(true);
        gl_attr.set_depth_size(24);

        let mut builder = video_subsystem.window(&config.title, config.width, config.height);
        builder.opengl().resizable();
        if config.mode == WindowMode::Borderless {
            builder.borderless();
        }
        let window = builder.build().map_err(|e| e.to_string())?;

        let gl_context = window.gl_create_context()?;
        window.gl_make_current(&gl_context)?;
        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump()?;

        let mut app = Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl: Arc::new(gl),
            event_pump,
        };
        app.set_window_mode(config.mode)?;
        app.set_vsync(config.vsync);

        let (width, height) = app.drawable_size();
        log::info!("Opened {width}x{height} window '{}'", config.title);
        Ok(app)
    }

    pub fn set_window_mode(&mut self, mode: WindowMode) -> Result<(), String> {
        let fullscreen = match mode {
            WindowMode::Fullscreen => FullscreenType::Desktop,
            WindowMode::Windowed | WindowMode::Borderless => FullscreenType::Off,
        };
        self.window.set_fullscreen(fullscreen)?;
        self.window.set_bordered(mode == WindowMode::Windowed);
        Ok(())
    }

    /// Turns vertical sync on or off. A driver refusal is logged and ignored.
    pub fn set_vsync(&self, enabled: bool) {
        let interval = if enabled {
            SwapInterval::VSync
        } else {
            SwapInterval::Immediate
        };
        if let Err(err) = self.video_subsystem.gl_set_swap_interval(interval) {
            log::warn!("Failed to set swap interval: {err}");
        }
    }

    /// Size of the GL drawable in pixels, which differs from the window size on HiDPI.
    pub fn drawable_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }
}
