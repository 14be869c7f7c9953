//! The scene viewer: setup from a [`ViewerConfig`] and the frame loop.

use std::{rc::Rc, sync::Arc, time::Instant};

use glam::{Mat4, Vec3, Vec4};
use lm3d_core::Camera;
use lumen3d::{
    Result,
    abs::{Framebuffer, RenderContext, ShaderProgram},
    render::{MODEL_MATRIX, Material, Mesh, Model},
};
use sdl2::{
    event::{Event, WindowEvent},
    keyboard::Keycode,
};

use crate::{
    app::App,
    config::{CameraConfig, ModelConfig, ViewerConfig},
    detail,
    fps::FpsCounter,
    input::{FlyController, InputState},
    screenshot,
    shaders,
    skybox::Skybox,
    terrain,
};

/// Edge length of the generated ground texture.
const DETAIL_SIZE: u32 = 256;
/// Direction the sunlight travels in.
const LIGHT_DIR: Vec3 = Vec3::new(-0.4, -1.0, -0.3);

/// Translation, then rotation around +Y, then uniform scale.
pub fn model_transform(config: &ModelConfig) -> Mat4 {
    Mat4::from_translation(Vec3::from_array(config.translation))
        * Mat4::from_rotation_y(config.rotation.to_radians())
        * Mat4::from_scale(Vec3::splat(config.scale))
}

pub fn camera_from_config(config: &CameraConfig, aspect_ratio: f32) -> Camera {
    let mut camera = Camera::new(config.fov, aspect_ratio, config.near, config.far);
    camera.set_position(Vec3::from_array(config.position));
    camera
}

struct PlacedModel {
    model: Model,
    transform: Mat4,
}

/// Everything drawn each frame.
pub struct Viewer {
    ctx: RenderContext,
    config: ViewerConfig,
    lit: Rc<ShaderProgram>,
    model: Option<PlacedModel>,
    terrain: Option<Mesh>,
    skybox: Option<Skybox>,
    framebuffer: Option<Framebuffer>,
    camera: Camera,
    controller: FlyController,
    input: InputState,
    fps: FpsCounter,
    mouse_grabbed: bool,
    screenshot_requested: bool,
}

impl Viewer {
    pub fn new(app: &App, config: ViewerConfig) -> Result<Self> {
        let (width, height) = app.drawable_size();
        let ctx = RenderContext::new(Arc::clone(&app.gl), width, height);
        ctx.apply_settings(&config.render);

        let lit = shaders::program(&ctx, "lit")?;

        let model = match &config.model {
            Some(model_config) => {
                let model = Model::load(&ctx, &model_config.path, Some(Rc::clone(&lit)))?;
                log::info!(
                    "Loaded {} with {} meshes, {} materials and {} textures",
                    model_config.path.display(),
                    model.mesh_count(),
                    model.material_count(),
                    model.texture_count()
                );
                Some(PlacedModel {
                    model,
                    transform: model_transform(model_config),
                })
            }
            None => None,
        };

        let terrain = if config.terrain.enabled {
            Some(Self::build_terrain(&ctx, &config, &lit)?)
        } else {
            None
        };

        let skybox = match &config.skybox {
            Some(faces) => Some(Skybox::new(&ctx, faces, shaders::program(&ctx, "skybox")?)?),
            None => None,
        };

        let framebuffer = if config.offscreen {
            Some(Framebuffer::new(&ctx, shaders::program(&ctx, "blit")?)?)
        } else {
            None
        };

        let camera = camera_from_config(&config.camera, ctx.aspect_ratio());
        let controller = FlyController::new(config.camera.speed, config.camera.sensitivity);

        Ok(Self {
            ctx,
            config,
            lit,
            model,
            terrain,
            skybox,
            framebuffer,
            camera,
            controller,
            input: InputState::default(),
            fps: FpsCounter::default(),
            mouse_grabbed: false,
            screenshot_requested: false,
        })
    }

    fn build_terrain(
        ctx: &RenderContext,
        config: &ViewerConfig,
        lit: &Rc<ShaderProgram>,
    ) -> Result<Mesh> {
        let seed = config.terrain.seed.unwrap_or_else(rand::random);
        let mut mesh = Mesh::new(ctx, terrain::generate(&config.terrain, seed))?;

        let mut material = Material::with_shader("Terrain", Rc::clone(lit));
        material.set_base_color_texture(Some(Rc::new(detail::generate(ctx, DETAIL_SIZE)?)));
        material.set_roughness(0.9);
        mesh.set_default_material(Some(material.shared()));

        log::info!("Built terrain from seed {seed}");
        Ok(mesh)
    }

    /// Runs until the window is closed.
    pub fn run(&mut self, app: &mut App) -> Result<()> {
        let mut last_time = Instant::now();

        'running: loop {
            self.input.begin_frame();
            for event in app.event_pump.poll_iter() {
                self.input.handle_event(&event);
                match event {
                    Event::Quit { .. } => break 'running,
                    Event::Window {
                        win_event: WindowEvent::SizeChanged(..),
                        ..
                    } => {
                        let (width, height) = app.window.drawable_size();
                        self.ctx.set_drawable_size(width, height);
                        self.camera.set_aspect_ratio(self.ctx.aspect_ratio());
                        if let Some(framebuffer) = &mut self.framebuffer {
                            framebuffer.resize(&self.ctx)?;
                        }
                    }
                    Event::KeyDown {
                        keycode: Some(Keycode::Escape),
                        repeat: false,
                        ..
                    } => {
                        self.mouse_grabbed = !self.mouse_grabbed;
                        app.sdl.mouse().set_relative_mouse_mode(self.mouse_grabbed);
                    }
                    Event::KeyDown {
                        keycode: Some(Keycode::F2),
                        repeat: false,
                        ..
                    } => self.screenshot_requested = true,
                    _ => {}
                }
            }

            let dt = (Instant::now() - last_time).as_secs_f64().min(2.0);
            last_time = Instant::now();

            if self.mouse_grabbed {
                self.controller.look(&mut self.camera, self.input.mouse.delta);
            }
            self.controller
                .fly(&mut self.camera, self.input.move_input(), dt as f32);

            self.render();

            if self.screenshot_requested {
                let size = self.ctx.drawable_size();
                screenshot::save(self.ctx.gl(), size.x, size.y, screenshot::SCREENSHOT_PATH);
                self.screenshot_requested = false;
            }
            app.window.gl_swap_window();

            if let Some(fps) = self.fps.tick(dt) {
                log::debug!("{fps} FPS");
            }
        }

        log::info!("Window closed");
        Ok(())
    }

    fn render(&self) {
        let clear_color = Vec4::from_array(self.config.clear_color);
        self.ctx.begin_frame(clear_color);
        if let Some(framebuffer) = &self.framebuffer {
            framebuffer.bind(&self.ctx);
        }

        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        self.lit.set_uniform("u_view", view);
        self.lit.set_uniform("u_projection", projection);
        self.lit.set_uniform("u_cameraPos", self.camera.position());
        self.lit.set_uniform("u_lightDir", LIGHT_DIR.normalize());

        if let Some(placed) = &self.model {
            placed.model.draw(placed.transform);
        }
        if let Some(terrain) = &self.terrain {
            self.lit.set_uniform(MODEL_MATRIX, Mat4::IDENTITY);
            terrain.draw();
        }
        if let Some(skybox) = &self.skybox {
            skybox.draw(view, projection);
        }

        if let Some(framebuffer) = &self.framebuffer {
            framebuffer.unbind(&self.ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn model_transform_scales_then_rotates_then_translates() {
        let config = ModelConfig {
            path: PathBuf::from("scene.glb"),
            translation: [10.0, 0.0, 0.0],
            rotation: 90.0,
            scale: 2.0,
        };
        let transform = model_transform(&config);
        let moved = transform.transform_point3(Vec3::X);
        assert!(close(moved, Vec3::new(10.0, 0.0, -2.0)));
    }

    #[test]
    fn camera_starts_at_configured_position() {
        let config = CameraConfig::default();
        let camera = camera_from_config(&config, 16.0 / 9.0);
        assert_eq!(camera.position(), Vec3::new(0.0, 20.0, 40.0));
        assert_eq!(camera.fov(), config.fov);
        assert_eq!(camera.far(), config.far);
    }
}
