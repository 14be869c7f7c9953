//! Cubemap skybox.

use std::{path::Path, rc::Rc, sync::Arc};

use glam::{Mat3, Mat4, Vec3};
use glow::HasContext;
use lm3d_core::{
    PixelFormat, SamplerParams, TextureDescriptor, TextureKind, Vertex, vertex::PositionVertex,
};
use lumen3d::{
    Result,
    abs::{BufferKind, BufferUsage, GpuBuffer, RenderContext, ShaderProgram, Texture, VertexArray},
};

/// Corners of the unit cube, two triangles per face, wound to face inwards.
fn cube_vertices() -> Vec<PositionVertex> {
    const FACES: [[f32; 18]; 6] = [
        [
            -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0,
            -1.0, 1.0, -1.0,
        ],
        [
            -1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0,
            -1.0, -1.0, 1.0,
        ],
        [
            1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0,
            -1.0, -1.0,
        ],
        [
            -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, -1.0,
            -1.0, 1.0,
        ],
        [
            -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, -1.0, 1.0, 1.0, -1.0,
            1.0, -1.0,
        ],
        [
            -1.0, -1.0, -1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0,
            1.0, -1.0, 1.0,
        ],
    ];

    FACES
        .iter()
        .flat_map(|face| face.chunks_exact(3))
        .map(|p| PositionVertex {
            position: Vec3::new(p[0], p[1], p[2]),
        })
        .collect()
}

/// Strips the translation so the sky stays centered on the camera.
pub fn sky_view(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

/// A cubemap drawn behind everything else.
pub struct Skybox {
    gl: Arc<glow::Context>,
    vertex_array: VertexArray,
    _vertex_buffer: GpuBuffer,
    texture: Texture,
    shader: Rc<ShaderProgram>,
    vertex_count: i32,
}

impl Skybox {
    /// Loads the six faces, ordered +X, -X, +Y, -Y, +Z, -Z.
    pub fn new<P: AsRef<Path>>(
        ctx: &RenderContext,
        faces: &[P],
        shader: Rc<ShaderProgram>,
    ) -> Result<Self> {
        let descriptor = TextureDescriptor::new(TextureKind::CubeMap, PixelFormat::Rgb)
            .with_sampler(SamplerParams::clamped());
        let texture = Texture::from_files(ctx, faces, descriptor)?;

        let vertices = cube_vertices();
        let vertex_array = VertexArray::new(ctx, PositionVertex::layout())?;
        let vertex_buffer = GpuBuffer::with_data(
            ctx,
            BufferKind::Vertex,
            bytemuck::cast_slice(&vertices),
            BufferUsage::Static,
        )?;
        vertex_array.apply_layout(&vertex_buffer, 0, 0);

        Ok(Self {
            gl: Arc::clone(ctx.gl()),
            vertex_array,
            _vertex_buffer: vertex_buffer,
            texture,
            shader,
            vertex_count: vertices.len() as i32,
        })
    }

    /// Draws the sky at maximum depth. The depth function and face culling are restored
    /// afterwards.
    pub fn draw(&self, view: Mat4, projection: Mat4) {
        let (previous_depth_func, culling) = unsafe {
            (
                self.gl.get_parameter_i32(glow::DEPTH_FUNC) as u32,
                self.gl.is_enabled(glow::CULL_FACE),
            )
        };

        unsafe {
            self.gl.depth_func(glow::LEQUAL);
            self.gl.disable(glow::CULL_FACE);
        }

        self.shader.set_uniform("u_view", sky_view(view));
        self.shader.set_uniform("u_projection", projection);
        self.shader.set_uniform("u_cubemap", 0i32);
        self.texture.bind_for_sampling(0);

        self.vertex_array.bind();
        unsafe {
            self.gl.draw_arrays(glow::TRIANGLES, 0, self.vertex_count);
        }
        self.vertex_array.unbind();

        unsafe {
            self.gl.depth_func(previous_depth_func);
            if culling {
                self.gl.enable(glow::CULL_FACE);
            }
        }
    }
}
