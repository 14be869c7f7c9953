//! Shader stages and linked programs.
//!
//! A [`Shader`] is one compiled stage (vertex, fragment, geometry, tessellation or compute)
//! and cannot exist in a failed state. [`ShaderProgram`] links stages into a graphics program,
//! or wraps a single compute stage together with its work group counts for
//! [`dispatch`](ShaderProgram::dispatch). Values reach uniforms through the [`Uniform`] trait,
//! looked up by name on every call.

use std::{path::Path, sync::Arc};

use glam::{IVec2, IVec3, Mat3, Mat4, UVec3, Vec2, Vec3, Vec4};
use glow::HasContext;

use crate::{
    abs::RenderContext,
    error::{Error, Result},
};

/// Pipeline stage a shader is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::TessControl => glow::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => glow::TESS_EVALUATION_SHADER,
            ShaderStage::Compute => glow::COMPUTE_SHADER,
        }
    }
}

/// Represents an individual compiled OpenGL shader stage.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: glow::Shader,
    stage: ShaderStage,
}

impl Shader {
    /// Compiles `source` as a `stage` shader.
    pub fn new(ctx: &RenderContext, stage: ShaderStage, source: &str) -> Result<Self> {
        let gl = ctx.gl();
        unsafe {
            let shader = gl.create_shader(stage.gl_enum()).map_err(Error::Device)?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                log::error!("{stage:?} shader failed to compile: {log}");
                return Err(Error::ShaderCompile { stage, log });
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
                stage,
            })
        }
    }

    /// Reads and compiles a shader source file.
    pub fn from_file(ctx: &RenderContext, stage: ShaderStage, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| Error::ShaderSource {
            path: path.to_owned(),
            source,
        })?;
        Self::new(ctx, stage, &source)
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

fn with_location(
    gl: &glow::Context,
    program: glow::Program,
    name: &str,
    set: impl FnOnce(&glow::UniformLocation),
) {
    if let Some(location) = unsafe { gl.get_uniform_location(program, name) } {
        set(&location);
    }
}

/// A value that can be uploaded to a named uniform.
pub trait Uniform {
    /// Sets the value of the uniform variable in the given shader program, which must be
    /// the current program.
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str);
}

impl Uniform for bool {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_1_i32(Some(loc), *self as i32)
        });
    }
}

impl Uniform for f32 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_1_f32(Some(loc), *self)
        });
    }
}

impl Uniform for i32 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_1_i32(Some(loc), *self)
        });
    }
}

impl Uniform for u32 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_1_u32(Some(loc), *self)
        });
    }
}

impl Uniform for Vec2 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_2_f32(Some(loc), self.x, self.y)
        });
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_3_f32(Some(loc), self.x, self.y, self.z)
        });
    }
}

impl Uniform for Vec4 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_4_f32(Some(loc), self.x, self.y, self.z, self.w)
        });
    }
}

impl Uniform for IVec2 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_2_i32(Some(loc), self.x, self.y)
        });
    }
}

impl Uniform for IVec3 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_3_i32(Some(loc), self.x, self.y, self.z)
        });
    }
}

impl Uniform for Mat3 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_matrix_3_f32_slice(Some(loc), false, self.as_ref())
        });
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| unsafe {
            gl.uniform_matrix_4_f32_slice(Some(loc), false, self.as_ref())
        });
    }
}

impl Uniform for [Vec3] {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        with_location(gl, program, name, |loc| {
            let data: Vec<f32> = self.iter().flat_map(|v| v.to_array()).collect();
            unsafe { gl.uniform_3_f32_slice(Some(loc), &data) }
        });
    }
}

impl<const N: usize> Uniform for [Vec3; N] {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        self.as_slice().set_uniform(gl, program, name);
    }
}

impl<T: Uniform + ?Sized> Uniform for &T {
    fn set_uniform(&self, gl: &glow::Context, program: glow::Program, name: &str) {
        (*self).set_uniform(gl, program, name);
    }
}

/// A linked program, either graphics stages or a single compute stage.
pub struct ShaderProgram {
    gl: Arc<glow::Context>,
    id: glow::Program,
    dispatch_groups: Option<UVec3>,
}

impl ShaderProgram {
    /// Links a new shader program from the given shaders. The stages are detached after a
    /// successful link and may be dropped independently of the program.
    pub fn new(ctx: &RenderContext, shaders: &[&Shader]) -> Result<Self> {
        let gl = ctx.gl();
        unsafe {
            let program = gl.create_program().map_err(Error::Device)?;

            for shader in shaders {
                gl.attach_shader(program, shader.id);
            }

            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                log::error!("Shader program failed to link: {log}");
                return Err(Error::ProgramLink(log));
            }

            for shader in shaders {
                gl.detach_shader(program, shader.id);
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: program,
                dispatch_groups: None,
            })
        }
    }

    /// Links a compute program that dispatches `groups` work groups.
    pub fn compute(ctx: &RenderContext, shader: &Shader, groups: UVec3) -> Result<Self> {
        if shader.stage() != ShaderStage::Compute {
            log::warn!("Linking a {:?} shader as a compute program", shader.stage());
        }
        let mut program = Self::new(ctx, &[shader])?;
        program.dispatch_groups = Some(groups);
        Ok(program)
    }

    /// Makes this the active program.
    pub fn use_program(&self) {
        unsafe {
            self.gl.use_program(Some(self.id));
        }
    }

    /// Sets a uniform variable in the shader program. The location is looked up on every
    /// call and the program is made current first.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        self.use_program();
        value.set_uniform(&self.gl, self.id, name);
    }

    pub fn set_dispatch_groups(&mut self, groups: UVec3) {
        self.dispatch_groups = Some(groups);
    }

    pub fn dispatch_groups(&self) -> Option<UVec3> {
        self.dispatch_groups
    }

    /// Runs the compute program over its dispatch groups.
    pub fn dispatch(&self) {
        let Some(groups) = self.dispatch_groups else {
            log::warn!("Dispatch called on a program without compute groups");
            return;
        };
        self.use_program();
        unsafe {
            self.gl.dispatch_compute(groups.x, groups.y, groups.z);
        }
    }

    /// Waits for shader writes of the given kinds to become visible, for example
    /// `glow::SHADER_IMAGE_ACCESS_BARRIER_BIT` after writing an image from a compute pass.
    pub fn memory_barrier(&self, barriers: u32) {
        unsafe {
            self.gl.memory_barrier(barriers);
        }
    }

    pub fn id(&self) -> glow::Program {
        self.id
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_map_to_gl() {
        assert_eq!(ShaderStage::Vertex.gl_enum(), glow::VERTEX_SHADER);
        assert_eq!(ShaderStage::TessEvaluation.gl_enum(), glow::TESS_EVALUATION_SHADER);
        assert_eq!(ShaderStage::Compute.gl_enum(), glow::COMPUTE_SHADER);
    }

    #[test]
    fn compile_errors_carry_the_log() {
        let err = Error::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:1: syntax error".into(),
        };
        let message = err.to_string();
        assert!(message.starts_with("Fragment shader failed to compile"));
        assert!(message.contains("syntax error"));
    }
}
