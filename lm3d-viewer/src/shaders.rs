//! Shader sources bundled into the viewer binary.
//!
//! Each program lives in its own directory under `shaders/` with `vert.glsl` and
//! `frag.glsl`, or `comp.glsl` for compute programs.

use std::{path::PathBuf, rc::Rc};

use glam::UVec3;
use include_dir::{Dir, include_dir};
use lumen3d::{
    Error, Result,
    abs::{RenderContext, Shader, ShaderProgram, ShaderStage},
};

static SHADERS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/shaders");

/// Returns the bundled source of `<program>/<file>`.
pub fn source(program: &str, file: &str) -> Result<&'static str> {
    let path = PathBuf::from(program).join(file);
    SHADERS
        .get_file(&path)
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| Error::ShaderSource {
            path: path.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no bundled UTF-8 shader with this name",
            ),
        })
}

/// Compiles and links the bundled vertex and fragment stages of `program`.
pub fn program(ctx: &RenderContext, program: &str) -> Result<Rc<ShaderProgram>> {
    let vert = Shader::new(ctx, ShaderStage::Vertex, source(program, "vert.glsl")?)?;
    let frag = Shader::new(ctx, ShaderStage::Fragment, source(program, "frag.glsl")?)?;
    let linked = ShaderProgram::new(ctx, &[&vert, &frag])?;
    log::debug!("Linked shader program '{program}'");
    Ok(Rc::new(linked))
}

/// Compiles the bundled compute stage of `program`.
pub fn compute(ctx: &RenderContext, program: &str, groups: UVec3) -> Result<ShaderProgram> {
    let comp = Shader::new(ctx, ShaderStage::Compute, source(program, "comp.glsl")?)?;
    ShaderProgram::compute(ctx, &comp, groups)
}
