//! Engine error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::abs::ShaderStage;

/// Errors raised while constructing or updating GPU resources.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load texture {path:?}: {reason}")]
    TextureLoad { path: PathBuf, reason: String },

    #[error("a cubemap needs exactly 6 faces, got {0}")]
    CubemapFaces(usize),

    #[error("cubemap face {face} is {actual:?}, expected {expected:?}")]
    CubemapFaceSize {
        face: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureDataSize { expected: usize, actual: usize },

    #[error("failed to read shader source {path:?}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage:?} shader failed to compile:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{0}")]
    ProgramLink(String),

    #[error("buffer range {offset}..{} exceeds capacity {capacity}", .offset + .size)]
    BufferRange {
        offset: usize,
        size: usize,
        capacity: usize,
    },

    #[error("failed to map buffer of {0} bytes")]
    BufferMap(usize),

    #[error("framebuffer incomplete (status 0x{0:X})")]
    FramebufferIncomplete(u32),

    #[error("failed to create GPU object: {0}")]
    Device(String),

    #[error(transparent)]
    Scene(#[from] lm3d_core::SceneError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
