//! Error types for scene import.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while importing a scene file.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The file extension is neither `.gltf` nor `.glb`.
    #[error("unsupported scene file extension: {0:?}")]
    UnsupportedExtension(PathBuf),

    /// The glTF document could not be read or parsed.
    #[error("failed to import glTF document: {0}")]
    Gltf(#[from] gltf::Error),

    /// The document parsed but contains nothing to draw.
    #[error("scene contains no meshes")]
    Empty,
}
