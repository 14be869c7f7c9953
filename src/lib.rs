//! lumen3d, a small OpenGL rendering engine.
//!
//! [`abs`] wraps raw GL objects (buffers, vertex arrays, textures, shaders, framebuffers)
//! and [`render`] builds materials, meshes and glTF models out of them. Everything that
//! does not need a GL context lives in [`lm3d_core`], which is re-exported here.

pub mod abs;
pub mod error;
pub mod render;

pub use error::{Error, Result};
pub use lm3d_core;
