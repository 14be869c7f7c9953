//! GPU-free core of the lumen3d engine.
//!
//! This crate holds everything that can be computed without a graphics context: vertex
//! formats, mesh geometry processing, material parameter sets, texture descriptors, the
//! camera, and glTF scene import into CPU-side assets.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod material;
pub mod scene;
pub mod texture;
pub mod vertex;

pub use camera::Camera;
pub use error::SceneError;
pub use geometry::{BoundingBox, MeshData, Submesh};
pub use material::{MaterialParams, MaterialValue};
pub use scene::{ModelNode, SceneAsset};
pub use texture::*;
pub use vertex::{Vertex, Vertex3D, VertexAttribute, VertexLayout};
