//! Drawable resources built on top of [`crate::abs`].

pub mod material;
pub mod mesh;
pub mod model;

pub use material::*;
pub use mesh::*;
pub use model::*;
