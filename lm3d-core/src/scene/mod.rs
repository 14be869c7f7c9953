//! CPU-side scene assets.
//!
//! A [`SceneAsset`] is the result of importing a glTF 2.0 document: geometry with per-
//! primitive submesh ranges, PBR material descriptions, texture and sampler descriptions,
//! decoded images and the node tree of the default scene. Cross references are plain
//! indices into the asset's own vectors; the renderer turns them into shared GPU objects.

mod gltf_import;
mod node;

use std::path::Path;

use glam::{Vec3, Vec4};

use crate::{
    error::SceneError,
    geometry::{BoundingBox, MeshData},
    texture::{PixelFormat, SamplerParams},
};

pub use node::ModelNode;

/// Geometry of one source mesh. Submesh materials are indices into
/// [`SceneAsset::materials`].
#[derive(Clone, Debug, Default)]
pub struct MeshAsset {
    pub name: Option<String>,
    pub data: MeshData<usize>,
}

/// PBR metallic-roughness material description. Textures are indices into
/// [`SceneAsset::textures`].
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialAsset {
    pub name: String,
    pub base_color_factor: Vec4,
    pub base_color_texture: Option<usize>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<usize>,
    pub normal_texture: Option<usize>,
    pub normal_scale: f32,
    pub emissive_factor: Vec3,
    pub emissive_texture: Option<usize>,
    pub occlusion_texture: Option<usize>,
    pub occlusion_strength: f32,
}

impl Default for MaterialAsset {
    fn default() -> Self {
        Self {
            name: "Unnamed".to_owned(),
            base_color_factor: Vec4::ONE,
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            normal_texture: None,
            normal_scale: 1.0,
            emissive_factor: Vec3::ZERO,
            emissive_texture: None,
            occlusion_texture: None,
            occlusion_strength: 1.0,
        }
    }
}

/// A texture: an image plus the sampler state to use with it.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureAsset {
    pub name: Option<String>,
    pub image: usize,
    pub sampler: SamplerParams,
}

/// Decoded 8-bit pixel data, rows top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAsset {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

/// Everything imported from one scene document.
#[derive(Clone, Debug, Default)]
pub struct SceneAsset {
    pub meshes: Vec<MeshAsset>,
    pub materials: Vec<MaterialAsset>,
    pub textures: Vec<TextureAsset>,
    /// Images in source order. `None` marks an image whose pixel format is not supported.
    pub images: Vec<Option<ImageAsset>>,
    /// Synthetic root whose children are the nodes of the default scene.
    pub root: ModelNode,
}

/// Returns `true` if the path names a `.gltf` or `.glb` file, in any letter case.
pub fn is_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gltf") || e.eq_ignore_ascii_case("glb"))
}

impl SceneAsset {
    /// Imports a `.gltf` (JSON) or `.glb` (binary) file, resolving external buffers and
    /// images relative to it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        if !is_supported_extension(path) {
            return Err(SceneError::UnsupportedExtension(path.to_owned()));
        }

        let (document, buffers, images) = gltf::import(path)?;
        let scene = gltf_import::convert(&document, &buffers, images)?;
        log::info!(
            "Loaded scene {}: {} meshes, {} materials, {} textures",
            path.display(),
            scene.meshes.len(),
            scene.materials.len(),
            scene.textures.len()
        );
        Ok(scene)
    }

    /// Imports a self-contained document from memory. Buffers and images must be embedded.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SceneError> {
        let (document, buffers, images) = gltf::import_slice(bytes)?;
        gltf_import::convert(&document, &buffers, images)
    }

    /// Union of every mesh's raw vertex positions, ignoring node transforms.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(
            self.meshes
                .iter()
                .flat_map(|m| m.data.vertices().iter().map(|v| v.position)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_supported_extension(Path::new("a/b/Model.GLTF")));
        assert!(is_supported_extension(Path::new("scene.glb")));
        assert!(!is_supported_extension(Path::new("scene.obj")));
        assert!(!is_supported_extension(Path::new("gltf")));
    }

    #[test]
    fn load_rejects_unknown_extensions() {
        let err = SceneAsset::load("does/not/exist.fbx").unwrap_err();
        assert!(matches!(err, SceneError::UnsupportedExtension(_)));
    }

    #[test]
    fn load_reports_missing_files() {
        let err = SceneAsset::load("does/not/exist.gltf").unwrap_err();
        assert!(matches!(err, SceneError::Gltf(_)));
    }
}
