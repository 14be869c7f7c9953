//! Models imported from glTF scenes.

use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use fxhash::FxHashMap;
use glam::{Mat4, Vec3};
use lm3d_core::{BoundingBox, MeshData, ModelNode, SceneAsset, material::DEFAULT_MATERIAL_NAME};

use crate::{
    abs::{RenderContext, ShaderProgram, Texture},
    error::Result,
    render::{Material, Mesh, SharedMaterial},
};

/// Uniform that receives the accumulated node transform.
pub const MODEL_MATRIX: &str = "u_modelMatrix";

/// The material a mesh is drawn with when placed by a node: its first submesh's material,
/// else the mesh default.
pub fn node_material<M: Clone>(data: &MeshData<M>, default: Option<&M>) -> Option<M> {
    data.submeshes()
        .first()
        .and_then(|s| s.material.clone())
        .or_else(|| default.cloned())
}

/// Looks up an imported submesh material. A missing one leaves the submesh without a material
/// so the mesh default applies at draw time.
pub fn submesh_material<M: Clone>(materials: &[M], index: usize) -> Option<M> {
    let material = materials.get(index).cloned();
    if material.is_none() {
        log::warn!("Submesh references missing material {index}");
    }
    material
}

/// Meshes, materials and textures of one scene, placed by a node tree.
pub struct Model {
    path: Option<PathBuf>,
    meshes: Vec<Mesh>,
    materials: Vec<SharedMaterial>,
    textures: Vec<Rc<Texture>>,
    default_material: SharedMaterial,
    root: ModelNode,
    bounds: BoundingBox,
}

impl Model {
    /// Loads a `.gltf` or `.glb` file. Every material gets `shader`.
    pub fn load(
        ctx: &RenderContext,
        path: impl AsRef<Path>,
        shader: Option<Rc<ShaderProgram>>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let asset = SceneAsset::load(path)?;
        let mut model = Self::from_asset(ctx, asset, shader)?;
        model.path = Some(path.to_owned());
        Ok(model)
    }

    /// Uploads an imported scene.
    pub fn from_asset(
        ctx: &RenderContext,
        asset: SceneAsset,
        shader: Option<Rc<ShaderProgram>>,
    ) -> Result<Self> {
        let bounds = asset.bounding_box();

        let mut cache: FxHashMap<usize, Rc<Texture>> = FxHashMap::default();
        let mut textures = Vec::new();
        let mut resolve = |index: usize| -> Option<Rc<Texture>> {
            if let Some(texture) = cache.get(&index) {
                return Some(Rc::clone(texture));
            }

            let source = asset.textures.get(index)?;
            let Some(Some(image)) = asset.images.get(source.image) else {
                log::warn!("Texture {index} has no usable image");
                return None;
            };
            match Texture::from_image(ctx, image, source.sampler) {
                Ok(texture) => {
                    let texture = Rc::new(texture);
                    cache.insert(index, Rc::clone(&texture));
                    textures.push(Rc::clone(&texture));
                    Some(texture)
                }
                Err(err) => {
                    log::warn!("Failed to upload texture {index}: {err}");
                    None
                }
            }
        };

        let materials: Vec<SharedMaterial> = asset
            .materials
            .iter()
            .map(|source| {
                let mut material = Material::new(source.name.clone());
                material.set_shader(shader.clone());
                material.params_mut().apply_asset(source, &mut resolve);
                material.shared()
            })
            .collect();

        let mut default_material = Material::new(DEFAULT_MATERIAL_NAME);
        default_material.set_shader(shader);
        let default_material = default_material.shared();

        let mut meshes = Vec::with_capacity(asset.meshes.len());
        for source in asset.meshes {
            let data = source
                .data
                .map_materials(|index| submesh_material(&materials, index));
            let mut mesh = Mesh::new(ctx, data)?;
            mesh.set_default_material(Some(Rc::clone(&default_material)));
            meshes.push(mesh);
        }

        log::info!(
            "Created model with {} meshes, {} materials and {} textures",
            meshes.len(),
            materials.len(),
            textures.len()
        );

        Ok(Self {
            path: None,
            meshes,
            materials,
            textures,
            default_material,
            root: asset.root,
            bounds,
        })
    }

    /// Draws every mesh placed by the node tree, with `root_transform` applied on top.
    pub fn draw(&self, root_transform: Mat4) {
        self.root.walk(root_transform, &mut |node, world| {
            for &index in &node.mesh_indices {
                let Some(mesh) = self.meshes.get(index) else {
                    log::warn!("Node '{}' references missing mesh {index}", node.name);
                    continue;
                };
                if let Some(material) = node_material(mesh.data(), mesh.default_material()) {
                    if let Some(shader) = material.borrow().shader() {
                        shader.set_uniform(MODEL_MATRIX, world);
                    }
                }
                mesh.draw();
            }
        });
    }

    /// Assigns `shader` to every material, including the default one.
    pub fn set_shader_for_all_materials(&self, shader: Rc<ShaderProgram>) {
        for material in self.materials.iter().chain([&self.default_material]) {
            material.borrow_mut().set_shader(Some(Rc::clone(&shader)));
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut [Mesh] {
        &mut self.meshes
    }

    pub fn materials(&self) -> &[SharedMaterial] {
        &self.materials
    }

    pub fn textures(&self) -> &[Rc<Texture>] {
        &self.textures
    }

    pub fn default_material(&self) -> &SharedMaterial {
        &self.default_material
    }

    pub fn root(&self) -> &ModelNode {
        &self.root
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Bounds of the raw mesh positions. Node transforms are not applied.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    pub fn bounding_box_center(&self) -> Vec3 {
        self.bounds.center()
    }

    pub fn bounding_box_size(&self) -> Vec3 {
        self.bounds.size()
    }
}

#[cfg(test)]
mod tests {
    use lm3d_core::geometry;

    use super::*;

    #[test]
    fn node_material_prefers_first_submesh() {
        let mut data: MeshData<&str> = geometry::cube(1.0);
        assert_eq!(node_material(&data, Some(&"default")), Some("default"));

        data.add_submesh(0, 6, Some("first"), None);
        data.add_submesh(6, 6, Some("second"), None);
        assert_eq!(node_material(&data, Some(&"default")), Some("first"));
    }

    #[test]
    fn missing_submesh_material_is_left_unset() {
        let materials = ["red", "green"];
        assert_eq!(submesh_material(&materials, 1), Some("green"));
        assert_eq!(submesh_material(&materials, 2), None);

        let mut data: MeshData<usize> = geometry::cube(1.0);
        data.add_submesh(0, 6, Some(5), None);
        let mapped = data.map_materials(|i| submesh_material(&materials, i));
        assert_eq!(mapped.submeshes()[0].material, None);
        assert_eq!(node_material(&mapped, Some(&"default")), Some("default"));
    }

    #[test]
    fn node_material_falls_back_when_first_submesh_is_untextured() {
        let mut data: MeshData<&str> = geometry::cube(1.0);
        data.add_submesh(0, 6, None, None);
        data.add_submesh(6, 6, Some("second"), None);
        assert_eq!(node_material(&data, Some(&"default")), Some("default"));
        assert_eq!(node_material(&data, None), None);
    }
}
