//! Material parameter sets.
//!
//! [`MaterialParams`] is a string-keyed map of typed values that a renderer uploads as
//! uniforms. Texture values are generic so that this crate does not depend on any GPU
//! texture type. Parameters keep their insertion order.

use std::rc::Rc;

use glam::{Vec2, Vec3, Vec4};
use indexmap::IndexMap;

use crate::scene::MaterialAsset;

pub const BASE_COLOR_FACTOR: &str = "u_baseColorFactor";
pub const METALLIC_FACTOR: &str = "u_metallicFactor";
pub const ROUGHNESS_FACTOR: &str = "u_roughnessFactor";
pub const EMISSIVE_FACTOR: &str = "u_emissiveFactor";
pub const NORMAL_SCALE: &str = "u_normalScale";
pub const OCCLUSION_STRENGTH: &str = "u_occlusionStrength";

pub const BASE_COLOR_TEXTURE: &str = "u_baseColorTexture";
pub const METALLIC_ROUGHNESS_TEXTURE: &str = "u_metallicRoughnessTexture";
pub const NORMAL_TEXTURE: &str = "u_normalTexture";
pub const EMISSIVE_TEXTURE: &str = "u_emissiveTexture";
pub const OCCLUSION_TEXTURE: &str = "u_occlusionTexture";

/// The well-known texture slots and the flag that tracks each of them.
pub const TEXTURE_FLAGS: [(&str, &str); 5] = [
    (BASE_COLOR_TEXTURE, "u_hasBaseColorTexture"),
    (METALLIC_ROUGHNESS_TEXTURE, "u_hasMetallicRoughnessTexture"),
    (NORMAL_TEXTURE, "u_hasNormalTexture"),
    (EMISSIVE_TEXTURE, "u_hasEmissiveTexture"),
    (OCCLUSION_TEXTURE, "u_hasOcclusionTexture"),
];

/// Name of the material used when none is given.
pub const DEFAULT_MATERIAL_NAME: &str = "DefaultMaterial";

/// One typed parameter value.
#[derive(Debug)]
pub enum MaterialValue<T> {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    Bool(bool),
    Texture(Option<Rc<T>>),
}

impl<T> Clone for MaterialValue<T> {
    fn clone(&self) -> Self {
        match self {
            MaterialValue::Float(v) => MaterialValue::Float(*v),
            MaterialValue::Vec2(v) => MaterialValue::Vec2(*v),
            MaterialValue::Vec3(v) => MaterialValue::Vec3(*v),
            MaterialValue::Vec4(v) => MaterialValue::Vec4(*v),
            MaterialValue::Int(v) => MaterialValue::Int(*v),
            MaterialValue::Bool(v) => MaterialValue::Bool(*v),
            MaterialValue::Texture(t) => MaterialValue::Texture(t.clone()),
        }
    }
}

/// Ordered parameter map.
#[derive(Debug)]
pub struct MaterialParams<T> {
    values: IndexMap<String, MaterialValue<T>>,
}

impl<T> Clone for MaterialParams<T> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
        }
    }
}

impl<T> Default for MaterialParams<T> {
    /// The PBR defaults: white base color, fully metallic and rough, no emission, unit normal
    /// scale and occlusion strength, and every texture flag cleared.
    fn default() -> Self {
        let mut params = Self::empty();
        params.set_vec4(BASE_COLOR_FACTOR, Vec4::ONE);
        params.set_float(METALLIC_FACTOR, 1.0);
        params.set_float(ROUGHNESS_FACTOR, 1.0);
        params.set_vec3(EMISSIVE_FACTOR, Vec3::ZERO);
        params.set_float(NORMAL_SCALE, 1.0);
        params.set_float(OCCLUSION_STRENGTH, 1.0);
        for (_, flag) in TEXTURE_FLAGS {
            params.set_bool(flag, false);
        }
        params
    }
}

impl<T> MaterialParams<T> {
    /// A parameter set with nothing in it.
    pub fn empty() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: MaterialValue<T>) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.set(name, MaterialValue::Float(value));
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) {
        self.set(name, MaterialValue::Vec2(value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set(name, MaterialValue::Vec3(value));
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.set(name, MaterialValue::Vec4(value));
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set(name, MaterialValue::Int(value));
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set(name, MaterialValue::Bool(value));
    }

    /// Stores a texture. For the well-known PBR slots the matching `u_has*` flag is updated
    /// to reflect whether a texture is present.
    pub fn set_texture(&mut self, name: &str, texture: Option<Rc<T>>) {
        if let Some((_, flag)) = TEXTURE_FLAGS.iter().find(|(slot, _)| *slot == name) {
            self.set_bool(flag, texture.is_some());
        }
        self.set(name, MaterialValue::Texture(texture));
    }

    pub fn get(&self, name: &str) -> Option<&MaterialValue<T>> {
        self.values.get(name)
    }

    pub fn get_float(&self, name: &str) -> f32 {
        match self.get(name) {
            Some(MaterialValue::Float(v)) => *v,
            _ => 0.0,
        }
    }

    pub fn get_vec2(&self, name: &str) -> Vec2 {
        match self.get(name) {
            Some(MaterialValue::Vec2(v)) => *v,
            _ => Vec2::ZERO,
        }
    }

    pub fn get_vec3(&self, name: &str) -> Vec3 {
        match self.get(name) {
            Some(MaterialValue::Vec3(v)) => *v,
            _ => Vec3::ZERO,
        }
    }

    pub fn get_vec4(&self, name: &str) -> Vec4 {
        match self.get(name) {
            Some(MaterialValue::Vec4(v)) => *v,
            _ => Vec4::ZERO,
        }
    }

    pub fn get_int(&self, name: &str) -> i32 {
        match self.get(name) {
            Some(MaterialValue::Int(v)) => *v,
            _ => 0,
        }
    }

    pub fn get_bool(&self, name: &str) -> bool {
        matches!(self.get(name), Some(MaterialValue::Bool(true)))
    }

    pub fn get_texture(&self, name: &str) -> Option<Rc<T>> {
        match self.get(name) {
            Some(MaterialValue::Texture(t)) => t.clone(),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaterialValue<T>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Fills the PBR parameters from an imported material description.
    ///
    /// `resolve` maps a source texture index to a shared texture, or `None` if the texture
    /// could not be created.
    pub fn apply_asset(
        &mut self,
        asset: &MaterialAsset,
        mut resolve: impl FnMut(usize) -> Option<Rc<T>>,
    ) {
        self.set_vec4(BASE_COLOR_FACTOR, asset.base_color_factor);
        self.set_float(METALLIC_FACTOR, asset.metallic_factor);
        self.set_float(ROUGHNESS_FACTOR, asset.roughness_factor);
        self.set_vec3(EMISSIVE_FACTOR, asset.emissive_factor);
        self.set_float(NORMAL_SCALE, asset.normal_scale);
        self.set_float(OCCLUSION_STRENGTH, asset.occlusion_strength);

        let slots = [
            (BASE_COLOR_TEXTURE, asset.base_color_texture),
            (METALLIC_ROUGHNESS_TEXTURE, asset.metallic_roughness_texture),
            (NORMAL_TEXTURE, asset.normal_texture),
            (EMISSIVE_TEXTURE, asset.emissive_texture),
            (OCCLUSION_TEXTURE, asset.occlusion_texture),
        ];
        for (slot, index) in slots {
            if let Some(index) = index {
                let texture = resolve(index);
                if texture.is_none() {
                    log::warn!("Material '{}' references unusable texture {index}", asset.name);
                }
                self.set_texture(slot, texture);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_pbr() {
        let params: MaterialParams<()> = MaterialParams::default();
        assert_eq!(params.get_vec4(BASE_COLOR_FACTOR), Vec4::ONE);
        assert_eq!(params.get_float(METALLIC_FACTOR), 1.0);
        assert_eq!(params.get_float(ROUGHNESS_FACTOR), 1.0);
        assert_eq!(params.get_vec3(EMISSIVE_FACTOR), Vec3::ZERO);
        assert_eq!(params.get_float(NORMAL_SCALE), 1.0);
        assert_eq!(params.get_float(OCCLUSION_STRENGTH), 1.0);
        for (_, flag) in TEXTURE_FLAGS {
            assert!(params.contains(flag));
            assert!(!params.get_bool(flag));
        }
        assert_eq!(params.len(), 11);
    }

    #[test]
    fn getters_default_on_missing_or_mismatched() {
        let mut params: MaterialParams<()> = MaterialParams::empty();
        params.set_int("u_count", 4);
        assert_eq!(params.get_float("u_count"), 0.0);
        assert_eq!(params.get_int("u_count"), 4);
        assert_eq!(params.get_vec2("u_missing"), Vec2::ZERO);
        assert!(!params.get_bool("u_count"));
        assert!(params.get_texture("u_count").is_none());
    }

    #[test]
    fn setting_pbr_textures_updates_flags() {
        let mut params: MaterialParams<u32> = MaterialParams::default();
        params.set_texture(NORMAL_TEXTURE, Some(Rc::new(3)));
        assert!(params.get_bool("u_hasNormalTexture"));
        assert_eq!(params.get_texture(NORMAL_TEXTURE).as_deref(), Some(&3));

        params.set_texture(NORMAL_TEXTURE, None);
        assert!(!params.get_bool("u_hasNormalTexture"));

        params.set_texture("u_customTexture", Some(Rc::new(1)));
        assert!(!params.contains("u_hasCustomTexture"));
    }

    #[test]
    fn apply_asset_resolves_textures() {
        let asset = MaterialAsset {
            name: "Painted".into(),
            base_color_factor: Vec4::new(0.5, 0.25, 1.0, 1.0),
            base_color_texture: Some(0),
            metallic_factor: 0.0,
            occlusion_texture: Some(5),
            ..Default::default()
        };
        let mut params: MaterialParams<usize> = MaterialParams::default();
        params.apply_asset(&asset, |i| (i == 0).then(|| Rc::new(i)));

        assert_eq!(params.get_vec4(BASE_COLOR_FACTOR), asset.base_color_factor);
        assert_eq!(params.get_float(METALLIC_FACTOR), 0.0);
        assert!(params.get_bool("u_hasBaseColorTexture"));
        assert!(!params.get_bool("u_hasOcclusionTexture"));
        assert!(!params.get_bool("u_hasNormalTexture"));
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut params: MaterialParams<()> = MaterialParams::empty();
        params.set_float("b", 1.0);
        params.set_float("a", 2.0);
        params.set_float("b", 3.0);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
