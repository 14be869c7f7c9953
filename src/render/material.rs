//! Materials.
//!
//! A [`Material`] pairs a shader program with a set of named parameters and uploads them on
//! [`Material::bind`]. Materials are shared between submeshes through [`SharedMaterial`].

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use glam::{Vec2, Vec3, Vec4};
use lm3d_core::{
    MaterialParams, MaterialValue,
    material::{
        BASE_COLOR_FACTOR, BASE_COLOR_TEXTURE, DEFAULT_MATERIAL_NAME, EMISSIVE_FACTOR,
        EMISSIVE_TEXTURE, METALLIC_FACTOR, METALLIC_ROUGHNESS_TEXTURE, NORMAL_SCALE,
        NORMAL_TEXTURE, OCCLUSION_STRENGTH, OCCLUSION_TEXTURE, ROUGHNESS_FACTOR,
    },
};

use crate::abs::{ShaderProgram, Texture};

/// A material referenced by any number of submeshes. Released when the last one drops it.
pub type SharedMaterial = Rc<RefCell<Material>>;

/// A shader program plus the uniform values it is drawn with.
pub struct Material {
    name: String,
    shader: Option<Rc<ShaderProgram>>,
    params: MaterialParams<Texture>,
    texture_unit: Cell<u32>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new(DEFAULT_MATERIAL_NAME)
    }
}

impl Material {
    /// Creates a material without a shader and with the default PBR parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: None,
            params: MaterialParams::default(),
            texture_unit: Cell::new(0),
        }
    }

    pub fn with_shader(name: impl Into<String>, shader: Rc<ShaderProgram>) -> Self {
        let mut material = Self::new(name);
        material.shader = Some(shader);
        material
    }

    /// Wraps the material for sharing between submeshes.
    pub fn shared(self) -> SharedMaterial {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn shader(&self) -> Option<&Rc<ShaderProgram>> {
        self.shader.as_ref()
    }

    pub fn set_shader(&mut self, shader: Option<Rc<ShaderProgram>>) {
        self.shader = shader;
    }

    pub fn params(&self) -> &MaterialParams<Texture> {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut MaterialParams<Texture> {
        &mut self.params
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.params.set_float(name, value);
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) {
        self.params.set_vec2(name, value);
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.params.set_vec3(name, value);
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.params.set_vec4(name, value);
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.params.set_int(name, value);
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.params.set_bool(name, value);
    }

    pub fn set_texture(&mut self, name: &str, texture: Option<Rc<Texture>>) {
        self.params.set_texture(name, texture);
    }

    pub fn get_float(&self, name: &str) -> f32 {
        self.params.get_float(name)
    }

    pub fn get_vec2(&self, name: &str) -> Vec2 {
        self.params.get_vec2(name)
    }

    pub fn get_vec3(&self, name: &str) -> Vec3 {
        self.params.get_vec3(name)
    }

    pub fn get_vec4(&self, name: &str) -> Vec4 {
        self.params.get_vec4(name)
    }

    pub fn get_int(&self, name: &str) -> i32 {
        self.params.get_int(name)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.params.get_bool(name)
    }

    pub fn get_texture(&self, name: &str) -> Option<Rc<Texture>> {
        self.params.get_texture(name)
    }

    pub fn set_base_color(&mut self, color: Vec4) {
        self.set_vec4(BASE_COLOR_FACTOR, color);
    }

    pub fn set_base_color_texture(&mut self, texture: Option<Rc<Texture>>) {
        self.set_texture(BASE_COLOR_TEXTURE, texture);
    }

    pub fn set_metallic(&mut self, metallic: f32) {
        self.set_float(METALLIC_FACTOR, metallic);
    }

    pub fn set_roughness(&mut self, roughness: f32) {
        self.set_float(ROUGHNESS_FACTOR, roughness);
    }

    pub fn set_metallic_roughness_texture(&mut self, texture: Option<Rc<Texture>>) {
        self.set_texture(METALLIC_ROUGHNESS_TEXTURE, texture);
    }

    pub fn set_emissive(&mut self, emissive: Vec3) {
        self.set_vec3(EMISSIVE_FACTOR, emissive);
    }

    pub fn set_emissive_texture(&mut self, texture: Option<Rc<Texture>>) {
        self.set_texture(EMISSIVE_TEXTURE, texture);
    }

    pub fn set_normal_texture(&mut self, texture: Option<Rc<Texture>>, scale: f32) {
        self.set_texture(NORMAL_TEXTURE, texture);
        self.set_float(NORMAL_SCALE, scale);
    }

    pub fn set_occlusion_texture(&mut self, texture: Option<Rc<Texture>>, strength: f32) {
        self.set_texture(OCCLUSION_TEXTURE, texture);
        self.set_float(OCCLUSION_STRENGTH, strength);
    }

    /// Texture units claimed by the last [`bind`](Self::bind).
    pub fn texture_units_used(&self) -> u32 {
        self.texture_unit.get()
    }

    /// Activates the shader and uploads every parameter. Textures take units 0, 1, 2, ... in
    /// parameter insertion order. Does nothing but warn if no shader is assigned.
    pub fn bind(&self) {
        let Some(shader) = &self.shader else {
            log::warn!("Material '{}' has no shader assigned", self.name);
            return;
        };

        shader.use_program();
        self.texture_unit.set(0);

        for (name, value) in self.params.iter() {
            match value {
                MaterialValue::Float(v) => shader.set_uniform(name, *v),
                MaterialValue::Vec2(v) => shader.set_uniform(name, *v),
                MaterialValue::Vec3(v) => shader.set_uniform(name, *v),
                MaterialValue::Vec4(v) => shader.set_uniform(name, *v),
                MaterialValue::Int(v) => shader.set_uniform(name, *v),
                MaterialValue::Bool(v) => shader.set_uniform(name, *v),
                MaterialValue::Texture(Some(texture)) => {
                    let unit = self.texture_unit.get();
                    texture.bind_for_sampling(unit);
                    shader.set_uniform(name, unit as i32);
                    self.texture_unit.set(unit + 1);
                }
                MaterialValue::Texture(None) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lm3d_core::material::TEXTURE_FLAGS;

    use super::*;

    #[test]
    fn default_material_has_pbr_parameters() {
        let material = Material::default();
        assert_eq!(material.name(), DEFAULT_MATERIAL_NAME);
        assert!(material.shader().is_none());
        assert_eq!(material.get_vec4(BASE_COLOR_FACTOR), Vec4::ONE);
        assert_eq!(material.get_float(ROUGHNESS_FACTOR), 1.0);
        for (_, flag) in TEXTURE_FLAGS {
            assert!(!material.get_bool(flag));
        }
    }

    #[test]
    fn convenience_setters_write_named_parameters() {
        let mut material = Material::new("Brick");
        material.set_base_color(Vec4::new(0.5, 0.25, 0.125, 1.0));
        material.set_metallic(0.0);
        material.set_roughness(0.75);
        material.set_emissive(Vec3::X);
        material.set_normal_texture(None, 0.5);
        material.set_occlusion_texture(None, 0.25);

        assert_eq!(material.get_vec4(BASE_COLOR_FACTOR).y, 0.25);
        assert_eq!(material.get_float(METALLIC_FACTOR), 0.0);
        assert_eq!(material.get_float(ROUGHNESS_FACTOR), 0.75);
        assert_eq!(material.get_vec3(EMISSIVE_FACTOR), Vec3::X);
        assert_eq!(material.get_float(NORMAL_SCALE), 0.5);
        assert_eq!(material.get_float(OCCLUSION_STRENGTH), 0.25);
        assert!(material.get_texture(NORMAL_TEXTURE).is_none());
    }

    #[test]
    fn mismatched_getters_fall_back_to_zero() {
        let mut material = Material::new("Typed");
        material.set_int("u_layers", 3);
        assert_eq!(material.get_int("u_layers"), 3);
        assert_eq!(material.get_float("u_layers"), 0.0);
        assert!(!material.get_bool("u_missing"));
        assert_eq!(material.get_vec2("u_missing"), Vec2::ZERO);
    }

    #[test]
    fn binding_without_shader_is_a_no_op() {
        let material = Material::new("Unshaded");
        material.bind();
        assert_eq!(material.texture_units_used(), 0);
    }

    #[test]
    fn shared_materials_see_each_others_edits() {
        let shared = Material::new("Shared").shared();
        let other = Rc::clone(&shared);
        other.borrow_mut().set_name("Renamed");
        assert_eq!(shared.borrow().name(), "Renamed");
    }
}
