//! Conversion from a parsed glTF document into a [`SceneAsset`].

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use gltf::{
    buffer, image,
    mesh::Mode,
    scene::Transform,
    texture::{MagFilter, MinFilter, WrappingMode},
};

use super::{ImageAsset, MaterialAsset, MeshAsset, ModelNode, SceneAsset, TextureAsset};
use crate::{
    error::SceneError,
    geometry::MeshData,
    texture::{PixelFormat, SamplerParams, TextureFilter, TextureWrap},
    vertex::Vertex3D,
};

pub(super) fn convert(
    document: &gltf::Document,
    buffers: &[buffer::Data],
    images: Vec<image::Data>,
) -> Result<SceneAsset, SceneError> {
    if document.meshes().next().is_none() {
        return Err(SceneError::Empty);
    }

    let materials = document.materials().map(convert_material).collect();
    let textures = document.textures().map(convert_texture).collect();
    let images = images.into_iter().map(convert_image).collect();
    let meshes = document
        .meshes()
        .map(|mesh| convert_mesh(&mesh, buffers))
        .collect();

    let mut root = ModelNode::new("root", Mat4::IDENTITY);
    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        root.children = scene.nodes().map(|n| convert_node(&n)).collect();
    }

    Ok(SceneAsset {
        meshes,
        materials,
        textures,
        images,
        root,
    })
}

/// Concatenates all primitives of a mesh, one submesh per primitive.
fn convert_mesh(mesh: &gltf::Mesh<'_>, buffers: &[buffer::Data]) -> MeshAsset {
    let mut vertices: Vec<Vertex3D> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut ranges = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            log::warn!(
                "Mesh {:?} primitive {} uses {:?}, drawing it as triangles",
                mesh.name(),
                primitive.index(),
                primitive.mode()
            );
        }

        let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
        let base = vertices.len() as u32;
        let index_offset = indices.len() as u32;

        let Some(positions) = reader.read_positions() else {
            log::warn!("Mesh {:?} primitive {} has no positions", mesh.name(), primitive.index());
            ranges.push((index_offset, 0, primitive.material().index()));
            continue;
        };
        vertices.extend(positions.map(|p| Vertex3D::new(Vec3::from(p), Vec3::Z, Vec2::ZERO)));
        let added = &mut vertices[base as usize..];

        if let Some(normals) = reader.read_normals() {
            for (v, n) in added.iter_mut().zip(normals) {
                v.normal = Vec3::from(n);
            }
        }
        if let Some(uvs) = reader.read_tex_coords(0) {
            for (v, uv) in added.iter_mut().zip(uvs.into_f32()) {
                v.tex_coords = Vec2::from(uv);
            }
        }

        let count = added.len() as u32;
        let primitive_indices = match reader.read_indices() {
            Some(read) => rebase_indices(read.into_u32(), base, count),
            None => rebase_indices(0..count, base, count),
        };
        let Some(primitive_indices) = primitive_indices else {
            log::warn!(
                "Mesh {:?} primitive {} has indices outside its {count} vertices, skipping it",
                mesh.name(),
                primitive.index()
            );
            vertices.truncate(base as usize);
            ranges.push((index_offset, 0, primitive.material().index()));
            continue;
        };
        indices.extend(primitive_indices);

        ranges.push((
            index_offset,
            indices.len() as u32 - index_offset,
            primitive.material().index(),
        ));
    }

    let mut data = MeshData::new(vertices, indices);
    for (offset, count, material) in ranges {
        data.add_submesh(offset, count, material, None);
    }
    if data.vertex_count() == 0 {
        log::warn!("Mesh {:?} has no vertices", mesh.name());
    } else {
        data.calculate_tangents();
    }
    log::debug!(
        "Imported mesh {:?}: {} vertices, {} indices, {} submeshes",
        mesh.name(),
        data.vertex_count(),
        data.index_count(),
        data.submesh_count()
    );

    MeshAsset {
        name: mesh.name().map(str::to_owned),
        data,
    }
}

/// Offsets primitive-local indices by `base`. Returns `None` if any index does not refer to
/// one of the primitive's `count` vertices.
fn rebase_indices(raw: impl Iterator<Item = u32>, base: u32, count: u32) -> Option<Vec<u32>> {
    raw.map(|i| if i < count { base.checked_add(i) } else { None })
        .collect()
}

fn convert_material(material: gltf::Material<'_>) -> MaterialAsset {
    let pbr = material.pbr_metallic_roughness();
    let normal = material.normal_texture();
    let occlusion = material.occlusion_texture();

    MaterialAsset {
        name: material
            .name()
            .filter(|n| !n.is_empty())
            .unwrap_or("Unnamed")
            .to_owned(),
        base_color_factor: Vec4::from(pbr.base_color_factor()),
        base_color_texture: pbr.base_color_texture().map(|t| t.texture().index()),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        metallic_roughness_texture: pbr.metallic_roughness_texture().map(|t| t.texture().index()),
        normal_texture: normal.as_ref().map(|t| t.texture().index()),
        normal_scale: normal.as_ref().map_or(1.0, |t| t.scale()),
        emissive_factor: Vec3::from(material.emissive_factor()),
        emissive_texture: material.emissive_texture().map(|t| t.texture().index()),
        occlusion_texture: occlusion.as_ref().map(|t| t.texture().index()),
        occlusion_strength: occlusion.as_ref().map_or(1.0, |t| t.strength()),
    }
}

fn convert_texture(texture: gltf::Texture<'_>) -> TextureAsset {
    let sampler = texture.sampler();
    let min_filter = sampler.min_filter().map_or(TextureFilter::Linear, |f| match f {
        MinFilter::Nearest => TextureFilter::Nearest,
        MinFilter::Linear => TextureFilter::Linear,
        MinFilter::NearestMipmapNearest => TextureFilter::NearestMipmapNearest,
        MinFilter::LinearMipmapNearest => TextureFilter::LinearMipmapNearest,
        MinFilter::NearestMipmapLinear => TextureFilter::NearestMipmapLinear,
        MinFilter::LinearMipmapLinear => TextureFilter::LinearMipmapLinear,
    });
    let mag_filter = match sampler.mag_filter() {
        Some(MagFilter::Nearest) => TextureFilter::Nearest,
        _ => TextureFilter::Linear,
    };

    TextureAsset {
        name: texture.name().map(str::to_owned),
        image: texture.source().index(),
        sampler: SamplerParams {
            min_filter,
            mag_filter,
            wrap_s: convert_wrap(sampler.wrap_s()),
            wrap_t: convert_wrap(sampler.wrap_t()),
            wrap_r: TextureWrap::Repeat,
        },
    }
}

fn convert_wrap(mode: WrappingMode) -> TextureWrap {
    match mode {
        WrappingMode::ClampToEdge => TextureWrap::ClampToEdge,
        WrappingMode::MirroredRepeat => TextureWrap::MirroredRepeat,
        WrappingMode::Repeat => TextureWrap::Repeat,
    }
}

fn convert_image(image: image::Data) -> Option<ImageAsset> {
    let format = match image.format {
        image::Format::R8 => PixelFormat::Red,
        image::Format::R8G8 => PixelFormat::Rg,
        image::Format::R8G8B8 => PixelFormat::Rgb,
        image::Format::R8G8B8A8 => PixelFormat::Rgba,
        other => {
            log::warn!("Skipping {}x{} image with unsupported format {other:?}", image.width, image.height);
            return None;
        }
    };

    Some(ImageAsset {
        width: image.width,
        height: image.height,
        format,
        pixels: image.pixels,
    })
}

fn convert_node(node: &gltf::Node<'_>) -> ModelNode {
    let transform = match node.transform() {
        Transform::Matrix { matrix } => Mat4::from_cols_array_2d(&matrix),
        Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => Mat4::from_scale_rotation_translation(
            Vec3::from(scale),
            Quat::from_array(rotation),
            Vec3::from(translation),
        ),
    };

    ModelNode {
        name: node.name().unwrap_or_default().to_owned(),
        transform,
        mesh_indices: node.mesh().map(|m| m.index()).into_iter().collect(),
        children: node.children().map(|c| convert_node(&c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec3, Vec4};

    use super::rebase_indices;
    use crate::{
        SceneAsset, SceneError,
        texture::{PixelFormat, TextureFilter, TextureWrap},
    };

    /// One triangle shared by two meshes, two materials, one 1x1 red texture and a two-level
    /// node hierarchy. Buffer and image are embedded as data URIs.
    const DOCUMENT: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "Parent", "mesh": 0, "translation": [1, 2, 3], "children": [1] },
            { "name": "Child", "mesh": 1, "matrix": [2,0,0,0, 0,2,0,0, 0,0,2,0, 0,0,0,1] },
            { "name": "Unused", "mesh": 1 }
        ],
        "meshes": [
            {
                "name": "Tri",
                "primitives": [
                    { "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 }, "indices": 3, "material": 0 },
                    { "attributes": { "POSITION": 0 } }
                ]
            },
            { "primitives": [ { "attributes": { "POSITION": 0, "TEXCOORD_0": 2 }, "material": 1 } ] }
        ],
        "materials": [
            {
                "name": "Red",
                "pbrMetallicRoughness": {
                    "baseColorFactor": [1, 0, 0, 1],
                    "baseColorTexture": { "index": 0 },
                    "metallicFactor": 0.5
                },
                "normalTexture": { "index": 0, "scale": 2 }
            },
            { "occlusionTexture": { "index": 0, "strength": 0.5 }, "emissiveFactor": [0, 1, 0] }
        ],
        "textures": [ { "sampler": 0, "source": 0 } ],
        "samplers": [ { "magFilter": 9728, "minFilter": 9987, "wrapS": 33071, "wrapT": 33648 } ],
        "images": [ { "uri": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGP4z8DwHwAFAAH/iZk9HQAAAABJRU5ErkJggg==" } ],
        "buffers": [ {
            "byteLength": 104,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIAAAA="
        } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 72, "byteLength": 24, "target": 34962 },
            { "buffer": 0, "byteOffset": 96, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    fn load() -> SceneAsset {
        SceneAsset::from_slice(DOCUMENT.as_bytes()).expect("embedded document should import")
    }

    #[test]
    fn meshes_and_materials_match_source_counts() {
        let scene = load();
        assert_eq!(scene.meshes.len(), 2);
        assert_eq!(scene.materials.len(), 2);

        for mesh in &scene.meshes {
            assert!(mesh.data.is_valid());
            for submesh in mesh.data.submeshes() {
                if let Some(material) = submesh.material {
                    assert!(material < scene.materials.len());
                }
            }
        }
    }

    #[test]
    fn primitives_become_submeshes() {
        let scene = load();
        let tri = &scene.meshes[0];
        assert_eq!(tri.name.as_deref(), Some("Tri"));
        assert_eq!(tri.data.vertex_count(), 6);
        assert_eq!(tri.data.indices(), &[0, 1, 2, 3, 4, 5]);

        let ranges: Vec<_> = tri
            .data
            .submeshes()
            .iter()
            .map(|s| (s.index_offset, s.index_count, s.material))
            .collect();
        assert_eq!(ranges, vec![(0, 3, Some(0)), (3, 3, None)]);

        let second_primitive = &tri.data.vertices()[3];
        assert_eq!(second_primitive.normal, Vec3::Z);
        assert!(second_primitive.tex_coords.abs_diff_eq(glam::Vec2::ZERO, 0.0));
        assert!(tri.data.vertices()[0].tangent.abs_diff_eq(Vec3::X, 1e-5));

        let unnamed = &scene.meshes[1];
        assert!(unnamed.name.is_none());
        assert_eq!(unnamed.data.submeshes()[0].material, Some(1));
    }

    #[test]
    fn materials_carry_pbr_values() {
        let scene = load();
        let red = &scene.materials[0];
        assert_eq!(red.name, "Red");
        assert_eq!(red.base_color_factor, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(red.base_color_texture, Some(0));
        assert_eq!(red.metallic_factor, 0.5);
        assert_eq!(red.roughness_factor, 1.0);
        assert_eq!(red.normal_texture, Some(0));
        assert_eq!(red.normal_scale, 2.0);
        assert_eq!(red.occlusion_texture, None);

        let other = &scene.materials[1];
        assert_eq!(other.name, "Unnamed");
        assert_eq!(other.occlusion_texture, Some(0));
        assert_eq!(other.occlusion_strength, 0.5);
        assert_eq!(other.emissive_factor, Vec3::Y);
    }

    #[test]
    fn textures_and_samplers() {
        let scene = load();
        assert_eq!(scene.textures.len(), 1);
        let sampler = scene.textures[0].sampler;
        assert_eq!(sampler.min_filter, TextureFilter::LinearMipmapLinear);
        assert_eq!(sampler.mag_filter, TextureFilter::Nearest);
        assert_eq!(sampler.wrap_s, TextureWrap::ClampToEdge);
        assert_eq!(sampler.wrap_t, TextureWrap::MirroredRepeat);

        let image = scene.images[scene.textures[0].image]
            .as_ref()
            .expect("png should decode");
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.format, PixelFormat::Rgba);
        assert_eq!(image.pixels, vec![255, 0, 0, 255]);
    }

    #[test]
    fn node_tree_follows_default_scene() {
        let scene = load();
        assert_eq!(scene.root.children.len(), 1);
        assert_eq!(scene.root.node_count(), 3);
        assert!(scene.root.find("Unused").is_none());

        let mut placed = Vec::new();
        scene.root.walk(glam::Mat4::IDENTITY, &mut |node, world| {
            if !node.mesh_indices.is_empty() {
                placed.push((node.mesh_indices[0], world.transform_point3(Vec3::ONE)));
            }
        });
        assert_eq!(
            placed,
            vec![(0, Vec3::new(2.0, 3.0, 4.0)), (1, Vec3::new(3.0, 4.0, 5.0))]
        );
    }

    #[test]
    fn bounding_box_ignores_node_transforms() {
        let bounds = load().bounding_box();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }

    const BAD_INDICES: &str = r#"{
        "asset": { "version": "2.0" },
        "meshes": [ {
            "primitives": [
                { "attributes": { "POSITION": 0 } },
                { "attributes": { "POSITION": 0 }, "indices": 1 }
            ]
        } ],
        "buffers": [ {
            "byteLength": 48,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAEAAAD/////"
        } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 12, "target": 34963 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
            { "bufferView": 1, "componentType": 5125, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    #[test]
    fn out_of_range_indices_skip_the_primitive() {
        let scene = SceneAsset::from_slice(BAD_INDICES.as_bytes()).expect("import should not fail");
        let data = &scene.meshes[0].data;
        assert_eq!(data.vertex_count(), 3);
        assert_eq!(data.indices(), &[0, 1, 2]);
        assert!(data.is_valid());

        let ranges: Vec<_> = data
            .submeshes()
            .iter()
            .map(|s| (s.index_offset, s.index_count))
            .collect();
        assert_eq!(ranges, vec![(0, 3), (3, 0)]);
    }

    #[test]
    fn rebasing_checks_every_index() {
        assert_eq!(rebase_indices([0, 2, 1].into_iter(), 10, 3), Some(vec![10, 12, 11]));
        assert_eq!(rebase_indices([0, 3].into_iter(), 0, 3), None);
        assert_eq!(rebase_indices([u32::MAX].into_iter(), 3, 3), None);
        assert_eq!(rebase_indices([1].into_iter(), u32::MAX, 2), None);
        assert_eq!(rebase_indices(std::iter::empty(), 5, 0), Some(vec![]));
    }

    #[test]
    fn document_without_meshes_is_empty() {
        let err = SceneAsset::from_slice(br#"{ "asset": { "version": "2.0" } }"#).unwrap_err();
        assert!(matches!(err, SceneError::Empty));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = SceneAsset::from_slice(b"{ not json").unwrap_err();
        assert!(matches!(err, SceneError::Gltf(_)));
    }
}
