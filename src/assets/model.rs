//! glTF import
//!
//! Flattens the default scene into one [`Object`]: every triangle primitive
//! becomes a mesh with its node's world transform baked into the vertices.

use std::path::Path;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};
use gltf::{image::Format, mesh::Mode};

use crate::{
    error::AssetError,
    gfx::{
        resources::{Material, TextureData},
        scene::{Mesh, Object, Vertex3D},
    },
};

/// Decodes a `.gltf` or `.glb` file. Buffers and images are resolved
/// relative to `path`.
pub fn decode_model(bytes: &[u8], path: &Path) -> Result<Object, AssetError> {
    let gltf_error = |source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(gltf_error)?;
    let base = path.parent();
    let buffers = gltf::import_buffers(&document, base, blob).map_err(gltf_error)?;
    let images = gltf::import_images(&document, base, &buffers).map_err(gltf_error)?;

    let mut materials: Vec<Material> = document
        .materials()
        .map(|material| convert_material(&material, &images, path))
        .collect();
    let default_material = materials.len();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::EmptyModel {
            path: path.to_path_buf(),
        })?;

    let mut meshes = Vec::new();
    let mut stack: Vec<_> = scene
        .nodes()
        .map(|node| (node, Matrix4::identity()))
        .collect();
    while let Some((node, parent)) = stack.pop() {
        let world = parent * Matrix4::from(node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    log::warn!(
                        "skipping {:?} primitive in mesh {:?}",
                        primitive.mode(),
                        mesh.name()
                    );
                    continue;
                }

                let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
                let Some(positions) = reader.read_positions() else {
                    continue;
                };
                let positions: Vec<[f32; 3]> = positions.collect();
                let indices: Vec<u32> = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..positions.len() as u32).collect(),
                };
                if indices.iter().any(|&i| i as usize >= positions.len()) {
                    return Err(AssetError::InvalidIndices {
                        path: path.to_path_buf(),
                        vertex_count: positions.len(),
                    });
                }
                let normals: Vec<[f32; 3]> = match reader.read_normals() {
                    Some(normals) => normals.collect(),
                    None => Mesh::compute_vertex_normals(&positions, &indices),
                };
                let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
                    Some(uvs) => uvs.into_f32().collect(),
                    None => vec![[0.0, 0.0]; positions.len()],
                };

                let vertices = bake_vertices(world, &positions, &normals, &uvs);
                let material = primitive.material().index().unwrap_or(default_material);
                meshes.push(Mesh::new(vertices, indices, material));
            }
        }

        stack.extend(node.children().map(|child| (child, world)));
    }

    if meshes.is_empty() {
        return Err(AssetError::EmptyModel {
            path: path.to_path_buf(),
        });
    }
    if meshes.iter().any(|mesh| mesh.material == default_material) {
        materials.push(Material::default());
    }

    let mut object = Object::new(meshes, materials);
    if let Some(stem) = path.file_stem() {
        object.set_name(stem.to_string_lossy());
    }
    log::info!(
        "decoded '{}': {} meshes, {} materials, {} triangles",
        path.display(),
        object.meshes.len(),
        object.materials.len(),
        object.triangle_count()
    );
    Ok(object)
}

fn bake_vertices(
    world: Matrix4<f32>,
    positions: &[[f32; 3]],
    normals: &[[f32; 3]],
    uvs: &[[f32; 2]],
) -> Vec<Vertex3D> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    let normal_matrix = linear.invert().map(|m| m.transpose()).unwrap_or(linear);

    positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let p = world * Vector4::new(position[0], position[1], position[2], 1.0);
            let n = normal_matrix * Vector3::from(normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]));
            let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
            Vertex3D {
                position: [p.x, p.y, p.z],
                normal: n.into(),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            }
        })
        .collect()
}

fn convert_material(material: &gltf::Material, images: &[gltf::image::Data], path: &Path) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let mut converted = Material::new(
        material.name().unwrap_or("Material"),
        pbr.base_color_factor(),
        pbr.metallic_factor(),
        pbr.roughness_factor(),
    )
    .with_emission(material.emissive_factor());

    let texture = |info: Option<gltf::texture::Info>| -> Option<TextureData> {
        let info = info?;
        if info.tex_coord() != 0 {
            log::debug!("texture uses UV set {}, sampling set 0", info.tex_coord());
        }
        let image = images.get(info.texture().source().index())?;
        let data = to_texture_data(image);
        if data.is_none() {
            log::warn!(
                "dropping {:?} texture of material {:?} in '{}'",
                image.format,
                material.name(),
                path.display()
            );
        }
        data
    };

    if let Some(data) = texture(pbr.base_color_texture()) {
        converted = converted.with_base_color_texture(data);
    }
    if let Some(data) = texture(pbr.metallic_roughness_texture()) {
        converted = converted.with_metallic_roughness_texture(data);
    }
    if let Some(data) = texture(material.emissive_texture()) {
        converted = converted.with_emissive_texture(data);
    }
    converted
}

/// Expands 8 and 16-bit images to RGBA8. Two-channel images are
/// luminance + alpha. Float images are not converted.
fn to_texture_data(image: &gltf::image::Data) -> Option<TextureData> {
    let pixels = &image.pixels;
    // 16-bit channels are stored in native byte order; keep the high byte
    let high = |c: &[u8]| (u16::from_ne_bytes([c[0], c[1]]) >> 8) as u8;
    let wide: Vec<u8> = match image.format {
        Format::R16 | Format::R16G16 | Format::R16G16B16 | Format::R16G16B16A16 => {
            pixels.chunks_exact(2).map(high).collect()
        }
        _ => Vec::new(),
    };

    let rgba8 = match image.format {
        Format::R8G8B8A8 => pixels.clone(),
        Format::R16G16B16A16 => wide,
        Format::R8G8B8 | Format::R16G16B16 => {
            let narrow = if image.format == Format::R8G8B8 { pixels } else { &wide };
            narrow
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect()
        }
        Format::R8G8 | Format::R16G16 => {
            let narrow = if image.format == Format::R8G8 { pixels } else { &wide };
            narrow
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect()
        }
        Format::R8 | Format::R16 => {
            let narrow = if image.format == Format::R8 { pixels } else { &wide };
            narrow.iter().flat_map(|&v| [v, v, v, 255]).collect()
        }
        Format::R32G32B32FLOAT | Format::R32G32B32A32FLOAT => return None,
    };
    Some(TextureData::new(image.width, image.height, rgba8))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_JSON: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "root", "scale": [2, 2, 2], "children": [1] },
            { "mesh": 0, "translation": [1, 0, 0] }
        ],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] }],
        "materials": [{
            "name": "red",
            "pbrMetallicRoughness": { "baseColorFactor": [1, 0, 0, 1], "metallicFactor": 0.25, "roughnessFactor": 0.75 },
            "emissiveFactor": [0.1, 0.2, 0.3]
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "buffers": [{ "byteLength": 42 }]
    }"#;

    fn triangle_bin() -> Vec<u8> {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices: [u16; 3] = [0, 1, 2];
        let mut bin = bytemuck::cast_slice::<f32, u8>(&positions).to_vec();
        bin.extend_from_slice(bytemuck::cast_slice(&indices));
        bin
    }

    /// Packs JSON and a binary chunk into a GLB container
    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let pad = |mut bytes: Vec<u8>, fill: u8| {
            while bytes.len() % 4 != 0 {
                bytes.push(fill);
            }
            bytes
        };
        let json = pad(json.as_bytes().to_vec(), b' ');
        let bin = pad(bin.to_vec(), 0);

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    #[test]
    fn bakes_node_transforms_and_reads_materials() {
        let bytes = glb(TRIANGLE_JSON, &triangle_bin());
        let object = decode_model(&bytes, Path::new("models/triangle.glb")).expect("decode");

        assert_eq!(object.name, "triangle");
        assert_eq!(object.meshes.len(), 1);
        assert_eq!(object.triangle_count(), 1);
        assert_eq!(object.scale, Vector3::new(1.0, 1.0, 1.0));

        // root scale 2 applied after child translation 1
        let vertices = &object.meshes[0].vertices;
        assert_eq!(vertices[0].position, [2.0, 0.0, 0.0]);
        assert_eq!(vertices[1].position, [4.0, 0.0, 0.0]);
        assert_eq!(vertices[2].position, [2.0, 2.0, 0.0]);
        for vertex in vertices {
            let n = Vector3::from(vertex.normal);
            assert!((n - Vector3::unit_z()).magnitude() < 1e-5);
        }

        let material = object.material_for(&object.meshes[0]).expect("material");
        assert_eq!(material.name, "red");
        assert_eq!(material.base_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(material.metallic, 0.25);
        assert_eq!(material.roughness, 0.75);
        assert_eq!(material.emissive, [0.1, 0.2, 0.3]);
        assert!(material.base_color_texture.is_none());
    }

    #[test]
    fn primitives_without_material_get_the_default() {
        let json = TRIANGLE_JSON.replace(r#", "material": 0"#, "");
        let object = decode_model(&glb(&json, &triangle_bin()), Path::new("t.glb")).expect("decode");

        assert_eq!(object.materials.len(), 2);
        let material = object.material_for(&object.meshes[0]).expect("material");
        assert_eq!(material.name, "Default");
    }

    #[test]
    fn scene_without_meshes_is_empty() {
        let json = TRIANGLE_JSON.replace(r#""nodes": [0]"#, r#""nodes": []"#);
        let error = decode_model(&glb(&json, &triangle_bin()), Path::new("empty.glb")).unwrap_err();
        assert!(matches!(error, AssetError::EmptyModel { .. }));
    }

    #[test]
    fn garbage_is_a_gltf_error() {
        let error = decode_model(b"{ not json", Path::new("broken.gltf")).unwrap_err();
        assert!(matches!(error, AssetError::Gltf { .. }));
    }

    #[test]
    fn rgb_images_gain_alpha() {
        let image = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let data = to_texture_data(&image).expect("convert");
        assert_eq!(data.rgba8, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn two_channel_images_are_luminance_alpha() {
        let image = gltf::image::Data {
            pixels: vec![10, 200, 30, 40],
            format: Format::R8G8,
            width: 2,
            height: 1,
        };
        let data = to_texture_data(&image).expect("convert");
        assert_eq!(data.rgba8, vec![10, 10, 10, 200, 30, 30, 30, 40]);
    }

    #[test]
    fn sixteen_bit_images_keep_the_high_byte() {
        let channels: [u16; 4] = [0x1234, 0xff00, 0x00ff, 0xabcd];
        let image = gltf::image::Data {
            pixels: channels.iter().flat_map(|c| c.to_ne_bytes()).collect(),
            format: Format::R16G16B16A16,
            width: 1,
            height: 1,
        };
        let data = to_texture_data(&image).expect("convert");
        assert_eq!(data.rgba8, vec![0x12, 0xff, 0x00, 0xab]);

        let gray = gltf::image::Data {
            pixels: 0x8000u16.to_ne_bytes().to_vec(),
            format: Format::R16,
            width: 1,
            height: 1,
        };
        assert_eq!(to_texture_data(&gray).expect("convert").rgba8, vec![0x80, 0x80, 0x80, 255]);
    }

    #[test]
    fn float_images_are_dropped() {
        let image = gltf::image::Data {
            pixels: vec![0; 16],
            format: Format::R32G32B32A32FLOAT,
            width: 1,
            height: 1,
        };
        assert!(to_texture_data(&image).is_none());
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        // no NORMAL attribute, so normals would be computed from the indices
        let mut bin = triangle_bin();
        bin.truncate(36);
        bin.extend_from_slice(bytemuck::cast_slice(&[0u16, 1, 9]));

        let error = decode_model(&glb(TRIANGLE_JSON, &bin), Path::new("bad.glb")).unwrap_err();
        assert!(matches!(
            error,
            AssetError::InvalidIndices { vertex_count: 3, .. }
        ));
    }
}
