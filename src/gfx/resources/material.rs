//! Metallic-roughness materials
//!
//! Materials come from the glTF file and are owned by the object that uses
//! them. GPU resources are created lazily on the render thread.

use wgpu::Device;

use super::{
    layouts::SceneLayouts,
    texture_resource::{TextureData, TextureResource},
};
use crate::wgpu_utils::{uniform_buffer::UniformBuffer, BindGroupBuilder};

/// GPU uniform data for materials. MUST match `Material` in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub has_base_color_texture: u32,
    pub has_metallic_roughness_texture: u32,
    pub has_emissive_texture: u32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

struct MaterialGpu {
    _ubo: MaterialUBO,
    _textures: [TextureResource; 3],
    bind_group: wgpu::BindGroup,
}

/// Material definition with PBR properties
///
/// Textures multiply their factors, as in glTF. Missing textures are bound as
/// a white texel so the factor applies unchanged.
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub base_color_texture: Option<TextureData>,
    /// Linear; green holds roughness, blue metalness
    pub metallic_roughness_texture: Option<TextureData>,
    pub emissive_texture: Option<TextureData>,

    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        // glTF defaults for a material-less primitive
        Self {
            name: "Default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            base_color_texture: None,
            metallic_roughness_texture: None,
            emissive_texture: None,
            gpu: None,
        }
    }
}

impl Material {
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn with_emission(mut self, emissive: [f32; 3]) -> Self {
        self.emissive = emissive;
        self
    }

    pub fn with_base_color_texture(mut self, texture: TextureData) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    pub fn with_metallic_roughness_texture(mut self, texture: TextureData) -> Self {
        self.metallic_roughness_texture = Some(texture.linear());
        self
    }

    pub fn with_emissive_texture(mut self, texture: TextureData) -> Self {
        self.emissive_texture = Some(texture);
        self
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            emissive: self.emissive,
            metallic: self.metallic,
            roughness: self.roughness,
            has_base_color_texture: self.base_color_texture.is_some() as u32,
            has_metallic_roughness_texture: self.metallic_roughness_texture.is_some() as u32,
            has_emissive_texture: self.emissive_texture.is_some() as u32,
        }
    }

    /// Creates the uniform buffer, textures and bind group once
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue, layouts: &SceneLayouts) {
        if self.gpu.is_some() {
            return;
        }

        let ubo = MaterialUBO::new(device, "Material Uniform", self.uniform());
        let white = TextureData::solid([255, 255, 255, 255]);
        let upload = |texture: &Option<TextureData>, white: &TextureData, slot: &str| {
            TextureResource::create_from_texture_data(
                device,
                queue,
                texture.as_ref().unwrap_or(white),
                &format!("{} {}", self.name, slot),
            )
        };
        let textures = [
            upload(&self.base_color_texture, &white, "Base Color"),
            upload(&self.metallic_roughness_texture, &white.clone().linear(), "Metallic Roughness"),
            upload(&self.emissive_texture, &white, "Emissive"),
        ];

        let mut builder = BindGroupBuilder::new(&layouts.material).resource(ubo.binding_resource());
        for texture in &textures {
            builder = builder.texture(&texture.view).sampler(&texture.sampler);
        }
        let bind_group = builder.create(device, &format!("{} Material Bind Group", self.name));

        self.gpu = Some(MaterialGpu {
            _ubo: ubo,
            _textures: textures,
            bind_group,
        });
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu.is_some()
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("base_color", &self.base_color)
            .field("metallic", &self.metallic)
            .field("roughness", &self.roughness)
            .field("emissive", &self.emissive)
            .field("base_color_texture", &self.base_color_texture.is_some())
            .field("metallic_roughness_texture", &self.metallic_roughness_texture.is_some())
            .field("emissive_texture", &self.emissive_texture.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_shader_size() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn factors_are_clamped() {
        let material = Material::new("m", [1.0; 4], 2.0, -1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }

    #[test]
    fn texture_flags_follow_textures() {
        let plain = Material::default();
        let uniform = plain.uniform();
        assert_eq!(uniform.has_base_color_texture, 0);
        assert_eq!(uniform.has_emissive_texture, 0);

        let textured = Material::default()
            .with_base_color_texture(TextureData::solid([0; 4]))
            .with_metallic_roughness_texture(TextureData::solid([0, 128, 255, 255]));
        let uniform = textured.uniform();
        assert_eq!(uniform.has_base_color_texture, 1);
        assert_eq!(uniform.has_metallic_roughness_texture, 1);
        assert_eq!(uniform.has_emissive_texture, 0);
        assert!(!textured.has_gpu_resources());
    }

    #[test]
    fn metallic_roughness_is_stored_linear() {
        let material =
            Material::default().with_metallic_roughness_texture(TextureData::solid([0, 0, 0, 255]));
        let texture = material.metallic_roughness_texture.expect("texture set");
        assert!(!texture.srgb);
    }
}
