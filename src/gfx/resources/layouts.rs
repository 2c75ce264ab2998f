//! Bind group layouts shared by the scene pipeline and the scene's GPU data
//!
//! Slot 0 holds the globals (see `global_bindings`); the layouts here cover
//! slots 1 to 3.

use crate::wgpu_utils::{binding_types, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};

pub struct SceneLayouts {
    /// Slot 1: per-object transform uniform
    pub transform: BindGroupLayoutWithDesc,
    /// Slot 2: material uniform and its three textures with samplers
    pub material: BindGroupLayoutWithDesc,
    /// Slot 3: environment radiance texture and sampler
    pub environment: BindGroupLayoutWithDesc,
}

impl SceneLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let transform = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Transform Bind Group Layout");

        // uniform, then (texture, sampler) for base color, metallic-roughness, emissive
        let mut material = BindGroupLayoutBuilder::new().next_binding_fragment(binding_types::uniform());
        for _ in 0..3 {
            material = material
                .next_binding_fragment(binding_types::color_texture())
                .next_binding_fragment(binding_types::filtering_sampler());
        }
        let material = material.create(device, "Material Bind Group Layout");

        let environment = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::hdr_texture())
            .next_binding_fragment(binding_types::non_filtering_sampler())
            .create(device, "Environment Bind Group Layout");

        Self {
            transform,
            material,
            environment,
        }
    }

    /// Layouts in slot order, for `PipelineConfig::with_bind_group_layouts`
    pub fn pipeline_layouts(&self, globals: &wgpu::BindGroupLayout) -> Vec<wgpu::BindGroupLayout> {
        vec![
            globals.clone(),
            self.transform.layout.clone(),
            self.material.layout.clone(),
            self.environment.layout.clone(),
        ]
    }
}
