//! Global uniform bindings for camera and output settings
//!
//! Per-frame data shared by every object of the scene pass: camera matrices,
//! tone mapping and whether an environment map is bound.

use crate::{
    config::ToneMapping,
    gfx::camera::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content.
///
/// MUST match the `Globals` struct in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    exposure: f32,
    tone_mapping: u32,
    environment_enabled: u32,
    _padding: f32,
}

/// Output settings written alongside the camera every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSettings {
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
}

pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

impl GlobalUBOContent {
    pub fn new(camera: CameraUniform, output: OutputSettings, environment_enabled: bool) -> Self {
        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            exposure: output.exposure,
            tone_mapping: output.tone_mapping.shader_id(),
            environment_enabled: environment_enabled as u32,
            _padding: 0.0,
        }
    }
}

/// Writes this frame's camera and output settings
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    output: OutputSettings,
    environment_enabled: bool,
) {
    ubo.write(queue, GlobalUBOContent::new(camera, output, environment_enabled));
}

/// Bind group for the global uniforms, bound to slot 0 of the scene pipeline
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
    }

    #[test]
    fn content_carries_output_settings() {
        let content = GlobalUBOContent::new(
            CameraUniform::default(),
            OutputSettings {
                tone_mapping: ToneMapping::AcesFilmic,
                exposure: 1.0,
            },
            true,
        );
        assert_eq!(content.tone_mapping, 1);
        assert_eq!(content.exposure, 1.0);
        assert_eq!(content.environment_enabled, 1);
    }
}
