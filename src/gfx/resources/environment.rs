//! Environment maps
//!
//! An environment map is a panoramic radiance image used as the ambient
//! lighting and reflection source of the scene. It is never drawn as a
//! background.

use super::{layouts::SceneLayouts, texture_resource::TextureResource};
use crate::wgpu_utils::BindGroupBuilder;

/// How an environment texture is addressed by the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMapping {
    /// Plain UV mapping, not usable as an environment
    Uv,
    /// Equirectangular panorama sampled by reflection direction
    EquirectangularReflection,
}

struct EnvironmentGpu {
    _texture: TextureResource,
    bind_group: wgpu::BindGroup,
}

/// HDR environment map with RGBA32F pixels in row-major order, top row first
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<f32>,
    pub mapping: TextureMapping,
    gpu: Option<EnvironmentGpu>,
}

impl EnvironmentMap {
    pub fn new(width: u32, height: u32, pixels: Vec<f32>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels,
            mapping: TextureMapping::Uv,
            gpu: None,
        }
    }

    pub fn with_mapping(mut self, mapping: TextureMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Radiance at a pixel, without alpha
    pub fn texel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Uploads the panorama once
    pub fn init_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SceneLayouts,
    ) {
        if self.gpu.is_some() {
            return;
        }

        let texture = TextureResource::create_from_rgba32f(
            device,
            queue,
            &self.pixels,
            self.width,
            self.height,
            "Environment Map",
        );
        let bind_group = create_environment_bind_group(device, layouts, &texture);
        log::debug!("environment map uploaded ({}x{})", self.width, self.height);

        self.gpu = Some(EnvironmentGpu {
            _texture: texture,
            bind_group,
        });
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

impl std::fmt::Debug for EnvironmentMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mapping", &self.mapping)
            .field("uploaded", &self.gpu.is_some())
            .finish()
    }
}

pub fn create_environment_bind_group(
    device: &wgpu::Device,
    layouts: &SceneLayouts,
    texture: &TextureResource,
) -> wgpu::BindGroup {
    BindGroupBuilder::new(&layouts.environment)
        .texture(&texture.view)
        .sampler(&texture.sampler)
        .create(device, "Environment Bind Group")
}

/// Black 1x1 environment bound while no map is loaded
pub struct FallbackEnvironment {
    _texture: TextureResource,
    pub bind_group: wgpu::BindGroup,
}

impl FallbackEnvironment {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, layouts: &SceneLayouts) -> Self {
        let texture = TextureResource::create_from_rgba32f(
            device,
            queue,
            &[0.0, 0.0, 0.0, 1.0],
            1,
            1,
            "Fallback Environment",
        );
        let bind_group = create_environment_bind_group(device, layouts, &texture);
        Self {
            _texture: texture,
            bind_group,
        }
    }
}
