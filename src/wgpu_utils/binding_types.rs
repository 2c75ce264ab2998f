//! Binding types used by the scene and post-processing layouts

use wgpu::{BindingType, SamplerBindingType, TextureSampleType, TextureViewDimension};

pub fn uniform() -> BindingType {
    BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

fn texture(filterable: bool) -> BindingType {
    BindingType::Texture {
        sample_type: TextureSampleType::Float { filterable },
        view_dimension: TextureViewDimension::D2,
        multisampled: false,
    }
}

/// 8-bit color texture (material maps, composer targets)
pub fn color_texture() -> BindingType {
    texture(true)
}

/// RGBA32F texture. Not filterable without `FLOAT32_FILTERABLE`, so it pairs
/// with [`non_filtering_sampler`].
pub fn hdr_texture() -> BindingType {
    texture(false)
}

pub fn filtering_sampler() -> BindingType {
    BindingType::Sampler(SamplerBindingType::Filtering)
}

pub fn non_filtering_sampler() -> BindingType {
    BindingType::Sampler(SamplerBindingType::NonFiltering)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hdr_textures_are_not_filterable() {
        assert!(matches!(
            hdr_texture(),
            BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: false },
                ..
            }
        ));
        assert!(matches!(
            color_texture(),
            BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: true },
                ..
            }
        ));
    }
}
