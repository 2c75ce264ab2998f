//! Texture resource management for wgpu
//!
//! Creates the GPU textures the viewer needs: depth and color render targets,
//! 8-bit material textures and 32-bit float environment maps.

use image::imageops::FilterType;

/// CPU-side RGBA8 image, as decoded from a glTF texture
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
    /// Color textures are sRGB encoded, data textures (metallic-roughness) linear
    pub srgb: bool,
}

impl TextureData {
    pub fn new(width: u32, height: u32, rgba8: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba8,
            srgb: true,
        }
    }

    /// 1x1 texture of the given color
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new(1, 1, rgba.to_vec())
    }

    /// Marks the data as linear
    pub fn linear(mut self) -> Self {
        self.srgb = false;
        self
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        if self.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }

    /// Number of levels in a full mip chain down to 1x1
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Downsampled levels 1.. of the mip chain, each half the previous size.
    ///
    /// Empty when the pixel buffer does not match the dimensions.
    pub fn mip_chain(&self) -> Vec<TextureData> {
        let Some(mut image) = image::RgbaImage::from_raw(self.width, self.height, self.rgba8.clone())
        else {
            return Vec::new();
        };

        (1..self.mip_level_count())
            .map(|level| {
                let width = (self.width >> level).max(1);
                let height = (self.height >> level).max(1);
                image = image::imageops::resize(&image, width, height, FilterType::Triangle);
                TextureData {
                    width,
                    height,
                    rgba8: image.as_raw().clone(),
                    srgb: self.srgb,
                }
            })
            .collect()
    }
}

/// GPU texture resource containing texture, view, and sampler
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Standard depth buffer format used throughout the engine
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Format of the offscreen color targets between passes
    pub const COLOR_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Creates a depth texture of the given size and sample count
    pub fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        sample_count: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Self::clamped_sampler(device, label, wgpu::FilterMode::Nearest);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates a color render target that later passes can sample from
    ///
    /// Multisampled targets are only rendered to and resolved, never sampled.
    pub fn create_color_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        sample_count: u32,
        label: &str,
    ) -> Self {
        let usage = if sample_count > 1 {
            wgpu::TextureUsages::RENDER_ATTACHMENT
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Self::clamped_sampler(device, label, wgpu::FilterMode::Linear);

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads an RGBA8 image and its mip chain with repeat addressing
    pub fn create_from_texture_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        label: &str,
    ) -> Self {
        let mips = data.mip_chain();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(data.width, data.height),
            mip_level_count: 1 + mips.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: data.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in std::iter::once(data).chain(&mips).enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.rgba8,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                extent(level.width, level.height),
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads RGBA32F pixels (4 floats per pixel)
    ///
    /// The sampler is non-filtering: `Rgba32Float` is only filterable with an
    /// optional device feature.
    pub fn create_from_rgba32f(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[f32],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = extent(width, height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(pixels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(16 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            // wraps horizontally around the panorama, clamps at the poles
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    fn clamped_sampler(
        device: &wgpu::Device,
        label: &str,
        filter: wgpu::FilterMode,
    ) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_data_color_space() {
        let color = TextureData::solid([255, 0, 0, 255]);
        assert_eq!(color.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(color.rgba8.len(), 4);

        let data = TextureData::new(2, 1, vec![0; 8]).linear();
        assert_eq!(data.format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn mip_chain_halves_down_to_one_texel() {
        let data = TextureData::new(8, 2, vec![200; 8 * 2 * 4]).linear();
        assert_eq!(data.mip_level_count(), 4);

        let mips = data.mip_chain();
        let sizes: Vec<(u32, u32)> = mips.iter().map(|m| (m.width, m.height)).collect();
        assert_eq!(sizes, vec![(4, 1), (2, 1), (1, 1)]);
        for mip in &mips {
            assert!(!mip.srgb);
            assert_eq!(mip.rgba8.len(), (mip.width * mip.height * 4) as usize);
            assert!(mip.rgba8.iter().all(|&c| c.abs_diff(200) <= 1));
        }
        assert!(TextureData::solid([1, 2, 3, 4]).mip_chain().is_empty());
    }

    #[test]
    fn mismatched_buffers_get_no_mips() {
        let data = TextureData::new(4, 4, vec![0; 3]);
        assert!(data.mip_chain().is_empty());
    }

    #[test]
    fn zero_extents_are_bumped() {
        let size = extent(0, 7);
        assert_eq!((size.width, size.height), (1, 7));
    }
}
