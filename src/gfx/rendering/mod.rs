pub mod composer;
pub mod pipeline_manager;
pub mod render_engine;
pub mod rgb_shift_pass;
pub mod scene_pass;

// Re-export main types
pub use composer::{EffectComposer, Pass, PassContext, RenderTarget};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::{FrameStatus, RenderEngine};
pub use rgb_shift_pass::RgbShiftPass;
pub use scene_pass::ScenePass;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    /// Headless device, or None when the machine has no usable adapter
    pub fn headless_device() -> Option<(Arc<wgpu::Device>, Arc<wgpu::Queue>)> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok()?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Test Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::Off,
        }))
        .ok()?;

        Some((Arc::new(device), Arc::new(queue)))
    }

    /// Copies a single-sampled RGBA8 texture back to the CPU
    ///
    /// `width * 4` must be a multiple of 256.
    pub fn read_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        width: u32,
        height: u32,
    ) -> Vec<u8> {
        let bytes_per_row = width * 4;
        assert_eq!(bytes_per_row % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (sender, receiver) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device
            .poll(wgpu::PollType::Wait)
            .expect("device poll failed");
        futures::executor::block_on(receiver)
            .expect("map callback dropped")
            .expect("buffer map failed");

        let data = slice.get_mapped_range().to_vec();
        buffer.unmap();
        data
    }

    /// Layout and bind group with no entries, for passes that ignore them
    pub fn empty_bind_group(device: &wgpu::Device) -> wgpu::BindGroup {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Empty Layout"),
            entries: &[],
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Empty Bind Group"),
            layout: &layout,
            entries: &[],
        })
    }
}
