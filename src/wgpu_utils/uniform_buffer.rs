//! Typed uniform buffers

use wgpu::util::DeviceExt;

/// A uniform buffer holding one `Content` value.
///
/// Keeps a CPU copy of the last written value so unchanged per-frame writes
/// (the RGB shift parameters, a resting model transform) never reach the
/// queue.
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    current: Content,
}

impl<Content: bytemuck::Pod + PartialEq> UniformBuffer<Content> {
    pub fn new(device: &wgpu::Device, label: &str, initial: Content) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            buffer,
            current: initial,
        }
    }

    /// Queues a write of `content`. Returns false when it equals the current value.
    pub fn write(&mut self, queue: &wgpu::Queue, content: Content) -> bool {
        if self.current == content {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&content));
        self.current = content;
        true
    }

    pub fn content(&self) -> &Content {
        &self.current
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::test_support::headless_device;

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    struct Params {
        amount: f32,
        angle: f32,
        _padding: [f32; 2],
    }

    fn params(amount: f32) -> Params {
        Params {
            amount,
            angle: 0.0,
            _padding: [0.0; 2],
        }
    }

    #[test]
    fn identical_writes_are_skipped() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no adapter, skipping");
            return;
        };

        let mut ubo = UniformBuffer::new(&device, "Params", params(0.5));
        assert_eq!(ubo.buffer().size(), 16);
        assert!(!ubo.write(&queue, params(0.5)));
        assert!(ubo.write(&queue, params(0.25)));
        assert_eq!(ubo.content().amount, 0.25);
        assert!(!ubo.write(&queue, params(0.25)));
    }
}
