//! Chromatic offset post effect.

use std::sync::Arc;

use super::{
    composer::{Pass, PassContext, RenderTarget},
    pipeline_manager::{pipeline_key, PipelineConfig, PipelineManager},
};
use crate::{
    config::EffectConfig,
    gfx::resources::texture_resource::TextureResource,
    wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc, UniformBuffer},
};

const SHADER: &str = "rgb_shift";

/// MUST match the `RgbShift` struct in `rgb_shift.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RgbShiftUniform {
    pub amount: f32,
    pub angle: f32,
    _padding: [f32; 2],
}

impl RgbShiftUniform {
    pub fn new(amount: f32, angle: f32) -> Self {
        Self {
            amount,
            angle,
            _padding: [0.0; 2],
        }
    }
}

/// Samples red at `uv + offset`, green at `uv` and blue at `uv - offset`,
/// where `offset = amount * (cos angle, sin angle)` in UV units.
pub struct RgbShiftPass {
    pub amount: f32,
    pub angle: f32,
    pub enabled: bool,
    uniform: UniformBuffer<RgbShiftUniform>,
    layout: BindGroupLayoutWithDesc,
    pipelines: PipelineManager,
}

impl RgbShiftPass {
    pub fn new(device: Arc<wgpu::Device>, amount: f32, angle: f32) -> Self {
        let uniform = UniformBuffer::new(&device, "RGB Shift Uniform", RgbShiftUniform::new(amount, angle));
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::color_texture())
            .next_binding_fragment(binding_types::filtering_sampler())
            .create(&device, "RGB Shift Bind Group Layout");

        let mut pipelines = PipelineManager::new(device);
        pipelines.load_shader(SHADER, include_str!("shaders/rgb_shift.wgsl"));

        Self {
            amount,
            angle,
            enabled: true,
            uniform,
            layout,
            pipelines,
        }
    }

    pub fn from_config(device: Arc<wgpu::Device>, config: &EffectConfig) -> Self {
        Self::new(device, config.rgb_shift_amount, config.rgb_shift_angle)
    }

    fn ensure_pipeline(&mut self, format: wgpu::TextureFormat) -> String {
        let key = pipeline_key("RGB Shift", format);
        if !self.pipelines.has_pipeline(&key) {
            let config = PipelineConfig::default()
                .with_label(&key)
                .with_shader(SHADER)
                .with_bind_group_layouts(vec![self.layout.layout.clone()])
                .with_cull_mode(None)
                .with_color_target(format, Some(wgpu::BlendState::REPLACE))
                .with_no_vertex_buffers();
            self.pipelines.register_pipeline(&key, config);
        }
        key
    }
}

impl Pass for RgbShiftPass {
    fn name(&self) -> &str {
        "rgb_shift"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_size(&mut self, _device: &wgpu::Device, _width: u32, _height: u32) {}

    fn render(
        &mut self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        input: Option<&TextureResource>,
        output: RenderTarget,
    ) {
        let Some(input) = input else {
            log::warn!("rgb shift pass has no input, skipping");
            return;
        };

        self.uniform
            .write(ctx.queue, RgbShiftUniform::new(self.amount, self.angle));
        let bind_group = BindGroupBuilder::new(&self.layout)
            .resource(self.uniform.binding_resource())
            .texture(&input.view)
            .sampler(&input.sampler)
            .create(ctx.device, "RGB Shift Bind Group");

        let key = self.ensure_pipeline(output.format);
        let Some(pipeline) = self.pipelines.get_pipeline(&key) else {
            return;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("RGB Shift Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
