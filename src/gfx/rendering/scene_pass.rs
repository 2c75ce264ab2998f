//! Renders the scene into the composer chain.

use std::sync::Arc;

use super::{
    composer::{Pass, PassContext, RenderTarget},
    pipeline_manager::{pipeline_key, PipelineConfig, PipelineManager},
};
use crate::gfx::{resources::texture_resource::TextureResource, scene::DrawObject};

const SHADER: &str = "scene";

/// Draws every visible object with the scene pipeline.
///
/// When multisampled, the pass renders into its own MSAA color target and
/// resolves into the output.
pub struct ScenePass {
    pipelines: PipelineManager,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    sample_count: u32,
    depth: TextureResource,
    msaa: Option<(wgpu::TextureFormat, TextureResource)>,
    width: u32,
    height: u32,
}

impl ScenePass {
    /// `bind_group_layouts` are the four scene slots in order
    pub fn new(
        device: Arc<wgpu::Device>,
        bind_group_layouts: Vec<wgpu::BindGroupLayout>,
        sample_count: u32,
    ) -> Self {
        let depth = TextureResource::create_depth_texture(&device, 1, 1, sample_count, "Scene Depth");
        let mut pipelines = PipelineManager::new(device);
        pipelines.load_shader(SHADER, include_str!("shaders/scene.wgsl"));

        Self {
            pipelines,
            bind_group_layouts,
            sample_count,
            depth,
            msaa: None,
            width: 1,
            height: 1,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn ensure_pipeline(&mut self, format: wgpu::TextureFormat) -> String {
        let key = pipeline_key("Scene", format);
        if !self.pipelines.has_pipeline(&key) {
            let config = PipelineConfig::default()
                .with_label(&key)
                .with_shader(SHADER)
                .with_bind_group_layouts(self.bind_group_layouts.clone())
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_sample_count(self.sample_count)
                // glTF models may be authored double sided
                .with_cull_mode(None)
                .with_color_target(format, Some(wgpu::BlendState::ALPHA_BLENDING));
            self.pipelines.register_pipeline(&key, config);
        }
        key
    }

    fn ensure_msaa_target(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) {
        if self.sample_count <= 1 {
            return;
        }
        let stale = match &self.msaa {
            Some((current, _)) => *current != format,
            None => true,
        };
        if stale {
            let target = TextureResource::create_color_target(
                device,
                self.width,
                self.height,
                format,
                self.sample_count,
                "Scene MSAA Target",
            );
            self.msaa = Some((format, target));
        }
    }
}

impl Pass for ScenePass {
    fn name(&self) -> &str {
        "scene"
    }

    fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.depth = TextureResource::create_depth_texture(
            device,
            self.width,
            self.height,
            self.sample_count,
            "Scene Depth",
        );
        // recreated at the new size on the next render
        self.msaa = None;
    }

    fn render(
        &mut self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        _input: Option<&TextureResource>,
        output: RenderTarget,
    ) {
        let key = self.ensure_pipeline(output.format);
        self.ensure_msaa_target(ctx.device, output.format);

        let Some(pipeline) = self.pipelines.get_pipeline(&key) else {
            return;
        };

        let (view, resolve_target) = match &self.msaa {
            Some((_, msaa)) => (&msaa.view, Some(output.view)),
            None => (output.view, None),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, ctx.globals, &[]);
        render_pass.set_bind_group(3, ctx.environment, &[]);

        for object in ctx.scene.objects().filter(|object| object.visible) {
            render_pass.draw_object(object);
        }
    }
}
