//! Render pipeline management system for wgpu
//!
//! Shader modules are compiled once and pipelines are created lazily from
//! registered configurations, then cached by name.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub multisample: MultisampleState,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub no_vertex_buffers: bool, // full-screen passes generate their own vertices
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "scene".to_string(),
            bind_group_layouts: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_format: None,
            multisample: MultisampleState::default(),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            no_vertex_buffers: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a depth attachment of `format`
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.multisample = MultisampleState {
            count,
            ..Default::default()
        };
        self
    }

    /// Single color target of `format` with the given blend state
    pub fn with_color_target(mut self, format: TextureFormat, blend: Option<BlendState>) -> Self {
        self.color_targets = vec![Some(ColorTargetState {
            format,
            blend,
            write_mask: ColorWrites::ALL,
        })];
        self
    }

    /// Configures pipeline for fullscreen triangle rendering (no vertex buffers needed)
    pub fn with_no_vertex_buffers(mut self) -> Self {
        self.no_vertex_buffers = true;
        self
    }
}

/// Manages render pipelines with caching and lazy creation
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
        }
    }

    /// Registers a pipeline configuration without creating it
    ///
    /// Re-registering a name drops the cached pipeline.
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.remove(name);
        self.pipeline_configs.insert(name.to_string(), config);
    }

    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    /// Gets or creates a pipeline (lazy loading)
    ///
    /// Returns None if no config is registered or its shader is missing.
    pub fn get_pipeline(&mut self, name: &str) -> Option<&RenderPipeline> {
        if !self.pipelines.contains_key(name) {
            let config = self.pipeline_configs.get(name)?;
            match self.create_pipeline_from_config(config) {
                Ok(pipeline) => {
                    log::debug!("created pipeline '{name}'");
                    self.pipelines.insert(name.to_string(), pipeline);
                }
                Err(e) => {
                    log::error!("failed to create pipeline '{name}': {e}");
                    return None;
                }
            }
        }

        self.pipelines.get(name)
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }

    fn create_pipeline_from_config(&self, config: &PipelineConfig) -> Result<RenderPipeline, String> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| format!("shader '{}' not loaded", config.shader))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", config.label)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let vertex_buffers: &[VertexBufferLayout] = if config.no_vertex_buffers {
            &[]
        } else {
            &[Vertex3D::desc()]
        };

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        Ok(self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            }))
    }
}

/// Cache key for a pipeline variant rendering into `format`
pub fn pipeline_key(name: &str, format: TextureFormat) -> String {
    format!("{name} {format:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = PipelineConfig::default()
            .with_label("RGB SHIFT")
            .with_shader("rgb_shift")
            .with_cull_mode(None)
            .with_sample_count(4)
            .with_depth_format(TextureFormat::Depth32Float)
            .with_color_target(TextureFormat::Rgba8UnormSrgb, None)
            .with_no_vertex_buffers();

        assert_eq!(config.label, "RGB SHIFT");
        assert_eq!(config.shader, "rgb_shift");
        assert_eq!(config.cull_mode, None);
        assert_eq!(config.multisample.count, 4);
        assert_eq!(config.depth_format, Some(TextureFormat::Depth32Float));
        assert!(config.no_vertex_buffers);
        let target = config.color_targets[0].as_ref().expect("one target");
        assert_eq!(target.format, TextureFormat::Rgba8UnormSrgb);
    }

    #[test]
    fn keys_differ_per_format() {
        assert_ne!(
            pipeline_key("Scene", TextureFormat::Rgba8UnormSrgb),
            pipeline_key("Scene", TextureFormat::Bgra8UnormSrgb)
        );
    }
}
