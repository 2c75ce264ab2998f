//! WGPU-based rendering engine for the viewer
//!
//! Owns the surface, device and queue, the shared bind groups of the scene
//! pipeline and the post-processing composer.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    config::{EffectConfig, RendererConfig},
    error::ViewerError,
    gfx::{
        camera::CameraUniform,
        resources::{
            environment::FallbackEnvironment,
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, OutputSettings},
            layouts::SceneLayouts,
            texture_resource::TextureResource,
        },
        scene::Scene,
    },
    interaction::Viewport,
};

use super::{
    composer::{EffectComposer, PassContext, RenderTarget},
    rgb_shift_pass::RgbShiftPass,
    scene_pass::ScenePass,
};

/// Sample count requested when antialiasing is on
const MSAA_SAMPLES: u32 = 4;

/// Outcome of [`RenderEngine::render_frame`] that is not a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// The surface was lost or outdated and has been reconfigured
    Reconfigured,
    /// No surface texture was available in time
    Skipped,
}

/// Core rendering engine managing GPU resources and draw calls
///
/// The RenderEngine handles:
/// - Surface and device management
/// - Drawing-buffer sizing from the viewport and pixel ratio
/// - Global uniforms (camera, tone mapping, exposure)
/// - Running the [`EffectComposer`] once per frame
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    renderer_config: RendererConfig,
    layouts: SceneLayouts,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    fallback_environment: FallbackEnvironment,
    composer: EffectComposer,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Picks an sRGB surface format, an alpha-capable composite mode when
    /// `renderer.transparent` is set and FIFO presentation when
    /// `renderer.vsync` is set. The composer starts with the scene pass
    /// followed by the RGB shift pass.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `viewport` - Logical size and scale factor of the window
    /// * `renderer` - Antialiasing, transparency, tone mapping settings
    /// * `effect` - RGB shift settings
    ///
    /// # Errors
    /// Returns [`ViewerError`] if no surface, adapter or device is available
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        viewport: Viewport,
        renderer: RendererConfig,
        effect: EffectConfig,
    ) -> Result<RenderEngine, ViewerError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(ViewerError::NoSurfaceFormat)?;

        let alpha_mode = choose_alpha_mode(&surface_capabilities.alpha_modes, renderer.transparent);
        let present_mode = if renderer.vsync {
            wgpu::PresentMode::Fifo
        } else if surface_capabilities
            .present_modes
            .contains(&wgpu::PresentMode::Immediate)
        {
            wgpu::PresentMode::Immediate
        } else {
            wgpu::PresentMode::Fifo
        };

        let (width, height) = viewport.drawing_buffer_size(renderer.max_pixel_ratio);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "surface configured: {width}x{height} {format:?}, {present_mode:?}, {alpha_mode:?}"
        );

        let sample_count = if renderer.antialias {
            let features = adapter.get_texture_format_features(TextureResource::COLOR_TARGET_FORMAT);
            let surface_features = adapter.get_texture_format_features(format);
            if features.flags.sample_count_supported(MSAA_SAMPLES)
                && surface_features.flags.sample_count_supported(MSAA_SAMPLES)
            {
                MSAA_SAMPLES
            } else {
                log::warn!("{MSAA_SAMPLES}x MSAA unsupported, rendering without antialiasing");
                1
            }
        } else {
            1
        };

        let layouts = SceneLayouts::new(&device);
        let global_ubo = GlobalUBO::new(&device, "Globals Uniform", bytemuck::Zeroable::zeroed());
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let fallback_environment = FallbackEnvironment::new(&device, &queue, &layouts);

        let mut composer = EffectComposer::new(&device, width, height);
        composer.add_pass(
            &device,
            Box::new(ScenePass::new(
                device.clone(),
                layouts.pipeline_layouts(global_bindings.bind_group_layout()),
                sample_count,
            )),
        );
        composer.add_pass(
            &device,
            Box::new(RgbShiftPass::from_config(device.clone(), &effect)),
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            format,
            renderer_config: renderer,
            layouts,
            global_ubo,
            global_bindings,
            fallback_environment,
            composer,
        })
    }

    /// Renders one frame through the composer and presents it
    ///
    /// # Errors
    /// Returns [`ViewerError::OutOfMemory`] when the surface reports it;
    /// every other surface error is recovered from.
    pub fn render_frame(&mut self, scene: &Scene) -> Result<FrameStatus, ViewerError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(FrameStatus::Reconfigured);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(ViewerError::OutOfMemory),
            Err(e) => {
                log::warn!("skipping frame: {e}");
                return Ok(FrameStatus::Skipped);
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let environment = scene
            .environment
            .as_ref()
            .and_then(|environment| environment.bind_group())
            .unwrap_or(&self.fallback_environment.bind_group);

        let ctx = PassContext {
            device: &self.device,
            queue: &self.queue,
            scene,
            globals: self.global_bindings.bind_group(),
            environment,
            clear_color: self.clear_color(),
        };
        self.composer.render(
            &ctx,
            &mut encoder,
            RenderTarget {
                view: &surface_texture_view,
                format: self.format,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(FrameStatus::Presented)
    }

    /// Creates GPU resources for anything newly added to the scene
    pub fn prepare_scene(&self, scene: &mut Scene) {
        scene.prepare_gpu(&self.device, &self.queue, &self.layouts);
    }

    /// Updates per-frame global uniforms
    ///
    /// # Arguments
    /// * `camera_uniform` - Updated camera uniform data
    /// * `environment_enabled` - Whether the scene has an uploaded environment
    pub fn update(&mut self, camera_uniform: CameraUniform, environment_enabled: bool) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            camera_uniform,
            OutputSettings {
                tone_mapping: self.renderer_config.tone_mapping,
                exposure: self.renderer_config.exposure,
            },
            environment_enabled,
        );
    }

    /// Resizes the surface and the composer to the viewport's drawing buffer
    ///
    /// Zero-sized viewports (minimized windows) are ignored. Returns the new
    /// drawing-buffer size, or None when nothing changed.
    pub fn resize(&mut self, viewport: Viewport) -> Option<(u32, u32)> {
        if viewport.is_empty() {
            return None;
        }
        let (width, height) = viewport.drawing_buffer_size(self.renderer_config.max_pixel_ratio);
        if (width, height) == (self.config.width, self.config.height) {
            return None;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.composer.set_size(&self.device, width, height);
        log::debug!("resized drawing buffer to {width}x{height}");
        Some((width, height))
    }

    fn clear_color(&self) -> wgpu::Color {
        if self.renderer_config.transparent {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        }
    }
}

/// Picks a compositing mode that keeps the alpha channel when transparency is wanted
fn choose_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    transparent: bool,
) -> wgpu::CompositeAlphaMode {
    let preferred: &[wgpu::CompositeAlphaMode] = if transparent {
        &[
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
    } else {
        &[wgpu::CompositeAlphaMode::Opaque]
    };

    preferred
        .iter()
        .copied()
        .find(|mode| supported.contains(mode))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
