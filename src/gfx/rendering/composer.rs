//! Post-processing chain
//!
//! An [`EffectComposer`] owns an ordered list of passes and two offscreen
//! color targets. Each enabled pass reads the previous pass's output and
//! writes the next; the last enabled pass writes the surface.

use crate::gfx::{resources::texture_resource::TextureResource, scene::Scene};

/// Color attachment a pass renders into
#[derive(Clone, Copy)]
pub struct RenderTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
}

/// Per-frame data shared by all passes
pub struct PassContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub scene: &'a Scene,
    /// Slot 0 of the scene pipeline
    pub globals: &'a wgpu::BindGroup,
    /// Slot 3: the scene's environment, or the black fallback
    pub environment: &'a wgpu::BindGroup,
    pub clear_color: wgpu::Color,
}

/// One stage of the post-processing chain.
pub trait Pass {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    /// Called when the drawing buffer changes size
    fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32);

    /// Records the pass. `input` is the previous pass's output, `None` for
    /// the first pass of the chain.
    fn render(
        &mut self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        input: Option<&TextureResource>,
        output: RenderTarget,
    );
}

pub struct EffectComposer {
    passes: Vec<Box<dyn Pass>>,
    read_target: TextureResource,
    write_target: TextureResource,
    width: u32,
    height: u32,
}

impl EffectComposer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (read_target, write_target) = create_targets(device, width, height);
        Self {
            passes: Vec::new(),
            read_target,
            write_target,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Appends a pass, sized to the composer's current size
    pub fn add_pass(&mut self, device: &wgpu::Device, mut pass: Box<dyn Pass>) {
        pass.set_size(device, self.width, self.height);
        log::debug!("composer: added pass '{}'", pass.name());
        self.passes.push(pass);
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Resizes the offscreen targets and every pass
    pub fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == (self.width, self.height) {
            return;
        }

        let (read_target, write_target) = create_targets(device, width, height);
        self.read_target = read_target;
        self.write_target = write_target;
        self.width = width;
        self.height = height;

        for pass in self.passes.iter_mut() {
            pass.set_size(device, width, height);
        }
    }

    /// Records all enabled passes, the last one into `surface`
    pub fn render(
        &mut self,
        ctx: &PassContext,
        encoder: &mut wgpu::CommandEncoder,
        surface: RenderTarget,
    ) {
        let Some(last) = self.passes.iter().rposition(|pass| pass.enabled()) else {
            clear(encoder, surface, ctx.clear_color);
            return;
        };

        let mut has_input = false;
        for index in 0..=last {
            let pass = &mut self.passes[index];
            if !pass.enabled() {
                continue;
            }

            let input = has_input.then_some(&self.read_target);
            if index == last {
                pass.render(ctx, encoder, input, surface);
            } else {
                let output = RenderTarget {
                    view: &self.write_target.view,
                    format: TextureResource::COLOR_TARGET_FORMAT,
                };
                pass.render(ctx, encoder, input, output);
                std::mem::swap(&mut self.read_target, &mut self.write_target);
                has_input = true;
            }
        }
    }
}

fn create_targets(device: &wgpu::Device, width: u32, height: u32) -> (TextureResource, TextureResource) {
    let make = |label| {
        TextureResource::create_color_target(
            device,
            width,
            height,
            TextureResource::COLOR_TARGET_FORMAT,
            1,
            label,
        )
    };
    (make("Composer Read Target"), make("Composer Write Target"))
}

fn clear(encoder: &mut wgpu::CommandEncoder, target: RenderTarget, color: wgpu::Color) {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Composer Clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::gfx::rendering::test_support::{empty_bind_group, headless_device};

    type Log = Rc<RefCell<Vec<(String, bool, wgpu::TextureFormat)>>>;

    struct RecordingPass {
        name: String,
        enabled: bool,
        size: Rc<RefCell<(u32, u32)>>,
        log: Log,
    }

    impl Pass for RecordingPass {
        fn name(&self) -> &str {
            &self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn set_size(&mut self, _device: &wgpu::Device, width: u32, height: u32) {
            *self.size.borrow_mut() = (width, height);
        }

        fn render(
            &mut self,
            _ctx: &PassContext,
            _encoder: &mut wgpu::CommandEncoder,
            input: Option<&TextureResource>,
            output: RenderTarget,
        ) {
            self.log
                .borrow_mut()
                .push((self.name.clone(), input.is_some(), output.format));
        }
    }

    #[test]
    fn runs_enabled_passes_in_order_and_last_hits_surface() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no GPU adapter, skipping");
            return;
        };

        let log: Log = Rc::default();
        let sizes: Vec<_> = (0..3).map(|_| Rc::new(RefCell::new((0, 0)))).collect();
        let mut composer = EffectComposer::new(&device, 32, 16);
        for (index, enabled) in [true, false, true].into_iter().enumerate() {
            composer.add_pass(
                &device,
                Box::new(RecordingPass {
                    name: format!("pass{index}"),
                    enabled,
                    size: sizes[index].clone(),
                    log: log.clone(),
                }),
            );
        }
        assert_eq!(composer.pass_names(), vec!["pass0", "pass1", "pass2"]);

        composer.set_size(&device, 64, 48);
        assert_eq!(composer.size(), (64, 48));
        for size in &sizes {
            assert_eq!(*size.borrow(), (64, 48));
        }

        let surface = TextureResource::create_color_target(
            &device,
            64,
            48,
            wgpu::TextureFormat::Bgra8UnormSrgb,
            1,
            "Fake Surface",
        );
        let scene = Scene::new();
        let bind_group = empty_bind_group(&device);
        let ctx = PassContext {
            device: &device,
            queue: &queue,
            scene: &scene,
            globals: &bind_group,
            environment: &bind_group,
            clear_color: wgpu::Color::TRANSPARENT,
        };
        let mut encoder = device.create_command_encoder(&Default::default());
        composer.render(
            &ctx,
            &mut encoder,
            RenderTarget {
                view: &surface.view,
                format: wgpu::TextureFormat::Bgra8UnormSrgb,
            },
        );

        let log = log.borrow();
        assert_eq!(
            *log,
            vec![
                ("pass0".to_string(), false, TextureResource::COLOR_TARGET_FORMAT),
                ("pass2".to_string(), true, wgpu::TextureFormat::Bgra8UnormSrgb),
            ]
        );
    }
}
