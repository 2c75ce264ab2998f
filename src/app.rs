use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    assets::{spawn_environment_load, spawn_model_load, AssetKind, AssetSink, LoadedAsset},
    config::ViewerConfig,
    error::{AssetError, ViewerError},
    frame::{FrameClock, StopToken},
    gfx::{
        camera::PerspectiveCamera,
        rendering::{FrameStatus, RenderEngine},
        scene::{ObjectHandle, Scene},
    },
    interaction::{apply_resize, Interaction, Viewport},
};

/// Load results delivered to the event loop
#[derive(Debug)]
pub enum AppEvent {
    Loaded(LoadedAsset),
    LoadFailed { kind: AssetKind, error: AssetError },
}

/// Forwards loader results to the event loop thread
struct ProxySink(EventLoopProxy<AppEvent>);

impl AssetSink for ProxySink {
    fn success(&self, asset: LoadedAsset) {
        let kind = asset.kind();
        if self.0.send_event(AppEvent::Loaded(asset)).is_err() {
            log::debug!("event loop closed, dropping loaded {kind}");
        }
    }

    fn failure(&self, kind: AssetKind, error: AssetError) {
        if self.0.send_event(AppEvent::LoadFailed { kind, error }).is_err() {
            log::debug!("event loop closed, dropping {kind} failure");
        }
    }
}

/// Applies a load result to the scene.
///
/// A model is scaled by `model_scale`, added and published to the model slot;
/// its handle is returned. Failures leave the scene untouched.
pub fn apply_load_result(
    scene: &mut Scene,
    interaction: &mut Interaction,
    event: AppEvent,
    model_scale: f32,
) -> Option<ObjectHandle> {
    match event {
        AppEvent::Loaded(LoadedAsset::Environment(environment)) => {
            scene.set_environment(environment);
            None
        }
        AppEvent::Loaded(LoadedAsset::Model(object)) => {
            let handle = interaction.publish_model(scene, object, model_scale);
            log::info!("model ready as {handle:?}: {:?}", scene.get_statistics());
            Some(handle)
        }
        AppEvent::LoadFailed { kind, error } => {
            log::error!("{kind} load failed: {:#}", anyhow::Error::from(error));
            None
        }
    }
}

pub struct ViewerApp {
    event_loop: EventLoop<AppEvent>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Scene,
    camera: PerspectiveCamera,
    interaction: Interaction,
    viewport: Viewport,
    clock: FrameClock,
    dropped_frames: u64,
    stop: StopToken,
    fatal: Option<ViewerError>,
}

impl ViewerApp {
    /// Create a viewer; the window and GPU are set up once the loop runs
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;

        let viewport = Viewport::new(config.window.width, config.window.height, 1.0);
        let camera = PerspectiveCamera::from_config(&config.camera, viewport.aspect() as f32);
        let interaction = Interaction::new(config.interaction);

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                scene: Scene::new(),
                camera,
                interaction,
                viewport,
                clock: FrameClock::new(),
                dropped_frames: 0,
                stop: StopToken::new(),
                fatal: None,
            },
        })
    }

    /// Token that ends the frame loop when stopped
    pub fn stop_token(&self) -> StopToken {
        self.app_state.stop.clone()
    }

    /// Starts both asset loads and runs the event loop until stopped
    pub fn run(self) -> Result<(), ViewerError> {
        let ViewerApp {
            event_loop,
            mut app_state,
        } = self;

        let assets = &app_state.config.assets;
        let proxy = event_loop.create_proxy();
        if let Err(e) = spawn_environment_load(assets.environment_path.clone(), ProxySink(proxy.clone())) {
            log::error!("could not start environment loader: {e}");
        }
        if let Err(e) = spawn_model_load(assets.model_path.clone(), ProxySink(proxy)) {
            log::error!("could not start model loader: {e}");
        }

        // redraws are requested from about_to_wait; FIFO present paces them
        event_loop.set_control_flow(ControlFlow::Wait);
        event_loop.run_app(&mut app_state)?;

        match app_state.fatal.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("fatal: {error}");
        self.fatal = Some(error);
        self.stop.stop();
        event_loop.exit();
    }

    fn resize(&mut self, viewport: Viewport) {
        if apply_resize(&mut self.camera, viewport, self.config.renderer.max_pixel_ratio).is_none() {
            return;
        }
        self.viewport = viewport;
        if let Some(render_engine) = self.render_engine.as_mut() {
            render_engine.resize(viewport);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.stop.is_stopped() {
            return;
        }
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        let frame = self.clock.tick();
        self.interaction.update(frame.dt, &mut self.scene);

        render_engine.prepare_scene(&mut self.scene);
        self.camera.update_view_proj();
        render_engine.update(self.camera.uniform, self.scene.has_environment_gpu());

        match render_engine.render_frame(&self.scene) {
            Ok(FrameStatus::Presented) => {}
            Ok(status) => {
                self.dropped_frames += 1;
                log::debug!("frame {} not presented: {status:?}", frame.frame_index);
            }
            Err(error) => self.fail(event_loop, error),
        }
    }
}

impl ApplicationHandler<AppEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_transparent(self.config.renderer.transparent);

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        self.window = Some(window.clone());

        let viewport = Viewport::from_physical(window.inner_size(), window.scale_factor());
        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            viewport,
            self.config.renderer,
            self.config.effect,
        ));
        match render_engine {
            Ok(render_engine) => self.render_engine = Some(render_engine),
            Err(e) => return self.fail(event_loop, e),
        }

        self.resize(viewport);
        self.clock.reset();
        window.request_redraw();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        apply_load_result(
            &mut self.scene,
            &mut self.interaction,
            event,
            self.config.assets.model_scale,
        );
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                log::info!("stop requested");
                self.stop.stop();
            }
            WindowEvent::Resized(size) => {
                self.resize(Viewport::from_physical(size, window.scale_factor()));
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.resize(Viewport::from_physical(window.inner_size(), scale_factor));
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = self.viewport.to_logical(position);
                self.interaction.on_pointer_move(position, &self.viewport);
            }
            WindowEvent::Occluded(false) => self.clock.reset(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.stop.is_stopped() {
            event_loop.exit();
            return;
        }
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!(
            "exiting after {} frames ({} not presented)",
            self.clock.frame_index(),
            self.dropped_frames
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::InteractionConfig,
        gfx::{
            resources::{EnvironmentMap, TextureMapping},
            scene::{Mesh, Object, Vertex3D},
        },
    };
    use cgmath::Vector3;
    use std::path::PathBuf;

    fn triangle() -> Object {
        let vertex = |position| Vertex3D {
            position,
            normal: [0.0, 0.0, 1.0],
            uv: [0.0, 0.0],
        };
        let mesh = Mesh::new(
            vec![
                vertex([0.0, 0.0, 0.0]),
                vertex([1.0, 0.0, 0.0]),
                vertex([0.0, 1.0, 0.0]),
            ],
            vec![0, 1, 2],
            0,
        );
        Object::new(vec![mesh], vec![Default::default()])
    }

    #[test]
    fn model_result_is_scaled_and_published() {
        let mut scene = Scene::new();
        let mut interaction = Interaction::new(InteractionConfig::default());
        let scale = ViewerConfig::default().assets.model_scale;

        let handle = apply_load_result(
            &mut scene,
            &mut interaction,
            AppEvent::Loaded(LoadedAsset::Model(triangle())),
            scale,
        )
        .expect("model handle");

        assert_eq!(scene.object_count(), 1);
        assert_eq!(interaction.model_slot().get(), Some(handle));
        let object = scene.object(handle).expect("object in scene");
        assert_eq!(object.scale, Vector3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn environment_result_lands_on_the_scene() {
        let mut scene = Scene::new();
        let mut interaction = Interaction::new(InteractionConfig::default());
        let map = EnvironmentMap::new(1, 1, vec![1.0; 4])
            .with_mapping(TextureMapping::EquirectangularReflection);

        let handle = apply_load_result(
            &mut scene,
            &mut interaction,
            AppEvent::Loaded(LoadedAsset::Environment(map)),
            2.0,
        );

        assert!(handle.is_none());
        assert_eq!(scene.object_count(), 0);
        let environment = scene.environment.as_ref().expect("environment set");
        assert_eq!(environment.mapping, TextureMapping::EquirectangularReflection);
    }

    #[test]
    fn failed_load_leaves_the_scene_untouched() {
        let mut scene = Scene::new();
        let mut interaction = Interaction::new(InteractionConfig::default());
        let error = AssetError::EmptyModel {
            path: PathBuf::from("missing.gltf"),
        };

        let handle = apply_load_result(
            &mut scene,
            &mut interaction,
            AppEvent::LoadFailed {
                kind: AssetKind::Model,
                error,
            },
            2.0,
        );

        assert!(handle.is_none());
        assert_eq!(scene.object_count(), 0);
        assert!(scene.environment.is_none());
        assert!(interaction.model_slot().is_empty());
    }
}
