//! Interaction layer
//!
//! Turns window events into camera and model updates: resizes keep the
//! drawing buffer and camera aspect in sync, pointer moves retarget the
//! model's rotation tween.

use std::cell::OnceCell;

use cgmath::Vector2;
use winit::dpi::{LogicalPosition, PhysicalPosition, PhysicalSize};

use crate::{
    animation::Tween,
    config::InteractionConfig,
    gfx::{
        camera::PerspectiveCamera,
        scene::{Object, ObjectHandle, Scene},
    },
};

/// Window size in logical pixels plus the display scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale_factor: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    /// Builds a viewport from the physical size winit reports
    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let logical = size.to_logical::<f64>(scale_factor);
        Self::new(logical.width, logical.height, scale_factor)
    }

    /// Device pixel ratio, capped at `max`
    pub fn pixel_ratio(&self, max: f64) -> f64 {
        self.scale_factor.min(max).max(f64::EPSILON)
    }

    /// Drawing-buffer size in physical pixels, at least 1x1
    pub fn drawing_buffer_size(&self, max_pixel_ratio: f64) -> (u32, u32) {
        let ratio = self.pixel_ratio(max_pixel_ratio);
        let scale = |logical: f64| (logical * ratio).round().max(1.0) as u32;
        (scale(self.width), scale(self.height))
    }

    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Minimized windows report a zero size
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Maps a physical cursor position into this viewport's logical space
    pub fn to_logical(&self, position: PhysicalPosition<f64>) -> LogicalPosition<f64> {
        position.to_logical(self.scale_factor)
    }
}

/// Maps a position inside a `width` x `height` viewport to `[-1, 1]` on both
/// axes, -1 at the left/top edge. Positions outside the viewport are clamped.
pub fn normalize_pointer(x: f64, y: f64, width: f64, height: f64) -> Vector2<f32> {
    let axis = |value: f64, extent: f64| {
        if extent <= 0.0 {
            return 0.0;
        }
        ((value / extent) * 2.0 - 1.0).clamp(-1.0, 1.0) as f32
    };
    Vector2::new(axis(x, width), axis(y, height))
}

/// Updates the camera for a new viewport.
///
/// Sets the aspect and then recomputes the projection; the cached projection
/// would otherwise keep the old aspect. Returns the drawing-buffer size, or
/// None for a zero-sized viewport.
pub fn apply_resize(
    camera: &mut PerspectiveCamera,
    viewport: Viewport,
    max_pixel_ratio: f64,
) -> Option<(u32, u32)> {
    if viewport.is_empty() {
        return None;
    }

    camera.set_aspect_from_size(viewport.width, viewport.height);
    camera.update_projection_matrix();
    camera.update_view_proj();
    Some(viewport.drawing_buffer_size(max_pixel_ratio))
}

/// Set-once holder for the loaded model's handle.
#[derive(Debug, Default)]
pub struct ModelSlot {
    handle: OnceCell<ObjectHandle>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the model handle. Returns false if one was already set.
    pub fn set(&self, handle: ObjectHandle) -> bool {
        if self.handle.set(handle).is_err() {
            log::warn!("model slot already filled, ignoring {handle:?}");
            return false;
        }
        true
    }

    pub fn get(&self) -> Option<ObjectHandle> {
        self.handle.get().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.handle.get().is_none()
    }
}

/// Pointer-driven rotation of the loaded model.
///
/// The tween value holds (pitch, yaw) in radians: x rotates about the X axis,
/// y about the Y axis.
#[derive(Debug)]
pub struct Interaction {
    slot: ModelSlot,
    rotation: Tween<Vector2<f32>>,
    config: InteractionConfig,
}

impl Interaction {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            slot: ModelSlot::new(),
            rotation: Tween::new(Vector2::new(0.0, 0.0), config.tween_duration, config.easing),
            config,
        }
    }

    pub fn model_slot(&self) -> &ModelSlot {
        &self.slot
    }

    /// Current (pitch, yaw) of the rotation tween
    pub fn rotation(&self) -> Vector2<f32> {
        self.rotation.value()
    }

    pub fn rotation_target(&self) -> Vector2<f32> {
        self.rotation.target()
    }

    /// Scales the loaded model, inserts it and publishes its handle
    pub fn publish_model(&mut self, scene: &mut Scene, mut object: Object, scale: f32) -> ObjectHandle {
        object.set_scale(scale);
        let start = Vector2::new(object.rotation.x, object.rotation.y);
        let handle = scene.add_object(object);
        if self.slot.set(handle) {
            self.rotation.snap(start);
        }
        handle
    }

    /// Retargets the rotation toward a logical cursor position.
    ///
    /// Skipped while no model is loaded. Returns whether a tween was started.
    pub fn on_pointer_move(&mut self, position: LogicalPosition<f64>, viewport: &Viewport) -> bool {
        if self.slot.is_empty() {
            log::trace!("pointer move before model load, ignored");
            return false;
        }

        let pointer = normalize_pointer(position.x, position.y, viewport.width, viewport.height);
        let max = self.config.max_rotation;
        // vertical movement pitches, horizontal movement yaws
        self.rotation
            .retarget(Vector2::new(pointer.y * max, pointer.x * max));
        true
    }

    /// Advances the tween and writes it into the model's rotation
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        let Some(handle) = self.slot.get() else {
            return;
        };

        let rotation = self.rotation.advance(dt);
        if let Some(model) = scene.object_mut(handle) {
            model.set_rotation_xy(rotation.x, rotation.y);
        }
    }
}
