//! Viewer configuration
//!
//! All tunables live here. `Default` reproduces the stock scene: a 60° camera
//! five units back, the helmet scaled by two, an RGB shift of 0.0035 and a
//! two second power1.out rotation tween capped at half a radian.

use std::path::PathBuf;

use cgmath::Vector3;

use crate::animation::Easing;

/// Top-level configuration for [`crate::ViewerApp`].
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub renderer: RendererConfig,
    pub effect: EffectConfig,
    pub interaction: InteractionConfig,
    pub assets: AssetConfig,
}

impl ViewerConfig {
    pub fn with_window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_effect(mut self, effect: EffectConfig) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionConfig) -> Self {
        self.interaction = interaction;
        self
    }

    pub fn with_assets(mut self, assets: AssetConfig) -> Self {
        self.assets = assets;
        self
    }
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    /// Initial inner size in logical pixels
    pub width: f64,
    pub height: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Perspective camera parameters
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vector3<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            position: Vector3::new(0.0, 0.0, 5.0),
        }
    }
}

/// Tone mapping operator applied at the end of the scene shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneMapping {
    None,
    AcesFilmic,
}

impl ToneMapping {
    /// Value passed to the shader
    pub fn shader_id(self) -> u32 {
        match self {
            ToneMapping::None => 0,
            ToneMapping::AcesFilmic => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RendererConfig {
    /// Enables 4x MSAA on the scene pass
    pub antialias: bool,
    /// Clears to transparent and asks the compositor for an alpha surface
    pub transparent: bool,
    /// Upper bound for the device pixel ratio
    pub max_pixel_ratio: f64,
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    /// FIFO presentation; the frame loop is paced by it
    pub vsync: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            transparent: true,
            max_pixel_ratio: 2.0,
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 1.0,
            vsync: true,
        }
    }
}

/// Post-processing parameters
#[derive(Debug, Clone, Copy)]
pub struct EffectConfig {
    /// Channel offset in UV units
    pub rgb_shift_amount: f32,
    /// Direction of the offset in radians, 0 is horizontal
    pub rgb_shift_angle: f32,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            rgb_shift_amount: 0.0035,
            rgb_shift_angle: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InteractionConfig {
    /// Rotation reached at the viewport edge, in radians
    pub max_rotation: f32,
    /// Tween duration in seconds
    pub tween_duration: f32,
    pub easing: Easing,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            max_rotation: 0.5,
            tween_duration: 2.0,
            easing: Easing::Power1Out,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub environment_path: PathBuf,
    pub model_path: PathBuf,
    /// Uniform scale applied to the loaded model
    pub model_scale: f32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            environment_path: PathBuf::from("./public/pondbridgenight1k.hdr"),
            model_path: PathBuf::from("./public/DamagedHelmet.gltf"),
            model_scale: 2.0,
        }
    }
}
