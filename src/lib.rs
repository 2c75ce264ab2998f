// src/lib.rs
//! Prism viewer
//!
//! Loads an HDRI environment and a glTF model, renders them through a small
//! post-processing chain (scene pass + RGB shift) and turns the model toward
//! the cursor with a tweened rotation.

pub mod animation;
pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod frame;
pub mod gfx;
pub mod interaction;
pub mod logging;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::ViewerConfig;
pub use error::{AssetError, ViewerError};

/// Creates a viewer with the default configuration
pub fn default() -> Result<ViewerApp, ViewerError> {
    ViewerApp::new(ViewerConfig::default())
}
