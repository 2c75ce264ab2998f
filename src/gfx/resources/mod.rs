// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, uniform buffers and bind groups for rendering.

pub mod environment;
pub mod global_bindings;
pub mod layouts;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use environment::{EnvironmentMap, TextureMapping};
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, OutputSettings};
pub use layouts::SceneLayouts;
pub use material::Material;
pub use texture_resource::{TextureData, TextureResource};
