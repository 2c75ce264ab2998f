// src/wgpu_utils/mod.rs
//! Small wgpu helpers shared by the render passes.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;
