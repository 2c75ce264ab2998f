//! # Graphics Module
//!
//! Everything that touches the GPU: the camera, the scene and its resources,
//! and the render pipeline.
//!
//! ## Architecture Overview
//!
//! - **Camera** ([`camera`]) - Perspective camera with an explicit projection update
//! - **Rendering** ([`rendering`]) - Render engine, effect composer and its passes
//! - **Scene** ([`scene`]) - Top-level objects and the environment map
//! - **Resources** ([`resources`]) - Materials, textures, bind group layouts and globals
//!
//! ## Usage
//!
//! ```no_run
//! use prism::gfx::{RenderEngine, scene::Scene};
//!
//! // The render engine is created by ViewerApp once the window exists
//! // let engine = RenderEngine::new(window, viewport, renderer, effect).await?;
//!
//! let scene = Scene::new();
//! assert_eq!(scene.object_count(), 0);
//! ```

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::PerspectiveCamera;
pub use rendering::render_engine::RenderEngine;
