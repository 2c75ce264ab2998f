//! # Scene Management Module
//!
//! Top-level objects with their meshes and materials, plus the optional
//! environment map.
//!
//! - [`Scene`] - container the loaders insert into
//! - [`Object`] - a top-level node with position, rotation and scale
//! - [`Vertex3D`] - vertex layout used by the scene pass

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{DrawObject, Mesh, Object, ObjectHandle};
pub use scene::{Scene, SceneStatistics};
pub use vertex::Vertex3D;
