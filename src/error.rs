//! Error types
//!
//! Asset failures are recoverable: they are logged and the scene simply lacks
//! the corresponding contribution. Viewer failures happen while bringing up
//! the window and GPU and end the program.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading or decoding an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image '{path}'")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to import glTF '{path}'")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("'{path}' contains no triangle meshes")]
    EmptyModel { path: PathBuf },

    #[error("'{path}' has an index past the end of its {vertex_count} vertices")]
    InvalidIndices { path: PathBuf, vertex_count: usize },
}

/// Failure while bringing up the window, surface or GPU device.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to create event loop")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window")]
    Window(#[from] winit::error::OsError),

    #[error("no output surface available")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to acquire GPU device")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("GPU ran out of memory")]
    OutOfMemory,
}
