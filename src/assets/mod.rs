//! Background asset loading
//!
//! Each load runs on its own thread and reports through an [`AssetSink`].
//! Nothing here touches the GPU: loads produce CPU-side scene data that the
//! event loop inserts into the scene.

pub mod environment;
pub mod loader;
pub mod model;

pub use environment::decode_environment;
pub use loader::{read_with_progress, spawn_environment_load, spawn_model_load};
pub use model::decode_model;

use crate::{
    error::AssetError,
    gfx::{resources::EnvironmentMap, scene::Object},
};

/// Which load a report belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Environment,
    Model,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Environment => write!(f, "environment"),
            AssetKind::Model => write!(f, "model"),
        }
    }
}

/// Result of a successful load
#[derive(Debug)]
pub enum LoadedAsset {
    Environment(EnvironmentMap),
    Model(Object),
}

impl LoadedAsset {
    pub fn kind(&self) -> AssetKind {
        match self {
            LoadedAsset::Environment(_) => AssetKind::Environment,
            LoadedAsset::Model(_) => AssetKind::Model,
        }
    }
}

/// Receives progress and completion of background loads.
///
/// Implementations are called from the loader threads.
pub trait AssetSink: Send + 'static {
    /// `loaded` of `total` bytes read; `total` is 0 when unknown
    fn progress(&self, kind: AssetKind, loaded: u64, total: u64) {
        match progress_percent(loaded, total) {
            Some(percent) => log::info!("{kind}: {percent:.0}% loaded"),
            None => log::info!("{kind}: {loaded} bytes loaded"),
        }
    }

    fn success(&self, asset: LoadedAsset);

    fn failure(&self, kind: AssetKind, error: AssetError);
}

/// `loaded / total * 100`, None when the total is unknown
pub fn progress_percent(loaded: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| loaded as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_known_total() {
        assert_eq!(progress_percent(0, 200), Some(0.0));
        assert_eq!(progress_percent(50, 200), Some(25.0));
        assert_eq!(progress_percent(200, 200), Some(100.0));
        assert_eq!(progress_percent(10, 0), None);
    }

    #[test]
    fn kinds_display_lowercase() {
        assert_eq!(AssetKind::Environment.to_string(), "environment");
        assert_eq!(AssetKind::Model.to_string(), "model");
    }
}
