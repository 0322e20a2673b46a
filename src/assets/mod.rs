//! Asset side of the viewer: the model manifest, glTF decoding, the
//! background load queue and the load-generation barrier.

mod batch;
mod loader;
mod manifest;
mod queue;

pub use batch::{LoadBatch, Settle};
pub use loader::GltfLoader;
pub use manifest::{Manifest, ManifestEntry};
pub use queue::{LoadCompletion, LoadQueue};

use crate::scene::SceneObject;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to import glTF {path}: {source}")]
    Import {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("{path} contains no triangle geometry")]
    NoGeometry { path: String },
    #[error("invalid model manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("failed to spawn load worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("load queue is shut down")]
    QueueClosed,
}

/// Decodes one manifest entry into a scene object. Runs on worker threads,
/// so it must not touch viewer state.
pub trait AssetLoader: Send + Sync + 'static {
    fn load(&self, entry: &ManifestEntry) -> Result<SceneObject, AssetError>;
}
