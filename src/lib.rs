//! Model viewer core: random non-overlapping placement of loaded glTF
//! models, single-selection highlighting, drag/orbit/click arbitration and
//! preset camera views in a +Z-up world.

pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod interaction;
pub mod placement;
pub mod registry;
pub mod scene;
pub mod selection;
pub mod viewer;

pub use camera::{CameraView, Viewport};
pub use config::ViewerConfig;
pub use viewer::{CompletionOutcome, Viewer};
