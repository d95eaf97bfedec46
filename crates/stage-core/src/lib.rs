pub mod config;
pub mod error;
pub mod host;
pub mod id;
pub mod model;

pub use config::{EditorConfig, Viewport};
pub use error::{ConfigError, SceneError, SceneResult};
pub use host::{DrawSurface, MediaElement, OverlayControl};
pub use id::NodeId;
pub use model::*;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
