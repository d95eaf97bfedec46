use crate::id::NodeId;

pub type SceneResult<T> = Result<T, SceneError>;

/// Failures raised by the scene model and the controllers built on it.
///
/// None of these are fatal: callers log them and leave the scene untouched.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("invalid node kind: {id} is {found}, expected {expected}")]
    InvalidNodeKind {
        id: NodeId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("asset load failure: {url}: {reason}")]
    AssetLoadFailure { url: String, reason: String },
}

impl SceneError {
    pub fn asset_load(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetLoadFailure {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration could not be read.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config value out of range: {0}")]
    Range(String),
}
