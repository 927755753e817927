//! Model error types.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read scene catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scene catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid scene '{id}': {reason}")]
    InvalidScene { id: String, reason: String },

    #[error("Duplicate scene id: {0}")]
    DuplicateScene(String),

    #[error("Scene catalog is empty")]
    EmptyCatalog,
}

impl ModelError {
    pub fn invalid_scene(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidScene {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
