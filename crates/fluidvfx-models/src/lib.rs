//! Shared data models for the FluidVFX generation workflow.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and the scene catalog
//! - Output constraints (aspect ratio, resolution, image size)
//! - Workflow steps

pub mod catalog;
pub mod error;
pub mod output;
pub mod scene;
pub mod step;

// Re-export common types
pub use catalog::SceneCatalog;
pub use error::{ModelError, ModelResult};
pub use output::{AspectRatio, ImageSize, OutputSpec, Resolution};
pub use scene::{Scene, SceneId};
pub use step::WorkflowStep;
