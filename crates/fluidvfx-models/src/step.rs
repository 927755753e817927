//! Workflow step enumeration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Position of a session in the generation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStep {
    /// Waiting for the user to pick a photo
    #[default]
    Upload,
    /// Photo selected, choosing a scene
    SceneSelection,
    /// Composite image request in flight
    GeneratingComposite,
    /// Composite ready for review
    ConfirmComposite,
    /// Video job in flight
    GeneratingVideo,
    /// Video ready
    Complete,
}

impl WorkflowStep {
    /// Get string representation of the step.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Upload => "upload",
            WorkflowStep::SceneSelection => "scene-selection",
            WorkflowStep::GeneratingComposite => "generating-composite",
            WorkflowStep::ConfirmComposite => "confirm-composite",
            WorkflowStep::GeneratingVideo => "generating-video",
            WorkflowStep::Complete => "complete",
        }
    }

    /// Whether a generation request is outstanding in this step.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            WorkflowStep::GeneratingComposite | WorkflowStep::GeneratingVideo
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStep::Complete)
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_as_str() {
        for step in [
            WorkflowStep::Upload,
            WorkflowStep::SceneSelection,
            WorkflowStep::GeneratingComposite,
            WorkflowStep::ConfirmComposite,
            WorkflowStep::GeneratingVideo,
            WorkflowStep::Complete,
        ] {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.as_str()));
        }
    }

    #[test]
    fn test_generating_steps() {
        assert!(WorkflowStep::GeneratingComposite.is_generating());
        assert!(WorkflowStep::GeneratingVideo.is_generating());
        assert!(!WorkflowStep::ConfirmComposite.is_generating());
        assert!(WorkflowStep::Complete.is_terminal());
    }
}
