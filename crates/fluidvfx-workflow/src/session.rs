//! The per-journey session record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fluidvfx_genai::{EncodedImage, InputImage, VideoReference};
use fluidvfx_models::{Scene, WorkflowStep};
use uuid::Uuid;

use crate::error::WorkflowFailure;

/// Filename offered when saving the finished video.
pub const SUGGESTED_DOWNLOAD_FILENAME: &str = "fluid-vfx-generated.mp4";

/// The photo the user picked.
#[derive(Debug, Clone)]
pub struct SelectedInput {
    image: InputImage,
    encoded: EncodedImage,
    preview: String,
}

impl SelectedInput {
    pub(crate) fn new(image: InputImage, encoded: EncodedImage) -> Self {
        let preview = encoded.to_data_url();
        Self {
            image,
            encoded,
            preview,
        }
    }

    /// Get the original upload.
    pub fn image(&self) -> &InputImage {
        &self.image
    }

    /// Transport encoding sent to the service.
    pub fn encoded(&self) -> &EncodedImage {
        &self.encoded
    }

    /// `data:` URL usable as a preview.
    pub fn preview(&self) -> &str {
        &self.preview
    }
}

/// Everything needed to save the finished video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOffer {
    pub reference: VideoReference,
    pub suggested_filename: &'static str,
}

/// State of one user journey.
///
/// Read-only from outside the crate; all mutation goes through
/// [`crate::WorkflowController`] transitions.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) id: Uuid,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) step: WorkflowStep,
    pub(crate) input: Option<SelectedInput>,
    pub(crate) scene: Option<Arc<Scene>>,
    pub(crate) composite: Option<EncodedImage>,
    pub(crate) video: Option<VideoReference>,
    pub(crate) error: Option<WorkflowFailure>,
    pub(crate) busy: bool,
    pub(crate) progress: Option<String>,
}

impl Session {
    /// Create an empty session at `Upload`.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            step: WorkflowStep::Upload,
            input: None,
            scene: None,
            composite: None,
            video: None,
            error: None,
            busy: false,
            progress: None,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the time the session was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Get the current step.
    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    /// Get the selected photo.
    pub fn input(&self) -> Option<&SelectedInput> {
        self.input.as_ref()
    }

    /// Get the preview `data:` URL of the selected photo.
    pub fn preview(&self) -> Option<&str> {
        self.input.as_ref().map(SelectedInput::preview)
    }

    /// Get the chosen scene.
    pub fn scene(&self) -> Option<&Arc<Scene>> {
        self.scene.as_ref()
    }

    /// Get the composite image, if one was generated.
    pub fn composite(&self) -> Option<&EncodedImage> {
        self.composite.as_ref()
    }

    /// Get the finished video reference.
    pub fn video(&self) -> Option<&VideoReference> {
        self.video.as_ref()
    }

    /// Get the last recorded failure.
    pub fn error(&self) -> Option<&WorkflowFailure> {
        self.error.as_ref()
    }

    /// Check if a generation is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Latest progress line of the current or most recent operation.
    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Download offer, available once the video is ready.
    pub fn download_offer(&self) -> Option<DownloadOffer> {
        if self.step != WorkflowStep::Complete {
            return None;
        }
        self.video.as_ref().map(|reference| DownloadOffer {
            reference: reference.clone(),
            suggested_filename: SUGGESTED_DOWNLOAD_FILENAME,
        })
    }

    /// Enter a generating step: busy, error and stale progress cleared.
    pub(crate) fn begin(&mut self, step: WorkflowStep, progress: &str) {
        self.step = step;
        self.busy = true;
        self.error = None;
        self.progress = Some(progress.to_string());
    }

    /// Leave a generating step.
    pub(crate) fn finish(&mut self, step: WorkflowStep, error: Option<WorkflowFailure>) {
        self.step = step;
        self.busy = false;
        self.error = error;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.step(), WorkflowStep::Upload);
        assert!(session.input().is_none());
        assert!(session.scene().is_none());
        assert!(session.composite().is_none());
        assert!(session.video().is_none());
        assert!(session.error().is_none());
        assert!(!session.is_busy());
        assert!(session.progress().is_none());
        assert!(session.download_offer().is_none());
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }

    #[test]
    fn test_preview_is_data_url() {
        let input = SelectedInput::new(
            InputImage::from_bytes(b"abc".to_vec(), None),
            EncodedImage::new("image/jpeg", "YWJj"),
        );
        assert_eq!(input.preview(), "data:image/jpeg;base64,YWJj");
    }
}
