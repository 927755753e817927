//! Workflow controller.
//!
//! Drives a [`Session`] through
//! upload → scene selection → composite → confirmation → video → complete.
//! Every transition checks its guards first; a failed guard leaves the
//! session untouched and returns [`Transition::Ignored`].

use std::sync::Arc;

use fluidvfx_genai::{encode_input, GenerationClient, InputImage};
use fluidvfx_models::{SceneCatalog, WorkflowStep};
use tokio::sync::watch;
use tracing::Instrument;

use crate::error::{GuardViolation, Transition, WorkflowFailure};
use crate::logging::{operation, SessionLogger};
use crate::session::{DownloadOffer, SelectedInput, Session};

/// Progress line shown while the composite is generated.
pub const COMPOSITE_PROGRESS: &str = "Analyzing photo and blending into scene...";

/// Progress line shown while a credential is being selected.
pub const CREDENTIAL_PROGRESS: &str = "Checking API key...";

/// Owns the session and invokes the generation client on its behalf.
pub struct WorkflowController {
    session: Session,
    catalog: Arc<SceneCatalog>,
    client: GenerationClient,
    progress: watch::Sender<Option<String>>,
}

impl WorkflowController {
    /// Create a controller with a fresh session at `Upload`.
    pub fn new(catalog: Arc<SceneCatalog>, client: GenerationClient) -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            session: Session::new(),
            catalog,
            client,
            progress,
        }
    }

    /// Get the current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get the scene catalog.
    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    /// Live progress lines. The value is `None` until an operation starts.
    pub fn subscribe_progress(&self) -> watch::Receiver<Option<String>> {
        self.progress.subscribe()
    }

    /// Get the download offer once the video is ready.
    pub fn download_offer(&self) -> Option<DownloadOffer> {
        self.session.download_offer()
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    /// Store the picked photo and derive its preview.
    ///
    /// A new photo invalidates any earlier composite. If the photo cannot be
    /// encoded the previously selected one is kept.
    pub fn select_input(&mut self, image: InputImage) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::Upload) {
            return Transition::Ignored(violation);
        }
        if image.is_empty() {
            return Transition::Ignored(GuardViolation::NoInput);
        }

        let logger = SessionLogger::new(self.session.id, operation::INPUT);
        match encode_input(&image) {
            Ok(encoded) => {
                logger.log_completion(&format!(
                    "{} ({} bytes, {})",
                    image.file_name().unwrap_or("photo"),
                    image.len(),
                    encoded.mime_type()
                ));
                self.session.input = Some(SelectedInput::new(image, encoded));
                self.session.composite = None;
                self.session.error = None;
                Transition::Applied(WorkflowStep::Upload)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                self.session.error = Some(WorkflowFailure::from(&e));
                Transition::RolledBack(WorkflowStep::Upload)
            }
        }
    }

    /// Drop the picked photo.
    pub fn clear_input(&mut self) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::Upload) {
            return Transition::Ignored(violation);
        }
        self.session.input = None;
        Transition::Applied(WorkflowStep::Upload)
    }

    /// Move on to scene selection once a preview exists.
    pub fn advance(&mut self) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::Upload) {
            return Transition::Ignored(violation);
        }
        if self.session.preview().is_none() {
            return Transition::Ignored(GuardViolation::NoInput);
        }
        self.session.step = WorkflowStep::SceneSelection;
        Transition::Applied(WorkflowStep::SceneSelection)
    }

    // ------------------------------------------------------------------
    // Scene selection
    // ------------------------------------------------------------------

    /// Return to upload, keeping the selected photo.
    pub fn back_to_upload(&mut self) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::SceneSelection) {
            return Transition::Ignored(violation);
        }
        self.session.step = WorkflowStep::Upload;
        Transition::Applied(WorkflowStep::Upload)
    }

    /// Pick a scene from the catalog.
    pub fn choose_scene(&mut self, scene_id: &str) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::SceneSelection) {
            return Transition::Ignored(violation);
        }
        let Some(scene) = self.catalog.get(scene_id) else {
            return Transition::Ignored(GuardViolation::UnknownScene(scene_id.to_string()));
        };
        self.session.scene = Some(scene);
        Transition::Applied(WorkflowStep::SceneSelection)
    }

    /// Composite the photo into the chosen scene.
    ///
    /// Success moves to `ConfirmComposite`; failure records the error and
    /// returns to `SceneSelection`.
    pub async fn generate_composite(&mut self) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::SceneSelection) {
            return Transition::Ignored(violation);
        }
        let Some(scene) = self.session.scene.clone() else {
            return Transition::Ignored(GuardViolation::NoScene);
        };
        let Some(input) = self.session.input.as_ref().map(|i| i.encoded().clone()) else {
            return Transition::Ignored(GuardViolation::NoInput);
        };

        let logger = SessionLogger::new(self.session.id, operation::COMPOSITE);
        logger.log_start(&scene.label());

        self.session.composite = None;
        self.session
            .begin(WorkflowStep::GeneratingComposite, COMPOSITE_PROGRESS);
        self.publish(COMPOSITE_PROGRESS);

        let result = self
            .client
            .request_composite(&input, &scene)
            .instrument(logger.create_span())
            .await;

        match result {
            Ok(composite) => {
                logger.log_completion(&format!("{} composite", composite.mime_type()));
                self.session.composite = Some(composite);
                self.session.finish(WorkflowStep::ConfirmComposite, None);
                Transition::Applied(WorkflowStep::ConfirmComposite)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                self.session
                    .finish(WorkflowStep::SceneSelection, Some(WorkflowFailure::from(&e)));
                Transition::RolledBack(WorkflowStep::SceneSelection)
            }
        }
    }

    // ------------------------------------------------------------------
    // Composite confirmation
    // ------------------------------------------------------------------

    /// Go back and pick another scene.
    pub fn retry_with_different_scene(&mut self) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::ConfirmComposite) {
            return Transition::Ignored(violation);
        }
        self.session.step = WorkflowStep::SceneSelection;
        Transition::Applied(WorkflowStep::SceneSelection)
    }

    /// Animate the composite.
    ///
    /// A credential is ensured first; if none can be obtained the service is
    /// not called. Any failure returns to `ConfirmComposite` with the
    /// composite intact.
    pub async fn generate_video(&mut self) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::ConfirmComposite) {
            return Transition::Ignored(violation);
        }
        let Some(composite) = self.session.composite.clone() else {
            return Transition::Ignored(GuardViolation::NoComposite);
        };
        let Some(scene) = self.session.scene.clone() else {
            return Transition::Ignored(GuardViolation::NoScene);
        };

        let logger = SessionLogger::new(self.session.id, operation::VIDEO);
        logger.log_start(&scene.label());

        self.session
            .begin(WorkflowStep::GeneratingVideo, CREDENTIAL_PROGRESS);
        self.publish(CREDENTIAL_PROGRESS);

        if let Err(failure) = self.ensure_credential().await {
            logger.log_error(failure.message());
            self.session
                .finish(WorkflowStep::ConfirmComposite, Some(failure));
            return Transition::RolledBack(WorkflowStep::ConfirmComposite);
        }

        let progress = &self.progress;
        let on_progress = |message: &str| {
            logger.log_progress(message);
            progress.send_replace(Some(message.to_string()));
        };
        let result = self
            .client
            .request_video(&composite, &scene, on_progress)
            .instrument(logger.create_span())
            .await;

        self.session.progress = self.progress.borrow().clone();

        match result {
            Ok(reference) => {
                logger.log_completion(&reference.redacted());
                self.session.video = Some(reference);
                self.session.finish(WorkflowStep::Complete, None);
                Transition::Applied(WorkflowStep::Complete)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                self.session
                    .finish(WorkflowStep::ConfirmComposite, Some(WorkflowFailure::from(&e)));
                Transition::RolledBack(WorkflowStep::ConfirmComposite)
            }
        }
    }

    // ------------------------------------------------------------------
    // Completion and recovery
    // ------------------------------------------------------------------

    /// Start over with a fresh session.
    pub fn reset(&mut self) -> Transition {
        if let Err(violation) = self.require(WorkflowStep::Complete) {
            return Transition::Ignored(violation);
        }
        self.session = Session::new();
        self.progress.send_replace(None);
        Transition::Applied(WorkflowStep::Upload)
    }

    /// Repair the session after an in-flight generation future was dropped.
    pub fn abandon(&mut self) -> Transition {
        if !self.session.busy {
            return Transition::Ignored(GuardViolation::NotBusy);
        }

        let from = self.session.step;
        let to = match from {
            WorkflowStep::GeneratingComposite => WorkflowStep::SceneSelection,
            WorkflowStep::GeneratingVideo => WorkflowStep::ConfirmComposite,
            other => return Transition::Ignored(GuardViolation::WrongStep { actual: other }),
        };

        let failure = WorkflowFailure::abandoned(from);
        SessionLogger::new(self.session.id, operation_for(from)).log_warning(failure.message());
        self.session.finish(to, Some(failure));
        Transition::RolledBack(to)
    }

    /// Let the user pick a different API key. The step does not change.
    pub async fn reselect_credential(&mut self) -> Transition {
        if self.session.busy {
            return Transition::Ignored(GuardViolation::Busy);
        }

        let logger = SessionLogger::new(self.session.id, operation::CREDENTIAL);
        let step = self.session.step;

        match self.client.credentials().request_selection().await {
            Ok(()) => {
                logger.log_completion("credential selected");
                self.session.error = None;
                Transition::Applied(step)
            }
            Err(e) => {
                logger.log_warning(&e.to_string());
                self.session.error = Some(WorkflowFailure::credential_unavailable(&e));
                Transition::RolledBack(step)
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn require(&self, step: WorkflowStep) -> Result<(), GuardViolation> {
        if self.session.busy {
            return Err(GuardViolation::Busy);
        }
        if self.session.step != step {
            return Err(GuardViolation::WrongStep {
                actual: self.session.step,
            });
        }
        Ok(())
    }

    async fn ensure_credential(&self) -> Result<(), WorkflowFailure> {
        let credentials = self.client.credentials();
        if credentials.is_present().await {
            return Ok(());
        }
        credentials
            .request_selection()
            .await
            .map_err(|e| WorkflowFailure::credential_unavailable(&e))
    }

    fn publish(&self, message: &str) {
        self.progress.send_replace(Some(message.to_string()));
    }
}

fn operation_for(step: WorkflowStep) -> &'static str {
    match step {
        WorkflowStep::GeneratingVideo => operation::VIDEO,
        _ => operation::COMPOSITE,
    }
}
