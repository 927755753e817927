//! Generation client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fluidvfx_models::{OutputSpec, Scene};
use tracing::{debug, info, warn};

use crate::backend::{CompositeRequest, GenerationBackend, VideoRequest};
use crate::config::GenAiConfig;
use crate::credential::{ApiKey, CredentialProvider};
use crate::encoding::EncodedImage;
use crate::error::{GenError, GenResult, UpstreamFailure};
use crate::gemini::GeminiBackend;
use crate::metrics::{self, operation};
use crate::progress::{RenderStatus, SUBMITTED, SUBMITTING};
use crate::reference::VideoReference;

/// Issues composite and video requests against a [`GenerationBackend`].
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    credentials: Arc<dyn CredentialProvider>,
    poll_interval: Duration,
    output: OutputSpec,
}

impl GenerationClient {
    /// Create a client over any backend.
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        credentials: Arc<dyn CredentialProvider>,
        config: &GenAiConfig,
    ) -> Self {
        Self {
            backend,
            credentials,
            poll_interval: config.poll_interval,
            output: config.output,
        }
    }

    /// Client backed by the Gemini REST API.
    pub fn from_config(
        config: GenAiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> GenResult<Self> {
        let backend = GeminiBackend::new(config.clone())?;
        Ok(Self::new(Arc::new(backend), credentials, &config))
    }

    /// Override the video polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Get the requested video output format.
    pub fn output(&self) -> OutputSpec {
        self.output
    }

    /// Get the credential provider.
    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    /// Composite the input photo into the scene.
    ///
    /// Returns the first inline image among the response parts.
    pub async fn request_composite(
        &self,
        input: &EncodedImage,
        scene: &Scene,
    ) -> GenResult<EncodedImage> {
        let started = Instant::now();
        let credential = self.credentials.current().await;

        let request = CompositeRequest {
            prompt: &scene.image_prompt,
            image: input,
            output: self.output,
        };

        info!(
            backend = self.backend.name(),
            scene = %scene.id,
            "Requesting composite"
        );

        let result = self
            .backend
            .generate_content(request, credential.as_ref())
            .await
            .and_then(|response| {
                let inline = response
                    .first_inline_data()
                    .ok_or(GenError::NoImageReturned)?;
                Ok(EncodedImage::new(&inline.mime_type, &inline.data))
            });

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(image) => {
                metrics::record_generation(operation::COMPOSITE, "success", elapsed);
                info!(
                    scene = %scene.id,
                    mime_type = image.mime_type(),
                    elapsed_secs = elapsed,
                    "Composite generated"
                );
            }
            Err(e) => {
                metrics::record_generation(operation::COMPOSITE, e.kind().as_str(), elapsed);
                warn!(scene = %scene.id, error = %e, "Composite generation failed");
            }
        }

        result
    }

    /// Animate the composite into a video.
    ///
    /// Submits the job, then sleeps and re-checks until the service reports
    /// it done. `on_progress` is called at least once per status check.
    /// There is no bound on the number of checks.
    pub async fn request_video<F>(
        &self,
        composite: &EncodedImage,
        scene: &Scene,
        on_progress: F,
    ) -> GenResult<VideoReference>
    where
        F: Fn(&str) + Send + Sync,
    {
        let started = Instant::now();
        let result = self.run_video_job(composite, scene, &on_progress).await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(reference) => {
                metrics::record_generation(operation::VIDEO, "success", elapsed);
                info!(
                    scene = %scene.id,
                    reference = %reference.redacted(),
                    elapsed_secs = elapsed,
                    "Video generated"
                );
            }
            Err(e) => {
                metrics::record_generation(operation::VIDEO, e.kind().as_str(), elapsed);
                warn!(scene = %scene.id, error = %e, "Video generation failed");
            }
        }

        result
    }

    async fn run_video_job(
        &self,
        composite: &EncodedImage,
        scene: &Scene,
        on_progress: &(dyn Fn(&str) + Send + Sync),
    ) -> GenResult<VideoReference> {
        let credential = self.credentials.current().await;

        on_progress(SUBMITTING);

        let request = VideoRequest {
            prompt: &scene.video_prompt,
            seed_frame: composite,
            output: self.output,
        };

        let mut operation = self
            .backend
            .submit_video(request, credential.as_ref())
            .await?;

        info!(
            backend = self.backend.name(),
            scene = %scene.id,
            operation = %operation.name,
            "Video job submitted"
        );
        on_progress(SUBMITTED);

        let mut status = RenderStatus::new();
        let mut polls: u32 = 0;

        while !operation.done {
            tokio::time::sleep(self.poll_interval).await;

            operation = self
                .backend
                .get_operation(&operation, credential.as_ref())
                .await?;
            polls += 1;
            metrics::record_video_poll();

            debug!(operation = %operation.name, polls, done = operation.done, "Polled video job");
            on_progress(status.advance());
        }

        if let Some(error) = &operation.error {
            return Err(GenError::Upstream(UpstreamFailure::from_operation_error(error)));
        }

        let uri = operation
            .video_uri()
            .ok_or_else(|| GenError::NoVideoReturned {
                filtered: operation.filtered_reasons(),
            })?;

        Ok(authorize(VideoReference::new(uri), credential.as_ref()))
    }
}

/// Attach the active credential so the reference can be fetched directly.
fn authorize(reference: VideoReference, credential: Option<&ApiKey>) -> VideoReference {
    match credential {
        Some(key) => reference.with_credential(key),
        None => {
            warn!("No active credential; returning video reference without key");
            reference
        }
    }
}
