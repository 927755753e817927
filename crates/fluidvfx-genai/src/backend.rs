//! Generation service boundary.
//!
//! A backend performs single wire calls; it does not poll, retry or pick
//! results out of responses. That logic lives in [`crate::GenerationClient`].

use async_trait::async_trait;
use fluidvfx_models::OutputSpec;

use crate::credential::ApiKey;
use crate::encoding::EncodedImage;
use crate::error::GenResult;
use crate::types::{GenerateContentResponse, VideoOperation};

/// Composite image request: one instruction plus one input image.
#[derive(Debug, Clone, Copy)]
pub struct CompositeRequest<'a> {
    pub prompt: &'a str,
    pub image: &'a EncodedImage,
    pub output: OutputSpec,
}

/// Video job request: one instruction plus the seed frame.
#[derive(Debug, Clone, Copy)]
pub struct VideoRequest<'a> {
    pub prompt: &'a str,
    pub seed_frame: &'a EncodedImage,
    pub output: OutputSpec,
}

/// Transport to the generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Synchronous image generation.
    async fn generate_content(
        &self,
        request: CompositeRequest<'_>,
        credential: Option<&ApiKey>,
    ) -> GenResult<GenerateContentResponse>;

    /// Submit a video job. Returns the job handle immediately.
    async fn submit_video(
        &self,
        request: VideoRequest<'_>,
        credential: Option<&ApiKey>,
    ) -> GenResult<VideoOperation>;

    /// Fetch the current state of a video job.
    async fn get_operation(
        &self,
        operation: &VideoOperation,
        credential: Option<&ApiKey>,
    ) -> GenResult<VideoOperation>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}
