//! Gemini REST backend.
//!
//! Speaks the public Generative Language API:
//! - `POST {base}/models/{model}:generateContent` for composites
//! - `POST {base}/models/{model}:predictLongRunning` to start a video job
//! - `GET {base}/{operation}` to check on it
//!
//! Requests authenticate with the `key` query parameter.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::backend::{CompositeRequest, GenerationBackend, VideoRequest};
use crate::config::GenAiConfig;
use crate::credential::ApiKey;
use crate::error::{GenError, GenResult, UpstreamFailure};
use crate::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, ImageConfig,
    ImageGenerationConfig, Part, PredictVideoRequest, SeedImage, VideoInstance, VideoOperation,
    VideoParameters,
};

/// HTTP client for the Gemini API.
pub struct GeminiBackend {
    http: Client,
    config: GenAiConfig,
}

impl GeminiBackend {
    /// Create a new backend.
    pub fn new(config: GenAiConfig) -> GenResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenResult<Self> {
        Self::new(GenAiConfig::from_env())
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/{}", self.config.base_url, name.trim_start_matches('/'))
    }

    fn authenticate(request: RequestBuilder, credential: Option<&ApiKey>) -> RequestBuilder {
        match credential {
            Some(key) => request.query(&[("key", key.expose())]),
            None => request,
        }
    }

    /// Decode a success body, or turn an error body into an [`UpstreamFailure`].
    async fn parse_response<T: DeserializeOwned>(response: Response) -> GenResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let failure = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => UpstreamFailure::from_api_error(Some(status.as_u16()), &envelope.error),
            Err(_) => UpstreamFailure {
                status_code: Some(status.as_u16()),
                rpc_code: None,
                status: None,
                reason: None,
                message: format!("Gemini API returned {}: {}", status, body),
            },
        };

        warn!(
            status = status.as_u16(),
            rpc_status = failure.status.as_deref().unwrap_or("-"),
            "Gemini API error: {}",
            failure.message
        );
        Err(GenError::Upstream(failure))
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate_content(
        &self,
        request: CompositeRequest<'_>,
        credential: Option<&ApiKey>,
    ) -> GenResult<GenerateContentResponse> {
        let url = self.model_url(&self.config.image_model, "generateContent");

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::text(request.prompt),
                    Part::inline(request.image.mime_type(), request.image.data()),
                ],
            }],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: request.output.aspect_ratio.to_string(),
                    image_size: request.output.image_size.as_str().to_string(),
                },
            },
        };

        debug!(model = %self.config.image_model, "Sending composite request");

        let response = Self::authenticate(self.http.post(&url), credential)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn submit_video(
        &self,
        request: VideoRequest<'_>,
        credential: Option<&ApiKey>,
    ) -> GenResult<VideoOperation> {
        let url = self.model_url(&self.config.video_model, "predictLongRunning");

        let body = PredictVideoRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt.to_string(),
                image: SeedImage {
                    bytes_base64_encoded: request.seed_frame.data().to_string(),
                    mime_type: request.seed_frame.mime_type().to_string(),
                },
            }],
            parameters: VideoParameters {
                aspect_ratio: request.output.aspect_ratio.to_string(),
                resolution: request.output.resolution.as_str().to_string(),
                sample_count: request.output.video_count(),
            },
        };

        debug!(model = %self.config.video_model, "Submitting video job");

        let response = Self::authenticate(self.http.post(&url), credential)
            .json(&body)
            .send()
            .await?;

        let operation: VideoOperation = Self::parse_response(response).await?;
        if operation.name.is_empty() {
            return Err(GenError::upstream(
                "Video job was accepted but no operation name was returned",
            ));
        }
        Ok(operation)
    }

    async fn get_operation(
        &self,
        operation: &VideoOperation,
        credential: Option<&ApiKey>,
    ) -> GenResult<VideoOperation> {
        let url = self.operation_url(&operation.name);

        let response = Self::authenticate(self.http.get(&url), credential)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let backend =
            GeminiBackend::new(GenAiConfig::default().with_base_url("http://localhost:1/v1beta"))
                .unwrap();

        assert_eq!(
            backend.model_url("veo-3.1-generate-preview", "predictLongRunning"),
            "http://localhost:1/v1beta/models/veo-3.1-generate-preview:predictLongRunning"
        );
        assert_eq!(
            backend.operation_url("models/veo/operations/abc"),
            "http://localhost:1/v1beta/models/veo/operations/abc"
        );
    }
}
