//! Generation client configuration.

use std::time::Duration;

use fluidvfx_models::{AspectRatio, OutputSpec, Resolution};
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-generate-preview";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the generation client.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// Base URL of the REST API (without trailing slash)
    pub base_url: String,
    /// Model used for compositing
    pub image_model: String,
    /// Model used for video generation
    pub video_model: String,
    /// Delay between video job status checks
    pub poll_interval: Duration,
    /// Per-request HTTP timeout (not a bound on the whole video job); the
    /// downloader applies it per read instead
    pub request_timeout: Duration,
    /// Output constraints for composite and video
    pub output: OutputSpec,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            output: OutputSpec::default(),
        }
    }
}

impl GenAiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let aspect_ratio = match std::env::var("FLUIDVFX_ASPECT_RATIO") {
            Ok(s) => s.parse::<AspectRatio>().unwrap_or_else(|e| {
                warn!("Ignoring FLUIDVFX_ASPECT_RATIO: {}", e);
                defaults.output.aspect_ratio
            }),
            Err(_) => defaults.output.aspect_ratio,
        };

        let resolution = match std::env::var("FLUIDVFX_VIDEO_RESOLUTION") {
            Ok(s) => s.parse::<Resolution>().unwrap_or_else(|e| {
                warn!("Ignoring FLUIDVFX_VIDEO_RESOLUTION: {}", e);
                defaults.output.resolution
            }),
            Err(_) => defaults.output.resolution,
        };

        Self {
            base_url: std::env::var("GEMINI_API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            image_model: std::env::var("FLUIDVFX_IMAGE_MODEL").unwrap_or(defaults.image_model),
            video_model: std::env::var("FLUIDVFX_VIDEO_MODEL").unwrap_or(defaults.video_model),
            poll_interval: Duration::from_secs(
                std::env::var("FLUIDVFX_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_POLL_INTERVAL.as_secs()),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("FLUIDVFX_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT.as_secs()),
            ),
            output: defaults
                .output
                .with_aspect_ratio(aspect_ratio)
                .with_resolution(resolution),
        }
    }

    /// Point the client at a different API root (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GenAiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.image_model, "gemini-3-pro-image-preview");
        assert_eq!(config.video_model, "veo-3.1-generate-preview");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.output.aspect_ratio, AspectRatio::LANDSCAPE);
        assert_eq!(config.output.resolution, Resolution::Hd1080);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let config = GenAiConfig::default().with_base_url("http://localhost:9000/v1beta/");
        assert_eq!(config.base_url, "http://localhost:9000/v1beta");
    }
}
