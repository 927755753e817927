//! Client for the generative media service.
//!
//! Two request types are supported:
//! - composite image generation (single request/response)
//! - video generation (submit a long-running job, then poll until it is done)
//!
//! The HTTP transport is abstracted behind [`GenerationBackend`] so the
//! polling and extraction logic in [`GenerationClient`] can run against stubs.

pub mod backend;
pub mod client;
pub mod config;
pub mod credential;
pub mod download;
pub mod encoding;
pub mod error;
pub mod gemini;
pub mod metrics;
pub mod progress;
pub mod reference;
pub mod types;

pub use backend::{CompositeRequest, GenerationBackend, VideoRequest};
pub use client::GenerationClient;
pub use config::GenAiConfig;
pub use credential::{ApiKey, CredentialError, CredentialProvider, CredentialSlot};
pub use download::VideoDownloader;
pub use encoding::{encode_input, EncodedImage, InputImage};
pub use error::{GenError, GenErrorKind, GenResult, UpstreamFailure};
pub use gemini::GeminiBackend;
pub use reference::VideoReference;
pub use types::VideoOperation;
