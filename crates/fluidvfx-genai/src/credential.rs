//! Credential provider abstraction.
//!
//! The generation service is metered, so the API key is an injected
//! dependency rather than an ambient lookup. [`CredentialSlot`] is the
//! process-wide slot with explicit get/set; front ends wrap it to add an
//! interactive selection flow.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variables checked for a key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// API key for the generation service.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building authenticated requests.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("No API key configured. Set GEMINI_API_KEY or select a key.")]
    NotConfigured,

    #[error("API key selection was cancelled")]
    Cancelled,

    #[error("API key selection failed: {0}")]
    SelectionFailed(String),
}

/// Source of the credential used for generation requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Whether a credential is currently available.
    async fn is_present(&self) -> bool;

    /// The active credential, if any.
    async fn current(&self) -> Option<ApiKey>;

    /// Run the selection flow. On `Ok`, a credential is present.
    async fn request_selection(&self) -> Result<(), CredentialError>;
}

/// In-process credential slot.
#[derive(Default)]
pub struct CredentialSlot {
    key: RwLock<Option<ApiKey>>,
}

impl CredentialSlot {
    pub fn new(key: Option<ApiKey>) -> Self {
        Self {
            key: RwLock::new(key),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Seed the slot from the first non-empty variable in [`API_KEY_ENV_VARS`].
    pub fn from_env() -> Self {
        let key = API_KEY_ENV_VARS.iter().find_map(|var| {
            std::env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| {
                    debug!(var, "Loaded API key from environment");
                    ApiKey::new(v)
                })
        });
        Self::new(key)
    }

    pub fn get(&self) -> Option<ApiKey> {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, key: ApiKey) {
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = Some(key);
        info!("API key updated");
    }

    pub fn clear(&self) {
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl CredentialProvider for CredentialSlot {
    async fn is_present(&self) -> bool {
        self.get().is_some()
    }

    async fn current(&self) -> Option<ApiKey> {
        self.get()
    }

    /// A bare slot has no interactive flow; selection succeeds only if a
    /// key was already set.
    async fn request_selection(&self) -> Result<(), CredentialError> {
        if self.get().is_some() {
            Ok(())
        } else {
            Err(CredentialError::NotConfigured)
        }
    }
}
