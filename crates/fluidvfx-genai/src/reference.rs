//! Playable video references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credential::ApiKey;

/// Query parameter carrying the credential on download references.
const KEY_PARAM: &str = "key";

/// Reference to a generated video (typically a download URL).
///
/// References returned by the video service point at the file API, which
/// only serves authenticated requests, so the active credential is always
/// attached via [`VideoReference::with_credential`] before the reference
/// leaves the client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoReference(String);

impl VideoReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a `key` query parameter is already present.
    pub fn has_credential(&self) -> bool {
        self.query()
            .map(|q| {
                q.split('&')
                    .any(|pair| pair.split('=').next() == Some(KEY_PARAM))
            })
            .unwrap_or(false)
    }

    /// Attach the credential as the `key` query parameter.
    ///
    /// A reference that already carries a key is returned unchanged.
    pub fn with_credential(&self, key: &ApiKey) -> Self {
        if self.has_credential() {
            return self.clone();
        }

        let separator = if self.0.contains('?') { '&' } else { '?' };
        Self(format!(
            "{}{}{}={}",
            self.0,
            separator,
            KEY_PARAM,
            urlencoding::encode(key.expose())
        ))
    }

    /// The reference with any credential value masked, for logs.
    pub fn redacted(&self) -> String {
        let Some((base, query)) = self.0.split_once('?') else {
            return self.0.clone();
        };

        let query = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((KEY_PARAM, _)) => format!("{}=***", KEY_PARAM),
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", base, query)
    }

    fn query(&self) -> Option<&str> {
        self.0.split_once('?').map(|(_, q)| q)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VideoReference").field(&self.redacted()).finish()
    }
}
