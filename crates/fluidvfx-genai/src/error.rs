//! Generation client error types.

use std::fmt;

use thiserror::Error;

use crate::types::ApiErrorBody;

pub type GenResult<T> = Result<T, GenError>;

/// Google RPC statuses that mean the credential itself was rejected.
const CREDENTIAL_STATUSES: &[&str] = &["UNAUTHENTICATED", "PERMISSION_DENIED"];

/// Numeric `google.rpc.Code` values for the same statuses.
const CREDENTIAL_RPC_CODES: &[u16] = &[7, 16];

/// `ErrorInfo` reasons that mean the credential itself was rejected.
const CREDENTIAL_REASONS: &[&str] = &["API_KEY_INVALID", "API_KEY_EXPIRED"];

/// Message fragments the service uses for missing or invalid keys when no
/// structured status is available.
const CREDENTIAL_MESSAGE_PATTERNS: &[&str] = &[
    "requested entity was not found",
    "api key not valid",
    "api key expired",
    "api_key_invalid",
];

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Could not read input image: {0}")]
    Encoding(String),

    #[error("{0}")]
    Upstream(UpstreamFailure),

    #[error("No image data found in response")]
    NoImageReturned,

    #[error("Video generation completed but no URI returned.{}", filtered_suffix(.filtered))]
    NoVideoReturned { filtered: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn filtered_suffix(filtered: &[String]) -> String {
    if filtered.is_empty() {
        String::new()
    } else {
        format!(" Filtered: {}", filtered.join("; "))
    }
}

/// Discriminant of [`GenError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenErrorKind {
    Encoding,
    Upstream,
    NoImageReturned,
    NoVideoReturned,
    Config,
    Io,
}

impl GenErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenErrorKind::Encoding => "encoding",
            GenErrorKind::Upstream => "upstream",
            GenErrorKind::NoImageReturned => "no_image_returned",
            GenErrorKind::NoVideoReturned => "no_video_returned",
            GenErrorKind::Config => "config",
            GenErrorKind::Io => "io",
        }
    }
}

impl GenError {
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(UpstreamFailure::new(msg))
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn kind(&self) -> GenErrorKind {
        match self {
            GenError::Encoding(_) => GenErrorKind::Encoding,
            GenError::Upstream(_) => GenErrorKind::Upstream,
            GenError::NoImageReturned => GenErrorKind::NoImageReturned,
            GenError::NoVideoReturned { .. } => GenErrorKind::NoVideoReturned,
            GenError::Config(_) => GenErrorKind::Config,
            GenError::Io(_) => GenErrorKind::Io,
        }
    }

    /// Structured upstream failure, if this error came from the service.
    pub fn upstream_failure(&self) -> Option<&UpstreamFailure> {
        match self {
            GenError::Upstream(failure) => Some(failure),
            _ => None,
        }
    }

    /// Whether the user should be offered to select a different credential.
    pub fn is_credential_problem(&self) -> bool {
        self.upstream_failure()
            .map(UpstreamFailure::is_credential_problem)
            .unwrap_or(false)
    }
}

impl From<reqwest::Error> for GenError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(UpstreamFailure::transport(&e))
    }
}

/// Failure reported by (or while talking to) the generation service.
///
/// The message is kept verbatim so the presentation layer can show exactly
/// what the service said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    /// HTTP status, when a response was received
    pub status_code: Option<u16>,
    /// Numeric `google.rpc.Code` from a long-running operation error
    pub rpc_code: Option<u16>,
    /// Google RPC status (e.g. `NOT_FOUND`)
    pub status: Option<String>,
    /// `ErrorInfo.reason` (e.g. `API_KEY_INVALID`)
    pub reason: Option<String>,
    pub message: String,
}

impl UpstreamFailure {
    /// Failure with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            rpc_code: None,
            status: None,
            reason: None,
            message: message.into(),
        }
    }

    /// Failure before a usable response arrived (connect, TLS, timeout, decode).
    pub fn transport(e: &reqwest::Error) -> Self {
        Self {
            status_code: e.status().map(|s| s.as_u16()),
            rpc_code: None,
            status: None,
            reason: None,
            message: e.to_string(),
        }
    }

    /// Failure described by the error envelope of an HTTP response.
    pub fn from_api_error(status_code: Option<u16>, body: &ApiErrorBody) -> Self {
        Self {
            status_code: status_code.or(body.code),
            rpc_code: None,
            status: body.status.clone(),
            reason: body.reason().map(str::to_string),
            message: body.message.clone(),
        }
    }

    /// Failure carried in the `error` field of a finished operation.
    ///
    /// The operation was fetched successfully, so there is no HTTP status;
    /// `code` is a `google.rpc.Code`.
    pub fn from_operation_error(body: &ApiErrorBody) -> Self {
        Self {
            status_code: None,
            rpc_code: body.code,
            status: body.status.clone(),
            reason: body.reason().map(str::to_string),
            message: body.message.clone(),
        }
    }

    /// Whether the credential was missing, invalid or not entitled.
    ///
    /// Structured fields are checked first; message matching covers
    /// responses that carry no status.
    pub fn is_credential_problem(&self) -> bool {
        if let Some(reason) = &self.reason {
            if CREDENTIAL_REASONS.contains(&reason.as_str()) {
                return true;
            }
        }

        if let Some(status) = &self.status {
            if CREDENTIAL_STATUSES.contains(&status.as_str()) {
                return true;
            }
        }

        if let Some(code) = self.rpc_code {
            if CREDENTIAL_RPC_CODES.contains(&code) {
                return true;
            }
        }

        if matches!(self.status_code, Some(401) | Some(403)) {
            return true;
        }

        let msg = self.message.to_lowercase();
        CREDENTIAL_MESSAGE_PATTERNS.iter().any(|p| msg.contains(p))
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: u16, status: &str, message: &str) -> ApiErrorBody {
        ApiErrorBody {
            code: Some(code),
            message: message.to_string(),
            status: Some(status.to_string()),
            details: Vec::new(),
        }
    }

    #[test]
    fn test_upstream_message_is_verbatim() {
        let err = GenError::Upstream(UpstreamFailure::from_api_error(
            Some(429),
            &api_error(429, "RESOURCE_EXHAUSTED", "Quota exceeded for metric"),
        ));
        assert_eq!(err.to_string(), "Quota exceeded for metric");
        assert_eq!(err.kind(), GenErrorKind::Upstream);
        assert!(!err.is_credential_problem());
    }

    #[test]
    fn test_not_found_entity_is_credential_problem() {
        let failure = UpstreamFailure::from_api_error(
            Some(404),
            &api_error(404, "NOT_FOUND", "Requested entity was not found."),
        );
        assert!(failure.is_credential_problem());
    }

    #[test]
    fn test_structured_credential_statuses() {
        let denied = UpstreamFailure::from_api_error(
            Some(403),
            &api_error(403, "PERMISSION_DENIED", "The caller does not have permission"),
        );
        assert!(denied.is_credential_problem());

        let mut invalid = api_error(400, "INVALID_ARGUMENT", "Bad key");
        invalid.details = vec![serde_json::json!({"reason": "API_KEY_INVALID"})];
        assert!(UpstreamFailure::from_api_error(Some(400), &invalid).is_credential_problem());

        let bad_request = UpstreamFailure::from_api_error(
            Some(400),
            &api_error(400, "INVALID_ARGUMENT", "Image too large"),
        );
        assert!(!bad_request.is_credential_problem());
    }

    #[test]
    fn test_operation_error_codes() {
        let body = |code: u16, message: &str| ApiErrorBody {
            code: Some(code),
            message: message.to_string(),
            status: None,
            details: Vec::new(),
        };

        let denied = UpstreamFailure::from_operation_error(&body(7, "Caller lacks access"));
        assert_eq!(denied.status_code, None);
        assert_eq!(denied.rpc_code, Some(7));
        assert!(denied.is_credential_problem());

        let unauthenticated = UpstreamFailure::from_operation_error(&body(16, "Missing auth"));
        assert!(unauthenticated.is_credential_problem());

        let invalid = UpstreamFailure::from_operation_error(&body(3, "Prompt rejected"));
        assert!(!invalid.is_credential_problem());

        // 403 as an RPC code means nothing; it must not be read as HTTP.
        let odd = UpstreamFailure::from_operation_error(&body(403, "Unknown"));
        assert!(!odd.is_credential_problem());
    }

    #[test]
    fn test_other_kinds_are_not_credential_problems() {
        assert!(!GenError::NoImageReturned.is_credential_problem());
        assert!(!GenError::encoding("unreadable").is_credential_problem());
    }

    #[test]
    fn test_no_video_message_lists_filters() {
        let err = GenError::NoVideoReturned {
            filtered: vec!["celebrity likeness".to_string()],
        };
        assert!(err.to_string().contains("no URI returned"));
        assert!(err.to_string().contains("celebrity likeness"));

        let bare = GenError::NoVideoReturned { filtered: vec![] };
        assert_eq!(
            bare.to_string(),
            "Video generation completed but no URI returned."
        );
    }
}
