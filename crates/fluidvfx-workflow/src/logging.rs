//! Structured session logging.
//!
//! Every lifecycle event of a workflow operation carries the session id and
//! the operation name, so one user journey can be followed in the logs.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Operation names used in session logs.
pub mod operation {
    pub const INPUT: &str = "input";
    pub const COMPOSITE: &str = "composite";
    pub const VIDEO: &str = "video";
    pub const CREDENTIAL: &str = "credential";
}

/// Logger bound to one session and one operation.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    operation: &'static str,
}

impl SessionLogger {
    /// Create a logger for `operation` within a session.
    pub fn new(session_id: Uuid, operation: &'static str) -> Self {
        Self {
            session_id: session_id.to_string(),
            operation,
        }
    }

    /// Log operation start.
    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            operation = self.operation,
            "Started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            operation = self.operation,
            "Progress: {}", message
        );
    }

    /// Log a warning.
    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            operation = self.operation,
            "Warning: {}", message
        );
    }

    /// Log an error.
    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            operation = self.operation,
            "Failed: {}", message
        );
    }

    /// Log operation completion.
    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            operation = self.operation,
            "Completed: {}", message
        );
    }

    /// Get the session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Get the operation name.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Span for instrumenting the async part of the operation.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            operation = self.operation
        )
    }
}
