//! Workflow outcome and failure types.

use std::fmt;

use fluidvfx_genai::{CredentialError, GenError, GenErrorKind};
use fluidvfx_models::WorkflowStep;
use thiserror::Error;

/// Category of a user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Encoding,
    Upstream,
    NoImageReturned,
    NoVideoReturned,
    Config,
    Io,
    /// Credential selection failed or was cancelled
    CredentialUnavailable,
    /// The in-flight request was dropped before it finished
    Abandoned,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Encoding => "encoding",
            FailureKind::Upstream => "upstream",
            FailureKind::NoImageReturned => "no_image_returned",
            FailureKind::NoVideoReturned => "no_video_returned",
            FailureKind::Config => "config",
            FailureKind::Io => "io",
            FailureKind::CredentialUnavailable => "credential_unavailable",
            FailureKind::Abandoned => "abandoned",
        }
    }
}

impl From<GenErrorKind> for FailureKind {
    fn from(kind: GenErrorKind) -> Self {
        match kind {
            GenErrorKind::Encoding => FailureKind::Encoding,
            GenErrorKind::Upstream => FailureKind::Upstream,
            GenErrorKind::NoImageReturned => FailureKind::NoImageReturned,
            GenErrorKind::NoVideoReturned => FailureKind::NoVideoReturned,
            GenErrorKind::Config => FailureKind::Config,
            GenErrorKind::Io => FailureKind::Io,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The last error of a session, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFailure {
    kind: FailureKind,
    message: String,
    needs_credential_reselect: bool,
}

impl WorkflowFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            needs_credential_reselect: false,
        }
    }

    pub fn credential_unavailable(err: &CredentialError) -> Self {
        Self {
            kind: FailureKind::CredentialUnavailable,
            message: err.to_string(),
            needs_credential_reselect: true,
        }
    }

    pub fn abandoned(step: WorkflowStep) -> Self {
        Self::new(
            FailureKind::Abandoned,
            format!("Request abandoned while {}", step),
        )
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the presentation layer should offer to pick another API key.
    pub fn needs_credential_reselect(&self) -> bool {
        self.needs_credential_reselect
    }
}

impl From<&GenError> for WorkflowFailure {
    fn from(err: &GenError) -> Self {
        Self {
            kind: err.kind().into(),
            message: err.to_string(),
            needs_credential_reselect: err.is_credential_problem(),
        }
    }
}

impl fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Why a transition was refused. The session is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("not available in step {actual}")]
    WrongStep { actual: WorkflowStep },

    #[error("a generation request is already in flight")]
    Busy,

    #[error("no generation request is in flight")]
    NotBusy,

    #[error("no input image selected")]
    NoInput,

    #[error("no scene selected")]
    NoScene,

    #[error("unknown scene: {0}")]
    UnknownScene(String),

    #[error("no composite image available")]
    NoComposite,
}

/// Result of invoking a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The transition ran and the session is now in this step.
    Applied(WorkflowStep),
    /// The operation failed; the error is recorded and the session rolled
    /// back to this step.
    RolledBack(WorkflowStep),
    /// A guard failed; nothing changed.
    Ignored(GuardViolation),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Transition::Ignored(_))
    }

    /// Step the session is in after this transition, if it moved.
    pub fn step(&self) -> Option<WorkflowStep> {
        match self {
            Transition::Applied(step) | Transition::RolledBack(step) => Some(*step),
            Transition::Ignored(_) => None,
        }
    }
}
