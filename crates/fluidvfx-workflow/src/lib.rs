//! Photo-to-video generation workflow.
//!
//! This crate provides:
//! - The [`Session`] record for one user journey
//! - The [`WorkflowController`] state machine that mutates it
//! - Failure classification for the presentation layer
//! - Structured session logging

pub mod controller;
pub mod error;
pub mod logging;
pub mod session;

pub use controller::{WorkflowController, COMPOSITE_PROGRESS};
pub use error::{FailureKind, GuardViolation, Transition, WorkflowFailure};
pub use logging::SessionLogger;
pub use session::{DownloadOffer, SelectedInput, Session, SUGGESTED_DOWNLOAD_FILENAME};
