//! Human-readable status text for long-running video jobs.
//!
//! The text is cosmetic; what matters is that a status line is emitted on
//! every poll so the caller can show the job is alive.

/// Emitted before the job is submitted.
pub const SUBMITTING: &str = "Initializing video generation model...";

/// Emitted once the job has been accepted.
pub const SUBMITTED: &str = "Rendering physics and lighting (this may take 1-2 minutes)...";

/// Rotated through on each status check.
pub const RENDER_STATUS: &[&str] = &[
    "Simulating fluid dynamics...",
    "Raytracing particles...",
    "Compositing audio tracks...",
    "Finalizing render...",
];

/// Cycles through [`RENDER_STATUS`].
#[derive(Debug, Default)]
pub struct RenderStatus {
    next: usize,
}

impl RenderStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status line for the next poll.
    pub fn advance(&mut self) -> &'static str {
        let message = RENDER_STATUS[self.next % RENDER_STATUS.len()];
        self.next += 1;
        message
    }
}
