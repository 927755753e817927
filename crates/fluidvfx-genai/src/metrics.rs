//! Metrics for generation requests.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const GENERATION_REQUESTS_TOTAL: &str = "fluidvfx_generation_requests_total";
    pub const GENERATION_DURATION_SECONDS: &str = "fluidvfx_generation_duration_seconds";
    pub const VIDEO_POLLS_TOTAL: &str = "fluidvfx_video_polls_total";
    pub const DOWNLOADS_TOTAL: &str = "fluidvfx_downloads_total";
    pub const DOWNLOAD_BYTES_TOTAL: &str = "fluidvfx_download_bytes_total";
}

/// Generation operation label values.
pub mod operation {
    pub const COMPOSITE: &str = "composite";
    pub const VIDEO: &str = "video";
}

/// Record a finished generation request.
pub fn record_generation(operation: &'static str, outcome: &'static str, duration_secs: f64) {
    let labels = [("operation", operation), ("outcome", outcome)];
    counter!(names::GENERATION_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one video job status check.
pub fn record_video_poll() {
    counter!(names::VIDEO_POLLS_TOTAL).increment(1);
}

/// Record a finished download.
pub fn record_download(outcome: &'static str, bytes: u64) {
    counter!(names::DOWNLOADS_TOTAL, "outcome" => outcome).increment(1);
    counter!(names::DOWNLOAD_BYTES_TOTAL).increment(bytes);
}
