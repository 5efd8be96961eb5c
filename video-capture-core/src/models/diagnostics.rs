use serde::Serialize;

/// Frame delivery counters for the current capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureDiagnostics {
    pub frames_delivered: u64,
    pub bytes_delivered: u64,
    pub last_capture_time_ms: Option<i64>,
    /// RFC 3339 time the last successful start completed.
    pub started_at: Option<String>,
}
