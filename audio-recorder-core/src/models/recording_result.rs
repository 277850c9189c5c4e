use std::path::PathBuf;

use serde::Serialize;

/// Why the capture loop stopped appending audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum EndReason {
    /// `stop` was requested.
    Stopped,
    /// The device failed and could not be recovered.
    DeviceFailure(String),
    /// Appending to the output file failed.
    StorageFailure(String),
}

/// Summary of a finalized recording file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    /// PCM bytes following the 44-byte header.
    pub payload_bytes: u64,
    pub duration_secs: f64,
    /// Rate written into the header.
    pub header_sample_rate: u32,
    /// Rate the device actually captured at.
    pub negotiated_sample_rate: u32,
    /// RFC 3339 timestamp of when capture began.
    pub started_at: String,
    /// SHA-256 hex digest of the finalized file.
    pub checksum: String,
    pub end_reason: EndReason,
}

impl RecordingResult {
    pub fn completed_normally(&self) -> bool {
        self.end_reason == EndReason::Stopped
    }
}
