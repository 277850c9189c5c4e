use thiserror::Error;

/// Errors surfaced by the recorder.
///
/// State-machine misuse (`AlreadyRecording`, `NotRecording`) is always
/// recoverable by the caller. Device acquisition failures leave the session
/// idle. `UnrecoverableDevice` and `Storage` end an in-progress recording.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error("failed to open audio device: {0}")]
    DeviceOpen(String),

    #[error("failed to set hardware parameters: {0}")]
    Parameter(String),

    #[error("unrecoverable device error: {0}")]
    UnrecoverableDevice(String),

    #[error("storage error: {0}")]
    Storage(String),

    /// The capture worker ended the recording on its own before `stop`.
    #[error("recording ended before stop was requested: {0}")]
    RecordingAborted(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl RecorderError {
    /// Machine-readable kind reported through the control surface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRecording => "already_recording",
            Self::NotRecording | Self::RecordingAborted(_) => "not_recording",
            Self::DeviceOpen(_) | Self::Parameter(_) | Self::Unknown(_) => "init_failed",
            Self::UnrecoverableDevice(_) => "device_failed",
            Self::Storage(_) => "storage_failed",
        }
    }

    /// Short human-readable summary, without the backend detail.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::AlreadyRecording => "Recording is already in progress",
            Self::NotRecording => "No recording in progress",
            Self::RecordingAborted(_) => "Recording already ended",
            Self::DeviceOpen(_) => "Failed to open audio device",
            Self::Parameter(_) => "Failed to set hardware parameters",
            Self::UnrecoverableDevice(_) => "Audio device failed",
            Self::Storage(_) => "Failed to write recording",
            Self::Unknown(_) => "Failed to start recording",
        }
    }

    /// Backend detail carried by the error, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::AlreadyRecording | Self::NotRecording => None,
            Self::DeviceOpen(d)
            | Self::Parameter(d)
            | Self::UnrecoverableDevice(d)
            | Self::Storage(d)
            | Self::RecordingAborted(d)
            | Self::Unknown(d) => Some(d),
        }
    }
}

/// A failed device read.
///
/// Returned by `CaptureDevice::read_frames` and handed back to
/// `CaptureDevice::recover`, which decides whether capture can continue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceFault {
    /// Samples were lost because the reader fell behind the device.
    #[error("input overrun, {dropped} samples dropped")]
    Overrun { dropped: usize },

    #[error("device suspended")]
    Suspended,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("device disconnected: {0}")]
    Disconnected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_codes() {
        assert_eq!(RecorderError::AlreadyRecording.code(), "already_recording");
        assert_eq!(RecorderError::NotRecording.code(), "not_recording");
        assert_eq!(RecorderError::RecordingAborted("x".into()).code(), "not_recording");
        assert_eq!(RecorderError::DeviceOpen("x".into()).code(), "init_failed");
        assert_eq!(RecorderError::Parameter("x".into()).code(), "init_failed");
        assert_eq!(RecorderError::Storage("x".into()).code(), "storage_failed");
    }

    #[test]
    fn detail_is_backend_message() {
        let err = RecorderError::DeviceOpen("No such device".into());
        assert_eq!(err.detail(), Some("No such device"));
        assert_eq!(err.to_string(), "failed to open audio device: No such device");
        assert_eq!(RecorderError::NotRecording.detail(), None);
    }
}
