use parking_lot::Mutex;
use serde_json::Value;

use crate::control::method::{MethodCall, MethodResponse};
use crate::models::state::RecorderState;
use crate::session::recording::RecordingSession;
use crate::traits::capture_device::CaptureBackend;

/// Name of the channel the host registers the recorder under.
pub const CHANNEL_NAME: &str = "audio_recorder";

pub const START_RECORDING: &str = "startRecording";
pub const STOP_RECORDING: &str = "stopRecording";

/// Translates named method calls into `RecordingSession` operations.
///
/// Owns the session for the lifetime of the host registration. The mutex
/// serializes control calls; dropping the surface tears the session down,
/// stopping any recording in progress.
pub struct ControlSurface<B: CaptureBackend> {
    session: Mutex<RecordingSession<B>>,
}

impl<B: CaptureBackend> ControlSurface<B> {
    pub fn new(session: RecordingSession<B>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Dispatch a call by method name.
    pub fn handle(&self, call: &MethodCall) -> MethodResponse {
        match call.method.as_str() {
            START_RECORDING => self.start_recording(&call.arguments),
            STOP_RECORDING => self.stop_recording(),
            other => {
                log::debug!("method {:?} not implemented", other);
                MethodResponse::NotImplemented
            }
        }
    }

    /// `startRecording({ path })`.
    pub fn start_recording(&self, arguments: &Value) -> MethodResponse {
        let Some(path) = arguments.get("path").and_then(Value::as_str) else {
            return MethodResponse::error(
                "invalid_arguments",
                "Expected a string argument \"path\"",
                None,
            );
        };

        match self.session.lock().start(path) {
            Ok(()) => MethodResponse::Success,
            Err(e) => {
                log::warn!("startRecording failed: {}", e);
                MethodResponse::from(&e)
            }
        }
    }

    /// `stopRecording()`.
    pub fn stop_recording(&self) -> MethodResponse {
        match self.session.lock().stop() {
            Ok(result) => {
                if !result.completed_normally() {
                    log::warn!("recording ended early: {:?}", result.end_reason);
                }
                log::info!(
                    "recorded {:.2}s to {} (sha256 {})",
                    result.duration_secs,
                    result.file_path.display(),
                    result.checksum
                );
                MethodResponse::Success
            }
            Err(e) => {
                log::warn!("stopRecording failed: {}", e);
                MethodResponse::from(&e)
            }
        }
    }

    pub fn state(&self) -> RecorderState {
        self.session.lock().state()
    }
}
