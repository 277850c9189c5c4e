use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;

/// Event delegate for recorder notifications.
///
/// Methods may be called from the capture thread, not only the thread that
/// issued `start`/`stop`. Implementations should marshal if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called when the session state changes, including when the capture
    /// loop ends the recording on its own.
    fn on_state_changed(&self, state: RecorderState);

    /// Called when the capture loop hits an error that ends the recording.
    fn on_error(&self, error: &RecorderError);

    /// Called when the output file has been finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
