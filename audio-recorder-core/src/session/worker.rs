use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::error::RecorderError;
use crate::models::recording_result::{EndReason, RecordingResult};
use crate::models::state::RecorderState;
use crate::processing::wav_format::BYTES_PER_FRAME;
use crate::storage::recording_writer::RecordingWriter;
use crate::traits::capture_device::CaptureDevice;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Everything the capture thread needs besides the device itself.
pub(crate) struct CaptureJob {
    pub output_path: PathBuf,
    pub frames_per_read: usize,
    pub header_sample_rate: u32,
    pub recording: Arc<AtomicBool>,
    pub delegate: Option<Arc<dyn RecorderDelegate>>,
}

/// Returned through the thread's `JoinHandle` so the session can close the
/// device after the loop is gone.
pub(crate) struct WorkerExit<D> {
    pub device: D,
    /// Why the loop stopped appending, independent of whether finalize
    /// succeeded afterwards.
    pub end_reason: EndReason,
    pub outcome: Result<RecordingResult, RecorderError>,
}

/// Capture thread body.
///
/// Runs until the shared flag is cleared by `stop`, or clears it itself when
/// the device or the file fails. The file is finalized on every path that
/// got as far as writing the header.
pub(crate) fn run<D: CaptureDevice>(mut device: D, job: CaptureJob) -> WorkerExit<D> {
    let (end_reason, outcome) = capture_to_file(&mut device, &job);

    // Only the side that lowers the flag reports the return to idle.
    let self_terminated =
        end_reason != EndReason::Stopped && job.recording.swap(false, Ordering::SeqCst);

    if let Some(ref delegate) = job.delegate {
        let reason_error = failure(&end_reason);
        if let Some(ref e) = reason_error {
            delegate.on_error(e);
        }
        match &outcome {
            Ok(result) => delegate.on_recording_finished(result),
            Err(e) if reason_error.as_ref() != Some(e) => delegate.on_error(e),
            Err(_) => {}
        }
        if self_terminated {
            delegate.on_state_changed(RecorderState::Idle);
        }
    }

    WorkerExit {
        device,
        end_reason,
        outcome,
    }
}

fn failure(end_reason: &EndReason) -> Option<RecorderError> {
    match end_reason {
        EndReason::Stopped => None,
        EndReason::DeviceFailure(detail) => Some(RecorderError::UnrecoverableDevice(detail.clone())),
        EndReason::StorageFailure(detail) => Some(RecorderError::Storage(detail.clone())),
    }
}

fn capture_to_file<D: CaptureDevice>(
    device: &mut D,
    job: &CaptureJob,
) -> (EndReason, Result<RecordingResult, RecorderError>) {
    let started_at = chrono::Utc::now().to_rfc3339();

    let mut writer = match RecordingWriter::create(
        job.output_path.clone(),
        job.header_sample_rate,
        job.frames_per_read,
    ) {
        Ok(writer) => writer,
        Err(e) => {
            log::error!("capture aborted before first read: {}", e);
            let detail = e.detail().unwrap_or_default().to_string();
            return (EndReason::StorageFailure(detail), Err(e));
        }
    };

    let mut frames = vec![0i16; job.frames_per_read];
    let mut end_reason = EndReason::Stopped;

    while job.recording.load(Ordering::SeqCst) {
        match device.read_frames(&mut frames) {
            Ok(0) => {}
            Ok(n) => {
                if let Err(e) = writer.append(&frames[..n.min(frames.len())]) {
                    log::error!("capture stopped: {}", e);
                    end_reason = EndReason::StorageFailure(e.detail().unwrap_or_default().to_string());
                    break;
                }
            }
            Err(fault) => {
                log::warn!("capture read failed ({}), attempting recovery", fault);
                if let Err(e) = device.recover(fault) {
                    log::error!("capture stopped: {}", e);
                    end_reason = EndReason::DeviceFailure(e.detail().unwrap_or_default().to_string());
                    break;
                }
            }
        }
    }

    let finalized = match writer.finalize() {
        Ok(finalized) => finalized,
        Err(e) => {
            log::error!("{} left without a valid header: {}", job.output_path.display(), e);
            return (end_reason, Err(e));
        }
    };

    let bytes_per_sec = device.sample_rate() as f64 * BYTES_PER_FRAME as f64;
    let duration_secs = if bytes_per_sec > 0.0 {
        finalized.payload_bytes as f64 / bytes_per_sec
    } else {
        0.0
    };

    log::info!(
        "finalized {} ({} payload bytes, {:.2}s)",
        job.output_path.display(),
        finalized.payload_bytes,
        duration_secs
    );

    let result = RecordingResult {
        file_path: job.output_path.clone(),
        payload_bytes: finalized.payload_bytes,
        duration_secs,
        header_sample_rate: job.header_sample_rate,
        negotiated_sample_rate: device.sample_rate(),
        started_at,
        checksum: finalized.checksum,
        end_reason: end_reason.clone(),
    };
    (end_reason, Ok(result))
}
