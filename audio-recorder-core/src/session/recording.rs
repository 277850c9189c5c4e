use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::models::config::RecorderConfig;
use crate::models::error::RecorderError;
use crate::models::recording_result::{EndReason, RecordingResult};
use crate::models::state::RecorderState;
use crate::session::worker::{self, CaptureJob, WorkerExit};
use crate::traits::capture_device::{CaptureBackend, CaptureDevice};
use crate::traits::recorder_delegate::RecorderDelegate;

/// A recording in flight: the output path and the capture thread, which
/// owns the device until it is joined.
struct ActiveRecording<D> {
    output_path: PathBuf,
    worker: thread::JoinHandle<WorkerExit<D>>,
}

/// Microphone-to-WAV recording session.
///
/// Owns one capture thread per recording and coordinates it through a
/// single shared flag: `start` raises it, `stop` lowers it and joins the
/// thread, and the thread lowers it itself when the device or the output
/// file fails.
///
/// ```text
/// [CaptureDevice] → read_frames → [capture thread] → [RecordingWriter] → file.wav
///                                        ↑
///                        recording flag (start / stop)
/// ```
///
/// Control calls take `&mut self`; share the session behind a mutex (see
/// `ControlSurface`) to serialize them. Dropping a session that is still
/// recording stops it first.
pub struct RecordingSession<B: CaptureBackend> {
    backend: B,
    config: RecorderConfig,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    recording: Arc<AtomicBool>,
    active: Option<ActiveRecording<B::Device>>,
}

impl<B: CaptureBackend> RecordingSession<B> {
    pub fn new(backend: B, config: RecorderConfig) -> Result<Self, RecorderError> {
        config.validate().map_err(RecorderError::Parameter)?;
        Ok(Self {
            backend,
            config,
            delegate: None,
            recording: Arc::new(AtomicBool::new(false)),
            active: None,
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Current state. A recording whose capture thread ended on its own
    /// reports `Idle` even before it has been reaped.
    pub fn state(&self) -> RecorderState {
        if self.is_recording() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some() && self.recording.load(Ordering::SeqCst)
    }

    /// Output path of the recording in progress.
    pub fn output_path(&self) -> Option<&Path> {
        self.active
            .as_ref()
            .filter(|_| self.recording.load(Ordering::SeqCst))
            .map(|a| a.output_path.as_path())
    }

    /// Open the capture device and start recording to `path`.
    ///
    /// Returns as soon as the capture thread is running; no audio has been
    /// captured yet. Transitions: idle → recording.
    pub fn start(&mut self, path: impl Into<PathBuf>) -> Result<(), RecorderError> {
        if self.is_recording() {
            return Err(RecorderError::AlreadyRecording);
        }

        if let Some(finished) = self.active.take() {
            log::info!(
                "releasing recording to {} that ended on its own",
                finished.output_path.display()
            );
            let (_, outcome) = Self::reap(finished);
            if let Err(e) = outcome {
                log::warn!("previous recording ended with error: {}", e);
            }
        }

        let output_path = path.into();
        let device = self.backend.open(&self.config)?;

        let negotiated = device.sample_rate();
        let header_sample_rate = self.config.header_rate(negotiated);
        if negotiated != header_sample_rate {
            log::warn!(
                "device runs at {} Hz but the header will record {} Hz",
                negotiated,
                header_sample_rate
            );
        }

        let job = CaptureJob {
            output_path: output_path.clone(),
            frames_per_read: self.config.frames_per_read,
            header_sample_rate,
            recording: Arc::clone(&self.recording),
            delegate: self.delegate.clone(),
        };

        self.recording.store(true, Ordering::SeqCst);
        self.notify_state(RecorderState::Recording);

        let spawned = thread::Builder::new()
            .name("audio-recorder-capture".into())
            .spawn(move || worker::run(device, job));
        let worker = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.recording.store(false, Ordering::SeqCst);
                self.notify_state(RecorderState::Idle);
                return Err(RecorderError::Unknown(format!(
                    "failed to spawn capture thread: {}",
                    e
                )));
            }
        };

        log::info!(
            "recording to {} at {} Hz",
            output_path.display(),
            negotiated
        );
        self.active = Some(ActiveRecording {
            output_path,
            worker,
        });
        Ok(())
    }

    /// Stop recording, wait for the capture thread, release the device.
    ///
    /// Blocks until the capture thread has exited and the file header is
    /// finalized; nothing writes to the file after this returns.
    /// Transitions: recording → idle.
    ///
    /// If the capture thread had already ended the recording on its own,
    /// its resources are released and `RecordingAborted` is returned.
    pub fn stop(&mut self) -> Result<RecordingResult, RecorderError> {
        let Some(active) = self.active.take() else {
            return Err(RecorderError::NotRecording);
        };

        let was_recording = self.recording.swap(false, Ordering::SeqCst);
        log::info!("stopping recording to {}", active.output_path.display());

        let (end_reason, outcome) = Self::reap(active);

        if !was_recording {
            let reason = match (end_reason, outcome) {
                (EndReason::DeviceFailure(detail) | EndReason::StorageFailure(detail), _) => detail,
                (EndReason::Stopped, Err(e)) => e.to_string(),
                (EndReason::Stopped, Ok(_)) => "capture ended".into(),
            };
            return Err(RecorderError::RecordingAborted(reason));
        }

        self.notify_state(RecorderState::Idle);
        outcome
    }

    /// Join the capture thread and close the device it hands back.
    fn reap(
        active: ActiveRecording<B::Device>,
    ) -> (EndReason, Result<RecordingResult, RecorderError>) {
        match active.worker.join() {
            Ok(WorkerExit {
                device,
                end_reason,
                outcome,
            }) => {
                device.close();
                (end_reason, outcome)
            }
            Err(_) => (
                EndReason::Stopped,
                Err(RecorderError::Unknown("capture thread panicked".into())),
            ),
        }
    }

    fn notify_state(&self, state: RecorderState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }
}

impl<B: CaptureBackend> Drop for RecordingSession<B> {
    fn drop(&mut self) {
        if self.active.is_none() {
            return;
        }
        log::info!("recorder torn down while recording, stopping");
        match self.stop() {
            Ok(_) | Err(RecorderError::RecordingAborted(_)) => {}
            Err(e) => log::warn!("stop during teardown failed: {}", e),
        }
    }
}
