//! # audio-recorder-core
//!
//! Platform-agnostic microphone recorder.
//!
//! Captures 16-bit mono PCM from a capture device on a background thread
//! and writes it to a WAV file whose header sizes are filled in when the
//! recording stops. Platform backends (cpal / ALSA) implement the
//! `CaptureBackend` and `CaptureDevice` traits and plug into the generic
//! `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! audio-recorder-core (this crate)
//! ├── traits/       ← CaptureBackend, CaptureDevice, RecorderDelegate
//! ├── models/       ← RecorderError, DeviceFault, RecorderState, RecorderConfig, RecordingResult
//! ├── processing/   ← WAV header encode/decode, sample RingBuffer
//! ├── storage/      ← RecordingWriter (placeholder header → PCM → finalize)
//! ├── session/      ← RecordingSession + capture thread
//! └── control/      ← ControlSurface (startRecording / stopRecording)
//! ```

pub mod control;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use control::method::{MethodCall, MethodResponse};
pub use control::surface::ControlSurface;
pub use models::config::{HeaderSampleRate, RecorderConfig};
pub use models::error::{DeviceFault, RecorderError};
pub use models::recording_result::{EndReason, RecordingResult};
pub use models::state::RecorderState;
pub use processing::ring_buffer::RingBuffer;
pub use processing::wav_format::WavHeader;
pub use session::recording::RecordingSession;
pub use storage::recording_writer::RecordingWriter;
pub use traits::capture_device::{CaptureBackend, CaptureDevice};
pub use traits::recorder_delegate::RecorderDelegate;
