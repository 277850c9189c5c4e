//! cpal capture backend for `audio-recorder-core`.
//!
//! Opens the default input device (ALSA on Linux), negotiates 16-bit mono
//! at the rate nearest the configured target, and exposes the stream as a
//! blocking [`CaptureDevice`](audio_recorder_core::CaptureDevice).

pub mod microphone;
pub mod negotiation;
mod queue;

pub use microphone::{CpalBackend, CpalMicrophone};
