use serde::{Deserialize, Serialize};

/// Which sample rate goes into the WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderSampleRate {
    /// Always write `target_sample_rate`, whatever the device negotiated.
    #[default]
    Nominal,
    /// Write the rate the device actually runs at.
    Negotiated,
}

/// Configuration for a recording session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Rate requested from the device in Hz (default: 16000).
    /// The nearest supported rate is used.
    pub target_sample_rate: u32,

    /// Frames read from the device per loop iteration (default: 1024).
    pub frames_per_read: usize,

    /// Header rate policy (default: nominal).
    pub header_sample_rate: HeaderSampleRate,

    /// Capacity of the backend's sample queue in milliseconds (default: 2000).
    pub device_buffer_ms: u32,
}

/// Upper bound on `frames_per_read`, one second at 192 kHz.
const MAX_FRAMES_PER_READ: usize = 192_000;

/// Highest sample rate accepted, the top of what audio interfaces offer.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.target_sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.target_sample_rate > MAX_SAMPLE_RATE {
            return Err(format!(
                "sample rate {} Hz exceeds {} Hz",
                self.target_sample_rate, MAX_SAMPLE_RATE
            ));
        }
        if self.frames_per_read == 0 || self.frames_per_read > MAX_FRAMES_PER_READ {
            return Err(format!("unsupported frames per read: {}", self.frames_per_read));
        }
        if self.device_buffer_ms == 0 {
            return Err("device buffer must be positive".into());
        }
        Ok(())
    }

    /// Rate to record in the header given what the device negotiated.
    pub fn header_rate(&self, negotiated: u32) -> u32 {
        match self.header_sample_rate {
            HeaderSampleRate::Nominal => self.target_sample_rate,
            HeaderSampleRate::Negotiated => negotiated,
        }
    }

    /// Sample queue capacity in frames for a device running at `sample_rate`.
    pub fn device_buffer_frames(&self, sample_rate: u32) -> usize {
        let frames = sample_rate as u64 * self.device_buffer_ms as u64 / 1000;
        (frames as usize).max(self.frames_per_read)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000,
            frames_per_read: 1024,
            header_sample_rate: HeaderSampleRate::Nominal,
            device_buffer_ms: 2000,
        }
    }
}
