use crate::models::config::RecorderConfig;
use crate::models::error::{DeviceFault, RecorderError};

/// Source of capture devices.
///
/// Implemented by:
/// - `CpalBackend` (default input device via cpal / ALSA)
/// - a scripted in-memory backend in this crate's tests
pub trait CaptureBackend: Send {
    type Device: CaptureDevice;

    /// Acquire the default capture device, configured for interleaved
    /// 16-bit little-endian mono at the rate nearest
    /// `config.target_sample_rate`.
    ///
    /// Fails with `RecorderError::DeviceOpen` when no device is available and
    /// `RecorderError::Parameter` when the device rejects the format.
    fn open(&self, config: &RecorderConfig) -> Result<Self::Device, RecorderError>;
}

/// An open capture device, owned by exactly one capture loop at a time.
pub trait CaptureDevice: Send + 'static {
    /// Rate the device actually captures at.
    fn sample_rate(&self) -> u32;

    /// Blocking read of up to `buf.len()` mono samples.
    ///
    /// Blocks until at least one frame is available or the device reports a
    /// fault. May return fewer frames than requested.
    fn read_frames(&mut self, buf: &mut [i16]) -> Result<usize, DeviceFault>;

    /// Try to clear `fault` without closing the device.
    ///
    /// `RecorderError::UnrecoverableDevice` means capture cannot continue.
    fn recover(&mut self, fault: DeviceFault) -> Result<(), RecorderError>;

    /// Release the device.
    fn close(self);
}
