//! Picks the capture rate for a device.
//!
//! Mirrors ALSA's "set rate near": among the device's 16-bit mono config
//! ranges, take the supported rate closest to the target.

use cpal::{SampleFormat, SupportedStreamConfigRange};

/// The parts of a cpal config range that matter for negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateRange {
    pub channels: u16,
    pub min_rate: u32,
    pub max_rate: u32,
    pub format: SampleFormat,
}

impl From<&SupportedStreamConfigRange> for RateRange {
    fn from(range: &SupportedStreamConfigRange) -> Self {
        Self {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
            format: range.sample_format(),
        }
    }
}

impl RateRange {
    fn is_mono_i16(&self) -> bool {
        self.channels == 1 && self.format == SampleFormat::I16 && self.min_rate <= self.max_rate
    }
}

/// Supported rate nearest `target`, or `None` if the device offers no
/// interleaved 16-bit mono configuration at all.
pub fn choose_rate(ranges: &[RateRange], target: u32) -> Option<u32> {
    ranges
        .iter()
        .filter(|r| r.is_mono_i16())
        .map(|r| target.clamp(r.min_rate, r.max_rate))
        .min_by_key(|rate| rate.abs_diff(target))
}
