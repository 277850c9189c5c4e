//! WAV container utilities.
//!
//! Encodes and decodes the canonical 44-byte RIFF header for 16-bit mono
//! PCM, and writes it in two passes: a placeholder before any audio, then
//! the final sizes once the payload length is known.

use std::io::{self, Seek, SeekFrom, Write};

use thiserror::Error;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

pub const PCM_FORMAT: u16 = 1;
pub const CHANNELS: u16 = 1;
pub const BITS_PER_SAMPLE: u16 = 16;
pub const BYTES_PER_FRAME: usize = (CHANNELS * BITS_PER_SAMPLE / 8) as usize;

/// Largest payload whose RIFF size (payload + 36) still fits in a `u32`.
pub const MAX_PAYLOAD_BYTES: u64 = (u32::MAX - 36) as u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header too short: {0} bytes")]
    TooShort(usize),

    #[error("bad chunk tag at offset {offset}, expected {expected:?}")]
    BadTag { offset: usize, expected: &'static str },

    #[error("unsupported format code {0}")]
    UnsupportedFormat(u16),
}

/// Decoded fields of a 44-byte PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size (file size - 8).
    pub riff_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Payload size in bytes.
    pub data_size: u32,
}

impl WavHeader {
    /// Header for a 16-bit mono stream carrying `data_size` payload bytes.
    ///
    /// A byte rate that does not fit the 32-bit field saturates.
    pub fn mono16(sample_rate: u32, data_size: u32) -> Self {
        let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
        Self {
            riff_size: data_size.saturating_add((WAV_HEADER_SIZE - 8) as u32),
            channels: CHANNELS,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(block_align as u32),
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        }
    }

    /// Encode into the on-disk layout.
    ///
    /// ```text
    /// [0-3]    "RIFF"
    /// [4-7]    riff_size = 36 + data_size
    /// [8-11]   "WAVE"
    /// [12-15]  "fmt "
    /// [16-19]  16 (PCM format chunk size)
    /// [20-21]  1 (PCM format code)
    /// [22-23]  channels
    /// [24-27]  sample_rate
    /// [28-31]  byte_rate
    /// [32-33]  block_align
    /// [34-35]  bits_per_sample
    /// [36-39]  "data"
    /// [40-43]  data_size
    /// ```
    pub fn encode(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut header = [0u8; WAV_HEADER_SIZE];

        // RIFF chunk descriptor
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.riff_size.to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&16u32.to_le_bytes());
        header[20..22].copy_from_slice(&PCM_FORMAT.to_le_bytes());
        header[22..24].copy_from_slice(&self.channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        header[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        // data sub-chunk
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_size.to_le_bytes());

        header
    }

    /// Placeholder form: both size fields zeroed.
    fn encode_placeholder(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut header = self.encode();
        header[4..8].copy_from_slice(&0u32.to_le_bytes());
        header[40..44].copy_from_slice(&0u32.to_le_bytes());
        header
    }

    /// Parse the first 44 bytes of a file.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(HeaderError::TooShort(bytes.len()));
        }

        for (offset, expected) in [(0, "RIFF"), (8, "WAVE"), (12, "fmt "), (36, "data")] {
            if &bytes[offset..offset + 4] != expected.as_bytes() {
                return Err(HeaderError::BadTag { offset, expected });
            }
        }

        let u16_at = |o: usize| u16::from_le_bytes([bytes[o], bytes[o + 1]]);
        let u32_at = |o: usize| u32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);

        let format = u16_at(20);
        if format != PCM_FORMAT {
            return Err(HeaderError::UnsupportedFormat(format));
        }

        Ok(Self {
            riff_size: u32_at(4),
            channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_size: u32_at(40),
        })
    }
}

/// Write a header with both size fields zeroed at the current position.
///
/// Must be called at the start of the file, before any payload.
pub fn write_placeholder_header<W: Write>(sink: &mut W, sample_rate: u32) -> io::Result<()> {
    sink.write_all(&WavHeader::mono16(sample_rate, 0).encode_placeholder())
}

/// Rewrite the header at offset 0 with the final payload size.
///
/// Call once, after every payload byte has been written. Leaves the sink
/// positioned at its end. Payloads beyond `MAX_PAYLOAD_BYTES` saturate.
pub fn finalize_header<W: Write + Seek>(
    sink: &mut W,
    payload_bytes: u64,
    sample_rate: u32,
) -> io::Result<()> {
    if payload_bytes > MAX_PAYLOAD_BYTES {
        log::warn!(
            "payload of {} bytes exceeds the WAV size limit, header sizes saturated",
            payload_bytes
        );
    }
    let data_size = payload_bytes.min(MAX_PAYLOAD_BYTES) as u32;

    sink.seek(SeekFrom::Start(0))?;
    sink.write_all(&WavHeader::mono16(sample_rate, data_size).encode())?;
    sink.flush()?;
    sink.seek(SeekFrom::End(0))?;
    Ok(())
}

/// Serialize samples as little-endian PCM into `out`, replacing its contents.
///
/// `out` keeps its allocation across calls.
pub fn encode_samples(samples: &[i16], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(samples.len() * BYTES_PER_FRAME);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
}
