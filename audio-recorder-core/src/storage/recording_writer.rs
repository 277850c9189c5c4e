use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::RecorderError;
use crate::processing::wav_format::{self, BYTES_PER_FRAME};

/// Streaming WAV file writer with deferred header finalization.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header, sizes zeroed until finalize]
/// [raw 16-bit little-endian mono PCM...]
/// ```
pub struct RecordingWriter {
    file_path: PathBuf,
    sample_rate: u32,
    file: BufWriter<File>,
    payload_bytes: u64,
    scratch: Vec<u8>,
}

/// What `RecordingWriter::finalize` leaves on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedFile {
    pub payload_bytes: u64,
    pub checksum: String,
}

impl RecordingWriter {
    /// Create the file and write the placeholder header.
    ///
    /// `frames_hint` sizes the internal conversion buffer so that appends of
    /// up to that many samples never allocate.
    pub fn create(file_path: PathBuf, sample_rate: u32, frames_hint: usize) -> Result<Self, RecorderError> {
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| RecorderError::Storage(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&file_path).map_err(|e| {
            RecorderError::Storage(format!("failed to create {}: {}", file_path.display(), e))
        })?;
        let mut file = BufWriter::new(file);

        wav_format::write_placeholder_header(&mut file, sample_rate)
            .map_err(|e| RecorderError::Storage(format!("failed to write header: {}", e)))?;

        Ok(Self {
            file_path,
            sample_rate,
            file,
            payload_bytes: 0,
            scratch: Vec::with_capacity(frames_hint * BYTES_PER_FRAME),
        })
    }

    /// Append samples as little-endian PCM.
    pub fn append(&mut self, samples: &[i16]) -> Result<(), RecorderError> {
        wav_format::encode_samples(samples, &mut self.scratch);
        self.file
            .write_all(&self.scratch)
            .map_err(|e| RecorderError::Storage(format!("write failed: {}", e)))?;
        self.payload_bytes += self.scratch.len() as u64;
        Ok(())
    }

    /// Rewrite the header with the final sizes, close the file and return
    /// its SHA-256 checksum.
    pub fn finalize(mut self) -> Result<FinalizedFile, RecorderError> {
        wav_format::finalize_header(&mut self.file, self.payload_bytes, self.sample_rate)
            .map_err(|e| RecorderError::Storage(format!("failed to finalize header: {}", e)))?;

        let file = self
            .file
            .into_inner()
            .map_err(|e| RecorderError::Storage(format!("flush failed: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| RecorderError::Storage(format!("sync failed: {}", e)))?;
        drop(file);

        let checksum = sha256_file(&self.file_path)?;
        Ok(FinalizedFile {
            payload_bytes: self.payload_bytes,
            checksum,
        })
    }

    /// PCM bytes appended so far, excluding the header.
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }
}

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, RecorderError> {
    let mut file = File::open(path)
        .map_err(|e| RecorderError::Storage(format!("failed to read file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| RecorderError::Storage(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format::WavHeader;

    #[test]
    fn write_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.wav");

        let mut writer = RecordingWriter::create(path.clone(), 16000, 4).unwrap();
        writer.append(&[0, 1, -1, i16::MAX]).unwrap();
        writer.append(&[42]).unwrap();
        assert_eq!(writer.payload_bytes(), 10);

        let finalized = writer.finalize().unwrap();
        assert_eq!(finalized.payload_bytes, 10);
        assert_eq!(finalized.checksum.len(), 64);

        let file_data = fs::read(&path).unwrap();
        assert_eq!(file_data.len(), 44 + 10);

        let header = WavHeader::decode(&file_data).unwrap();
        assert_eq!(header.data_size, 10);
        assert_eq!(header.riff_size, 46);
        assert_eq!(&file_data[44..46], &[0, 0]);
        assert_eq!(&file_data[50..52], &[0xFF, 0x7F]);
    }

    #[test]
    fn standard_reader_accepts_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hound.wav");

        let mut writer = RecordingWriter::create(path.clone(), 16000, 8).unwrap();
        writer.append(&[10, -20, 30, -40]).unwrap();
        writer.finalize().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
        assert_eq!(samples, vec![10, -20, 30, -40]);
    }

    #[test]
    fn empty_recording_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");

        let writer = RecordingWriter::create(path.clone(), 16000, 0).unwrap();
        let finalized = writer.finalize().unwrap();

        assert_eq!(finalized.payload_bytes, 0);
        let file_data = fs::read(&path).unwrap();
        assert_eq!(file_data.len(), 44);
        assert_eq!(WavHeader::decode(&file_data).unwrap().riff_size, 36);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/take.wav");

        RecordingWriter::create(path.clone(), 16000, 0)
            .unwrap()
            .finalize()
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn create_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = RecordingWriter::create(blocker.join("take.wav"), 16000, 0);
        assert!(matches!(result, Err(RecorderError::Storage(_))));
    }

    #[test]
    fn checksum_matches_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sum.wav");

        let mut writer = RecordingWriter::create(path.clone(), 16000, 2).unwrap();
        writer.append(&[1, 2]).unwrap();
        let finalized = writer.finalize().unwrap();

        let expected = hex_encode(&Sha256::digest(fs::read(&path).unwrap()));
        assert_eq!(finalized.checksum, expected);
        assert_eq!(sha256_file(&path).unwrap(), expected);
    }
}
