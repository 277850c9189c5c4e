/// Circular buffer of 16-bit PCM samples.
///
/// Sits between a device callback (writer) and the capture loop (reader).
/// Wrap in `parking_lot::Mutex` for cross-thread access.
///
/// Overflow behavior: drops oldest samples and reports how many were lost.
#[derive(Debug)]
pub struct RingBuffer {
    buffer: Vec<i16>,
    write_index: usize,
    read_index: usize,
    available: usize,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0; capacity],
            write_index: 0,
            read_index: 0,
            available: 0,
            capacity,
        }
    }

    /// Write samples into the ring buffer.
    ///
    /// Returns the number of samples dropped to make room, including any
    /// leading part of `samples` that could never fit.
    pub fn write(&mut self, samples: &[i16]) -> usize {
        if samples.is_empty() {
            return 0;
        }

        let mut dropped = 0;

        // If more data than capacity, only keep the tail
        let samples = if samples.len() > self.capacity {
            dropped += samples.len() - self.capacity;
            &samples[samples.len() - self.capacity..]
        } else {
            samples
        };

        let overflow = (self.available + samples.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.read_index = (self.read_index + overflow) % self.capacity;
            self.available -= overflow;
            dropped += overflow;
        }

        for &sample in samples {
            self.buffer[self.write_index] = sample;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.available += samples.len();
        dropped
    }

    /// Move up to `out.len()` samples into `out`, oldest first.
    ///
    /// Returns the number of samples copied.
    pub fn read_into(&mut self, out: &mut [i16]) -> usize {
        let to_read = out.len().min(self.available);
        if to_read == 0 {
            return 0;
        }

        // At most two contiguous runs: up to the end of storage, then from 0.
        let first = to_read.min(self.capacity - self.read_index);
        out[..first].copy_from_slice(&self.buffer[self.read_index..self.read_index + first]);
        let second = to_read - first;
        if second > 0 {
            out[first..to_read].copy_from_slice(&self.buffer[..second]);
        }

        self.read_index = (self.read_index + to_read) % self.capacity;
        self.available -= to_read;
        to_read
    }

    /// Number of samples currently available for reading.
    pub fn count(&self) -> usize {
        self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
