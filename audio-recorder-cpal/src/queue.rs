//! Hand-off between cpal's data callback and the blocking capture read.

use audio_recorder_core::{DeviceFault, RingBuffer};
use parking_lot::{Condvar, Mutex};

struct QueueState {
    ring: RingBuffer,
    fault: Option<DeviceFault>,
    closed: bool,
}

/// Samples pushed by the stream callback, pulled by `read`.
///
/// Faults reported by the stream are delivered to the reader ahead of any
/// buffered samples.
pub(crate) struct SampleQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                ring: RingBuffer::new(capacity),
                fault: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Called from the data callback. Keep it short.
    pub fn push(&self, samples: &[i16]) {
        let mut state = self.state.lock();
        let dropped = state.ring.write(samples);
        if dropped > 0 {
            merge_fault(&mut state.fault, DeviceFault::Overrun { dropped });
        }
        drop(state);
        self.ready.notify_one();
    }

    /// Called from the error callback.
    pub fn report(&self, fault: DeviceFault) {
        merge_fault(&mut self.state.lock().fault, fault);
        self.ready.notify_one();
    }

    /// No more samples will arrive; wakes a blocked reader.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Block until samples, a fault, or close.
    pub fn read(&self, buf: &mut [i16]) -> Result<usize, DeviceFault> {
        let mut state = self.state.lock();
        loop {
            if let Some(fault) = state.fault.take() {
                return Err(fault);
            }
            if !state.ring.is_empty() {
                return Ok(state.ring.read_into(buf));
            }
            if state.closed {
                return Err(DeviceFault::Disconnected("input stream closed".into()));
            }
            self.ready.wait(&mut state);
        }
    }
}

/// Keep the most severe pending fault; overruns accumulate.
fn merge_fault(pending: &mut Option<DeviceFault>, fault: DeviceFault) {
    *pending = match (pending.take(), fault) {
        (Some(DeviceFault::Overrun { dropped: a }), DeviceFault::Overrun { dropped: b }) => {
            Some(DeviceFault::Overrun { dropped: a + b })
        }
        (Some(existing @ DeviceFault::Disconnected(_)), _) => Some(existing),
        (Some(DeviceFault::Overrun { .. }), other) | (None, other) => Some(other),
        (Some(existing), DeviceFault::Overrun { .. }) => Some(existing),
        (Some(_), other) => Some(other),
    };
}

/// Map a cpal stream error onto a recoverable or terminal fault.
pub(crate) fn classify(error: &cpal::StreamError) -> DeviceFault {
    match error {
        cpal::StreamError::DeviceNotAvailable => DeviceFault::Disconnected(error.to_string()),
        other => DeviceFault::Backend(other.to_string()),
    }
}
