//! Scripted in-memory capture backend for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::RecorderConfig;
use crate::models::error::{DeviceFault, RecorderError};
use crate::traits::capture_device::{CaptureBackend, CaptureDevice};

/// One scripted device read.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Deliver this many frames (capped at the read size).
    Frames(usize),
    /// Fail the read with this fault.
    Fault(DeviceFault),
}

/// Counters shared between a backend, its devices and the test.
#[derive(Debug, Default)]
pub(crate) struct Probe {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub recoveries: AtomicUsize,
    pub frames_delivered: AtomicU64,
    /// Consumed by whichever device reads first; afterwards devices deliver
    /// full reads forever.
    script: Mutex<VecDeque<Step>>,
}

impl Probe {
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn recoveries(&self) -> usize {
        self.recoveries.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy)]
enum Pace {
    Fixed(Duration),
    /// Sleep as long as the delivered frames would take at the device rate.
    Realtime,
}

pub(crate) struct ScriptedBackend {
    probe: Arc<Probe>,
    sample_rate: u32,
    pace: Pace,
    open_error: Option<RecorderError>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            probe: Arc::new(Probe::default()),
            sample_rate: 16000,
            pace: Pace::Fixed(Duration::from_millis(1)),
            open_error: None,
        }
    }

    pub fn with_script(self, steps: Vec<Step>) -> Self {
        *self.probe.script.lock() = steps.into();
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn realtime(mut self) -> Self {
        self.pace = Pace::Realtime;
        self
    }

    pub fn failing_open(mut self, error: RecorderError) -> Self {
        self.open_error = Some(error);
        self
    }

    pub fn probe(&self) -> Arc<Probe> {
        Arc::clone(&self.probe)
    }
}

impl CaptureBackend for ScriptedBackend {
    type Device = ScriptedDevice;

    fn open(&self, _config: &RecorderConfig) -> Result<ScriptedDevice, RecorderError> {
        if let Some(ref e) = self.open_error {
            return Err(e.clone());
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedDevice {
            probe: Arc::clone(&self.probe),
            sample_rate: self.sample_rate,
            pace: self.pace,
            next_sample: 0,
        })
    }
}

pub(crate) struct ScriptedDevice {
    probe: Arc<Probe>,
    sample_rate: u32,
    pace: Pace,
    next_sample: i16,
}

impl ScriptedDevice {
    fn deliver(&mut self, buf: &mut [i16], frames: usize) -> usize {
        let n = frames.min(buf.len());
        let delay = match self.pace {
            Pace::Fixed(d) => d,
            Pace::Realtime => Duration::from_secs_f64(n as f64 / self.sample_rate as f64),
        };
        thread::sleep(delay);

        for sample in &mut buf[..n] {
            *sample = self.next_sample;
            self.next_sample = self.next_sample.wrapping_add(1);
        }
        self.probe.frames_delivered.fetch_add(n as u64, Ordering::SeqCst);
        n
    }
}

impl CaptureDevice for ScriptedDevice {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frames(&mut self, buf: &mut [i16]) -> Result<usize, DeviceFault> {
        let step = self.probe.script.lock().pop_front();
        match step {
            Some(Step::Frames(n)) => Ok(self.deliver(buf, n)),
            Some(Step::Fault(fault)) => Err(fault),
            None => {
                let len = buf.len();
                Ok(self.deliver(buf, len))
            }
        }
    }

    fn recover(&mut self, fault: DeviceFault) -> Result<(), RecorderError> {
        self.probe.recoveries.fetch_add(1, Ordering::SeqCst);
        match fault {
            DeviceFault::Disconnected(detail) => Err(RecorderError::UnrecoverableDevice(detail)),
            _ => Ok(()),
        }
    }

    fn close(self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}
