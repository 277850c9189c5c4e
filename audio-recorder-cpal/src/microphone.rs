//! Default-input capture through cpal.
//!
//! `cpal::Stream` is not `Send`, so a dedicated thread opens the device,
//! owns the stream and takes commands over a channel. Samples reach the
//! capture loop through a shared [`SampleQueue`].

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use audio_recorder_core::{CaptureBackend, CaptureDevice, DeviceFault, RecorderConfig, RecorderError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, BuildStreamError, SampleRate, StreamConfig};

use crate::negotiation::{self, RateRange};
use crate::queue::{classify, SampleQueue};

/// Opens the host's default input device.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureBackend for CpalBackend {
    type Device = CpalMicrophone;

    fn open(&self, config: &RecorderConfig) -> Result<CpalMicrophone, RecorderError> {
        CpalMicrophone::open_default(config)
    }
}

enum StreamCommand {
    Resume(mpsc::Sender<Result<(), String>>),
    Shutdown,
}

/// What the stream thread reports once the stream is playing.
struct OpenedStream {
    name: String,
    sample_rate: u32,
    queue: Arc<SampleQueue>,
}

/// A playing 16-bit mono input stream.
pub struct CpalMicrophone {
    name: String,
    sample_rate: u32,
    queue: Arc<SampleQueue>,
    commands: mpsc::Sender<StreamCommand>,
    stream_thread: Option<thread::JoinHandle<()>>,
}

impl CpalMicrophone {
    pub fn open_default(config: &RecorderConfig) -> Result<Self, RecorderError> {
        let target_rate = config.target_sample_rate;
        let thread_config = config.clone();
        let (commands, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let stream_thread = thread::Builder::new()
            .name("audio-recorder-stream".into())
            .spawn(move || run_stream(thread_config, command_rx, ready_tx))
            .map_err(|e| RecorderError::DeviceOpen(format!("failed to spawn stream thread: {}", e)))?;

        let opened = match ready_rx.recv() {
            Ok(Ok(opened)) => opened,
            Ok(Err(e)) => {
                let _ = stream_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = stream_thread.join();
                return Err(RecorderError::DeviceOpen(
                    "stream thread exited during setup".into(),
                ));
            }
        };

        if opened.sample_rate != target_rate {
            log::warn!(
                "{} does not support {} Hz, capturing at {} Hz",
                opened.name,
                target_rate,
                opened.sample_rate
            );
        }
        log::info!("opened {} at {} Hz mono i16", opened.name, opened.sample_rate);

        Ok(Self {
            name: opened.name,
            sample_rate: opened.sample_rate,
            queue: opened.queue,
            commands,
            stream_thread: Some(stream_thread),
        })
    }

    fn resume(&self) -> Result<(), RecorderError> {
        let gone = || RecorderError::UnrecoverableDevice("input stream thread is gone".into());
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(StreamCommand::Resume(reply_tx))
            .map_err(|_| gone())?;
        match reply_rx.recv() {
            Ok(Ok(())) => {
                log::info!("{} resumed", self.name);
                Ok(())
            }
            Ok(Err(detail)) => Err(RecorderError::UnrecoverableDevice(detail)),
            Err(_) => Err(gone()),
        }
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.stream_thread.take() else {
            return;
        };
        let _ = self.commands.send(StreamCommand::Shutdown);
        if handle.join().is_err() {
            log::error!("{} stream thread panicked", self.name);
        }
        self.queue.close();
        log::debug!("closed {}", self.name);
    }
}

impl CaptureDevice for CpalMicrophone {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read_frames(&mut self, buf: &mut [i16]) -> Result<usize, DeviceFault> {
        self.queue.read(buf)
    }

    fn recover(&mut self, fault: DeviceFault) -> Result<(), RecorderError> {
        match fault {
            DeviceFault::Overrun { dropped } => {
                log::warn!("{} overran, {} samples lost", self.name, dropped);
                Ok(())
            }
            DeviceFault::Suspended | DeviceFault::Backend(_) => self.resume(),
            DeviceFault::Disconnected(detail) => Err(RecorderError::UnrecoverableDevice(detail)),
        }
    }

    fn close(mut self) {
        self.shutdown();
    }
}

impl Drop for CpalMicrophone {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Stream thread body: open, play, then serve commands until shutdown.
fn run_stream(
    config: RecorderConfig,
    commands: mpsc::Receiver<StreamCommand>,
    ready: mpsc::Sender<Result<OpenedStream, RecorderError>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready.send(Err(RecorderError::DeviceOpen(
            "no default input device".into(),
        )));
        return;
    };
    let name = device.name().unwrap_or_else(|_| "default input".into());

    let sample_rate = match negotiate(&device, config.target_sample_rate, &name) {
        Ok(rate) => rate,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let stream_config = StreamConfig {
        channels: 1,
        sample_rate: SampleRate(sample_rate),
        buffer_size: BufferSize::Default,
    };

    let queue = Arc::new(SampleQueue::new(config.device_buffer_frames(sample_rate)));
    let data_queue = Arc::clone(&queue);
    let error_queue = Arc::clone(&queue);
    let stream = device.build_input_stream(
        &stream_config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| data_queue.push(data),
        move |err: cpal::StreamError| {
            log::warn!("input stream error: {}", err);
            error_queue.report(classify(&err));
        },
        None,
    );
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(map_build_error(e)));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready.send(Err(RecorderError::DeviceOpen(format!(
            "failed to start {}: {}",
            name, e
        ))));
        return;
    }
    let _ = ready.send(Ok(OpenedStream {
        name,
        sample_rate,
        queue: Arc::clone(&queue),
    }));

    for command in commands {
        match command {
            StreamCommand::Resume(reply) => {
                let _ = reply.send(stream.play().map_err(|e| e.to_string()));
            }
            StreamCommand::Shutdown => break,
        }
    }

    drop(stream);
    queue.close();
}

fn negotiate(device: &cpal::Device, target_rate: u32, name: &str) -> Result<u32, RecorderError> {
    let ranges: Vec<RateRange> = device
        .supported_input_configs()
        .map_err(|e| RecorderError::DeviceOpen(format!("{}: {}", name, e)))?
        .map(|range| RateRange::from(&range))
        .collect();

    negotiation::choose_rate(&ranges, target_rate).ok_or_else(|| {
        RecorderError::Parameter(format!("{} offers no 16-bit mono configuration", name))
    })
}

fn map_build_error(error: BuildStreamError) -> RecorderError {
    let detail = error.to_string();
    match error {
        BuildStreamError::StreamConfigNotSupported | BuildStreamError::InvalidArgument => {
            RecorderError::Parameter(detail)
        }
        _ => RecorderError::DeviceOpen(detail),
    }
}
