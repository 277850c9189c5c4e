//! JSON-lines plumbing between stdin/stdout and the control surface.
//!
//! Each input line is one `MethodCall`; each call gets exactly one
//! `MethodResponse` line. Recorder events are interleaved on the same
//! stream as `{"event": ..., "payload": ...}` lines.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use audio_recorder_core::{
    CaptureBackend, ControlSurface, MethodCall, MethodResponse, RecorderConfig, RecorderDelegate,
    RecorderError, RecorderState, RecordingResult,
};

/// Line-buffered sink shared by the control loop and the capture thread.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    pub fn write_line(&self, value: &impl serde::Serialize) -> io::Result<()> {
        let line = serde_json::to_string(value)?;
        let mut sink = self.sink.lock();
        writeln!(sink, "{}", line)?;
        sink.flush()
    }
}

/// Forwards recorder events to the output stream.
pub struct EventDelegate {
    output: Output,
}

impl EventDelegate {
    pub fn new(output: Output) -> Arc<Self> {
        Arc::new(Self { output })
    }

    fn emit(&self, event: &str, payload: Value) {
        let line = json!({ "event": event, "payload": payload });
        if let Err(e) = self.output.write_line(&line) {
            log::warn!("dropped {} event: {}", event, e);
        }
    }
}

impl RecorderDelegate for EventDelegate {
    fn on_state_changed(&self, state: RecorderState) {
        self.emit("audio://state-changed", json!({ "state": state }));
    }

    fn on_error(&self, error: &RecorderError) {
        self.emit(
            "audio://error",
            json!({ "code": error.code(), "message": error.to_string() }),
        );
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        self.emit("audio://recording-finished", json!(result));
    }
}

pub fn load_config(path: &Path) -> Result<RecorderConfig, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    let config: RecorderConfig = serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse {}: {}", path.display(), e))?;
    config
        .validate()
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(config)
}

/// Handle one input line. Blank lines produce no response.
pub fn handle_line<B: CaptureBackend>(
    surface: &ControlSurface<B>,
    line: &str,
) -> Option<MethodResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<MethodCall>(line) {
        Ok(call) => {
            log::debug!("call {}", call.method);
            Some(surface.handle(&call))
        }
        Err(e) => Some(MethodResponse::error(
            "invalid_call",
            "Malformed method call",
            Some(e.to_string()),
        )),
    }
}

/// Serve calls until `input` reaches end of file.
pub fn serve<B: CaptureBackend>(
    surface: &ControlSurface<B>,
    input: impl BufRead,
    output: &Output,
) -> io::Result<()> {
    for line in input.lines() {
        if let Some(response) = handle_line(surface, &line?) {
            output.write_line(&response)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use audio_recorder_core::{CaptureDevice, DeviceFault, RecordingSession};

    use super::*;

    /// Backend with no devices behind it.
    struct NoDevices;

    struct Unreachable;

    impl CaptureDevice for Unreachable {
        fn sample_rate(&self) -> u32 {
            16000
        }
        fn read_frames(&mut self, _buf: &mut [i16]) -> Result<usize, DeviceFault> {
            Err(DeviceFault::Disconnected("unreachable".into()))
        }
        fn recover(&mut self, _fault: DeviceFault) -> Result<(), RecorderError> {
            Err(RecorderError::UnrecoverableDevice("unreachable".into()))
        }
        fn close(self) {}
    }

    impl CaptureBackend for NoDevices {
        type Device = Unreachable;

        fn open(&self, _config: &RecorderConfig) -> Result<Unreachable, RecorderError> {
            Err(RecorderError::DeviceOpen("no default input device".into()))
        }
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn lines(&self) -> Vec<Value> {
            String::from_utf8(self.0.lock().clone())
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    fn surface() -> ControlSurface<NoDevices> {
        ControlSurface::new(RecordingSession::new(NoDevices, RecorderConfig::default()).unwrap())
    }

    #[test]
    fn malformed_line_is_invalid_call() {
        let response = handle_line(&surface(), "{not json").unwrap();
        assert_eq!(response.code(), Some("invalid_call"));
        assert!(handle_line(&surface(), "   ").is_none());
    }

    #[test]
    fn serves_one_response_per_call() {
        let captured = Captured::default();
        let output = Output::new(captured.clone());
        let input = Cursor::new(
            "{\"method\":\"stopRecording\"}\n\n\
             {\"method\":\"startRecording\",\"arguments\":{\"path\":\"/tmp/never.wav\"}}\n\
             {\"method\":\"listDevices\"}\n",
        );

        serve(&surface(), input, &output).unwrap();

        let lines = captured.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["code"], "not_recording");
        assert_eq!(lines[1]["code"], "init_failed");
        assert_eq!(lines[1]["details"], "no default input device");
        assert_eq!(lines[2]["status"], "not_implemented");
    }

    #[test]
    fn delegate_emits_event_lines() {
        let captured = Captured::default();
        let delegate = EventDelegate::new(Output::new(captured.clone()));

        delegate.on_state_changed(RecorderState::Recording);
        delegate.on_error(&RecorderError::UnrecoverableDevice("unplugged".into()));

        let lines = captured.lines();
        assert_eq!(lines[0]["event"], "audio://state-changed");
        assert_eq!(lines[0]["payload"]["state"], "recording");
        assert_eq!(lines[1]["payload"]["code"], "device_failed");
    }

    #[test]
    fn loads_partial_config_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.json");
        fs::write(&path, r#"{"frames_per_read": 256, "header_sample_rate": "negotiated"}"#)
            .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.frames_per_read, 256);
        assert_eq!(config.target_sample_rate, 16000);
    }

    #[test]
    fn rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.json");
        fs::write(&path, r#"{"frames_per_read": 0}"#).unwrap();
        assert!(load_config(&path).is_err());
        assert!(load_config(&dir.path().join("missing.json")).is_err());
    }
}
