mod host;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use audio_recorder_core::{ControlSurface, RecorderConfig, RecordingSession};
use audio_recorder_cpal::CpalBackend;

use host::{EventDelegate, Output};

fn main() -> ExitCode {
    env_logger::init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => match host::load_config(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => RecorderConfig::default(),
    };

    let mut session = match RecordingSession::new(CpalBackend::new(), config) {
        Ok(session) => session,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = Output::new(io::stdout());
    session.set_delegate(EventDelegate::new(output.clone()));
    let surface = ControlSurface::new(session);

    log::info!("{} channel ready on stdin", audio_recorder_core::control::surface::CHANNEL_NAME);
    let result = host::serve(&surface, io::stdin().lock(), &output);

    // Tears down any recording still in progress.
    drop(surface);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("control channel failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
