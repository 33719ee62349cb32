//! Drives a recorder over stdin/stdout.
//!
//! Each stdin line is a `MethodCall` (`{"method": "start", "arguments": "/tmp/a.wav", "id": 1}`);
//! each reply is a `MethodResponse` line. Amplitude values and delegate
//! callbacks are written as `{"event": ...}` lines in between.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use serde::Serialize;

use mic_recorder_core::{
    dispatch, MethodCall, MethodResponse, RecorderDelegate, RecorderError, RecorderFacade,
    RecorderOptions, RecorderState, RecordingResult,
};
use mic_recorder_cpal::{CpalMicInput, CpalMicrophonePermission, DeviceEnumerator, RodioPlayer};

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum Event<'a> {
    Amplitude { value: f64 },
    StateChanged { state: &'a str },
    Error { code: &'a str, message: String },
    RecordingFinished { result: &'a RecordingResult },
}

fn emit(event: &Event<'_>) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => log::warn!("Failed to serialize event: {}", e),
    }
}

/// Delegate that forwards callbacks to stdout.
struct StdoutDelegate;

impl RecorderDelegate for StdoutDelegate {
    fn on_state_changed(&self, state: RecorderState) {
        let state = match state {
            RecorderState::Idle => "idle",
            RecorderState::Recording => "recording",
        };
        emit(&Event::StateChanged { state });
    }

    fn on_error(&self, error: &RecorderError) {
        emit(&Event::Error {
            code: error.code(),
            message: error.to_string(),
        });
    }

    fn on_recording_finished(&self, result: &RecordingResult) {
        emit(&Event::RecordingFinished { result });
    }
}

fn cache_dir() -> PathBuf {
    dirs_next::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mic-recorder")
}

fn main() {
    env_logger::init();

    let input = match std::env::var("MIC_RECORDER_DEVICE") {
        Ok(name) => CpalMicInput::with_device(name),
        Err(_) => CpalMicInput::default_device(),
    };
    let options = RecorderOptions {
        cache_dir: cache_dir(),
        ..Default::default()
    };
    let recorder = RecorderFacade::with_options(input, RodioPlayer::new(), options);
    recorder.set_permission(Arc::new(CpalMicrophonePermission));
    recorder.set_delegate(Some(Arc::new(StdoutDelegate)));

    match DeviceEnumerator::new().list_input_devices() {
        Ok(devices) => {
            for device in devices {
                log::info!(
                    "Input device: {}{}",
                    device.name,
                    if device.is_default { " (default)" } else { "" }
                );
            }
        }
        Err(e) => log::warn!("Failed to list input devices: {}", e),
    }

    let amplitudes = recorder.subscribe();
    thread::Builder::new()
        .name("amplitude-printer".into())
        .spawn(move || {
            for value in amplitudes {
                emit(&Event::Amplitude { value });
            }
        })
        .map_err(|e| log::error!("Failed to spawn amplitude printer: {}", e))
        .ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<MethodCall>(&line) {
            Ok(call) => MethodResponse::from_outcome(call.id.clone(), dispatch(&recorder, &call)),
            Err(e) => {
                log::warn!("Ignoring malformed call: {}", e);
                continue;
            }
        };

        match serde_json::to_string(&response) {
            Ok(out) => {
                let mut stdout = io::stdout().lock();
                let _ = writeln!(stdout, "{}", out);
                let _ = stdout.flush();
            }
            Err(e) => log::warn!("Failed to serialize response: {}", e),
        }
    }

    if let Some(path) = recorder.stop() {
        log::info!("Recording saved on exit: {}", path.display());
    }
}
