//! Microphone capture via cpal.
//!
//! `cpal::Stream` is not `Send` on every host, so the stream is built and
//! owned by a dedicated thread. `start` waits for that thread to report the
//! stream as playing (or failed); `stop` signals it and joins.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use mic_recorder_core::models::audio_models::{AudioSource, InputFormat};
use mic_recorder_core::models::error::CaptureError;
use mic_recorder_core::processing::pcm;
use mic_recorder_core::traits::audio_input::{AudioBufferCallback, AudioInput, StreamErrorCallback};

use crate::device_enumerator::DeviceEnumerator;
use crate::permissions::is_permission_error;

/// How long `start` waits for the capture thread to open the device.
const OPEN_TIMEOUT: Duration = Duration::from_secs(3);

struct CaptureThread {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// [`AudioInput`] backed by a cpal input stream.
pub struct CpalMicInput {
    /// Device name to match; `None` uses the host default.
    device_name: Option<String>,
    worker: Option<CaptureThread>,
}

impl CpalMicInput {
    /// Capture from the host's default input device.
    pub fn default_device() -> Self {
        Self {
            device_name: None,
            worker: None,
        }
    }

    /// Capture from the input device whose name best matches `name`.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            worker: None,
        }
    }

    fn resolve_device(&self) -> Result<cpal::Device, CaptureError> {
        DeviceEnumerator::new().find_input_device(self.device_name.as_deref())
    }
}

impl AudioInput for CpalMicInput {
    fn is_available(&self) -> bool {
        self.resolve_device().is_ok()
    }

    fn start(
        &mut self,
        format: InputFormat,
        on_samples: AudioBufferCallback,
        on_error: StreamErrorCallback,
    ) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            self.stop()?;
        }

        let device_name = self.device_name.clone();
        let (ready_tx, ready_rx) = bounded::<Result<(), CaptureError>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("cpal-mic-capture".into())
            .spawn(move || {
                let stream = match DeviceEnumerator::new()
                    .find_input_device(device_name.as_deref())
                    .and_then(|device| open_stream(&device, format, on_samples, on_error))
                {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(map_backend_error(e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));
                log::debug!("Mic capture thread started");

                // Block until stop is requested or the owner is dropped.
                let _ = stop_rx.recv();
                drop(stream);
                log::debug!("Mic capture thread stopped");
            })
            .map_err(|e| CaptureError::StreamFailed(format!("failed to spawn capture thread: {}", e)))?;

        let outcome = match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(CaptureError::StreamFailed("capture thread exited during start".into()))
            }
        };

        match outcome {
            Ok(()) => {
                self.worker = Some(CaptureThread { stop_tx, handle });
                log::info!(
                    "Mic capture started: {} Hz, {} ch, buffer {} frames",
                    format.sample_rate,
                    format.channels,
                    format.buffer_frames
                );
                Ok(())
            }
            Err(e) => {
                // The thread either returned already or will on the dropped sender.
                drop(stop_tx);
                if !matches!(e, CaptureError::Timeout) {
                    let _ = handle.join();
                }
                Err(e)
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = worker.stop_tx.send(());
        worker
            .handle
            .join()
            .map_err(|_| CaptureError::StreamFailed("capture thread panicked".into()))?;
        log::info!("Mic capture stopped");
        Ok(())
    }

    fn device_info(&self) -> AudioSource {
        let enumerator = DeviceEnumerator::new();
        let default_name = enumerator.default_input_name();
        let name = self
            .resolve_device()
            .ok()
            .and_then(|d| d.name().ok())
            .or_else(|| self.device_name.clone())
            .unwrap_or_else(|| "default".to_string());
        AudioSource {
            id: name.clone(),
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
        }
    }
}

impl Drop for CpalMicInput {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop mic capture on drop: {}", e);
        }
    }
}

/// Build an input stream at `format`, converting whatever sample type the
/// device offers to i16.
fn open_stream(
    device: &cpal::Device,
    format: InputFormat,
    on_samples: AudioBufferCallback,
    on_error: StreamErrorCallback,
) -> Result<cpal::Stream, CaptureError> {
    let (sample_format, buffer_size) = select_config(device, format)?;
    let mut config = cpal::StreamConfig {
        channels: format.channels,
        sample_rate: cpal::SampleRate(format.sample_rate),
        buffer_size,
    };

    log::debug!(
        "Opening {:?} input stream: {} Hz, {} ch, buffer {:?}",
        sample_format,
        format.sample_rate,
        format.channels,
        config.buffer_size
    );

    match build_stream(device, &config, sample_format, on_samples.clone(), on_error.clone()) {
        Ok(stream) => Ok(stream),
        Err(e) if matches!(config.buffer_size, cpal::BufferSize::Fixed(_)) => {
            log::warn!("Fixed buffer rejected ({}); retrying with host default", e);
            config.buffer_size = cpal::BufferSize::Default;
            build_stream(device, &config, sample_format, on_samples, on_error)
        }
        Err(e) => Err(e),
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    on_samples: AudioBufferCallback,
    on_error: StreamErrorCallback,
) -> Result<cpal::Stream, CaptureError> {
    let err_fn = move |err: cpal::StreamError| {
        log::error!("Mic stream error: {}", err);
        on_error(map_stream_error(err));
    };

    let stream = match sample_format {
        cpal::SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| on_samples(data),
            err_fn,
            None,
        ),
        cpal::SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| on_samples(&pcm::convert_f32(data)),
            err_fn,
            None,
        ),
        cpal::SampleFormat::I32 => device.build_input_stream(
            config,
            move |data: &[i32], _: &cpal::InputCallbackInfo| on_samples(&pcm::convert_i32(data)),
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| on_samples(&pcm::convert_u16(data)),
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("input device disappeared".into())
        }
        cpal::BuildStreamError::StreamConfigNotSupported => CaptureError::DeviceUnavailable(format!(
            "{} Hz / {} ch not supported",
            config.sample_rate.0, config.channels
        )),
        other => map_backend_error(other.to_string()),
    })
}

/// Pick the preferred sample format among ranges that can run at `format`.
fn select_config(
    device: &cpal::Device,
    format: InputFormat,
) -> Result<(cpal::SampleFormat, cpal::BufferSize), CaptureError> {
    let ranges = device
        .supported_input_configs()
        .map_err(|e| map_backend_error(e.to_string()))?;
    let rate = cpal::SampleRate(format.sample_rate);

    ranges
        .filter(|r| r.channels() == format.channels)
        .filter(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
        .filter_map(|r| format_rank(r.sample_format()).map(|rank| (rank, r)))
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, r)| {
            (
                r.sample_format(),
                buffer_size_for(r.buffer_size(), format.buffer_frames),
            )
        })
        .ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!(
                "device cannot capture {} Hz / {} ch",
                format.sample_rate, format.channels
            ))
        })
}

fn format_rank(format: cpal::SampleFormat) -> Option<u8> {
    match format {
        cpal::SampleFormat::I16 => Some(0),
        cpal::SampleFormat::F32 => Some(1),
        cpal::SampleFormat::I32 => Some(2),
        cpal::SampleFormat::U16 => Some(3),
        _ => None,
    }
}

/// `Fixed(frames)` when the device advertises a range containing it.
fn buffer_size_for(supported: &cpal::SupportedBufferSize, frames: u32) -> cpal::BufferSize {
    match supported {
        cpal::SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&frames) => {
            cpal::BufferSize::Fixed(frames)
        }
        _ => cpal::BufferSize::Default,
    }
}

fn map_stream_error(err: cpal::StreamError) -> CaptureError {
    match err {
        cpal::StreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("input device disconnected".into())
        }
        other => CaptureError::StreamFailed(other.to_string()),
    }
}

fn map_backend_error(message: String) -> CaptureError {
    if is_permission_error(&message) {
        CaptureError::PermissionDenied
    } else {
        CaptureError::StreamFailed(message)
    }
}
