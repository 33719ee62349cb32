use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use mic_recorder_core::models::error::PlaybackError;
use mic_recorder_core::traits::audio_player::AudioPlayer;

/// Owns the `!Send` `OutputStream` on its own thread and hands back a handle.
struct OutputThread {
    handle: OutputStreamHandle,
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

impl OutputThread {
    fn open() -> Result<Self, PlaybackError> {
        let (handle_tx, handle_rx) = bounded(1);
        let (shutdown, shutdown_rx) = bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("rodio-output".into())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    let _ = handle_tx.send(Ok(handle));
                    let _ = shutdown_rx.recv();
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(PlaybackError::Playback(e.to_string())));
                }
            })
            .map_err(|e| PlaybackError::Playback(format!("failed to spawn output thread: {}", e)))?;

        let handle = handle_rx
            .recv()
            .map_err(|_| PlaybackError::Playback("output thread exited".into()))??;
        log::debug!("Audio output opened");
        Ok(Self {
            handle,
            shutdown,
            thread,
        })
    }

    fn close(self) {
        let _ = self.shutdown.send(());
        let _ = self.thread.join();
    }
}

/// [`AudioPlayer`] that decodes files with rodio and plays them on the
/// default output device. The output device is opened on first `load`.
#[derive(Default)]
pub struct RodioPlayer {
    output: Option<OutputThread>,
    sink: Option<Sink>,
}

impl RodioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn output_handle(&mut self) -> Result<&OutputStreamHandle, PlaybackError> {
        if self.output.is_none() {
            self.output = Some(OutputThread::open()?);
        }
        self.output
            .as_ref()
            .map(|o| &o.handle)
            .ok_or_else(|| PlaybackError::Playback("audio output unavailable".into()))
    }
}

impl AudioPlayer for RodioPlayer {
    fn load(&mut self, path: &Path) -> Result<(), PlaybackError> {
        if let Some(previous) = self.sink.take() {
            previous.stop();
        }

        let file = File::open(path).map_err(|e| PlaybackError::Playback(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::Playback(format!("cannot decode {}: {}", path.display(), e)))?;

        let sink = Sink::try_new(self.output_handle()?).map_err(|e| PlaybackError::Playback(e.to_string()))?;
        sink.append(source);
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        match &self.sink {
            Some(sink) => {
                sink.pause();
                Ok(())
            }
            None => Err(PlaybackError::Pause("nothing is loaded".into())),
        }
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        match &self.sink {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(PlaybackError::Playback("nothing is loaded".into())),
        }
    }

    fn stop(&mut self) -> Result<(), PlaybackError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map_or(true, |s| s.empty())
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        if let Some(output) = self.output.take() {
            output.close();
        }
    }
}
