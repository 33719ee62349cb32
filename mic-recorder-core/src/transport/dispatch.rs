use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::error::{PlaybackError, RecorderError};
use crate::session::recorder::RecorderFacade;
use crate::traits::audio_input::AudioInput;
use crate::traits::audio_player::AudioPlayer;

/// One named call with loosely typed arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
    /// Echoed back in the response so callers can correlate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
            id: None,
        }
    }
}

/// Wire error: a stable code plus a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodError {
    pub code: String,
    pub message: String,
}

impl MethodError {
    pub fn not_implemented(method: &str) -> Self {
        Self {
            code: "NOT_IMPLEMENTED".into(),
            message: format!("method '{}' is not implemented", method),
        }
    }
}

impl From<RecorderError> for MethodError {
    fn from(error: RecorderError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Reply to a [`MethodCall`]; exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<MethodError>,
}

impl MethodResponse {
    pub fn from_outcome(id: Option<Value>, outcome: Result<Value, MethodError>) -> Self {
        match outcome {
            Ok(result) => Self {
                id,
                result: Some(result),
                error: None,
            },
            Err(error) => Self {
                id,
                result: None,
                error: Some(error),
            },
        }
    }
}

/// Route `call` to the matching facade operation.
///
/// `start` and `play` take the path as a bare string argument;
/// `configureRecording` takes an object.
pub fn dispatch<I, P>(recorder: &RecorderFacade<I, P>, call: &MethodCall) -> Result<Value, MethodError>
where
    I: AudioInput + 'static,
    P: AudioPlayer,
{
    log::debug!("Dispatching {}", call.method);
    match call.method.as_str() {
        "start" => {
            let path = path_argument(&call.arguments);
            recorder.start(path)?;
            Ok(Value::Null)
        }
        "stop" => Ok(recorder
            .stop()
            .map(|p| Value::String(p.to_string_lossy().into_owned()))
            .unwrap_or(Value::Null)),
        "play" => {
            let path = path_argument(&call.arguments).ok_or(RecorderError::from(PlaybackError::MissingArgument))?;
            recorder.play(&path)?;
            Ok(Value::Null)
        }
        "pausePlayback" => {
            recorder.pause_playback()?;
            Ok(Value::Null)
        }
        "resumePlayback" => {
            recorder.resume_playback()?;
            Ok(Value::Null)
        }
        "stopPlayback" => {
            recorder.stop_playback()?;
            Ok(Value::Null)
        }
        "isPlaying" => Ok(Value::Bool(recorder.is_playing())),
        "configureRecording" => {
            recorder.configure_recording(&call.arguments)?;
            Ok(Value::Null)
        }
        "getPlatformVersion" => Ok(Value::String(recorder.platform_version())),
        other => Err(MethodError::not_implemented(other)),
    }
}

/// A non-empty string argument, as a path.
fn path_argument(arguments: &Value) -> Option<PathBuf> {
    arguments.as_str().filter(|s| !s.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::RecorderOptions;
    use crate::test_support::{temp_path, MockInput, MockPlayer};
    use serde_json::json;

    fn recorder() -> (RecorderFacade<MockInput, MockPlayer>, PathBuf) {
        let (input, _) = MockInput::new();
        let (player, _) = MockPlayer::new();
        let cache_dir = temp_path("cache");
        let options = RecorderOptions {
            cache_dir: cache_dir.clone(),
            ..Default::default()
        };
        (RecorderFacade::with_options(input, player, options), cache_dir)
    }

    fn call(recorder: &RecorderFacade<MockInput, MockPlayer>, method: &str, arguments: Value) -> Result<Value, MethodError> {
        dispatch(recorder, &MethodCall::new(method, arguments))
    }

    fn code(result: Result<Value, MethodError>) -> String {
        result.unwrap_err().code
    }

    #[test]
    fn start_stop_round_trip_over_the_wire() {
        let (recorder, cache_dir) = recorder();
        assert_eq!(call(&recorder, "start", Value::Null).unwrap(), Value::Null);
        assert_eq!(code(call(&recorder, "start", Value::Null)), "ALREADY_RECORDING");

        let stopped = call(&recorder, "stop", Value::Null).unwrap();
        let expected = cache_dir.join("mic_stream_recording.wav");
        assert_eq!(stopped, json!(expected.to_string_lossy()));
        assert_eq!(call(&recorder, "stop", Value::Null).unwrap(), Value::Null);

        std::fs::remove_dir_all(cache_dir.parent().unwrap()).ok();
    }

    #[test]
    fn start_accepts_custom_path_string() {
        let (recorder, cache_dir) = recorder();
        let custom = cache_dir.join("custom.wav");
        call(&recorder, "start", json!(custom.to_string_lossy())).unwrap();
        assert_eq!(
            call(&recorder, "stop", Value::Null).unwrap(),
            json!(custom.to_string_lossy())
        );
        std::fs::remove_dir_all(cache_dir.parent().unwrap()).ok();
    }

    #[test]
    fn play_argument_errors() {
        let (recorder, cache_dir) = recorder();
        assert_eq!(code(call(&recorder, "play", Value::Null)), "MISSING_ARGUMENT");
        assert_eq!(code(call(&recorder, "play", json!(""))), "MISSING_ARGUMENT");
        let missing = cache_dir.join("missing.wav");
        assert_eq!(code(call(&recorder, "play", json!(missing.to_string_lossy()))), "FILE_NOT_FOUND");
        assert_eq!(call(&recorder, "isPlaying", Value::Null).unwrap(), json!(false));
    }

    #[test]
    fn playback_controls_are_noops_when_idle() {
        let (recorder, _) = recorder();
        for method in ["pausePlayback", "resumePlayback", "stopPlayback"] {
            assert_eq!(call(&recorder, method, Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn configure_recording_over_the_wire() {
        let (recorder, _) = recorder();
        call(
            &recorder,
            "configureRecording",
            json!({"sampleRate": 48000, "channels": 5, "bufferSize": 333, "audioQuality": "loud"}),
        )
        .unwrap();
        let config = recorder.config();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 2);
        assert_eq!(config.buffer_size, 1024);

        assert_eq!(code(call(&recorder, "configureRecording", Value::Null)), "INVALID_ARGUMENTS");
        assert_eq!(code(call(&recorder, "configureRecording", json!([1, 2]))), "INVALID_ARGUMENTS");

        call(&recorder, "configureRecording", json!({"amplitudeMin": 1.0, "amplitudeMax": 0.0})).unwrap();
        assert!(recorder.config().amplitude_range.is_inverted());
    }

    #[test]
    fn platform_version_and_unknown_methods() {
        let (recorder, _) = recorder();
        let version = call(&recorder, "getPlatformVersion", Value::Null).unwrap();
        assert!(version.as_str().unwrap().contains(std::env::consts::OS));

        let err = call(&recorder, "record", Value::Null).unwrap_err();
        assert_eq!(err.code, "NOT_IMPLEMENTED");
        assert!(err.message.contains("record"));
    }

    #[test]
    fn responses_serialize_with_id() {
        let ok = MethodResponse::from_outcome(Some(json!(7)), Ok(json!(true)));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"id": 7, "result": true}));

        let err = MethodResponse::from_outcome(None, Err(MethodError::not_implemented("x")));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["error"]["code"], "NOT_IMPLEMENTED");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn method_call_parses_without_arguments() {
        let call: MethodCall = serde_json::from_str(r#"{"method":"stop"}"#).unwrap();
        assert_eq!(call.method, "stop");
        assert_eq!(call.arguments, Value::Null);
        assert_eq!(call.id, None);
    }
}
