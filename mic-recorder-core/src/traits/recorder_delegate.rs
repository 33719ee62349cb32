use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;

/// Lifecycle notifications from a [`RecorderFacade`](crate::RecorderFacade).
///
/// Methods may be called from the read-loop thread as well as from the thread
/// that invoked the facade. Implementations should marshal to a UI thread if
/// needed. Amplitude values are not delivered here; see
/// [`AmplitudeStream`](crate::AmplitudeStream).
pub trait RecorderDelegate: Send + Sync {
    fn on_state_changed(&self, state: RecorderState);

    /// Called for failures that happen outside a caller's request, such as an
    /// input stream dying mid-recording.
    fn on_error(&self, error: &RecorderError);

    /// Called once the recording file has been finalized.
    fn on_recording_finished(&self, result: &RecordingResult);
}
