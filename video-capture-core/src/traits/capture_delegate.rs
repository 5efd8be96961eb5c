use crate::models::error::CaptureError;
use crate::models::state::SessionState;

/// Event delegate for capture session notifications.
///
/// `on_state_changed` is called on the thread driving the session;
/// `on_error` may arrive on a backend thread. Implementations must not call
/// back into the session synchronously.
pub trait CaptureDelegate: Send + Sync {
    /// Called after every session state transition.
    fn on_state_changed(&self, state: &SessionState);

    /// Called with [`CaptureError::NativeCaptureFailure`] when the device
    /// reports an asynchronous failure. The session keeps its state; the
    /// owner decides whether to stop.
    fn on_error(&self, error: &CaptureError);
}
