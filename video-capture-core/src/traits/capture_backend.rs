use std::sync::Arc;

use crate::models::capability::{OfferedFormat, TargetProfile};
use crate::models::error::NativeError;
use crate::processing::frame_sink::SampleSink;
use crate::session::pending::Pending;

/// Callback invoked when the device reports an out-of-band capture failure.
///
/// Fires on a backend thread, at any time between subscribe and unsubscribe.
pub type FailureListener = Arc<dyn Fn(&NativeError) + Send + Sync + 'static>;

/// Identifies one failure-listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub(crate) u64);

/// A live handle to one native capture device.
///
/// Every step that touches the device is asynchronous and returns a
/// [`Pending`] the capture session joins on. Dropping the handle releases the
/// device.
///
/// Implemented by:
/// - `MediaFoundationDevice` (Windows)
pub trait CaptureBackend: Send {
    /// Unique identifier of the device this handle was opened for.
    fn device_id(&self) -> &str;

    /// Bind the device. Must complete before any other step.
    fn initialize(&mut self) -> Pending<()>;

    /// Stream formats the device offers for video recording.
    fn available_formats(&mut self) -> Pending<Vec<OfferedFormat>>;

    /// Select the native stream format to record from.
    fn apply_format(&mut self, format: &OfferedFormat) -> Pending<()>;

    /// Start delivering samples in the profile's format to `sink`.
    fn begin_recording(&mut self, profile: &TargetProfile, sink: SampleSink) -> Pending<()>;

    /// Stop delivering samples. Once this completes no further sample
    /// reaches the sink passed to `begin_recording`.
    fn stop_recording(&mut self) -> Pending<()>;

    fn subscribe_failures(&self, listener: FailureListener) -> ListenerToken;

    /// Unknown or already-removed tokens are ignored.
    fn unsubscribe_failures(&self, token: ListenerToken);
}
