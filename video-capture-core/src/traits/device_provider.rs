use crate::models::device::DeviceDescriptor;
use crate::models::error::NativeError;
use crate::session::pending::Pending;
use crate::traits::capture_backend::CaptureBackend;

/// Platform device enumeration.
///
/// Enumeration order is whatever the platform reports and may change
/// between calls.
pub trait DeviceProvider: Send + Sync {
    /// List the video capture devices currently present.
    fn list_video_capture_devices(&self) -> Pending<Vec<DeviceDescriptor>>;

    /// Create an uninitialized handle for `device`.
    fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn CaptureBackend>, NativeError>;
}
