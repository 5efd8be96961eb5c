//! # video-capture-core
//!
//! Platform-agnostic camera capture core library.
//!
//! Provides device lookup, capability negotiation, frame delivery and session
//! orchestration. Platform-specific backends (Windows Media Foundation)
//! implement the `DeviceProvider` and `CaptureBackend` traits and plug into
//! the generic `VideoCapture` facade.
//!
//! ## Architecture
//!
//! ```text
//! video-capture-core (this crate)
//! ├── traits/       ← DeviceProvider, CaptureBackend, FrameConsumer, CaptureDelegate
//! ├── models/       ← CaptureError, SessionState, Capability, DeviceDescriptor, etc.
//! ├── device/       ← DeviceDirectory (enumeration, prefix lookup)
//! ├── processing/   ← capability matcher, frame sink adapter
//! └── session/      ← Pending, CaptureSession, VideoCapture facade
//! ```

pub mod device;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use device::directory::{DeviceDirectory, DeviceHandle};
pub use models::capability::{
    Capability, FrameRate, NativeFormatId, NativeSubtype, OfferedFormat, PixelFormat, TargetProfile,
};
pub use models::config::{CaptureConfiguration, MAX_UNIQUE_ID_LEN};
pub use models::device::DeviceDescriptor;
pub use models::diagnostics::CaptureDiagnostics;
pub use models::error::{CaptureError, NativeError};
pub use models::frame::{hns_to_ms, Frame};
pub use models::state::SessionState;
pub use processing::capability_matcher::best_match;
pub use processing::frame_sink::{FrameSinkAdapter, SampleSink};
pub use session::capture_session::CaptureSession;
pub use session::listeners::FailureListeners;
pub use session::pending::{Completer, Pending};
pub use session::video_capture::VideoCapture;
pub use traits::capture_backend::{CaptureBackend, FailureListener, ListenerToken};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::device_provider::DeviceProvider;
pub use traits::frame_consumer::FrameConsumer;
