use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::directory::{DeviceDirectory, DeviceHandle};
use crate::models::capability::{Capability, TargetProfile};
use crate::models::device::DeviceDescriptor;
use crate::models::diagnostics::CaptureDiagnostics;
use crate::models::error::CaptureError;
use crate::models::frame::Frame;
use crate::models::state::SessionState;
use crate::processing::capability_matcher::best_match;
use crate::session::capture_session::CaptureSession;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::frame_consumer::FrameConsumer;

/// Sits between the sink and the application's consumer, keeping counters.
struct FrameForwarder {
    consumer: Arc<dyn FrameConsumer>,
    diagnostics: Mutex<CaptureDiagnostics>,
}

impl FrameConsumer for FrameForwarder {
    fn on_incoming_frame(&self, frame: &Frame<'_>) {
        {
            let mut d = self.diagnostics.lock();
            d.frames_delivered += 1;
            d.bytes_delivered += frame.len() as u64;
            d.last_capture_time_ms = Some(frame.capture_time_ms);
        }
        self.consumer.on_incoming_frame(frame);
    }
}

/// Camera capture for one device at a time.
///
/// Composes the [`DeviceDirectory`], a [`CaptureSession`] and the capability
/// matcher. Every operation blocks until the native work behind it has
/// settled:
/// ```text
/// init(id) → directory.resolve → session.initialize
/// start_capture(cap) → offered formats → best_match → session.configure_and_start
/// frames: backend → sink → VideoCapture → consumer
/// stop_capture() → session.stop
/// ```
/// Calls must be serialized by the owner; wrap in a mutex to share across
/// threads. The consumer must not call back into this object.
pub struct VideoCapture {
    directory: Arc<DeviceDirectory>,
    session: CaptureSession,
    forwarder: Arc<FrameForwarder>,
    device: Option<DeviceDescriptor>,
}

impl VideoCapture {
    /// `consumer` receives every frame of every capture started on this
    /// object.
    pub fn new(directory: Arc<DeviceDirectory>, consumer: Arc<dyn FrameConsumer>) -> Self {
        let timeout = directory.config().operation_timeout;
        Self {
            directory,
            session: CaptureSession::new(timeout),
            forwarder: Arc::new(FrameForwarder {
                consumer,
                diagnostics: Mutex::new(CaptureDiagnostics::default()),
            }),
            device: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.session.set_delegate(delegate);
    }

    pub fn directory(&self) -> &DeviceDirectory {
        &self.directory
    }

    /// Bind the first device whose identifier starts with `device_id`.
    ///
    /// Any previous device is released first. On failure no device remains
    /// bound.
    pub fn init(&mut self, device_id: &str) -> Result<(), CaptureError> {
        log::info!("init called for device {}", device_id);
        self.session.teardown();
        self.device = None;

        let DeviceHandle {
            descriptor,
            backend,
        } = self.directory.resolve(device_id)?;

        if let Err(e) = self.session.initialize(backend) {
            self.session.teardown();
            return Err(e);
        }

        log::info!("bound {} ({})", descriptor.display_name, descriptor.unique_id);
        self.device = Some(descriptor);
        Ok(())
    }

    /// Negotiate the offered format closest to `capability` and start
    /// delivering frames.
    pub fn start_capture(&mut self, capability: &Capability) -> Result<(), CaptureError> {
        if !self.session.is_bound() {
            return Err(CaptureError::NotInitialized);
        }
        if self.session.is_started() {
            return Err(CaptureError::AlreadyStarted);
        }

        let subtype = capability.pixel_format.native_subtype().ok_or_else(|| {
            log::error!("pixel format {} is not supported on this platform", capability.pixel_format);
            CaptureError::FormatNotSupported(format!(
                "{} has no native subtype",
                capability.pixel_format
            ))
        })?;

        let offered = self.session.available_formats()?;
        let matched = best_match(capability, &offered).cloned().ok_or_else(|| {
            log::error!("device offers no {} format", capability.pixel_format);
            CaptureError::FormatNotSupported(format!(
                "device offers no {} format",
                capability.pixel_format
            ))
        })?;
        log::info!("requested {}, matched {}", capability, matched.capability);

        *self.forwarder.diagnostics.lock() = CaptureDiagnostics::default();
        let consumer: Arc<dyn FrameConsumer> = self.forwarder.clone();
        self.session
            .configure_and_start(TargetProfile::new(subtype, matched), consumer)?;

        self.forwarder.diagnostics.lock().started_at = Some(chrono::Utc::now().to_rfc3339());
        Ok(())
    }

    /// Stop delivering frames. Always succeeds; native stop failures are
    /// logged and the session is cleaned up regardless. No frame callback
    /// fires after this returns.
    pub fn stop_capture(&mut self) {
        self.session.stop();
    }

    pub fn capture_started(&self) -> bool {
        self.session.is_started()
    }

    /// The negotiated format of the bound device's last start.
    pub fn capture_settings(&self) -> Option<Capability> {
        self.session.negotiated()
    }

    pub fn current_device(&self) -> Option<&DeviceDescriptor> {
        self.device.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.forwarder.diagnostics.lock().clone()
    }
}
