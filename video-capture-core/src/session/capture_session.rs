use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::capability::{Capability, OfferedFormat, TargetProfile};
use crate::models::error::{CaptureError, NativeError};
use crate::models::state::SessionState;
use crate::processing::frame_sink::FrameSinkAdapter;
use crate::traits::capture_backend::{CaptureBackend, FailureListener, ListenerToken};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::frame_consumer::FrameConsumer;

type SharedDelegate = Arc<Mutex<Option<Arc<dyn CaptureDelegate>>>>;

/// The live binding between one device handle and its capture pipeline.
///
/// Drives the native backend through
/// ```text
/// initialize → [sink init → apply format → begin recording] → stop → cleanup
/// ```
/// joining on every asynchronous step, so each public call returns only once
/// the native side has settled. Not thread-safe for concurrent calls; the
/// owner serializes them (`&mut self`).
pub struct CaptureSession {
    id: Uuid,
    backend: Option<Box<dyn CaptureBackend>>,
    failure_token: Option<ListenerToken>,
    sink: Option<FrameSinkAdapter>,
    state: SessionState,
    negotiated: Option<Capability>,
    delegate: SharedDelegate,
    timeout: Option<Duration>,
}

impl CaptureSession {
    /// `timeout` bounds each asynchronous join; None waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend: None,
            failure_token: None,
            sink: None,
            state: SessionState::Uninitialized,
            negotiated: None,
            delegate: Arc::new(Mutex::new(None)),
            timeout,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        *self.delegate.lock() = Some(delegate);
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    /// Whether a device handle is currently bound.
    pub fn is_bound(&self) -> bool {
        self.backend.is_some()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.backend.as_ref().map(|b| b.device_id())
    }

    /// Format of the most recent successful start on the bound device.
    pub fn negotiated(&self) -> Option<Capability> {
        self.negotiated
    }

    /// Frames delivered by the current sink, if one exists.
    pub fn frames_delivered(&self) -> u64 {
        self.sink.as_ref().map_or(0, |s| s.frames_delivered())
    }

    /// Bind `backend` and register for its failure notifications.
    ///
    /// Any previously bound device is torn down first. On failure the
    /// listener is removed and the handle released before returning
    /// [`CaptureError::InitializationError`].
    pub fn initialize(&mut self, mut backend: Box<dyn CaptureBackend>) -> Result<(), CaptureError> {
        self.teardown();

        log::info!("[{}] initializing capture device {}", self.id, backend.device_id());
        let token = backend.subscribe_failures(self.failure_listener());

        if let Err(e) = backend.initialize().wait(self.timeout) {
            backend.unsubscribe_failures(token);
            log::error!(
                "[{}] device {} failed to initialize, rolled back: {}",
                self.id,
                backend.device_id(),
                e
            );
            drop(backend);

            let error = CaptureError::InitializationError(e.to_string());
            self.set_state(SessionState::Failed(error.clone()));
            return Err(error);
        }

        self.backend = Some(backend);
        self.failure_token = Some(token);
        self.set_state(SessionState::Initialized);
        Ok(())
    }

    /// Query the bound device's offered stream formats.
    pub fn available_formats(&mut self) -> Result<Vec<OfferedFormat>, CaptureError> {
        let timeout = self.timeout;
        let backend = self.backend.as_mut().ok_or(CaptureError::NotInitialized)?;
        backend
            .available_formats()
            .wait(timeout)
            .map_err(|e| start_error("query stream formats", e))
    }

    /// Build a sink for `profile` and start recording into it.
    ///
    /// Runs sink initialization, stream property application and recording
    /// start strictly in sequence. Any failing step releases the sink and
    /// returns [`CaptureError::StartCaptureError`]; nothing is retried.
    pub fn configure_and_start(
        &mut self,
        profile: TargetProfile,
        consumer: Arc<dyn FrameConsumer>,
    ) -> Result<(), CaptureError> {
        if self.backend.is_none() {
            return Err(CaptureError::NotInitialized);
        }
        if self.is_started() {
            return Err(CaptureError::AlreadyStarted);
        }

        self.cleanup_sink();
        self.set_state(SessionState::Configuring);

        let target = profile.capability();
        log::info!(
            "[{}] starting capture at {} ({})",
            self.id,
            target,
            profile.subtype.fourcc()
        );
        let sink = FrameSinkAdapter::configure(target, consumer);

        match self.run_start_chain(&profile, &sink) {
            Ok(()) => {
                self.sink = Some(sink);
                self.negotiated = Some(target);
                self.set_state(SessionState::Started);
                Ok(())
            }
            Err(error) => {
                sink.release();
                log::error!("[{}] {}", self.id, error);
                self.set_state(SessionState::Failed(error.clone()));
                Err(error)
            }
        }
    }

    /// Stop recording and release the sink.
    ///
    /// No-op unless started. Blocks until the native stop completes; the sink
    /// is released and the session returns to `Initialized` whether or not
    /// the native stop succeeded.
    pub fn stop(&mut self) {
        if !self.is_started() {
            return;
        }

        self.stop_recording();
        self.cleanup_sink();
        self.set_state(SessionState::Initialized);
    }

    /// Unregister the failure listener, stop if needed, release the sink and
    /// the device handle. Safe to call repeatedly; always leaves the session
    /// `Uninitialized`, including after a failed `initialize`.
    pub fn teardown(&mut self) {
        if self.backend.is_none() && self.sink.is_none() {
            if self.state.is_failed() {
                self.set_state(SessionState::Uninitialized);
            }
            return;
        }

        if let (Some(backend), Some(token)) = (self.backend.as_ref(), self.failure_token.take()) {
            backend.unsubscribe_failures(token);
        }

        if self.is_started() {
            self.stop_recording();
        }
        self.cleanup_sink();

        if let Some(backend) = self.backend.take() {
            log::info!("[{}] releasing capture device {}", self.id, backend.device_id());
        }
        self.negotiated = None;
        self.set_state(SessionState::Uninitialized);
    }

    // --- Internal helpers ---

    fn run_start_chain(
        &mut self,
        profile: &TargetProfile,
        sink: &FrameSinkAdapter,
    ) -> Result<(), CaptureError> {
        let timeout = self.timeout;
        let id = self.id;
        let backend = self.backend.as_mut().ok_or(CaptureError::NotInitialized)?;

        let samples = sink
            .initialize()
            .wait(timeout)
            .map_err(|e| start_error("initialize sink", e))?;

        backend
            .apply_format(&profile.format)
            .wait(timeout)
            .map_err(|e| start_error("apply stream properties", e))?;

        if let Err(e) = backend.begin_recording(profile, samples).wait(timeout) {
            // The device may be half-started, or still starting after a
            // timeout; stop it so a later start begins from a clean device.
            if let Err(stop_error) = backend.stop_recording().wait(timeout) {
                log::warn!(
                    "[{}] stop after failed begin recording failed: {}",
                    id,
                    stop_error
                );
            }
            return Err(start_error("begin recording", e));
        }
        Ok(())
    }

    fn stop_recording(&mut self) {
        self.set_state(SessionState::Stopping);

        let timeout = self.timeout;
        if let Some(backend) = self.backend.as_mut() {
            if let Err(e) = backend.stop_recording().wait(timeout) {
                log::warn!("[{}] stop recording failed, cleaning up anyway: {}", self.id, e);
            }
        }
    }

    fn cleanup_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.release();
            log::debug!(
                "[{}] sink released after {} frames",
                self.id,
                sink.frames_delivered()
            );
        }
    }

    fn failure_listener(&self) -> FailureListener {
        let delegate = Arc::clone(&self.delegate);
        let id = self.id;
        Arc::new(move |error: &NativeError| {
            log::error!("[{}] native capture failure: {}", id, error);
            let delegate = delegate.lock().clone();
            if let Some(delegate) = delegate {
                delegate.on_error(&CaptureError::from(error.clone()));
            }
        })
    }

    fn set_state(&mut self, new_state: SessionState) {
        log::info!("[{}] {} -> {}", self.id, self.state.name(), new_state);
        self.state = new_state.clone();

        let delegate = self.delegate.lock().clone();
        if let Some(delegate) = delegate {
            delegate.on_state_changed(&new_state);
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn start_error(step: &str, error: NativeError) -> CaptureError {
    CaptureError::StartCaptureError(format!("{} failed: {}", step, error))
}
