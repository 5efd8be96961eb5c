//! Scripted fake backend and provider for session and facade tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::capability::{FrameRate, NativeFormatId, OfferedFormat, PixelFormat, TargetProfile};
use crate::models::device::DeviceDescriptor;
use crate::models::error::{CaptureError, NativeError};
use crate::models::state::SessionState;
use crate::processing::frame_sink::SampleSink;
use crate::session::listeners::FailureListeners;
use crate::session::pending::Pending;
use crate::traits::capture_backend::{CaptureBackend, FailureListener, ListenerToken};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::device_provider::DeviceProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Step {
    Initialize,
    Formats,
    ApplyFormat,
    BeginRecording,
    StopRecording,
}

impl Step {
    fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Formats => "available_formats",
            Self::ApplyFormat => "apply_format",
            Self::BeginRecording => "begin_recording",
            Self::StopRecording => "stop_recording",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Succeed,
    Fail,
    Abandon,
    Hang,
}

/// Shared view of a fake device, observed by tests.
pub(crate) struct Probe {
    id: String,
    formats: Vec<OfferedFormat>,
    behaviors: Mutex<HashMap<Step, Behavior>>,
    calls: Mutex<Vec<&'static str>>,
    listeners: FailureListeners,
    sink: Mutex<Option<SampleSink>>,
    applied: Mutex<Option<OfferedFormat>>,
    recording: AtomicBool,
    released: AtomicBool,
    hung: Mutex<Vec<Box<dyn Send>>>,
}

impl Probe {
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn applied(&self) -> Option<OfferedFormat> {
        self.applied.lock().clone()
    }

    /// Push a sample through the sink handed to `begin_recording`.
    pub(crate) fn deliver(&self, data: &[u8], timestamp_100ns: i64) -> bool {
        let sink = self.sink.lock().clone();
        sink.map_or(false, |s| s.on_sample(data, timestamp_100ns))
    }

    /// Raise an out-of-band failure as the device would.
    pub(crate) fn fail_async(&self, error: NativeError) {
        self.listeners.notify(&error);
    }

    fn behavior(&self, step: Step) -> Behavior {
        self.behaviors
            .lock()
            .get(&step)
            .copied()
            .unwrap_or(Behavior::Succeed)
    }
}

/// Test-side controller for one fake camera.
#[derive(Clone)]
pub(crate) struct FakeDevice {
    probe: Arc<Probe>,
}

impl FakeDevice {
    pub(crate) fn new(id: &str) -> Self {
        Self::with_formats(
            id,
            vec![
                offer(0, PixelFormat::Yuy2, 640, 480, 30),
                offer(1, PixelFormat::Yuy2, 1280, 720, 30),
                offer(2, PixelFormat::Mjpeg, 1280, 720, 30),
            ],
        )
    }

    pub(crate) fn with_formats(id: &str, formats: Vec<OfferedFormat>) -> Self {
        Self {
            probe: Arc::new(Probe {
                id: id.to_string(),
                formats,
                behaviors: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
                listeners: FailureListeners::new(),
                sink: Mutex::new(None),
                applied: Mutex::new(None),
                recording: AtomicBool::new(false),
                released: AtomicBool::new(false),
                hung: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.probe.id
    }

    pub(crate) fn probe(&self) -> &Probe {
        &self.probe
    }

    pub(crate) fn boxed(&self) -> Box<dyn CaptureBackend> {
        self.probe.released.store(false, Ordering::SeqCst);
        Box::new(FakeBackend {
            probe: Arc::clone(&self.probe),
        })
    }

    pub(crate) fn fail(&self, step: Step) {
        self.script(step, Behavior::Fail);
    }

    pub(crate) fn succeed(&self, step: Step) {
        self.script(step, Behavior::Succeed);
    }

    pub(crate) fn abandon(&self, step: Step) {
        self.script(step, Behavior::Abandon);
    }

    pub(crate) fn hang(&self, step: Step) {
        self.script(step, Behavior::Hang);
    }

    fn script(&self, step: Step, behavior: Behavior) {
        self.probe.behaviors.lock().insert(step, behavior);
    }
}

pub(crate) fn offer(index: u32, pixel_format: PixelFormat, width: u32, height: u32, fps: u32) -> OfferedFormat {
    OfferedFormat::new(
        NativeFormatId(index),
        pixel_format,
        width,
        height,
        FrameRate::whole(fps),
    )
}

struct FakeBackend {
    probe: Arc<Probe>,
}

impl FakeBackend {
    /// Record the call, then resolve according to the script. Successful
    /// steps apply `effect` and complete from another thread.
    fn step<T, F>(&self, step: Step, effect: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&Probe) -> T,
    {
        self.probe.calls.lock().push(step.name());

        match self.probe.behavior(step) {
            Behavior::Succeed => {
                let value = effect(&self.probe);
                Pending::spawn("fake-step", move || Ok(value))
            }
            Behavior::Fail => Pending::ready(Err(NativeError::failed(format!(
                "{} failed",
                step.name()
            )))),
            Behavior::Abandon => {
                let (completer, pending) = Pending::channel();
                drop(completer);
                pending
            }
            Behavior::Hang => {
                let (completer, pending) = Pending::channel();
                self.probe.hung.lock().push(Box::new(completer));
                pending
            }
        }
    }
}

impl CaptureBackend for FakeBackend {
    fn device_id(&self) -> &str {
        &self.probe.id
    }

    fn initialize(&mut self) -> Pending<()> {
        self.step(Step::Initialize, |_| ())
    }

    fn available_formats(&mut self) -> Pending<Vec<OfferedFormat>> {
        self.step(Step::Formats, |probe| probe.formats.clone())
    }

    fn apply_format(&mut self, format: &OfferedFormat) -> Pending<()> {
        let format = format.clone();
        self.step(Step::ApplyFormat, move |probe| {
            *probe.applied.lock() = Some(format);
        })
    }

    fn begin_recording(&mut self, _profile: &TargetProfile, sink: SampleSink) -> Pending<()> {
        // Like a native device, recording is armed before the outcome is
        // known and only a stop disarms it.
        if self.probe.recording.swap(true, Ordering::SeqCst) {
            self.probe.calls.lock().push(Step::BeginRecording.name());
            return Pending::ready(Err(NativeError::invalid_state("recording already started")));
        }
        self.step(Step::BeginRecording, move |probe| {
            *probe.sink.lock() = Some(sink);
        })
    }

    fn stop_recording(&mut self) -> Pending<()> {
        self.step(Step::StopRecording, |probe| {
            probe.sink.lock().take();
            probe.recording.store(false, Ordering::SeqCst);
        })
    }

    fn subscribe_failures(&self, listener: FailureListener) -> ListenerToken {
        self.probe.listeners.subscribe(listener)
    }

    fn unsubscribe_failures(&self, token: ListenerToken) {
        self.probe.listeners.unsubscribe(token);
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.probe.released.store(true, Ordering::SeqCst);
    }
}

/// Fake enumeration over a fixed set of devices.
pub(crate) struct FakeProvider {
    devices: Vec<FakeDevice>,
    enumerations: AtomicUsize,
    fail_enumeration: AtomicBool,
}

impl FakeProvider {
    pub(crate) fn new(devices: Vec<FakeDevice>) -> Arc<Self> {
        Arc::new(Self {
            devices,
            enumerations: AtomicUsize::new(0),
            fail_enumeration: AtomicBool::new(false),
        })
    }

    pub(crate) fn with_ids(ids: &[&str]) -> Arc<Self> {
        Self::new(ids.iter().map(|id| FakeDevice::new(id)).collect())
    }

    pub(crate) fn device(&self, id: &str) -> &FakeDevice {
        self.devices
            .iter()
            .find(|d| d.id() == id)
            .unwrap_or_else(|| panic!("no fake device {}", id))
    }

    pub(crate) fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_enumeration(&self) {
        self.fail_enumeration.store(true, Ordering::SeqCst);
    }
}

impl DeviceProvider for FakeProvider {
    fn list_video_capture_devices(&self) -> Pending<Vec<DeviceDescriptor>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Pending::ready(Err(NativeError::failed("enumeration failed")));
        }

        let descriptors: Vec<DeviceDescriptor> = self
            .devices
            .iter()
            .map(|d| DeviceDescriptor::new(d.id(), format!("Camera {}", d.id())))
            .collect();
        let (completer, pending) = Pending::channel();
        thread::spawn(move || completer.complete(Ok(descriptors)));
        pending
    }

    fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn CaptureBackend>, NativeError> {
        self.devices
            .iter()
            .find(|d| d.id() == device.unique_id)
            .map(FakeDevice::boxed)
            .ok_or_else(|| NativeError::failed(format!("cannot open {}", device.unique_id)))
    }
}

/// Delegate that records everything it is told.
#[derive(Default)]
pub(crate) struct RecordingDelegate {
    states: Mutex<Vec<&'static str>>,
    errors: Mutex<Vec<CaptureError>>,
}

impl RecordingDelegate {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn states(&self) -> Vec<&'static str> {
        self.states.lock().clone()
    }

    pub(crate) fn errors(&self) -> Vec<CaptureError> {
        self.errors.lock().clone()
    }
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &SessionState) {
        self.states.lock().push(state.name());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }
}
