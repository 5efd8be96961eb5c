//! Media Foundation camera backend.
//!
//! Opens a camera by symbolic link and reads samples from the first video
//! stream of an `IMFSourceReader` on a dedicated capture thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use windows::core::{GUID, HSTRING};
use windows::Win32::Media::MediaFoundation::*;

use video_capture_core::models::capability::{OfferedFormat, TargetProfile};
use video_capture_core::models::error::NativeError;
use video_capture_core::processing::frame_sink::SampleSink;
use video_capture_core::session::listeners::FailureListeners;
use video_capture_core::session::pending::{Completer, Pending};
use video_capture_core::traits::capture_backend::{CaptureBackend, FailureListener, ListenerToken};

use crate::media_types;
use crate::mf::{native, video_source_attributes, ComApartment, MfRuntime, VIDEO_STREAM};

/// The opened media source and the reader pulling from it.
struct Reader {
    source: IMFMediaSource,
    reader: IMFSourceReader,
}

// SAFETY: media sources and source readers are free-threaded. Every call is
// made from an MTA thread while holding the slot mutex, or from the single
// capture thread on its own reference.
unsafe impl Send for Reader {}

impl Reader {
    unsafe fn open(symbolic_link: &str) -> Result<Self, NativeError> {
        let attributes = video_source_attributes(1)?;
        attributes
            .SetString(
                &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_SYMBOLIC_LINK,
                &HSTRING::from(symbolic_link),
            )
            .map_err(|e| native("failed to set symbolic link", e))?;

        let source: IMFMediaSource =
            MFCreateDeviceSource(&attributes).map_err(|e| native("MFCreateDeviceSource failed", e))?;

        let mut reader_attributes: Option<IMFAttributes> = None;
        MFCreateAttributes(&mut reader_attributes, 1)
            .map_err(|e| native("MFCreateAttributes failed", e))?;
        let reader_attributes = reader_attributes
            .ok_or_else(|| NativeError::failed("MFCreateAttributes returned no store"))?;
        // Native types only; conversions are the consumer's business.
        reader_attributes
            .SetUINT32(&MF_READWRITE_DISABLE_CONVERTERS, 1)
            .map_err(|e| native("failed to disable converters", e))?;

        match MFCreateSourceReaderFromMediaSource(&source, &reader_attributes) {
            Ok(reader) => Ok(Self { source, reader }),
            Err(e) => {
                let _ = source.Shutdown();
                Err(native("MFCreateSourceReaderFromMediaSource failed", e))
            }
        }
    }

    unsafe fn native_formats(&self) -> Result<Vec<OfferedFormat>, NativeError> {
        let mut formats = Vec::new();
        for index in 0u32.. {
            let media_type = match self.reader.GetNativeMediaType(VIDEO_STREAM, index) {
                Ok(t) => t,
                Err(e) if e.code() == MF_E_NO_MORE_TYPES => break,
                Err(e) => return Err(native("GetNativeMediaType failed", e)),
            };
            match media_types::offered_format(index, &media_type) {
                Ok(format) => formats.push(format),
                Err(e) => log::debug!("skipping native media type {}: {}", index, e),
            }
        }
        Ok(formats)
    }

    unsafe fn select(&self, index: u32) -> Result<(), NativeError> {
        let media_type = self
            .reader
            .GetNativeMediaType(VIDEO_STREAM, index)
            .map_err(|e| native("GetNativeMediaType failed", e))?;
        self.reader
            .SetCurrentMediaType(VIDEO_STREAM, None, &media_type)
            .map_err(|e| native("SetCurrentMediaType failed", e))
    }
}

type ReaderSlot = Arc<Mutex<Option<Reader>>>;

/// One Media Foundation camera.
///
/// Each asynchronous step runs on its own MTA thread; recording runs a
/// blocking `ReadSample` loop until stopped.
pub struct MediaFoundationDevice {
    _runtime: Arc<MfRuntime>,
    symbolic_link: String,
    reader: ReaderSlot,
    listeners: Arc<FailureListeners>,
    running: Arc<AtomicBool>,
    capture_thread: Option<thread::JoinHandle<()>>,
}

impl MediaFoundationDevice {
    pub(crate) fn new(runtime: Arc<MfRuntime>, symbolic_link: String) -> Self {
        Self {
            _runtime: runtime,
            symbolic_link,
            reader: Arc::new(Mutex::new(None)),
            listeners: Arc::new(FailureListeners::new()),
            running: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
        }
    }

    /// Run `step` against the opened reader on an MTA thread.
    fn with_reader<T, F>(&self, name: &str, step: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&Reader) -> Result<T, NativeError> + Send + 'static,
    {
        let slot = Arc::clone(&self.reader);
        Pending::spawn(name, move || {
            let _com = ComApartment::enter()?;
            let guard = slot.lock();
            let reader = guard
                .as_ref()
                .ok_or_else(|| NativeError::invalid_state("device is not initialized"))?;
            step(reader)
        })
    }
}

impl CaptureBackend for MediaFoundationDevice {
    fn device_id(&self) -> &str {
        &self.symbolic_link
    }

    fn initialize(&mut self) -> Pending<()> {
        let symbolic_link = self.symbolic_link.clone();
        let slot = Arc::clone(&self.reader);
        Pending::spawn("mf-initialize", move || {
            let _com = ComApartment::enter()?;
            let reader = unsafe { Reader::open(&symbolic_link) }?;
            *slot.lock() = Some(reader);
            log::debug!("opened source reader for {}", symbolic_link);
            Ok(())
        })
    }

    fn available_formats(&mut self) -> Pending<Vec<OfferedFormat>> {
        self.with_reader("mf-formats", |reader| unsafe { reader.native_formats() })
    }

    fn apply_format(&mut self, format: &OfferedFormat) -> Pending<()> {
        let index = format.native.0;
        self.with_reader("mf-apply-format", move |reader| unsafe { reader.select(index) })
    }

    fn begin_recording(&mut self, profile: &TargetProfile, sink: SampleSink) -> Pending<()> {
        if let Some(handle) = self.capture_thread.take() {
            if !handle.is_finished() {
                self.capture_thread = Some(handle);
                return Pending::ready(Err(NativeError::invalid_state(
                    "recording already started",
                )));
            }
            // A previous start failed without a stop; reap its thread.
            if handle.join().is_err() {
                log::warn!("previous capture thread for {} panicked", self.symbolic_link);
            }
        }

        let (started, pending) = Pending::channel();
        let expected = media_types::subtype_guid(profile.subtype);
        let slot = Arc::clone(&self.reader);
        let listeners = Arc::clone(&self.listeners);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name("mf-video-capture".into())
            .spawn(move || {
                capture_loop(&running, &slot, &listeners, &sink, expected, started);
                running.store(false, Ordering::SeqCst);
            });

        match spawned {
            Ok(handle) => {
                self.capture_thread = Some(handle);
                pending
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Pending::ready(Err(NativeError::failed(format!(
                    "failed to spawn capture thread: {}",
                    e
                ))))
            }
        }
    }

    fn stop_recording(&mut self) -> Pending<()> {
        self.running.store(false, Ordering::SeqCst);
        let Some(handle) = self.capture_thread.take() else {
            return Pending::ready(Ok(()));
        };
        Pending::spawn("mf-stop", move || {
            handle
                .join()
                .map_err(|_| NativeError::failed("capture thread panicked"))
        })
    }

    fn subscribe_failures(&self, listener: FailureListener) -> ListenerToken {
        self.listeners.subscribe(listener)
    }

    fn unsubscribe_failures(&self, token: ListenerToken) {
        self.listeners.unsubscribe(token);
    }
}

impl Drop for MediaFoundationDevice {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }

        if let Some(reader) = self.reader.lock().take() {
            let _com = ComApartment::enter().ok();
            if let Err(e) = unsafe { reader.source.Shutdown() } {
                log::warn!("media source shutdown failed for {}: {}", self.symbolic_link, e);
            }
        }
    }
}

/// Body of the capture thread.
///
/// Resolves `started` once the reader is confirmed to deliver the expected
/// subtype, then pulls samples until `running` clears. Stream errors raised
/// while running go to the failure listeners.
fn capture_loop(
    running: &AtomicBool,
    slot: &ReaderSlot,
    listeners: &FailureListeners,
    sink: &SampleSink,
    expected: GUID,
    started: Completer<()>,
) {
    let _com = match ComApartment::enter() {
        Ok(com) => com,
        Err(e) => return started.complete(Err(e)),
    };

    let reader = match slot.lock().as_ref() {
        Some(r) => r.reader.clone(),
        None => {
            return started.complete(Err(NativeError::invalid_state("device is not initialized")))
        }
    };

    if let Err(e) = unsafe { check_subtype(&reader, &expected) } {
        return started.complete(Err(e));
    }
    started.complete(Ok(()));
    log::info!("capture thread started at {}", sink.format());

    while running.load(Ordering::SeqCst) {
        match unsafe { read_frame(&reader, sink) } {
            Ok(true) => {}
            Ok(false) => {
                listeners.notify(&NativeError::failed("capture stream ended"));
                break;
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    listeners.notify(&e);
                }
                break;
            }
        }
    }
    log::info!("capture thread exiting");
}

unsafe fn check_subtype(reader: &IMFSourceReader, expected: &GUID) -> Result<(), NativeError> {
    let current = reader
        .GetCurrentMediaType(VIDEO_STREAM)
        .map_err(|e| native("GetCurrentMediaType failed", e))?;
    let subtype = current
        .GetGUID(&MF_MT_SUBTYPE)
        .map_err(|e| native("failed to read current subtype", e))?;
    if subtype != *expected {
        return Err(NativeError::invalid_state(
            "current media type does not match the requested subtype",
        ));
    }
    Ok(())
}

/// Read one sample and hand it to the sink. Returns false at end of stream.
unsafe fn read_frame(reader: &IMFSourceReader, sink: &SampleSink) -> Result<bool, NativeError> {
    let mut flags: u32 = 0;
    let mut timestamp: i64 = 0;
    let mut sample: Option<IMFSample> = None;

    reader
        .ReadSample(
            VIDEO_STREAM,
            0,
            None,
            Some(&mut flags as *mut u32),
            Some(&mut timestamp as *mut i64),
            Some(&mut sample as *mut Option<IMFSample>),
        )
        .map_err(|e| native("ReadSample failed", e))?;

    if flags & (MF_SOURCE_READERF_ERROR.0 as u32) != 0 {
        return Err(NativeError::failed("source reader reported a stream error"));
    }
    if flags & (MF_SOURCE_READERF_ENDOFSTREAM.0 as u32) != 0 {
        return Ok(false);
    }

    // Stream ticks arrive without a sample.
    let Some(sample) = sample else {
        return Ok(true);
    };

    let buffer = sample
        .ConvertToContiguousBuffer()
        .map_err(|e| native("ConvertToContiguousBuffer failed", e))?;

    let mut data: *mut u8 = std::ptr::null_mut();
    let mut length: u32 = 0;
    buffer
        .Lock(&mut data, None, Some(&mut length as *mut u32))
        .map_err(|e| native("IMFMediaBuffer::Lock failed", e))?;

    if !data.is_null() && length > 0 {
        let bytes = std::slice::from_raw_parts(data, length as usize);
        sink.on_sample(bytes, timestamp);
    }

    buffer
        .Unlock()
        .map_err(|e| native("IMFMediaBuffer::Unlock failed", e))?;
    Ok(true)
}
