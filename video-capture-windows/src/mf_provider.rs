//! Camera enumeration via `MFEnumDeviceSources`.
//!
//! Each camera is identified by its symbolic link, which is stable across
//! enumerations and is what `MediaFoundationDevice` opens.

use std::sync::Arc;

use windows::core::{GUID, PWSTR};
use windows::Win32::Media::MediaFoundation::*;
use windows::Win32::System::Com::CoTaskMemFree;

use video_capture_core::models::device::DeviceDescriptor;
use video_capture_core::models::error::NativeError;
use video_capture_core::session::pending::Pending;
use video_capture_core::traits::capture_backend::CaptureBackend;
use video_capture_core::traits::device_provider::DeviceProvider;

use crate::mf::{native, video_source_attributes, ComApartment, MfRuntime};
use crate::mf_device::MediaFoundationDevice;

/// Video capture device provider backed by Media Foundation.
///
/// Starts Media Foundation on creation; it stays up until the provider and
/// every device opened from it are dropped.
pub struct MediaFoundationProvider {
    runtime: Arc<MfRuntime>,
}

impl MediaFoundationProvider {
    pub fn new() -> Result<Self, NativeError> {
        Ok(Self {
            runtime: MfRuntime::start()?,
        })
    }
}

impl DeviceProvider for MediaFoundationProvider {
    fn list_video_capture_devices(&self) -> Pending<Vec<DeviceDescriptor>> {
        Pending::spawn("mf-enumerate", || {
            let _com = ComApartment::enter()?;
            unsafe { enumerate_devices() }
        })
    }

    fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn CaptureBackend>, NativeError> {
        Ok(Box::new(MediaFoundationDevice::new(
            Arc::clone(&self.runtime),
            device.unique_id.clone(),
        )))
    }
}

unsafe fn enumerate_devices() -> Result<Vec<DeviceDescriptor>, NativeError> {
    let attributes = video_source_attributes(0)?;

    let mut activates: *mut Option<IMFActivate> = std::ptr::null_mut();
    let mut count: u32 = 0;
    MFEnumDeviceSources(&attributes, &mut activates, &mut count)
        .map_err(|e| native("MFEnumDeviceSources failed", e))?;

    if activates.is_null() {
        return Ok(Vec::new());
    }

    let entries = std::slice::from_raw_parts_mut(activates, count as usize);
    let mut devices = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter_mut().enumerate() {
        // Taking the entry releases the activation object at the end of the
        // iteration.
        let Some(activate) = entry.take() else {
            continue;
        };
        match describe(&activate) {
            Ok(device) => devices.push(device),
            Err(e) => log::warn!("skipping capture device {}: {}", index, e),
        }
    }
    CoTaskMemFree(Some(activates as *const _));

    log::debug!("enumerated {} video capture devices", devices.len());
    Ok(devices)
}

unsafe fn describe(activate: &IMFActivate) -> Result<DeviceDescriptor, NativeError> {
    let unique_id = allocated_string(
        activate,
        &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_SYMBOLIC_LINK,
    )?;
    let display_name = allocated_string(activate, &MF_DEVSOURCE_ATTRIBUTE_FRIENDLY_NAME)
        .unwrap_or_else(|_| unique_id.clone());
    Ok(DeviceDescriptor::new(unique_id, display_name))
}

unsafe fn allocated_string(activate: &IMFActivate, key: &GUID) -> Result<String, NativeError> {
    let mut value = PWSTR::null();
    let mut length: u32 = 0;
    activate
        .GetAllocatedString(key, &mut value, &mut length)
        .map_err(|e| native("GetAllocatedString failed", e))?;

    let text = value.to_string();
    CoTaskMemFree(Some(value.0 as *const _));
    text.map_err(|e| NativeError::failed(format!("attribute is not valid UTF-16: {}", e)))
}
