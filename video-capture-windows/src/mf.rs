//! Media Foundation runtime and COM apartment guards, plus shared helpers.

use std::sync::Arc;

use windows::Win32::Media::MediaFoundation::*;
use windows::Win32::System::Com::*;

use video_capture_core::models::error::NativeError;

/// Stream index of the first video stream on a source reader.
pub(crate) const VIDEO_STREAM: u32 = MF_SOURCE_READER_FIRST_VIDEO_STREAM.0 as u32;

/// Wrap a Windows error, keeping its HRESULT.
pub(crate) fn native(context: &str, error: windows::core::Error) -> NativeError {
    NativeError::new(error.code().0, format!("{}: {}", context, error))
}

/// Keeps Media Foundation started for as long as any provider or device
/// holds a reference.
pub(crate) struct MfRuntime {
    _private: (),
}

impl MfRuntime {
    pub(crate) fn start() -> Result<Arc<Self>, NativeError> {
        unsafe { MFStartup(MF_VERSION, MFSTARTUP_NOSOCKET) }
            .map_err(|e| native("MFStartup failed", e))?;
        log::debug!("media foundation started");
        Ok(Arc::new(Self { _private: () }))
    }
}

impl Drop for MfRuntime {
    fn drop(&mut self) {
        if let Err(e) = unsafe { MFShutdown() } {
            log::warn!("MFShutdown failed: {}", e);
        }
    }
}

/// Joins the multithreaded apartment for the current thread; leaves it on drop.
pub(crate) struct ComApartment;

impl ComApartment {
    pub(crate) fn enter() -> Result<Self, NativeError> {
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .map_err(|e| native("CoInitializeEx failed", e))?;
        Ok(Self)
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}

/// Attribute store selecting video capture sources, with room for `extra`
/// more attributes.
pub(crate) unsafe fn video_source_attributes(extra: u32) -> Result<IMFAttributes, NativeError> {
    let mut attributes: Option<IMFAttributes> = None;
    MFCreateAttributes(&mut attributes, 1 + extra).map_err(|e| native("MFCreateAttributes failed", e))?;
    let attributes =
        attributes.ok_or_else(|| NativeError::failed("MFCreateAttributes returned no store"))?;

    attributes
        .SetGUID(
            &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE,
            &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
        )
        .map_err(|e| native("failed to select video capture sources", e))?;
    Ok(attributes)
}
