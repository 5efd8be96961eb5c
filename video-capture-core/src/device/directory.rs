use std::sync::Arc;

use crate::models::capability::OfferedFormat;
use crate::models::config::CaptureConfiguration;
use crate::models::device::DeviceDescriptor;
use crate::models::error::CaptureError;
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::device_provider::DeviceProvider;

/// A device resolved by the directory: its descriptor and an uninitialized
/// native handle.
pub struct DeviceHandle {
    pub descriptor: DeviceDescriptor,
    pub backend: Box<dyn CaptureBackend>,
}

/// Enumerates capture devices and resolves identifiers to live handles.
///
/// Owned by the embedding application and shared between facades.
pub struct DeviceDirectory {
    provider: Arc<dyn DeviceProvider>,
    config: CaptureConfiguration,
}

impl DeviceDirectory {
    pub fn new(
        provider: Arc<dyn DeviceProvider>,
        config: CaptureConfiguration,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::InvalidArgument)?;
        Ok(Self { provider, config })
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    /// List the devices present right now, in platform order.
    pub fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let devices = self
            .provider
            .list_video_capture_devices()
            .wait(self.config.operation_timeout)
            .map_err(|e| CaptureError::DeviceNotFound(format!("device enumeration failed: {}", e)))?;

        if devices.is_empty() {
            log::error!("no video capture device found");
        }
        Ok(devices)
    }

    pub fn device_count(&self) -> Result<usize, CaptureError> {
        Ok(self.enumerate()?.len())
    }

    /// Descriptor at `index` in the current enumeration order.
    pub fn device_at(&self, index: usize) -> Result<DeviceDescriptor, CaptureError> {
        self.enumerate()?
            .into_iter()
            .nth(index)
            .ok_or_else(|| CaptureError::DeviceNotFound(format!("no device at index {}", index)))
    }

    /// Find the first device whose identifier starts with `unique_id_prefix`.
    ///
    /// Over-long or malformed identifiers are rejected before enumerating.
    pub fn find(&self, unique_id_prefix: &str) -> Result<DeviceDescriptor, CaptureError> {
        self.validate_id(unique_id_prefix)?;

        self.enumerate()?
            .into_iter()
            .find(|device| device.matches_prefix(unique_id_prefix))
            .ok_or_else(|| CaptureError::DeviceNotFound(unique_id_prefix.to_string()))
    }

    /// Resolve `unique_id_prefix` to an uninitialized device handle.
    pub fn resolve(&self, unique_id_prefix: &str) -> Result<DeviceHandle, CaptureError> {
        let descriptor = self.find(unique_id_prefix)?;
        log::debug!(
            "resolved {} to {} ({})",
            unique_id_prefix,
            descriptor.unique_id,
            descriptor.display_name
        );

        let backend = self.provider.open(&descriptor).map_err(|e| {
            CaptureError::InitializationError(format!("failed to open {}: {}", descriptor.unique_id, e))
        })?;
        Ok(DeviceHandle { descriptor, backend })
    }

    /// Formats offered by a device, read through a temporary handle that is
    /// released before returning.
    pub fn capabilities(&self, unique_id_prefix: &str) -> Result<Vec<OfferedFormat>, CaptureError> {
        let DeviceHandle {
            descriptor,
            mut backend,
        } = self.resolve(unique_id_prefix)?;
        log::info!("building capability map for {}", descriptor.unique_id);

        let timeout = self.config.operation_timeout;
        backend
            .initialize()
            .wait(timeout)
            .map_err(|e| CaptureError::InitializationError(e.to_string()))?;

        backend
            .available_formats()
            .wait(timeout)
            .map_err(|e| CaptureError::InitializationError(format!("failed to read formats: {}", e)))
    }

    fn validate_id(&self, unique_id: &str) -> Result<(), CaptureError> {
        if unique_id.len() > self.config.max_unique_id_len {
            log::error!("device id too long ({} bytes)", unique_id.len());
            return Err(CaptureError::InvalidArgument(format!(
                "device id exceeds {} bytes",
                self.config.max_unique_id_len
            )));
        }
        if unique_id.is_empty() {
            return Err(CaptureError::InvalidArgument("device id is empty".into()));
        }
        if unique_id.contains('\0') {
            return Err(CaptureError::InvalidArgument(
                "device id contains a NUL byte".into(),
            ));
        }
        Ok(())
    }
}
