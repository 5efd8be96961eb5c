//! # video-capture-windows
//!
//! Windows Media Foundation backend for video-capture-kit.
//!
//! Provides:
//! - `MediaFoundationProvider`: camera enumeration via `MFEnumDeviceSources`
//! - `MediaFoundationDevice`: capture from one camera through an `IMFSourceReader`
//!
//! ## Platform Requirements
//! - Windows 10 or later
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use video_capture_core::{CaptureConfiguration, DeviceDirectory, VideoCapture};
//! use video_capture_windows::MediaFoundationProvider;
//!
//! let provider = Arc::new(MediaFoundationProvider::new()?);
//! let directory = Arc::new(DeviceDirectory::new(provider, CaptureConfiguration::default())?);
//! let mut capture = VideoCapture::new(directory, consumer);
//! ```

#[cfg(target_os = "windows")]
mod media_types;
#[cfg(target_os = "windows")]
mod mf;
#[cfg(target_os = "windows")]
pub mod mf_device;
#[cfg(target_os = "windows")]
pub mod mf_provider;

#[cfg(target_os = "windows")]
pub use mf_device::MediaFoundationDevice;
#[cfg(target_os = "windows")]
pub use mf_provider::MediaFoundationProvider;
