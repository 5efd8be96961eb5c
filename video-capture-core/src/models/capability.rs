use std::fmt;

use serde::{Deserialize, Serialize};

/// Pixel layout of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixelFormat {
    Yv12,
    Yuy2,
    /// Planar 4:2:0, also published as IYUV.
    #[serde(alias = "IYUV")]
    I420,
    Rgb24,
    Argb,
    Mjpeg,
    Nv12,
    Unknown,
}

impl PixelFormat {
    /// Native subtype used to request this pixel format from a device.
    ///
    /// `Unknown` has no native representation.
    pub fn native_subtype(self) -> Option<NativeSubtype> {
        match self {
            Self::Yv12 => Some(NativeSubtype::Yv12),
            Self::Yuy2 => Some(NativeSubtype::Yuy2),
            Self::I420 => Some(NativeSubtype::Iyuv),
            Self::Rgb24 => Some(NativeSubtype::Rgb24),
            Self::Argb => Some(NativeSubtype::Rgb32),
            Self::Mjpeg => Some(NativeSubtype::Mjpg),
            Self::Nv12 => Some(NativeSubtype::Nv12),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yv12 => "YV12",
            Self::Yuy2 => "YUY2",
            Self::I420 => "I420",
            Self::Rgb24 => "RGB24",
            Self::Argb => "ARGB",
            Self::Mjpeg => "MJPEG",
            Self::Nv12 => "NV12",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for PixelFormat {
    type Err = String;

    /// Parse a format name case-insensitively; `IYUV` is accepted for I420.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YV12" => Ok(Self::Yv12),
            "YUY2" => Ok(Self::Yuy2),
            "I420" | "IYUV" => Ok(Self::I420),
            "RGB24" => Ok(Self::Rgb24),
            "ARGB" => Ok(Self::Argb),
            "MJPEG" => Ok(Self::Mjpeg),
            "NV12" => Ok(Self::Nv12),
            _ => Err(format!("unknown pixel format: {}", s)),
        }
    }
}

/// Uncompressed/compressed subtypes understood by native capture pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeSubtype {
    Yv12,
    Yuy2,
    Iyuv,
    Rgb24,
    Rgb32,
    Mjpg,
    Nv12,
}

impl NativeSubtype {
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Self::Yv12 => PixelFormat::Yv12,
            Self::Yuy2 => PixelFormat::Yuy2,
            Self::Iyuv => PixelFormat::I420,
            Self::Rgb24 => PixelFormat::Rgb24,
            Self::Rgb32 => PixelFormat::Argb,
            Self::Mjpg => PixelFormat::Mjpeg,
            Self::Nv12 => PixelFormat::Nv12,
        }
    }

    pub fn fourcc(self) -> &'static str {
        match self {
            Self::Yv12 => "YV12",
            Self::Yuy2 => "YUY2",
            Self::Iyuv => "IYUV",
            Self::Rgb24 => "RGB24",
            Self::Rgb32 => "RGB32",
            Self::Mjpg => "MJPG",
            Self::Nv12 => "NV12",
        }
    }
}

/// Rational frame rate as reported by native stream properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    pub fn whole(fps: u32) -> Self {
        Self {
            numerator: fps,
            denominator: 1,
        }
    }

    /// Whole frames per second, truncated (0 for a zero denominator).
    pub fn fps(&self) -> u32 {
        self.numerator.checked_div(self.denominator).unwrap_or(0)
    }
}

/// A (width, height, fps, pixel format) tuple describing a video stream shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub width: u32,
    pub height: u32,
    pub max_fps: u32,
    pub pixel_format: PixelFormat,
}

impl Capability {
    pub fn new(width: u32, height: u32, max_fps: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            max_fps,
            pixel_format,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}@{} {}",
            self.width, self.height, self.max_fps, self.pixel_format
        )
    }
}

/// Backend-specific handle selecting one native stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeFormatId(pub u32);

/// A format a device can produce, plus the handle needed to select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferedFormat {
    pub capability: Capability,
    pub frame_rate: FrameRate,
    pub native: NativeFormatId,
}

impl OfferedFormat {
    pub fn new(
        native: NativeFormatId,
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        frame_rate: FrameRate,
    ) -> Self {
        Self {
            capability: Capability::new(width, height, frame_rate.fps(), pixel_format),
            frame_rate,
            native,
        }
    }
}

/// The stream a session asks the backend to record: the native subtype of
/// the requested pixel format and the offered format chosen for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProfile {
    pub subtype: NativeSubtype,
    pub format: OfferedFormat,
}

impl TargetProfile {
    pub fn new(subtype: NativeSubtype, format: OfferedFormat) -> Self {
        Self { subtype, format }
    }

    /// The format frames are delivered in.
    pub fn capability(&self) -> Capability {
        self.format.capability
    }
}
