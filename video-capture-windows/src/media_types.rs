//! Translation between Media Foundation media types and core formats.

use windows::core::GUID;
use windows::Win32::Media::MediaFoundation::*;

use video_capture_core::models::capability::{
    FrameRate, NativeFormatId, NativeSubtype, OfferedFormat, PixelFormat,
};

const SUBTYPES: [NativeSubtype; 7] = [
    NativeSubtype::Yv12,
    NativeSubtype::Yuy2,
    NativeSubtype::Iyuv,
    NativeSubtype::Rgb24,
    NativeSubtype::Rgb32,
    NativeSubtype::Mjpg,
    NativeSubtype::Nv12,
];

pub(crate) fn subtype_guid(subtype: NativeSubtype) -> GUID {
    match subtype {
        NativeSubtype::Yv12 => MFVideoFormat_YV12,
        NativeSubtype::Yuy2 => MFVideoFormat_YUY2,
        NativeSubtype::Iyuv => MFVideoFormat_IYUV,
        NativeSubtype::Rgb24 => MFVideoFormat_RGB24,
        NativeSubtype::Rgb32 => MFVideoFormat_RGB32,
        NativeSubtype::Mjpg => MFVideoFormat_MJPG,
        NativeSubtype::Nv12 => MFVideoFormat_NV12,
    }
}

pub(crate) fn subtype_from_guid(guid: &GUID) -> Option<NativeSubtype> {
    SUBTYPES.into_iter().find(|s| subtype_guid(*s) == *guid)
}

/// High and low halves of a packed `MF_MT_FRAME_SIZE`/`MF_MT_FRAME_RATE` value.
fn unpack(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, value as u32)
}

/// Describe the native media type at `index`. Subtypes with no core
/// equivalent come back as `PixelFormat::Unknown`.
pub(crate) unsafe fn offered_format(
    index: u32,
    media_type: &IMFMediaType,
) -> windows::core::Result<OfferedFormat> {
    let subtype = media_type.GetGUID(&MF_MT_SUBTYPE)?;
    let (width, height) = unpack(media_type.GetUINT64(&MF_MT_FRAME_SIZE)?);
    let (numerator, denominator) = unpack(media_type.GetUINT64(&MF_MT_FRAME_RATE)?);

    let pixel_format =
        subtype_from_guid(&subtype).map_or(PixelFormat::Unknown, NativeSubtype::pixel_format);

    Ok(OfferedFormat::new(
        NativeFormatId(index),
        pixel_format,
        width,
        height,
        FrameRate {
            numerator,
            denominator,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subtype_maps_back() {
        for subtype in SUBTYPES {
            assert_eq!(subtype_from_guid(&subtype_guid(subtype)), Some(subtype));
        }
        assert_eq!(subtype_from_guid(&MFVideoFormat_H264), None);
    }

    #[test]
    fn unpacks_frame_size() {
        assert_eq!(unpack((1280u64 << 32) | 720), (1280, 720));
        assert_eq!(unpack((30000u64 << 32) | 1001), (30000, 1001));
    }
}
