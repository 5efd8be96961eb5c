use crate::models::capability::{Capability, OfferedFormat, PixelFormat};

/// Pick the offered format closest to `requested`.
///
/// Only formats with the requested pixel format are considered; there is no
/// conversion fallback. Candidates are ranked by
/// `(|Δwidth|, |Δheight|, |Δfps|)` compared lexicographically, and the first
/// of several equally close candidates wins. Returns `None` when no offered
/// format shares the pixel format, or when `Unknown` is requested.
pub fn best_match<'a>(requested: &Capability, offered: &'a [OfferedFormat]) -> Option<&'a OfferedFormat> {
    if requested.pixel_format == PixelFormat::Unknown {
        return None;
    }

    offered
        .iter()
        .filter(|format| format.capability.pixel_format == requested.pixel_format)
        .min_by_key(|format| distance(requested, &format.capability))
}

fn distance(requested: &Capability, offered: &Capability) -> (u32, u32, u32) {
    (
        offered.width.abs_diff(requested.width),
        offered.height.abs_diff(requested.height),
        offered.max_fps.abs_diff(requested.max_fps),
    )
}
