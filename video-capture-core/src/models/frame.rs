use super::capability::Capability;

/// Native sample timestamps are expressed in 100-nanosecond units.
pub const HNS_PER_MILLISECOND: i64 = 10_000;

/// Convert a 100-nanosecond timestamp to whole milliseconds.
pub fn hns_to_ms(timestamp_100ns: i64) -> i64 {
    timestamp_100ns / HNS_PER_MILLISECOND
}

/// A captured frame handed to a [`FrameConsumer`](crate::FrameConsumer).
///
/// The data is borrowed from the native buffer and is only valid for the
/// duration of the callback; copy it to keep it.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub data: &'a [u8],
    pub capture_time_ms: i64,
    pub format: Capability,
}

impl Frame<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
