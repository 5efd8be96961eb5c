pub mod capability_matcher;
pub mod frame_sink;
