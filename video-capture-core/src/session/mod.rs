pub mod capture_session;
pub mod listeners;
pub mod pending;
pub mod video_capture;
